use std::io::{self, Write};
use std::process::ExitCode;

use interaction::{
    ActionCatalog, CommandSink, ContextFilter, InteractionConfig, Menu, Notification,
    NotificationBus, OutboundCommand, Session, SinkError,
};
use tracing::{debug, error, info, warn};

use super::bootstrap::AppWiring;
use super::scenario::{Scenario, ScenarioStep};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "runtime_start_failed");
            return ExitCode::FAILURE;
        }
    };

    let mut sink = JsonLinesSink::new(io::stdout());
    let mut chat = ChatLog;
    let replay = runtime.block_on(replay(
        &app.scenario,
        &app.catalog,
        &app.config,
        &mut sink,
        &mut chat,
    ));
    match replay {
        Ok(summary) => {
            info!(
                menus = summary.menus_opened,
                selections = summary.selections,
                fired = summary.fired,
                "scenario_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "scenario_failed");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReplaySummary {
    pub(crate) menus_opened: usize,
    pub(crate) selections: usize,
    pub(crate) fired: usize,
}

pub(crate) async fn replay(
    scenario: &Scenario,
    catalog: &ActionCatalog,
    config: &InteractionConfig,
    sink: &mut dyn CommandSink,
    bus: &mut dyn NotificationBus,
) -> Result<ReplaySummary, String> {
    let mut session = Session::from_config(catalog, config);
    let mut snapshot = scenario.snapshot.clone();
    let player = snapshot.player.socket_id.clone();
    let mut menu: Option<Menu<'_>> = None;
    let mut summary = ReplaySummary::default();

    for (index, step) in scenario.steps.iter().enumerate() {
        match step {
            ScenarioStep::Open(open) => {
                let opened = session
                    .open_menu(&snapshot, &open.click_context(), &ContextFilter)
                    .await;
                info!(step = index, labels = ?opened.labels(), "menu_opened");
                summary.menus_opened += 1;
                menu = Some(opened);
            }
            ScenarioStep::Select { action } => {
                let Some(current) = menu.take() else {
                    warn!(step = index, action = %action, "select_without_open_menu");
                    continue;
                };
                let outcome = session
                    .select(&snapshot, &current, action, sink, bus)
                    .map_err(|err| format!("step {index}: {err}"))?;
                debug!(
                    step = index,
                    queued = outcome.queued.is_some(),
                    superseded = outcome.superseded.is_some(),
                    "selection_handled"
                );
                summary.selections += 1;
            }
            ScenarioStep::Arrive(position) => {
                snapshot.player.position = *position;
                menu = None;
                if let Some(fired) = session.movement_arrived(&player, *position) {
                    info!(step = index, action = %fired.action.name, "arrived_with_pending_action");
                    summary.fired += 1;
                }
            }
            ScenarioStep::Interrupt {} => {
                session.movement_interrupted(&player);
            }
        }
    }

    Ok(summary)
}

pub(crate) struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> CommandSink for JsonLinesSink<W> {
    fn send(&mut self, command: OutboundCommand) -> Result<(), SinkError> {
        let event = command.event_name();
        let line =
            serde_json::to_string(&command).map_err(|source| SinkError::Encode { event, source })?;
        writeln!(self.out, "{line}")
            .and_then(|()| self.out.flush())
            .map_err(|source| SinkError::Write { event, source })
    }
}

struct ChatLog;

impl NotificationBus for ChatLog {
    fn publish(&mut self, notification: Notification) {
        match notification {
            Notification::Chat { kind, text } => info!(kind = ?kind, text = %text, "chat_message"),
        }
    }
}

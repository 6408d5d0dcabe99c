mod bootstrap;
mod runner;
mod scenario;

pub(crate) use bootstrap::build_app;
pub(crate) use runner::run;

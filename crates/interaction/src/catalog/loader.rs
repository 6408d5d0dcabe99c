use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::info;

use super::database::{ActionCatalog, CatalogError};
use super::types::{ActionDefinition, ContextClass, ContextClasses, TargetRequirement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateName,
}

#[derive(Debug, Clone)]
pub struct CatalogLoadError {
    pub code: CatalogErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for CatalogLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for CatalogLoadError {}

pub fn load_catalog_file(path: &Path) -> Result<ActionCatalog, CatalogLoadError> {
    let raw = fs::read_to_string(path).map_err(|error| CatalogLoadError {
        code: CatalogErrorCode::ReadFile,
        message: format!("failed to read catalog: {error}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    let catalog = parse_catalog_xml(path, &raw)?;
    info!(
        path = %path.display(),
        action_count = catalog.len(),
        "action_catalog_loaded"
    );
    Ok(catalog)
}

pub fn parse_catalog_xml(file_path: &Path, raw: &str) -> Result<ActionCatalog, CatalogLoadError> {
    let doc = Document::parse(raw).map_err(|error| CatalogLoadError {
        code: CatalogErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Actions" {
        return Err(error_at_node(
            CatalogErrorCode::InvalidRoot,
            "root element must be <Actions>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let mut definitions = Vec::<ActionDefinition>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "ActionDef" {
            return Err(error_at_node(
                CatalogErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; expected <ActionDef>",
                    child.tag_name().name()
                ),
                file_path,
                &doc,
                child,
            ));
        }
        let definition = parse_action_def(file_path, &doc, child)?;
        if definitions.iter().any(|seen| seen.name.eq_ignore_ascii_case(&definition.name)) {
            return Err(error_at_node(
                CatalogErrorCode::DuplicateName,
                format!("duplicate ActionDef '{}'", definition.name),
                file_path,
                &doc,
                child,
            ));
        }
        definitions.push(definition);
    }

    ActionCatalog::from_definitions(definitions).map_err(|error| {
        let code = match error {
            CatalogError::DuplicateName { .. } => CatalogErrorCode::DuplicateName,
            CatalogError::EmptyName | CatalogError::NoContext { .. } => {
                CatalogErrorCode::InvalidValue
            }
        };
        CatalogLoadError {
            code,
            message: error.to_string(),
            file_path: file_path.to_path_buf(),
            location: None,
        }
    })
}

fn parse_action_def(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<ActionDefinition, CatalogLoadError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut context: Option<ContextClasses> = None;
    let mut queueable = false;
    let mut requires = TargetRequirement::Nothing;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(error_at_node(
                CatalogErrorCode::DuplicateField,
                format!("duplicate field <{}> in <ActionDef>", field_name),
                file_path,
                doc,
                field,
            ));
        }

        match field_name.as_str() {
            "name" => name = Some(required_text(file_path, doc, field, "name")?),
            "label" => label = Some(required_text(file_path, doc, field, "label")?),
            "context" => {
                let value = required_text(file_path, doc, field, "context")?;
                let mut classes = ContextClasses::empty();
                for token in value.split_whitespace() {
                    let class = token.parse::<ContextClass>().map_err(|message| {
                        error_at_node(CatalogErrorCode::InvalidValue, message, file_path, doc, field)
                    })?;
                    classes |= class.flag();
                }
                context = Some(classes);
            }
            "queueable" => {
                let value = required_text(file_path, doc, field, "queueable")?;
                queueable = match value.as_str() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(error_at_node(
                            CatalogErrorCode::InvalidValue,
                            format!("queueable '{}' must be true or false", value),
                            file_path,
                            doc,
                            field,
                        ))
                    }
                };
            }
            "requires" => {
                let value = required_text(file_path, doc, field, "requires")?;
                requires = value.parse::<TargetRequirement>().map_err(|message| {
                    error_at_node(CatalogErrorCode::InvalidValue, message, file_path, doc, field)
                })?;
            }
            _ => {
                return Err(error_at_node(
                    CatalogErrorCode::UnknownField,
                    format!("unknown field <{}> in <ActionDef>", field_name),
                    file_path,
                    doc,
                    field,
                ))
            }
        }
    }

    let Some(name) = name else {
        return Err(error_at_node(
            CatalogErrorCode::MissingField,
            "missing required field <name> in <ActionDef>".to_string(),
            file_path,
            doc,
            node,
        ));
    };
    let Some(context) = context else {
        return Err(error_at_node(
            CatalogErrorCode::MissingField,
            "missing required field <context> in <ActionDef>".to_string(),
            file_path,
            doc,
            node,
        ));
    };

    Ok(ActionDefinition {
        label: label.unwrap_or_else(|| name.clone()),
        name,
        context,
        queueable,
        requires,
    })
}

fn required_text(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, CatalogLoadError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(error_at_node(
            CatalogErrorCode::MissingField,
            format!("field <{}> must not be empty", field_name),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value)
}

fn error_at_node(
    code: CatalogErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> CatalogLoadError {
    let pos = doc.text_pos_at(node.range().start);
    CatalogLoadError {
        code,
        message,
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}

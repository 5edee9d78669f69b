use crate::ast::Location;
use serde::{Deserialize, Serialize};

/// Category of a fatal modelling error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The section tree does not have the shape the modeller expects.
    Internal,
    /// A scalar value is out of range or outside its vocabulary.
    BadValue,
    /// A bundled or required path is missing, of the wrong kind, or malformed.
    BadPath,
    DuplicateExecutable,
    NoSourceCode,
    DuplicateConfigTree,
    DuplicateExtern,
    DuplicateExternalName,
    /// An exe, component or interface reference did not resolve.
    Unresolved,
    InterfaceNotFound,
    DuplicateBinding,
    DuplicateWildcardBinding,
}

/// A fatal modelling error. The build stops at the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{location}: error: {message}{}", previous_note(.previous))]
pub struct ModelError {
    pub kind: ErrorKind,
    pub location: Location,
    pub message: String,
    /// Where the conflicting earlier declaration was made, for duplicate errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Location>,
}

fn previous_note(previous: &Option<Location>) -> String {
    match previous {
        Some(loc) => format!("\n{}: note: Previously done here.", loc),
        None => String::new(),
    }
}

impl ModelError {
    pub fn new(kind: ErrorKind, location: &Location, message: impl Into<String>) -> Self {
        ModelError {
            kind,
            location: location.clone(),
            message: message.into(),
            previous: None,
        }
    }

    pub fn internal(location: &Location, message: impl Into<String>) -> Self {
        ModelError::new(ErrorKind::Internal, location, message)
    }

    pub fn with_previous(mut self, previous: &Location) -> Self {
        self.previous = Some(previous.clone());
        self
    }

    /// Serialize to JSON with every field present (null for missing).
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":     self.kind,
            "file":     self.location.file,
            "line":     self.location.line,
            "column":   self.location.column,
            "message":  self.message,
            "previous": self.previous,
        })
    }
}

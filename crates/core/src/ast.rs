//! Section tree types for an application definition.
//!
//! These types are produced by the upstream definition parser and consumed
//! by every modelling pass. The builder never re-parses text; it only
//! interprets the already-tokenized values held here.

use crate::error::{ErrorKind, ModelError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ──────────────────────────────────────────────
// Location
// ──────────────────────────────────────────────

/// Source location of a node in the definition file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Location {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ──────────────────────────────────────────────
// Tokens
// ──────────────────────────────────────────────

/// Lexical category assigned to a token by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Name,
    Integer,
    Boolean,
    FilePath,
    FilePermissions,
    /// `appName` or `<userName>` on the server side of a binding.
    IpcAgent,
    /// Wildcard marker on the client side of a binding.
    Star,
    /// Stands for "this app" in a config tree grant.
    Dot,
    OpenParenthesis,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub loc: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, loc: Location) -> Self {
        Token {
            kind,
            text: text.into(),
            loc,
        }
    }
}

// ──────────────────────────────────────────────
// Items and sections
// ──────────────────────────────────────────────

/// A token-list item inside an item-list section, e.g. one binding, one
/// executable definition or one bundled file spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub loc: Location,
    /// Leading name token, for items of the form `name = ...` or `name(...)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Token>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl Item {
    /// Fetch the content token at `index`, or fail with an internal error
    /// naming what was expected there.
    pub fn token(&self, index: usize, what: &str) -> Result<&Token, ModelError> {
        self.tokens.get(index).ok_or_else(|| {
            ModelError::new(
                ErrorKind::Internal,
                &self.loc,
                format!("Internal error: missing {} (token {}) in item.", what, index),
            )
        })
    }

    /// The item's name token, or an internal error if the parser left it out.
    pub fn name_token(&self) -> Result<&Token, ModelError> {
        self.name.as_ref().ok_or_else(|| {
            ModelError::new(
                ErrorKind::Internal,
                &self.loc,
                "Internal error: item has no name token.",
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBody {
    Simple(Token),
    TokenList(Vec<Token>),
    ItemList(Vec<Item>),
    Complex(Vec<Section>),
}

impl SectionBody {
    fn shape(&self) -> &'static str {
        match self {
            SectionBody::Simple(_) => "simple section",
            SectionBody::TokenList(_) => "token list section",
            SectionBody::ItemList(_) => "item list section",
            SectionBody::Complex(_) => "complex section",
        }
    }
}

/// A named section or subsection of the definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub loc: Location,
    pub body: SectionBody,
}

impl Section {
    fn shape_error(&self, expected: &str) -> ModelError {
        ModelError::new(
            ErrorKind::Internal,
            &self.loc,
            format!(
                "Internal error: section '{}' is a {}, expected a {}.",
                self.name,
                self.body.shape(),
                expected
            ),
        )
    }

    pub fn as_simple(&self) -> Result<&Token, ModelError> {
        match &self.body {
            SectionBody::Simple(token) => Ok(token),
            _ => Err(self.shape_error("simple section")),
        }
    }

    pub fn as_token_list(&self) -> Result<&[Token], ModelError> {
        match &self.body {
            SectionBody::TokenList(tokens) => Ok(tokens),
            _ => Err(self.shape_error("token list section")),
        }
    }

    pub fn as_item_list(&self) -> Result<&[Item], ModelError> {
        match &self.body {
            SectionBody::ItemList(items) => Ok(items),
            _ => Err(self.shape_error("item list section")),
        }
    }

    pub fn as_complex(&self) -> Result<&[Section], ModelError> {
        match &self.body {
            SectionBody::Complex(sections) => Ok(sections),
            _ => Err(self.shape_error("complex section")),
        }
    }
}

/// A parsed application definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdefFile {
    pub path: PathBuf,
    #[serde(default)]
    pub sections: Vec<Section>,
}

// ──────────────────────────────────────────────
// Section vocabulary
// ──────────────────────────────────────────────

/// The closed set of top-level sections an application definition may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSectionKind {
    Bindings,
    Bundles,
    Components,
    CpuShare,
    Executables,
    Extern,
    Groups,
    MaxFileSystemBytes,
    MaxMemoryBytes,
    MaxMQueueBytes,
    MaxQueuedSignals,
    MaxThreads,
    MaxSecureStorageBytes,
    Processes,
    Provides,
    Requires,
    Sandboxed,
    Start,
    Version,
    WatchdogAction,
    WatchdogTimeout,
}

impl AppSectionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bindings" => AppSectionKind::Bindings,
            "bundles" => AppSectionKind::Bundles,
            "components" => AppSectionKind::Components,
            "cpuShare" => AppSectionKind::CpuShare,
            "executables" => AppSectionKind::Executables,
            "extern" => AppSectionKind::Extern,
            "groups" => AppSectionKind::Groups,
            "maxFileSystemBytes" => AppSectionKind::MaxFileSystemBytes,
            "maxMemoryBytes" => AppSectionKind::MaxMemoryBytes,
            "maxMQueueBytes" => AppSectionKind::MaxMQueueBytes,
            "maxQueuedSignals" => AppSectionKind::MaxQueuedSignals,
            "maxThreads" => AppSectionKind::MaxThreads,
            "maxSecureStorageBytes" => AppSectionKind::MaxSecureStorageBytes,
            "processes" => AppSectionKind::Processes,
            "provides" => AppSectionKind::Provides,
            "requires" => AppSectionKind::Requires,
            "sandboxed" => AppSectionKind::Sandboxed,
            "start" => AppSectionKind::Start,
            "version" => AppSectionKind::Version,
            "watchdogAction" => AppSectionKind::WatchdogAction,
            "watchdogTimeout" => AppSectionKind::WatchdogTimeout,
            _ => return None,
        };
        Some(kind)
    }

    /// Classify a section, failing with an internal error when the parser
    /// produced a name outside the vocabulary.
    pub fn classify(section: &Section) -> Result<Self, ModelError> {
        Self::from_name(&section.name).ok_or_else(|| {
            ModelError::new(
                ErrorKind::Internal,
                &section.loc,
                format!("Internal error: Unrecognized section '{}'.", section.name),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new("test.adef", 3, 1)
    }

    #[test]
    fn classify_known_and_unknown_sections() {
        let section = Section {
            name: "maxMQueueBytes".to_string(),
            loc: loc(),
            body: SectionBody::Simple(Token::new(TokenKind::Integer, "512", loc())),
        };
        assert_eq!(
            AppSectionKind::classify(&section).unwrap(),
            AppSectionKind::MaxMQueueBytes
        );

        let bogus = Section {
            name: "frobnicate".to_string(),
            ..section
        };
        let err = AppSectionKind::classify(&bogus).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.contains("frobnicate"));
    }

    #[test]
    fn shape_mismatch_is_internal_error() {
        let section = Section {
            name: "groups".to_string(),
            loc: loc(),
            body: SectionBody::Simple(Token::new(TokenKind::Name, "audio", loc())),
        };
        let err = section.as_token_list().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.contains("expected a token list section"));
    }

    #[test]
    fn section_tree_deserializes_from_json() {
        let json = r#"{
            "path": "/apps/foo.adef",
            "sections": [
                {
                    "name": "start",
                    "loc": { "file": "foo.adef", "line": 1 },
                    "body": { "simple": { "kind": "name", "text": "manual",
                              "loc": { "file": "foo.adef", "line": 1, "column": 8 } } }
                }
            ]
        }"#;
        let adef: AdefFile = serde_json::from_str(json).unwrap();
        assert_eq!(adef.sections.len(), 1);
        assert_eq!(adef.sections[0].as_simple().unwrap().text, "manual");
        assert_eq!(adef.sections[0].loc.column, 0);
    }
}

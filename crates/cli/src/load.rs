//! Input loading: the JSON section tree and the component catalog.

use adef_core::provider::CatalogError;
use adef_core::{AdefFile, ComponentCatalog, ComponentDef, ModelError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("error reading file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error parsing JSON in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid component catalog '{}': {source}", path.display())]
    Catalog {
        path: PathBuf,
        source: CatalogError,
    },

    #[error("invalid --var '{0}', expected NAME=VALUE")]
    BadVar(String),

    #[error("error writing output: {0}")]
    Output(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CliError {
    pub(crate) fn to_json_value(&self) -> serde_json::Value {
        match self {
            CliError::Model(e) => e.to_json_value(),
            other => serde_json::json!({ "error": other.to_string() }),
        }
    }
}

/// On-disk catalog layout: `{ "components": [ ... ] }`, in dependency order.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    components: Vec<ComponentDef>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_owned(),
        source,
    })
}

pub(crate) fn load_tree(path: &Path) -> Result<AdefFile, CliError> {
    read_json(path)
}

pub(crate) fn load_catalog(path: &Path) -> Result<ComponentCatalog, CliError> {
    let file: CatalogFile = read_json(path)?;
    ComponentCatalog::from_defs(file.components).map_err(|source| CliError::Catalog {
        path: path.to_owned(),
        source,
    })
}

/// Parse one `--var NAME=VALUE` argument.
pub(crate) fn parse_var(arg: &str) -> Result<(String, String), CliError> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(CliError::BadVar(arg.to_string())),
    }
}

//! Build context threaded through every modelling pass.

use crate::ast::Token;
use crate::error::{ErrorKind, ModelError};
use crate::provider::{ComponentModeller, FileSystem, VarSubstitution};
use std::path::{Path, PathBuf};

/// Collaborators plus the current directory used for relative-path and
/// `CURDIR` resolution. Nested builds share one context and scope their
/// directory with [`BuildContext::in_dir`].
pub struct BuildContext<'a> {
    pub components: &'a dyn ComponentModeller,
    pub fs: &'a dyn FileSystem,
    pub vars: &'a dyn VarSubstitution,
    cur_dir: PathBuf,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        components: &'a dyn ComponentModeller,
        fs: &'a dyn FileSystem,
        vars: &'a dyn VarSubstitution,
    ) -> Self {
        BuildContext {
            components,
            fs,
            vars,
            cur_dir: PathBuf::from("."),
        }
    }

    pub fn cur_dir(&self) -> &Path {
        &self.cur_dir
    }

    /// Run `f` with `dir` as the current directory. The previous directory
    /// is restored when `f` returns, whether it succeeded or failed.
    pub fn in_dir<R>(&mut self, dir: &Path, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.cur_dir, dir.to_path_buf());
        let result = f(self);
        self.cur_dir = previous;
        result
    }

    /// Expand variables in a token's text.
    pub fn substitute(&self, token: &Token) -> Result<String, ModelError> {
        self.substitute_text(&token.text, token)
    }

    /// Expand variables in `text`, reporting failures at `token`.
    pub fn substitute_text(&self, text: &str, token: &Token) -> Result<String, ModelError> {
        self.vars
            .substitute(text, &self.cur_dir)
            .map_err(|msg| ModelError::new(ErrorKind::BadValue, &token.loc, msg))
    }
}

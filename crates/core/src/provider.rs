//! Collaborator abstractions used by the builder.
//!
//! The builder does not model component definitions, touch the filesystem
//! or expand variables itself; it goes through the traits here. Each trait
//! has a host-backed implementation and an in-memory one for tests and for
//! tools that already hold everything in memory.

use crate::ast::Token;
use crate::context::BuildContext;
use crate::error::{ErrorKind, ModelError};
use crate::extract::unquote;
use crate::model::{ApiInterface, Component, ComponentId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

// ──────────────────────────────────────────────
// Filesystem
// ──────────────────────────────────────────────

/// Read-only filesystem predicates used to validate bundled paths.
pub trait FileSystem {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn exists(&self, path: &Path) -> bool;
}

/// Filesystem provider backed by `std::fs`.
pub struct HostFileSystem;

impl FileSystem for HostFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// In-memory filesystem: a set of declared files and directories. Parent
/// directories of declared entries exist implicitly.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    files: HashSet<PathBuf>,
    dirs: HashSet<PathBuf>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }

    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.insert(path.into());
        self
    }
}

impl FileSystem for InMemoryFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
            || self
                .files
                .iter()
                .chain(self.dirs.iter())
                .any(|p| p != path && p.starts_with(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }
}

// ──────────────────────────────────────────────
// Variable substitution
// ──────────────────────────────────────────────

/// Expands `$NAME` and `${NAME}` references in definition text.
pub trait VarSubstitution {
    /// Expand every variable reference in `text`. `cur_dir` is the value of
    /// `CURDIR` for this expansion.
    fn substitute(&self, text: &str, cur_dir: &Path) -> Result<String, String>;
}

/// Substitution from explicit overrides, then `CURDIR`, then the process
/// environment. Undefined variables expand to nothing.
#[derive(Debug, Default)]
pub struct EnvVarSubstitution {
    overrides: HashMap<String, String>,
}

impl EnvVarSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    fn lookup(&self, name: &str, cur_dir: &Path) -> String {
        if let Some(value) = self.overrides.get(name) {
            return value.clone();
        }
        if name == "CURDIR" {
            return cur_dir.to_string_lossy().to_string();
        }
        std::env::var(name).unwrap_or_default()
    }
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl VarSubstitution for EnvVarSubstitution {
    fn substitute(&self, text: &str, cur_dir: &Path) -> Result<String, String> {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            let braced = matches!(chars.peek(), Some((_, '{')));
            if braced {
                chars.next();
            }
            let mut name = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if !is_var_char(c) {
                    break;
                }
                name.push(c);
                chars.next();
            }
            if braced {
                match chars.next() {
                    Some((_, '}')) => {}
                    _ => return Err(format!("Unterminated '${{{}' in '{}'.", name, text)),
                }
            }
            if name.is_empty() {
                return Err(format!("Missing variable name after '$' in '{}'.", text));
            }
            out.push_str(&self.lookup(&name, cur_dir));
        }

        Ok(out)
    }
}

// ──────────────────────────────────────────────
// Component modeller
// ──────────────────────────────────────────────

/// Produces fully-built components for component references found in the
/// definition file.
pub trait ComponentModeller {
    /// Resolve a component reference. `Ok(None)` means the reference
    /// expanded to an empty string and should be skipped.
    fn component(
        &self,
        reference: &Token,
        search_dirs: &[PathBuf],
        cx: &BuildContext<'_>,
    ) -> Result<Option<Rc<Component>>, ModelError>;
}

/// Definition of one catalog component, as read from a JSON catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    pub dir: PathBuf,
    #[serde(default)]
    pub has_native_code: bool,
    #[serde(default)]
    pub has_managed_code: bool,
    #[serde(default)]
    pub client_apis: Vec<ApiInterface>,
    #[serde(default)]
    pub server_apis: Vec<ApiInterface>,
    /// Names of previously registered components this one depends on.
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("component '{0}' is registered more than once")]
    Duplicate(String),

    #[error("component '{component}' requires unknown component '{requires}'")]
    UnknownSubComponent { component: String, requires: String },
}

/// In-memory component modeller holding pre-built components.
///
/// Registration order assigns component ids, so the same catalog always
/// yields the same ids and the same shared component objects.
#[derive(Debug, Default)]
pub struct ComponentCatalog {
    components: Vec<Rc<Component>>,
    by_name: HashMap<String, usize>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defs(defs: Vec<ComponentDef>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for def in defs {
            catalog.insert(def)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, def: ComponentDef) -> Result<Rc<Component>, CatalogError> {
        if self.by_name.contains_key(&def.name) {
            return Err(CatalogError::Duplicate(def.name));
        }
        let mut sub_components = Vec::with_capacity(def.requires.len());
        for required in &def.requires {
            let found = self.get(required).ok_or_else(|| CatalogError::UnknownSubComponent {
                component: def.name.clone(),
                requires: required.clone(),
            })?;
            sub_components.push(found);
        }
        let component = Rc::new(Component {
            id: ComponentId(self.components.len() as u32),
            name: def.name.clone(),
            dir: def.dir,
            has_native_code: def.has_native_code,
            has_managed_code: def.has_managed_code,
            client_apis: def.client_apis,
            server_apis: def.server_apis,
            sub_components,
        });
        self.by_name.insert(def.name, self.components.len());
        self.components.push(Rc::clone(&component));
        Ok(component)
    }

    pub fn get(&self, name: &str) -> Option<Rc<Component>> {
        self.by_name
            .get(name)
            .map(|&index| Rc::clone(&self.components[index]))
    }

    fn find_by_dir(&self, dir: &Path) -> Option<Rc<Component>> {
        self.components.iter().find(|c| c.dir == dir).cloned()
    }
}

impl ComponentModeller for ComponentCatalog {
    fn component(
        &self,
        reference: &Token,
        search_dirs: &[PathBuf],
        cx: &BuildContext<'_>,
    ) -> Result<Option<Rc<Component>>, ModelError> {
        let text = unquote(&cx.substitute(reference)?).to_owned();
        if text.is_empty() {
            return Ok(None);
        }

        let path = Path::new(&text);
        let cur_dir = cx.cur_dir().to_path_buf();
        let by_dir = if path.is_absolute() {
            self.find_by_dir(path)
        } else {
            search_dirs
                .iter()
                .chain(std::iter::once(&cur_dir))
                .find_map(|dir| self.find_by_dir(&dir.join(path)))
        };
        if let Some(component) = by_dir {
            return Ok(Some(component));
        }

        let last_node = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| text.clone());
        self.get(&last_node).map(Some).ok_or_else(|| {
            ModelError::new(
                ErrorKind::Unresolved,
                &reference.loc,
                format!("Can't find component: '{}'.", text),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Location, TokenKind};

    fn def(name: &str, requires: &[&str]) -> ComponentDef {
        ComponentDef {
            name: name.to_string(),
            dir: PathBuf::from(format!("/src/{}", name)),
            has_native_code: true,
            has_managed_code: false,
            client_apis: Vec::new(),
            server_apis: Vec::new(),
            requires: requires.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn token(text: &str) -> Token {
        Token::new(TokenKind::FilePath, text, Location::new("a.adef", 1, 1))
    }

    #[test]
    fn substitution_expands_plain_braced_and_curdir() {
        let vars = EnvVarSubstitution::new().with_var("LEGATO_ROOT", "/opt/legato");
        let out = vars
            .substitute("$LEGATO_ROOT/x:${CURDIR}/y", Path::new("/apps"))
            .unwrap();
        assert_eq!(out, "/opt/legato/x:/apps/y");
    }

    #[test]
    fn substitution_undefined_is_empty_and_unterminated_is_error() {
        let vars = EnvVarSubstitution::new();
        assert_eq!(
            vars.substitute("${ADEF_SURELY_UNDEFINED_VAR}", Path::new("/"))
                .unwrap(),
            ""
        );
        assert!(vars.substitute("${OPEN", Path::new("/")).is_err());
        assert!(vars.substitute("cost: $", Path::new("/")).is_err());
    }

    #[test]
    fn in_memory_fs_implies_parent_dirs() {
        let fs = InMemoryFileSystem::new().with_file("/a/b/c.txt");
        assert!(fs.is_file(Path::new("/a/b/c.txt")));
        assert!(fs.is_dir(Path::new("/a/b")));
        assert!(fs.is_dir(Path::new("/a")));
        assert!(!fs.is_dir(Path::new("/a/b/c.txt")));
        assert!(!fs.exists(Path::new("/a/x")));
    }

    #[test]
    fn catalog_rejects_unknown_sub_component() {
        let mut catalog = ComponentCatalog::new();
        let err = catalog.insert(def("top", &["missing"])).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSubComponent { .. }));
    }

    #[test]
    fn catalog_resolves_by_name_and_dir_and_skips_empty() {
        let catalog = ComponentCatalog::from_defs(vec![def("base", &[]), def("top", &["base"])])
            .unwrap();
        let fs = InMemoryFileSystem::new();
        let vars = EnvVarSubstitution::new().with_var("EMPTY", "");
        let cx = BuildContext::new(&catalog, &fs, &vars);

        let top = catalog
            .component(&token("components/top"), &[], &cx)
            .unwrap()
            .unwrap();
        assert_eq!(top.id, ComponentId(1));
        assert_eq!(top.sub_components[0].name, "base");

        let base = catalog
            .component(&token("base"), &[PathBuf::from("/src")], &cx)
            .unwrap()
            .unwrap();
        assert!(Rc::ptr_eq(&base, &top.sub_components[0]));

        assert!(catalog.component(&token("$EMPTY"), &[], &cx).unwrap().is_none());

        let err = catalog.component(&token("nope"), &[], &cx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unresolved);
    }
}

//! Shared fixtures for building section trees and running the builder.

#![allow(dead_code)]

use adef_core::model::ApiInterface;
use adef_core::*;
use std::cell::Cell;
use std::path::PathBuf;

pub const ADEF_PATH: &str = "/apps/foo.adef";

thread_local! {
    static NEXT_LINE: Cell<u32> = const { Cell::new(1) };
}

/// A fresh location on its own line, so duplicate errors can be told apart.
pub fn loc() -> Location {
    let line = NEXT_LINE.with(|n| {
        let line = n.get();
        n.set(line + 1);
        line
    });
    Location::new("foo.adef", line, 1)
}

// ── Tokens ───────────────────────────────────────────────────────────────────

pub fn tok(kind: TokenKind, text: &str) -> Token {
    Token::new(kind, text, loc())
}

pub fn name(text: &str) -> Token {
    tok(TokenKind::Name, text)
}

pub fn int(text: &str) -> Token {
    tok(TokenKind::Integer, text)
}

pub fn path(text: &str) -> Token {
    tok(TokenKind::FilePath, text)
}

pub fn perms(text: &str) -> Token {
    tok(TokenKind::FilePermissions, text)
}

// ── Items and sections ───────────────────────────────────────────────────────

pub fn item(tokens: Vec<Token>) -> Item {
    Item {
        loc: loc(),
        name: None,
        tokens,
    }
}

pub fn named_item(item_name: &str, tokens: Vec<Token>) -> Item {
    Item {
        loc: loc(),
        name: Some(name(item_name)),
        tokens,
    }
}

pub fn simple(section: &str, token: Token) -> Section {
    Section {
        name: section.to_string(),
        loc: loc(),
        body: SectionBody::Simple(token),
    }
}

pub fn token_list(section: &str, tokens: Vec<Token>) -> Section {
    Section {
        name: section.to_string(),
        loc: loc(),
        body: SectionBody::TokenList(tokens),
    }
}

pub fn items(section: &str, items: Vec<Item>) -> Section {
    Section {
        name: section.to_string(),
        loc: loc(),
        body: SectionBody::ItemList(items),
    }
}

pub fn complex(section: &str, subsections: Vec<Section>) -> Section {
    Section {
        name: section.to_string(),
        loc: loc(),
        body: SectionBody::Complex(subsections),
    }
}

/// One `executables:` item: `exe = ( comp1 comp2 ... )`.
pub fn exe(exe_name: &str, components: &[&str]) -> Item {
    named_item(exe_name, components.iter().map(|c| path(c)).collect())
}

pub fn executables(exes: Vec<Item>) -> Section {
    items("executables", exes)
}

/// Dotted spec like `exe.comp.if`, `name.exe.comp.if` or `agent.if`.
fn dotted(spec: &str) -> Vec<&str> {
    spec.trim().split('.').collect()
}

/// An extern candidate from `[external.]exe.comp.if`.
pub fn extern_item(spec: &str) -> Item {
    item(dotted(spec).into_iter().map(name).collect())
}

/// A binding item from `client -> server`, where client is `exe.comp.if`
/// or `*.if`, and server is `exe.comp.if`, `app.if` or `<user>.if`.
pub fn binding(spec: &str) -> Item {
    let (client, server) = spec.split_once("->").expect("binding spec has '->'");
    let mut tokens = Vec::new();

    let client = dotted(client);
    if client[0] == "*" {
        tokens.push(tok(TokenKind::Star, "*"));
        tokens.push(name(client[1]));
    } else {
        tokens.extend(client.into_iter().map(name));
    }

    let server = dotted(server);
    if server.len() == 2 {
        tokens.push(tok(TokenKind::IpcAgent, server[0]));
        tokens.push(name(server[1]));
    } else {
        tokens.extend(server.into_iter().map(name));
    }
    item(tokens)
}

pub fn bindings(specs: &[&str]) -> Section {
    items("bindings", specs.iter().map(|s| binding(s)).collect())
}

pub fn externs(specs: &[&str]) -> Section {
    items("extern", specs.iter().map(|s| extern_item(s)).collect())
}

pub fn adef(sections: Vec<Section>) -> AdefFile {
    AdefFile {
        path: PathBuf::from(ADEF_PATH),
        sections,
    }
}

// ── Collaborators ────────────────────────────────────────────────────────────

fn api(name: &str) -> ApiInterface {
    ApiInterface {
        internal_name: name.to_string(),
        api_file: PathBuf::from(format!("/interfaces/{}.api", name)),
    }
}

fn component(
    name: &str,
    native: bool,
    managed: bool,
    clients: &[&str],
    servers: &[&str],
    requires: &[&str],
) -> ComponentDef {
    ComponentDef {
        name: name.to_string(),
        dir: PathBuf::from(format!("/apps/components/{}", name)),
        has_native_code: native,
        has_managed_code: managed,
        client_apis: clients.iter().map(|c| api(c)).collect(),
        server_apis: servers.iter().map(|s| api(s)).collect(),
        requires: requires.iter().map(|s| s.to_string()).collect(),
    }
}

/// Catalog used by every integration test:
///
/// - `compA`: C code, clients `ifX` `ifZ`, server `srvA`
/// - `compB`: C code, server `ifY`
/// - `compC`: no code, client `ifX`
/// - `javaComp`: Java code, server `jsvc`
/// - `libComp`: C code, client `logIf`; `withLib` (no code) requires it
pub fn catalog() -> ComponentCatalog {
    ComponentCatalog::from_defs(vec![
        component("compA", true, false, &["ifX", "ifZ"], &["srvA"], &[]),
        component("compB", true, false, &[], &["ifY"], &[]),
        component("compC", false, false, &["ifX"], &[], &[]),
        component("javaComp", false, true, &[], &["jsvc"], &[]),
        component("libComp", true, false, &["logIf"], &[], &[]),
        component("withLib", false, false, &[], &[], &["libComp"]),
    ])
    .expect("fixture catalog is valid")
}

pub fn default_fs() -> InMemoryFileSystem {
    InMemoryFileSystem::new()
        .with_file("/apps/data/config.json")
        .with_dir("/apps/data/assets")
}

/// Build with the fixture catalog and filesystem.
pub fn build(sections: Vec<Section>) -> Result<ModelledApp, ModelError> {
    build_with(sections, &default_fs(), &EnvVarSubstitution::new())
}

pub fn build_with(
    sections: Vec<Section>,
    fs: &InMemoryFileSystem,
    vars: &EnvVarSubstitution,
) -> Result<ModelledApp, ModelError> {
    let catalog = catalog();
    let mut cx = BuildContext::new(&catalog, fs, vars);
    build_app(&adef(sections), &mut cx)
}

/// The usual two-executable app: `exeA = (compA compB)`, `exeB = (compB)`.
pub fn two_exes() -> Section {
    executables(vec![
        exe("exeA", &["compA", "compB"]),
        exe("exeB", &["compB"]),
    ])
}

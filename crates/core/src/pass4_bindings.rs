//! Pass 4: binding resolution.
//!
//! Binding specs are token lists whose shape is decided by token kind and
//! position:
//!
//! ```text
//! 0     1     2          3     4     5
//! STAR  NAME  IPC_AGENT  NAME              wildcard -> external app/user
//! STAR  NAME  NAME       NAME  NAME        wildcard -> internal exe
//! NAME  NAME  NAME       IPC_AGENT  NAME   specific -> external app/user
//! NAME  NAME  NAME       NAME  NAME  NAME  specific -> internal exe
//! ```
//!
//! Runs after extern resolution so that internal server names are final.

use crate::ast::{Item, Section, TokenKind};
use crate::error::{ErrorKind, ModelError};
use crate::model::{App, Binding, EndpointType};
use tracing::debug;

pub fn add_bindings(app: &mut App, sections: Vec<&Section>) -> Result<(), ModelError> {
    for section in sections {
        for item in section.as_item_list()? {
            add_binding(app, item)?;
        }
    }
    Ok(())
}

fn add_binding(app: &mut App, item: &Item) -> Result<(), ModelError> {
    let first = item.token(0, "client side of binding")?;

    if first.kind == TokenKind::Star {
        let client_if = item.token(1, "wildcard interface name")?;
        let binding = resolve_binding(app, item, client_if.text.clone(), 2)?;

        if let Some(existing) = app.wildcard_bindings.get(&client_if.text) {
            return Err(ModelError::new(
                ErrorKind::DuplicateWildcardBinding,
                &client_if.loc,
                "Duplicate wildcard binding.",
            )
            .with_previous(&existing.loc));
        }
        debug!(app = %app.name, interface = %client_if.text, "wildcard binding");
        app.wildcard_bindings.insert(client_if.text.clone(), binding);
    } else {
        let client_ref = app.find_client_interface(
            first,
            item.token(1, "client component name")?,
            item.token(2, "client interface name")?,
        )?;
        let client_if_name = app.interface(&client_ref).name.clone();
        let binding = resolve_binding(app, item, client_if_name, 3)?;

        let client = app.interface_mut(&client_ref);
        if let Some(existing) = &client.binding {
            return Err(ModelError::new(
                ErrorKind::DuplicateBinding,
                &first.loc,
                "Client interface bound more than once.",
            )
            .with_previous(&existing.loc));
        }
        client.binding = Some(binding);
    }
    Ok(())
}

/// Build a binding for `client_if_name`, reading the server side from
/// token `start` onward.
fn resolve_binding(
    app: &App,
    item: &Item,
    client_if_name: String,
    start: usize,
) -> Result<Binding, ModelError> {
    let agent_or_exe = item.token(start, "server side of binding")?;

    let (server_type, server_agent_name, server_if_name) =
        if agent_or_exe.kind == TokenKind::IpcAgent {
            let server_if = item.token(start + 1, "server interface name")?;
            let agent = &agent_or_exe.text;
            match agent.strip_prefix('<') {
                Some(user) => (
                    EndpointType::ExternalUser,
                    user.strip_suffix('>').unwrap_or(user).to_owned(),
                    server_if.text.clone(),
                ),
                None => (
                    EndpointType::ExternalApp,
                    agent.clone(),
                    server_if.text.clone(),
                ),
            }
        } else {
            let server_ref = app.find_server_interface(
                agent_or_exe,
                item.token(start + 1, "server component name")?,
                item.token(start + 2, "server interface name")?,
            )?;
            (
                EndpointType::Internal,
                app.name.clone(),
                app.interface(&server_ref).name.clone(),
            )
        };

    Ok(Binding {
        client_type: EndpointType::Internal,
        client_agent_name: app.name.clone(),
        client_if_name,
        server_type,
        server_agent_name,
        server_if_name,
        loc: item.loc.clone(),
    })
}

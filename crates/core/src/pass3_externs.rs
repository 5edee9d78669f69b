//! Pass 3: extern resolution -- give interface instances their externally
//! visible names and record them in the app's extern maps.
//!
//! Runs after pass 1 so that every executable and component instance named
//! by an extern candidate already exists.

use crate::ast::{Item, Token};
use crate::error::{ErrorKind, ModelError};
use crate::model::{App, InterfaceInstance, InterfaceRef, InterfaceSide};
use tracing::debug;

pub fn make_interfaces_external(app: &mut App, candidates: Vec<&Item>) -> Result<(), ModelError> {
    for item in candidates {
        // [externalName, exe, component, interface] or [exe, component, interface];
        // the short form exports under the interface's own name.
        let (name_token, exe, component, interface) = match item.tokens.as_slice() {
            [name, exe, component, interface] => (name, exe, component, interface),
            [exe, component, interface] => (interface, exe, component, interface),
            tokens => {
                return Err(ModelError::internal(
                    &item.loc,
                    format!(
                        "Internal error: extern interface spec has {} tokens, expected 3 or 4.",
                        tokens.len()
                    ),
                ))
            }
        };
        make_interface_external(app, name_token, exe, component, interface)?;
    }
    Ok(())
}

fn make_interface_external(
    app: &mut App,
    name_token: &Token,
    exe_token: &Token,
    component_token: &Token,
    interface_token: &Token,
) -> Result<(), ModelError> {
    let name = &name_token.text;

    if app.is_extern_name_used(name) {
        let mut err = ModelError::new(
            ErrorKind::DuplicateExternalName,
            &name_token.loc,
            format!("Duplicate external interface name: '{}'.", name),
        );
        let holder = app
            .extern_client_interfaces
            .get(name)
            .or_else(|| app.extern_server_interfaces.get(name));
        if let Some(mark) = holder.and_then(|r| app.interface(r).extern_mark.as_ref()) {
            err = err.with_previous(mark);
        }
        return Err(err);
    }

    let target = {
        let (exe, instance) = app.find_component_instance(exe_token, component_token)?;
        let component_instance = &exe.component_instances[instance];
        let found = component_instance
            .find_client_interface(&interface_token.text)
            .map(|index| (InterfaceSide::Client, index))
            .or_else(|| {
                component_instance
                    .find_server_interface(&interface_token.text)
                    .map(|index| (InterfaceSide::Server, index))
            });
        let (side, index) = found.ok_or_else(|| {
            ModelError::new(
                ErrorKind::InterfaceNotFound,
                &name_token.loc,
                format!(
                    "Interface '{}' not found in component '{}' in executable '{}'.",
                    interface_token.text, component_token.text, exe_token.text
                ),
            )
        })?;
        InterfaceRef {
            exe: exe.name.clone(),
            instance,
            side,
            index,
        }
    };

    mark_interface_external(app.interface_mut(&target), name_token)?;
    debug!(
        app = %app.name,
        external_name = %name,
        exe = %exe_token.text,
        component = %component_token.text,
        interface = %interface_token.text,
        "interface marked extern"
    );

    match target.side {
        InterfaceSide::Client => app.extern_client_interfaces.insert(name.clone(), target),
        InterfaceSide::Server => app.extern_server_interfaces.insert(name.clone(), target),
    };
    Ok(())
}

/// Mark an interface external under `name_token`'s text. An interface can
/// be marked only once.
fn mark_interface_external(
    instance: &mut InterfaceInstance,
    name_token: &Token,
) -> Result<(), ModelError> {
    if let Some(previous) = &instance.extern_mark {
        return Err(ModelError::new(
            ErrorKind::DuplicateExtern,
            &name_token.loc,
            "Same interface marked 'extern' more than once.",
        )
        .with_previous(previous));
    }
    instance.extern_mark = Some(name_token.loc.clone());
    instance.name = name_token.text.clone();
    Ok(())
}

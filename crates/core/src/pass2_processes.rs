//! Pass 2: model the deferred `processes:` sections, one process
//! environment per section, in file order.

use crate::ast::Section;
use crate::context::BuildContext;
use crate::error::ModelError;
use crate::instantiate;
use crate::model::App;

pub fn add_process_envs(
    app: &mut App,
    sections: Vec<&Section>,
    cx: &BuildContext<'_>,
) -> Result<(), ModelError> {
    for section in sections {
        let env = instantiate::new_process_env(section, cx)?;
        app.process_envs.push(env);
    }
    Ok(())
}

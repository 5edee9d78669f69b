use crate::ast::Location;
use serde::{Deserialize, Serialize};

/// What kind of agent sits at one end of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    /// An interface inside the same app.
    Internal,
    /// An interface served by another app.
    ExternalApp,
    /// An interface served by a non-app user.
    ExternalUser,
}

/// A resolved client -> server IPC link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub client_type: EndpointType,
    pub client_agent_name: String,
    pub client_if_name: String,
    pub server_type: EndpointType,
    pub server_agent_name: String,
    pub server_if_name: String,
    /// Location of the binding specification.
    pub loc: Location,
}

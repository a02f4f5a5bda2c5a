//! meshgen core types: mesh specification, component roles, naming, errors.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod naming;
pub mod spec;

pub use spec::{
    LoggingConfig, MeshSpec, MixerConfig, OwnerRef, ProxyConfig, RoleConfig, SdsConfig, TracingConfig, ZipkinConfig,
};

/// Mixer variant being synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentRole {
    Telemetry,
    Policy,
}

impl ComponentRole {
    pub const ALL: [ComponentRole; 2] = [ComponentRole::Telemetry, ComponentRole::Policy];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentRole::Telemetry => "telemetry",
            ComponentRole::Policy => "policy",
        }
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "telemetry" => Ok(ComponentRole::Telemetry),
            "policy" => Ok(ComponentRole::Policy),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

/// Synthesis failures. Builders themselves never fail; everything here comes
/// out of configuration resolution or role dispatch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A required field is absent and has no default.
    #[error("missing required field {field}")]
    MissingField { field: String },

    /// A field is set but unusable, alone or in combination with another.
    #[error("invalid configuration at {field}: {message}")]
    InvalidConfig { field: String, message: String },

    #[error("unknown component role {0:?} (expected one of: telemetry, policy)")]
    InvalidRole(String),
}

impl Error {
    pub fn missing(field: impl Into<String>) -> Self {
        Error::MissingField { field: field.into() }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidConfig { field: field.into(), message: message.into() }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub mod prelude {
    pub use super::{ComponentRole, Error, MeshSpec, Result};
}

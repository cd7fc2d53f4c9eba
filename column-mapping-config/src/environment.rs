use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Variable naming the environment whose overrides are layered over the base rules.
pub const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Deployment whose configuration file overrides the base mapping rules.
///
/// The name doubles as the stem of the override file, so `prod` loads `configuration/prod.yaml`
/// on top of `configuration/base.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

/// An environment name outside [`Environment::ALL`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a supported environment, expected `dev` or `prod`")]
pub struct UnknownEnvironment(pub String);

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Dev, Environment::Prod];

    /// Reads the environment from [`ENVIRONMENT_VAR`].
    pub fn load() -> Result<Environment, UnknownEnvironment> {
        Self::select(std::env::var(ENVIRONMENT_VAR).ok().as_deref())
    }

    /// Picks the environment for an optional name; unset or blank means [`Environment::Dev`].
    pub fn select(name: Option<&str>) -> Result<Environment, UnknownEnvironment> {
        match name.map(str::trim) {
            None | Some("") => Ok(Environment::default()),
            Some(name) => name.parse(),
        }
    }

    /// Returns the name used as the override file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .into_iter()
            .find(|environment| environment.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownEnvironment(name.to_string()))
    }
}

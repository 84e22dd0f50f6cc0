//! Environment loading helpers
//!
//! Values are read through a lookup function so callers (and tests) can
//! substitute the process environment with a fixed map.

use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// A required variable is unset or empty
    #[error("{0} not set")]
    Missing(String),

    /// A variable is set but could not be parsed
    #[error("{var} is invalid: {reason}")]
    Invalid { var: String, reason: String },
}

/// Load a `.env` file from the working directory, if there is one.
///
/// Returns the path that was loaded.
pub fn load_dotenv() -> Option<std::path::PathBuf> {
    dotenv::dotenv().ok()
}

/// Read-only view over a variable lookup
pub struct Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    lookup: F,
}

impl Env<fn(&str) -> Option<String>> {
    /// View over the process environment
    pub fn process() -> Self {
        Self {
            lookup: |name| std::env::var(name).ok(),
        }
    }
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// View over an arbitrary lookup function
    pub fn with_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    /// Variable value with surrounding whitespace trimmed; empty counts as unset
    pub fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Variable value, or `EnvError::Missing`
    pub fn required(&self, name: &str) -> Result<String, EnvError> {
        self.optional(name)
            .ok_or_else(|| EnvError::Missing(name.to_string()))
    }

    /// Parse an optional variable
    pub fn parsed<T>(&self, name: &str) -> Result<Option<T>, EnvError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| EnvError::Invalid {
                    var: name.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

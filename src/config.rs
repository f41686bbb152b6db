//! Runtime configuration.

use std::env;
use std::path::PathBuf;

/// Environment variable naming the account data directory.
pub const DATA_DIR_VAR: &str = "SNOWLEDGER_DATA_DIR";

/// Environment variable enabling strict currency registration.
pub const STRICT_CURRENCIES_VAR: &str = "SNOWLEDGER_STRICT_CURRENCIES";

const DEFAULT_DATA_DIR: &str = "accounts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one JSON document per account.
    pub data_dir: PathBuf,
    /// Reject re-registration of a currency identifier instead of overwriting.
    pub strict_currencies: bool,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from a variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let strict_currencies = lookup(STRICT_CURRENCIES_VAR)
            .map(|value| matches!(value.trim(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        Self {
            data_dir,
            strict_currencies,
        }
    }

    /// Override the data directory, e.g. from a command-line argument.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

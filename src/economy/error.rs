//! Error types for the economy registry.

use thiserror::Error;

use crate::storage::StorageError;

/// Registry-level faults. Ledger business failures are never reported here;
/// they are outcomes on the transaction result.
#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("already have a default currency '{existing}', cannot register '{attempted}'")]
    DuplicateDefaultCurrency { existing: String, attempted: String },

    #[error("no default currency set")]
    NoDefaultCurrency,

    #[error("currency '{0}' is already registered")]
    DuplicateCurrency(String),

    #[error("account '{0}' exists but is not a {1} account")]
    AccountKindMismatch(String, &'static str),

    #[error("no account store configured")]
    NoStore,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

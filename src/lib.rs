pub mod account;
pub mod admin;
pub mod amount;
pub mod command;
pub mod config;
pub mod context;
pub mod currency;
pub mod economy;
pub mod hook;
pub mod identity;
pub mod model;
pub mod storage;

pub use account::{Account, AccountKind};
pub use amount::Amount;
pub use config::Config;
pub use context::{Context, ContextCalculator, ContextSet};
pub use currency::Currency;
pub use economy::{Economy, EconomyError};
pub use hook::{BalanceChange, CancellationHook, TransactionEvent};
pub use model::{Cause, ResultType, TransactionResult, TransactionType, TransferResult};

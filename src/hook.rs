//! Pre-commit cancellation hooks.

use crate::Amount;
use crate::model::{Cause, TransactionResult};

/// Balance of one side of a pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    /// Balance before the transaction (the default balance if there is no entry).
    pub before: Amount,
    /// Proposed balance, `None` when it is not representable.
    pub after: Option<Amount>,
}

/// A pending transaction offered to cancellation hooks before it is committed.
///
/// `result` carries the validator's provisional outcome, which may already be a
/// failure: hooks see every attempted mutation.
#[derive(Debug, Clone, Copy)]
pub struct TransactionEvent<'a> {
    pub cause: &'a Cause,
    pub result: &'a TransactionResult,
    /// Balance of the account named by `result`.
    pub balance: BalanceChange,
    /// Receiving account when the transaction is a transfer.
    pub account_to: Option<&'a str>,
    /// Balance of the receiving account when the transaction is a transfer.
    pub balance_to: Option<BalanceChange>,
}

/// Observer that may veto a pending transaction.
///
/// Hooks run synchronously while the ledger tables of the accounts involved
/// are locked. A hook must not touch those accounts or their economy at all,
/// reads included: doing so deadlocks. Everything needed to decide is in the
/// [`TransactionEvent`].
pub trait CancellationHook: Send + Sync {
    /// Return `true` to cancel the transaction.
    fn cancel(&self, event: &TransactionEvent<'_>) -> bool;
}

impl<F> CancellationHook for F
where
    F: Fn(&TransactionEvent<'_>) -> bool + Send + Sync,
{
    fn cancel(&self, event: &TransactionEvent<'_>) -> bool {
        self(event)
    }
}

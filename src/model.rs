//! Core domain types for the ledger: causes, outcomes and result records.

use std::fmt;

use crate::Amount;
use crate::context::ContextSet;
use crate::currency::Currency;

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    /// The balance grew or stayed the same.
    Deposit,
    /// The balance shrank.
    Withdraw,
}

impl TransactionType {
    /// Classify a signed change: withdraw iff the balance shrinks.
    pub fn of_delta(delta: Amount) -> Self {
        if delta < Amount::ZERO {
            TransactionType::Withdraw
        } else {
            TransactionType::Deposit
        }
    }
}

/// Outcome of a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    /// The mutation was applied.
    Success,
    /// Vetoed by a cancellation hook, or the transfer target is not valid.
    Failed,
    /// The new balance would be negative on a currency without negatives.
    NoFunds,
    /// The new balance would exceed the currency's maximum.
    OverLimit,
    /// Reserved for context validation failures raised by collaborators.
    ContextMismatch,
}

impl ResultType {
    pub fn is_success(self) -> bool {
        self == ResultType::Success
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultType::Success => "success",
            ResultType::Failed => "failed",
            ResultType::NoFunds => "no funds",
            ResultType::OverLimit => "over limit",
            ResultType::ContextMismatch => "context mismatch",
        };
        f.write_str(name)
    }
}

/// Opaque token describing who or what caused a transaction.
///
/// The ledger never inspects it; it is handed to cancellation hooks as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause(Vec<String>);

impl Cause {
    pub fn of(source: impl Into<String>) -> Self {
        Cause(vec![source.into()])
    }

    /// Append a further source, e.g. the plugin acting on behalf of a player.
    pub fn with(mut self, source: impl Into<String>) -> Self {
        self.0.push(source.into());
        self
    }

    /// The first (root) source.
    pub fn root(&self) -> &str {
        &self.0[0]
    }

    pub fn sources(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" <- "))
    }
}

/// Immutable record of one attempted balance change.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    account: String,
    currency: Currency,
    amount: Amount,
    contexts: ContextSet,
    transaction_type: TransactionType,
    result: ResultType,
}

impl TransactionResult {
    pub(crate) fn new(
        account: impl Into<String>,
        currency: Currency,
        amount: Amount,
        contexts: ContextSet,
        transaction_type: TransactionType,
        result: ResultType,
    ) -> Self {
        Self {
            account: account.into(),
            currency,
            amount,
            contexts,
            transaction_type,
            result,
        }
    }

    /// Same record with another outcome.
    pub(crate) fn with_result(&self, result: ResultType) -> Self {
        Self {
            result,
            ..self.clone()
        }
    }

    /// Identifier of the account the change applies to.
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Signed delta between the old and the new balance.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn contexts(&self) -> &ContextSet {
        &self.contexts
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn result(&self) -> ResultType {
        self.result
    }
}

/// Immutable record of an attempted transfer between two accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    transaction: TransactionResult,
    account_to: String,
}

impl TransferResult {
    pub(crate) fn new(transaction: TransactionResult, account_to: impl Into<String>) -> Self {
        Self {
            transaction,
            account_to: account_to.into(),
        }
    }

    /// The source side of the transfer.
    pub fn transaction(&self) -> &TransactionResult {
        &self.transaction
    }

    /// Identifier of the counterparty receiving the funds.
    pub fn account_to(&self) -> &str {
        &self.account_to
    }

    pub fn result(&self) -> ResultType {
        self.transaction.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn transaction_type_from_direction() {
        assert_eq!(TransactionType::of_delta(dec!(-4)), TransactionType::Withdraw);
        assert_eq!(TransactionType::of_delta(dec!(4)), TransactionType::Deposit);
        // no change counts as a deposit
        assert_eq!(TransactionType::of_delta(dec!(0)), TransactionType::Deposit);
    }

    #[test]
    fn with_result_keeps_everything_else() {
        let original = TransactionResult::new(
            "acc",
            Currency::snowballs(),
            dec!(-2),
            ContextSet::empty(),
            TransactionType::Withdraw,
            ResultType::Success,
        );
        let failed = original.with_result(ResultType::Failed);
        assert_eq!(failed.result(), ResultType::Failed);
        assert_eq!(failed.amount(), dec!(-2));
        assert_eq!(failed.account(), "acc");
        assert_eq!(failed.transaction_type(), TransactionType::Withdraw);
    }

    #[test]
    fn cause_chain_display() {
        let cause = Cause::of("steve").with("snowledger");
        assert_eq!(cause.root(), "steve");
        assert_eq!(cause.to_string(), "steve <- snowledger");
    }
}

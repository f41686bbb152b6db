//! Accounts and their transactional operations.
//!
//! Every mutation follows the same sequence while the account's ledger table is
//! locked: classify the proposed balance, offer the provisional result to the
//! cancellation hooks, and write the entry only if nothing vetoed and the
//! classification was a success. Business-rule violations never error; they
//! are reported through [`ResultType`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::Amount;
use crate::context::ContextSet;
use crate::currency::Currency;
use crate::economy::Observers;
use crate::hook::{BalanceChange, TransactionEvent};
use crate::model::{Cause, ResultType, TransactionResult, TransactionType, TransferResult};

mod table;
pub use table::LedgerTable;

pub mod validate;

/// What an account is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    /// Bound to a real identity.
    Unique(Uuid),
    /// Bound only to an opaque identifier.
    Virtual,
}

/// A named holder of balances, created and owned by an
/// [`Economy`](crate::Economy).
pub struct Account {
    id: String,
    display_name: String,
    kind: AccountKind,
    table: Mutex<LedgerTable>,
    observers: Arc<Observers>,
}

/// Public API
impl Account {
    pub fn identifier(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    /// The identity of a unique account.
    pub fn unique_id(&self) -> Option<Uuid> {
        match self.kind {
            AccountKind::Unique(uuid) => Some(uuid),
            AccountKind::Virtual => None,
        }
    }

    pub fn default_balance(&self, currency: &Currency) -> Amount {
        currency.default_balance()
    }

    /// Stored balance, or the currency's default balance if there is none.
    pub fn balance(&self, currency: &Currency, contexts: &ContextSet) -> Amount {
        self.lock_table().get_or_default(currency, contexts)
    }

    /// Whether an explicit entry exists, whatever its value.
    pub fn has_balance(&self, currency: &Currency, contexts: &ContextSet) -> bool {
        self.lock_table().contains(currency, contexts)
    }

    /// Explicit balances held in one context set.
    pub fn balances(&self, contexts: &ContextSet) -> Vec<(Currency, Amount)> {
        self.lock_table().balances(contexts)
    }

    /// Contexts produced by the registered calculators and confirmed by at
    /// least one of them.
    pub fn active_contexts(&self) -> ContextSet {
        let calculators = self.observers.calculators();
        let mut candidates = BTreeSet::new();
        for calculator in &calculators {
            calculator.accumulate_contexts(self, &mut candidates);
        }
        candidates
            .into_iter()
            .filter(|context| calculators.iter().any(|calc| calc.matches(context, self)))
            .collect()
    }

    pub fn set_balance(
        &self,
        currency: &Currency,
        amount: Amount,
        cause: &Cause,
        contexts: &ContextSet,
    ) -> TransactionResult {
        let mut table = self.lock_table();
        self.set_locked(&mut table, currency, amount, cause, contexts)
    }

    pub fn deposit(
        &self,
        currency: &Currency,
        amount: Amount,
        cause: &Cause,
        contexts: &ContextSet,
    ) -> TransactionResult {
        let mut table = self.lock_table();
        let before = table.get_or_default(currency, contexts);
        let change = BalanceChange {
            before,
            after: before.checked_add(amount),
        };
        self.commit(&mut table, currency, change, amount, cause, contexts)
    }

    pub fn withdraw(
        &self,
        currency: &Currency,
        amount: Amount,
        cause: &Cause,
        contexts: &ContextSet,
    ) -> TransactionResult {
        let mut table = self.lock_table();
        let before = table.get_or_default(currency, contexts);
        let change = BalanceChange {
            before,
            after: before.checked_sub(amount),
        };
        self.commit(&mut table, currency, change, -amount, cause, contexts)
    }

    /// Set the balance back to the currency's default.
    ///
    /// Without an explicit entry this is a successful no-op: nothing is written
    /// and no hook is consulted.
    pub fn reset_balance(
        &self,
        currency: &Currency,
        cause: &Cause,
        contexts: &ContextSet,
    ) -> TransactionResult {
        let mut table = self.lock_table();
        if !table.contains(currency, contexts) {
            return TransactionResult::new(
                &self.id,
                currency.clone(),
                Decimal::ZERO,
                contexts.clone(),
                TransactionType::Withdraw,
                ResultType::Success,
            );
        }
        self.set_locked(&mut table, currency, currency.default_balance(), cause, contexts)
    }

    /// Reset every currency holding an explicit entry in `contexts`.
    ///
    /// Returns `None` when the account holds no entries at all. The aggregate
    /// result names the account's first currency and succeeds only if every
    /// individual reset did.
    pub fn reset_balances(
        &self,
        cause: &Cause,
        contexts: &ContextSet,
    ) -> Option<TransactionResult> {
        let mut table = self.lock_table();
        let currencies = table.currencies();
        let first = currencies.first()?.clone();

        let mut all_ok = true;
        for currency in &currencies {
            if !table.contains(currency, contexts) {
                continue;
            }
            let result =
                self.set_locked(&mut table, currency, currency.default_balance(), cause, contexts);
            all_ok &= result.result().is_success();
        }

        let result = if all_ok {
            ResultType::Success
        } else {
            ResultType::Failed
        };
        let amount = first.default_balance();
        Some(TransactionResult::new(
            &self.id,
            first,
            amount,
            contexts.clone(),
            TransactionType::Withdraw,
            result,
        ))
    }

    /// Move `amount` from this account to `to`.
    ///
    /// Both new balances are validated before either is written. The target
    /// must be another account of the same economy, otherwise the transfer
    /// fails without consulting the hooks.
    pub fn transfer(
        &self,
        to: &Account,
        currency: &Currency,
        amount: Amount,
        cause: &Cause,
        contexts: &ContextSet,
    ) -> TransferResult {
        let delta = -amount;

        if std::ptr::eq(self, to) || !Arc::ptr_eq(&self.observers, &to.observers) {
            let failed = TransactionResult::new(
                &self.id,
                currency.clone(),
                delta,
                contexts.clone(),
                TransactionType::of_delta(delta),
                ResultType::Failed,
            );
            info!(
                account = %self.id,
                account_to = %to.id,
                currency = %currency,
                "transfer skipped: target is not a counterparty of this economy"
            );
            return TransferResult::new(failed, &to.id);
        }

        let (mut source, mut target) = self.lock_pair(to);

        let source_before = source.get_or_default(currency, contexts);
        let target_before = target.get_or_default(currency, contexts);
        let source_new = source_before.checked_sub(amount);
        let target_new = target_before.checked_add(amount);
        let outcome = match (source_new, target_new) {
            (Some(source_new), Some(target_new)) => {
                validate::check_transfer(currency, source_new, target_new)
            }
            _ => ResultType::OverLimit,
        };

        let provisional = TransactionResult::new(
            &self.id,
            currency.clone(),
            delta,
            contexts.clone(),
            TransactionType::of_delta(delta),
            outcome,
        );
        let event = TransactionEvent {
            cause,
            result: &provisional,
            balance: BalanceChange {
                before: source_before,
                after: source_new,
            },
            account_to: Some(&to.id),
            balance_to: Some(BalanceChange {
                before: target_before,
                after: target_new,
            }),
        };
        let result = if self.observers.is_cancelled(&event) {
            warn!(account = %self.id, account_to = %to.id, %cause, "transfer cancelled by hook");
            provisional.with_result(ResultType::Failed)
        } else {
            if let (ResultType::Success, Some(source_new), Some(target_new)) =
                (outcome, source_new, target_new)
            {
                source.put(currency, contexts, source_new);
                target.put(currency, contexts, target_new);
            }
            provisional
        };

        log_result("transfer", Some(&to.id), &result);
        TransferResult::new(result, &to.id)
    }
}

/// Crate API
impl Account {
    pub(crate) fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        kind: AccountKind,
        table: LedgerTable,
        observers: Arc<Observers>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind,
            table: Mutex::new(table),
            observers,
        }
    }

    /// Exclusive access to the ledger table, e.g. for persistence.
    pub(crate) fn lock_table(&self) -> MutexGuard<'_, LedgerTable> {
        // the table is only written after validation, so a poisoned lock still
        // holds a consistent table
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Private API
impl Account {
    /// Lock both tables in (identifier, address) order.
    fn lock_pair<'a>(
        &'a self,
        other: &'a Account,
    ) -> (MutexGuard<'a, LedgerTable>, MutexGuard<'a, LedgerTable>) {
        let self_key = (self.id.as_str(), self as *const Account as usize);
        let other_key = (other.id.as_str(), other as *const Account as usize);
        if self_key < other_key {
            let mine = self.lock_table();
            let theirs = other.lock_table();
            (mine, theirs)
        } else {
            let theirs = other.lock_table();
            let mine = self.lock_table();
            (mine, theirs)
        }
    }

    fn set_locked(
        &self,
        table: &mut LedgerTable,
        currency: &Currency,
        amount: Amount,
        cause: &Cause,
        contexts: &ContextSet,
    ) -> TransactionResult {
        let before = table.get_or_default(currency, contexts);
        let change = BalanceChange {
            before,
            after: Some(amount),
        };
        self.commit(
            table,
            currency,
            change,
            amount.saturating_sub(before),
            cause,
            contexts,
        )
    }

    /// Validate, consult hooks, then write.
    ///
    /// A proposed balance that is not representable is reported as over-limit.
    fn commit(
        &self,
        table: &mut LedgerTable,
        currency: &Currency,
        change: BalanceChange,
        delta: Amount,
        cause: &Cause,
        contexts: &ContextSet,
    ) -> TransactionResult {
        let outcome = match change.after {
            Some(to) => validate::check(currency, to),
            None => ResultType::OverLimit,
        };
        let provisional = TransactionResult::new(
            &self.id,
            currency.clone(),
            delta,
            contexts.clone(),
            TransactionType::of_delta(delta),
            outcome,
        );

        let event = TransactionEvent {
            cause,
            result: &provisional,
            balance: change,
            account_to: None,
            balance_to: None,
        };
        if self.observers.is_cancelled(&event) {
            warn!(
                account = %self.id,
                currency = %currency,
                %cause,
                "transaction cancelled by hook"
            );
            let failed = provisional.with_result(ResultType::Failed);
            log_result("transaction", None, &failed);
            return failed;
        }

        if let (ResultType::Success, Some(after)) = (outcome, change.after) {
            table.put(currency, contexts, after);
        }
        log_result("transaction", None, &provisional);
        provisional
    }
}

/// Small helper to log transaction outcomes
fn log_result(operation: &str, account_to: Option<&str>, result: &TransactionResult) {
    let kind = match result.transaction_type() {
        TransactionType::Deposit => "deposit",
        TransactionType::Withdraw => "withdraw",
    };
    match (result.result(), account_to) {
        (ResultType::Success, Some(to)) => {
            info!(
                account = %result.account(),
                account_to = %to,
                currency = %result.currency(),
                amount = %result.amount(),
                contexts = %result.contexts(),
                "{operation} ({kind}) applied"
            );
        }
        (ResultType::Success, None) => {
            info!(
                account = %result.account(),
                currency = %result.currency(),
                amount = %result.amount(),
                contexts = %result.contexts(),
                "{operation} ({kind}) applied"
            );
        }
        (reason, Some(to)) => {
            info!(
                account = %result.account(),
                account_to = %to,
                currency = %result.currency(),
                amount = %result.amount(),
                contexts = %result.contexts(),
                %reason,
                "{operation} ({kind}) skipped"
            );
        }
        (reason, None) => {
            info!(
                account = %result.account(),
                currency = %result.currency(),
                amount = %result.amount(),
                contexts = %result.contexts(),
                %reason,
                "{operation} ({kind}) skipped"
            );
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

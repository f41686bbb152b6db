use std::collections::HashMap;

use crate::Amount;
use crate::context::ContextSet;
use crate::currency::Currency;

/// Composite key of a ledger entry: currency identifier plus canonical contexts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LedgerKey {
    currency: String,
    contexts: ContextSet,
}

impl LedgerKey {
    fn new(currency: &Currency, contexts: &ContextSet) -> Self {
        Self {
            currency: currency.identifier().to_owned(),
            contexts: contexts.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    currency: Currency,
    balance: Amount,
}

/// Sparse (currency, context set) -> balance store of one account.
///
/// Missing entries are not zero: readers fall back to the currency's default
/// balance. Nothing here creates an entry except [`put`](Self::put).
#[derive(Debug, Default)]
pub struct LedgerTable {
    entries: HashMap<LedgerKey, LedgerEntry>,
}

impl LedgerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, currency: &Currency, contexts: &ContextSet) -> Option<Amount> {
        self.entries
            .get(&LedgerKey::new(currency, contexts))
            .map(|entry| entry.balance)
    }

    pub fn get_or_default(&self, currency: &Currency, contexts: &ContextSet) -> Amount {
        self.get(currency, contexts)
            .unwrap_or_else(|| currency.default_balance())
    }

    pub fn contains(&self, currency: &Currency, contexts: &ContextSet) -> bool {
        self.entries.contains_key(&LedgerKey::new(currency, contexts))
    }

    pub fn put(&mut self, currency: &Currency, contexts: &ContextSet, balance: Amount) {
        self.entries.insert(
            LedgerKey::new(currency, contexts),
            LedgerEntry {
                currency: currency.clone(),
                balance,
            },
        );
    }

    /// Explicit balances held in one context set, sorted by currency identifier.
    pub fn balances(&self, contexts: &ContextSet) -> Vec<(Currency, Amount)> {
        let mut balances: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, _)| &key.contexts == contexts)
            .map(|(_, entry)| (entry.currency.clone(), entry.balance))
            .collect();
        balances.sort_by(|(a, _), (b, _)| a.identifier().cmp(b.identifier()));
        balances
    }

    /// Every currency with at least one entry, sorted by identifier.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<Currency> = Vec::new();
        for entry in self.entries.values() {
            if !currencies.contains(&entry.currency) {
                currencies.push(entry.currency.clone());
            }
        }
        currencies.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        currencies
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Currency, &ContextSet, Amount)> + '_ {
        self.entries
            .iter()
            .map(|(key, entry)| (&entry.currency, &key.contexts, entry.balance))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! The economy: registry of currencies, accounts, context calculators and
//! cancellation hooks.
//!
//! One `Economy` is built at startup and shared (behind an `Arc`) with every
//! component that needs it. Registration takes exclusive locks; lookups only
//! take shared ones.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::account::{Account, AccountKind, LedgerTable};
use crate::config::Config;
use crate::context::ContextCalculator;
use crate::currency::Currency;
use crate::hook::{CancellationHook, TransactionEvent};
use crate::identity::{Anonymous, IdentityResolver};
use crate::storage::FileStore;

mod error;
pub use error::EconomyError;

/// Observers shared between an economy and all of its accounts.
#[derive(Default)]
pub(crate) struct Observers {
    hooks: RwLock<Vec<Arc<dyn CancellationHook>>>,
    calculators: RwLock<Vec<Arc<dyn ContextCalculator>>>,
}

impl Observers {
    /// Offer the event to every hook; cancelled if any of them vetoes.
    pub(crate) fn is_cancelled(&self, event: &TransactionEvent<'_>) -> bool {
        // snapshot so hooks may register further hooks
        let hooks = read(&self.hooks).clone();
        hooks
            .iter()
            .fold(false, |cancelled, hook| hook.cancel(event) || cancelled)
    }

    pub(crate) fn calculators(&self) -> Vec<Arc<dyn ContextCalculator>> {
        read(&self.calculators).clone()
    }
}

#[derive(Default)]
struct Catalog {
    currencies: HashMap<String, Currency>,
    default: Option<Currency>,
}

/// The ledger registry.
pub struct Economy {
    catalog: RwLock<Catalog>,
    accounts: RwLock<HashMap<String, Arc<Account>>>,
    observers: Arc<Observers>,
    identities: Arc<dyn IdentityResolver>,
    store: Option<FileStore>,
    strict_currencies: bool,
}

/// Public API
impl Economy {
    /// An economy without persistence, resolving no display names.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
            accounts: RwLock::new(HashMap::new()),
            observers: Arc::new(Observers::default()),
            identities: Arc::new(Anonymous),
            store: None,
            strict_currencies: false,
        }
    }

    /// An economy persisting to the configured data directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_store(FileStore::new(&config.data_dir))
            .with_strict_currencies(config.strict_currencies)
    }

    pub fn with_identities(mut self, identities: impl IdentityResolver + 'static) -> Self {
        self.identities = Arc::new(identities);
        self
    }

    pub fn with_store(mut self, store: FileStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Reject re-registration of a currency identifier instead of
    /// overwriting the previous descriptor.
    pub fn with_strict_currencies(mut self, strict: bool) -> Self {
        self.strict_currencies = strict;
        self
    }

    pub fn store(&self) -> Option<&FileStore> {
        self.store.as_ref()
    }

    pub fn register_currency(&self, currency: Currency) -> Result<(), EconomyError> {
        let mut catalog = write(&self.catalog);

        if currency.is_default() {
            if let Some(existing) = &catalog.default {
                return Err(EconomyError::DuplicateDefaultCurrency {
                    existing: existing.identifier().to_owned(),
                    attempted: currency.identifier().to_owned(),
                });
            }
        }

        if catalog.currencies.contains_key(currency.identifier()) {
            if self.strict_currencies {
                return Err(EconomyError::DuplicateCurrency(
                    currency.identifier().to_owned(),
                ));
            }
            warn!(currency = %currency, "currency registered twice, overwriting");
            if catalog.default.as_ref() == Some(&currency) {
                catalog.default = None;
            }
        }

        if currency.is_default() {
            catalog.default = Some(currency.clone());
        }
        info!(
            currency = %currency,
            default = currency.is_default(),
            "currency registered"
        );
        catalog
            .currencies
            .insert(currency.identifier().to_owned(), currency);
        Ok(())
    }

    pub fn currency(&self, identifier: &str) -> Option<Currency> {
        read(&self.catalog).currencies.get(identifier).cloned()
    }

    /// Every registered currency, sorted by identifier.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<_> = read(&self.catalog).currencies.values().cloned().collect();
        currencies.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        currencies
    }

    pub fn default_currency(&self) -> Result<Currency, EconomyError> {
        read(&self.catalog)
            .default
            .clone()
            .ok_or(EconomyError::NoDefaultCurrency)
    }

    pub fn register_context_calculator(&self, calculator: Arc<dyn ContextCalculator>) {
        write(&self.observers.calculators).push(calculator);
    }

    pub fn register_cancellation_hook(&self, hook: Arc<dyn CancellationHook>) {
        write(&self.observers.hooks).push(hook);
    }

    /// The unique account of `uuid`, if it was created.
    pub fn account(&self, uuid: Uuid) -> Option<Arc<Account>> {
        self.account_by_id(&uuid.to_string())
            .filter(|account| account.unique_id().is_some())
    }

    /// Any account, unique or virtual, by identifier.
    pub fn account_by_id(&self, identifier: &str) -> Option<Arc<Account>> {
        read(&self.accounts).get(identifier).cloned()
    }

    /// Get or create the unique account of `uuid`.
    pub fn create_account(&self, uuid: Uuid) -> Result<Arc<Account>, EconomyError> {
        let identifier = uuid.to_string();
        let account = self.get_or_create(&identifier, || {
            (self.identities.display_name(uuid), AccountKind::Unique(uuid))
        })?;
        match account.kind() {
            AccountKind::Unique(_) => Ok(account),
            AccountKind::Virtual => Err(EconomyError::AccountKindMismatch(identifier, "unique")),
        }
    }

    /// Get or create the virtual account named `identifier`.
    pub fn create_virtual_account(&self, identifier: &str) -> Result<Arc<Account>, EconomyError> {
        let account =
            self.get_or_create(identifier, || (identifier.to_owned(), AccountKind::Virtual))?;
        match account.kind() {
            AccountKind::Virtual => Ok(account),
            AccountKind::Unique(_) => Err(EconomyError::AccountKindMismatch(
                identifier.to_owned(),
                "virtual",
            )),
        }
    }

    /// Every account currently held in memory.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        read(&self.accounts).values().cloned().collect()
    }

    /// Evict an account from memory without saving it.
    ///
    /// Handles still held elsewhere become detached: changes made through them
    /// are never saved, and the next `create_*` call builds a fresh account from
    /// the store.
    pub fn remove_account(&self, identifier: &str) -> Option<Arc<Account>> {
        let removed = write(&self.accounts).remove(identifier);
        if removed.is_some() {
            debug!(account = identifier, "account evicted");
        }
        removed
    }

    /// Save every account to the store, then evict it; the next reference
    /// reloads it from disk. Returns the number of flushed accounts.
    ///
    /// Handles obtained before the flush are detached afterwards: changes made
    /// through them are lost, and the next `create_*` call loads a separate
    /// copy from disk. Look accounts up again after flushing.
    pub fn flush(&self) -> Result<usize, EconomyError> {
        let store = self.store.as_ref().ok_or(EconomyError::NoStore)?;

        let mut accounts = write(&self.accounts);
        for account in accounts.values() {
            store.save(account)?;
        }
        let flushed = accounts.len();
        accounts.clear();

        info!(accounts = flushed, dir = %store.dir().display(), "flushed all accounts");
        Ok(flushed)
    }
}

/// Private API
impl Economy {
    /// Look up `identifier`, creating (and hydrating from the store) on a miss.
    fn get_or_create(
        &self,
        identifier: &str,
        describe: impl FnOnce() -> (String, AccountKind),
    ) -> Result<Arc<Account>, EconomyError> {
        if let Some(account) = self.account_by_id(identifier) {
            return Ok(account);
        }

        let mut accounts = write(&self.accounts);
        // another caller may have created it between the two locks
        if let Some(account) = accounts.get(identifier) {
            return Ok(Arc::clone(account));
        }

        let table = match &self.store {
            Some(store) => store
                .load(identifier, |id| self.currency(id))?
                .unwrap_or_default(),
            None => LedgerTable::new(),
        };

        let (display_name, kind) = describe();
        let account = Arc::new(Account::new(
            identifier,
            display_name,
            kind,
            table,
            Arc::clone(&self.observers),
        ));
        accounts.insert(identifier.to_owned(), Arc::clone(&account));
        debug!(account = identifier, name = account.display_name(), "account created");
        Ok(account)
    }
}

impl Default for Economy {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

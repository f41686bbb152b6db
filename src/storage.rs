//! Persistence of ledger tables.
//!
//! A table is converted to a storage-neutral nested mapping: currency
//! identifier, then a list of (context-tag mapping, balance) pairs. The
//! [`FileStore`] writes that mapping as one JSON document per account.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::Amount;
use crate::account::{Account, LedgerTable};
use crate::context::{Context, ContextSet};
use crate::currency::Currency;

/// Context tags of one entry, as a key -> value mapping.
pub type ContextMap = BTreeMap<String, String>;

/// Currency identifier -> (context tags, balance) pairs.
pub type LedgerData = BTreeMap<String, Vec<(ContextMap, Amount)>>;

/// Errors that can occur when saving or loading ledger data
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}: malformed account document: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unknown currency '{0}'")]
    UnknownCurrency(String),

    #[error("currency '{currency}': context key '{key}' has several values")]
    DuplicateContextKey { currency: String, key: String },
}

/// On-disk form of one account.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountDocument {
    pub identifier: String,
    pub balances: LedgerData,
}

/// Convert a table to its storage shape.
///
/// A context set holding several values for one key cannot be written as a
/// mapping and is rejected.
pub fn to_data(table: &LedgerTable) -> Result<LedgerData, StorageError> {
    let mut data = LedgerData::new();
    for (currency, contexts, balance) in table.iter() {
        let mut tags = ContextMap::new();
        for context in contexts.iter() {
            let previous = tags.insert(context.key().to_owned(), context.value().to_owned());
            if previous.is_some() {
                return Err(StorageError::DuplicateContextKey {
                    currency: currency.identifier().to_owned(),
                    key: context.key().to_owned(),
                });
            }
        }
        data.entry(currency.identifier().to_owned())
            .or_default()
            .push((tags, balance));
    }
    for entries in data.values_mut() {
        entries.sort();
    }
    Ok(data)
}

/// Rebuild a table, resolving currency identifiers through `catalog`.
pub fn from_data(
    data: LedgerData,
    catalog: impl Fn(&str) -> Option<Currency>,
) -> Result<LedgerTable, StorageError> {
    let mut table = LedgerTable::new();
    for (identifier, entries) in data {
        let currency =
            catalog(&identifier).ok_or_else(|| StorageError::UnknownCurrency(identifier.clone()))?;
        for (tags, balance) in entries {
            let contexts: ContextSet = tags
                .into_iter()
                .map(|(key, value)| Context::new(key, value))
                .collect();
            table.put(&currency, &contexts, balance);
        }
    }
    Ok(table)
}

/// Directory of JSON account documents.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an account's document.
    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_file_name(identifier)))
    }

    /// Write an account's current balances, replacing any previous document.
    pub fn save(&self, account: &Account) -> Result<(), StorageError> {
        let balances = to_data(&account.lock_table())?;
        let document = AccountDocument {
            identifier: account.identifier().to_owned(),
            balances,
        };

        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(account.identifier());
        let json = serde_json::to_vec_pretty(&document).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;

        // write next to the target, then swap it in
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(account = account.identifier(), path = %path.display(), "account saved");
        Ok(())
    }

    /// Load an account's balances, if it was ever saved.
    pub fn load(
        &self,
        identifier: &str,
        catalog: impl Fn(&str) -> Option<Currency>,
    ) -> Result<Option<LedgerTable>, StorageError> {
        let path = self.path_for(identifier);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        let document: AccountDocument =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
                path: path.clone(),
                source,
            })?;

        let table = from_data(document.balances, catalog)?;
        debug!(
            account = identifier,
            path = %path.display(),
            entries = table.len(),
            "account loaded"
        );
        Ok(Some(table))
    }
}

/// Percent-encode everything outside `[A-Za-z0-9_.-]`.
fn encode_file_name(identifier: &str) -> String {
    let mut encoded = String::with_capacity(identifier.len());
    for byte in identifier.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn catalog(id: &str) -> Option<Currency> {
        match id {
            Currency::SNOWBALLS => Some(Currency::snowballs()),
            "gems" => Some(Currency::new("gems").with_maximum_balance(dec!(10))),
            _ => None,
        }
    }

    #[test]
    fn round_trip_through_data() {
        let mut table = LedgerTable::new();
        table.put(&Currency::snowballs(), &ContextSet::empty(), dec!(5.00));

        let data = to_data(&table).unwrap();
        let restored = from_data(data, catalog).unwrap();
        assert_eq!(
            restored.get(&Currency::snowballs(), &ContextSet::empty()),
            Some(dec!(5.00))
        );
    }

    #[test]
    fn data_shape_groups_by_currency() {
        let nether = ContextSet::empty().with("world", "nether");
        let mut table = LedgerTable::new();
        table.put(&Currency::snowballs(), &ContextSet::empty(), dec!(1));
        table.put(&Currency::snowballs(), &nether, dec!(2));
        table.put(&Currency::new("gems"), &nether, dec!(3));

        let data = to_data(&table).unwrap();
        assert_eq!(data.len(), 2);
        let snowballs = &data["snowballs"];
        assert_eq!(snowballs.len(), 2);
        assert_eq!(snowballs[0], (ContextMap::new(), dec!(1)));
        assert_eq!(snowballs[1].0["world"], "nether");
        assert_eq!(data["gems"][0].1, dec!(3));
    }

    #[test]
    fn unknown_currency_is_an_error() {
        let mut table = LedgerTable::new();
        table.put(&Currency::new("doubloons"), &ContextSet::empty(), dec!(1));
        let data = to_data(&table).unwrap();

        let err = from_data(data, catalog).unwrap_err();
        assert!(matches!(err, StorageError::UnknownCurrency(id) if id == "doubloons"));
    }

    #[test]
    fn duplicate_context_key_is_an_error() {
        let contexts = ContextSet::empty().with("world", "nether").with("world", "end");
        let mut table = LedgerTable::new();
        table.put(&Currency::snowballs(), &contexts, dec!(1));

        let err = to_data(&table).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateContextKey { key, .. } if key == "world"));
    }

    #[test]
    fn balances_are_written_as_strings() {
        let mut table = LedgerTable::new();
        table.put(&Currency::snowballs(), &ContextSet::empty(), dec!(5.00));
        let json = serde_json::to_string(&to_data(&table).unwrap()).unwrap();
        assert_eq!(json, r#"{"snowballs":[[{},"5.00"]]}"#);
    }

    #[test]
    fn load_missing_document_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("nobody", catalog).unwrap().is_none());
    }

    #[test]
    fn load_malformed_document_fails() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(store.path_for("broken"), "not json").unwrap();

        let err = store.load("broken", catalog).unwrap_err();
        assert!(matches!(err, StorageError::Json { .. }));
    }

    #[test]
    fn file_names_are_encoded() {
        assert_eq!(encode_file_name("bank-01.main"), "bank-01.main");
        assert_eq!(encode_file_name("town/hall"), "town%2Fhall");
        assert_eq!(encode_file_name("a b"), "a%20b");
    }
}

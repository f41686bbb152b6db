//! Context tags partitioning balances, and the calculators producing them.

use std::collections::BTreeSet;
use std::fmt;

use crate::account::Account;

/// A single `key=value` tag, e.g. `world=nether`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Context {
    key: String,
    value: String,
}

impl Context {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// An order-irrelevant set of context tags identifying a balance partition.
///
/// Tags are kept sorted, so two sets built from the same tags in a different
/// order compare and hash equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextSet(BTreeSet<Context>);

impl ContextSet {
    /// The global partition.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(Context::new(key, value));
        self
    }

    pub fn contains(&self, context: &Context) -> bool {
        self.0.contains(context)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> + '_ {
        self.0.iter()
    }
}

impl FromIterator<Context> for ContextSet {
    fn from_iter<I: IntoIterator<Item = Context>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ContextSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| Context::new(k, v)).collect()
    }
}

impl fmt::Display for ContextSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, context) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{context}")?;
        }
        f.write_str("}")
    }
}

/// Computes the contexts an account is currently active in.
///
/// Every registered calculator first contributes candidate tags through
/// [`accumulate_contexts`](Self::accumulate_contexts). A candidate is kept only
/// if at least one calculator confirms it through [`matches`](Self::matches),
/// which lets a calculator invalidate stale tags produced by another one.
pub trait ContextCalculator: Send + Sync {
    fn accumulate_contexts(&self, account: &Account, contexts: &mut BTreeSet<Context>);

    fn matches(&self, context: &Context, account: &Account) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn insertion_order_is_irrelevant() {
        let a = ContextSet::empty().with("world", "nether").with("region", "spawn");
        let b = ContextSet::empty().with("region", "spawn").with("world", "nether");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn duplicate_tags_collapse() {
        let set = ContextSet::empty().with("world", "nether").with("world", "nether");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn same_key_different_values_are_distinct_tags() {
        let set = ContextSet::empty().with("world", "nether").with("world", "end");
        assert_eq!(set.len(), 2);
        assert_ne!(set, ContextSet::empty().with("world", "nether"));
    }

    #[test]
    fn collects_from_pairs() {
        let set: ContextSet = [("world", "end")].into_iter().collect();
        assert!(set.contains(&Context::new("world", "end")));
    }

    #[test]
    fn display_is_sorted() {
        let set = ContextSet::empty().with("world", "nether").with("region", "spawn");
        assert_eq!(set.to_string(), "{region=spawn, world=nether}");
        assert_eq!(ContextSet::empty().to_string(), "{}");
    }
}

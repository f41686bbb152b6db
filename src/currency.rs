//! Currency descriptors.

use std::fmt;
use std::hash::{Hash, Hasher};

use rust_decimal::Decimal;

use crate::Amount;

/// Numeric policy of a currency.
///
/// Descriptors are immutable once built. Two descriptors are the same currency
/// iff their identifiers match; the identifier is also the storage key.
#[derive(Debug, Clone)]
pub struct Currency {
    identifier: String,
    default_balance: Amount,
    supports_negatives: bool,
    maximum_balance: Option<Amount>,
    is_default: bool,
}

impl Currency {
    /// Identifier of the built-in currency.
    pub const SNOWBALLS: &'static str = "snowballs";

    /// A non-default currency with a zero default balance, no negative
    /// balances and no maximum.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            default_balance: Decimal::ZERO,
            supports_negatives: false,
            maximum_balance: None,
            is_default: false,
        }
    }

    /// The built-in default currency: negatives allowed, no cap, starts at zero.
    pub fn snowballs() -> Self {
        Self::new(Self::SNOWBALLS)
            .with_negatives(true)
            .as_default()
    }

    pub fn with_default_balance(mut self, balance: Amount) -> Self {
        self.default_balance = balance;
        self
    }

    pub fn with_negatives(mut self, supports_negatives: bool) -> Self {
        self.supports_negatives = supports_negatives;
        self
    }

    pub fn with_maximum_balance(mut self, maximum: Amount) -> Self {
        self.maximum_balance = Some(maximum);
        self
    }

    /// Mark this currency as the registry's default currency.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn default_balance(&self) -> Amount {
        self.default_balance
    }

    pub fn supports_negatives(&self) -> bool {
        self.supports_negatives
    }

    pub fn maximum_balance(&self) -> Option<Amount> {
        self.maximum_balance
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_currency_is_strict_and_uncapped() {
        let currency = Currency::new("gems");
        assert_eq!(currency.identifier(), "gems");
        assert_eq!(currency.default_balance(), dec!(0));
        assert!(!currency.supports_negatives());
        assert_eq!(currency.maximum_balance(), None);
        assert!(!currency.is_default());
    }

    #[test]
    fn snowballs_policy() {
        let snowballs = Currency::snowballs();
        assert_eq!(snowballs.identifier(), "snowballs");
        assert!(snowballs.supports_negatives());
        assert!(snowballs.is_default());
        assert_eq!(snowballs.maximum_balance(), None);
        assert_eq!(snowballs.default_balance(), dec!(0));
    }

    #[test]
    fn equality_is_by_identifier() {
        let a = Currency::new("gems").with_maximum_balance(dec!(10));
        let b = Currency::new("gems").with_default_balance(dec!(3));
        assert_eq!(a, b);
        assert_ne!(a, Currency::new("coins"));
    }
}

//! Pure checks of a proposed balance against a currency's policy.

use rust_decimal::Decimal;

use crate::Amount;
use crate::currency::Currency;
use crate::model::ResultType;

/// Classify a single proposed balance.
pub fn check(currency: &Currency, proposed: Amount) -> ResultType {
    check_all(currency, &[proposed])
}

/// Classify both sides of a transfer.
pub fn check_transfer(currency: &Currency, source: Amount, destination: Amount) -> ResultType {
    check_all(currency, &[source, destination])
}

// Negative-balance violations win over maximum-balance violations, whichever
// side they occur on.
fn check_all(currency: &Currency, proposed: &[Amount]) -> ResultType {
    if !currency.supports_negatives() && proposed.iter().any(|b| *b < Decimal::ZERO) {
        return ResultType::NoFunds;
    }
    if currency
        .maximum_balance()
        .is_some_and(|max| proposed.iter().any(|b| *b > max))
    {
        return ResultType::OverLimit;
    }
    ResultType::Success
}

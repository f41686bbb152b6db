use rust_decimal::Decimal;

/// Balances and deltas are arbitrary-precision decimals.
pub type Amount = Decimal;

/// Number of fraction digits used when rendering balances for humans.
pub const DISPLAY_PRECISION: u32 = 2;

/// Render an amount with [`DISPLAY_PRECISION`] fraction digits.
pub fn display(amount: Amount) -> String {
    let mut rounded = amount.round_dp(DISPLAY_PRECISION);
    rounded.rescale(DISPLAY_PRECISION);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn display_pads_to_two_digits() {
        assert_eq!(display(dec!(1)), "1.00");
        assert_eq!(display(dec!(0)), "0.00");
        assert_eq!(display(dec!(2.5)), "2.50");
    }

    #[test]
    fn display_rounds_extra_digits() {
        assert_eq!(display(dec!(1.005)), "1.00");
        assert_eq!(display(dec!(1.2345)), "1.23");
        assert_eq!(display(dec!(1.239)), "1.24");
    }

    #[test]
    fn display_formats_negative() {
        assert_eq!(display(dec!(-4)), "-4.00");
        assert_eq!(display(dec!(-0.5)), "-0.50");
    }
}

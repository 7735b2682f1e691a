//! Platform fee computation.
//!
//! Pure arithmetic over [`Decimal`] so that splits recombine exactly;
//! rounding happens only at the display boundary, never on amounts that
//! are recorded or transferred.

use rust_decimal::Decimal;
use serde::Serialize;

/// Result type for fee computation.
pub type Result<T> = std::result::Result<T, FeeError>;

/// Errors from fee computation.
#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    #[error("fee rate {0} outside [0, 1]")]
    RateOutOfRange(Decimal),

    #[error("negative gross amount: {0}")]
    NegativeGross(Decimal),
}

/// Split of a gross payment into platform fee and instructor net earning.
///
/// Invariant: `platform_fee + net_amount == gross_amount`, exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub gross_amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
}

impl FeeBreakdown {
    /// Effective fee percentage, rounded for presentation only.
    pub fn fee_percentage(&self) -> Decimal {
        if self.gross_amount.is_zero() {
            return Decimal::ZERO;
        }
        (self.platform_fee / self.gross_amount * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

/// Pure gross/fee/net split calculator.
pub struct FeeCalculator;

impl FeeCalculator {
    /// Compute the fee breakdown for a gross amount at the given rate.
    ///
    /// `rate` must be in `[0, 1]`; `gross` must be non-negative. A zero
    /// gross amount yields an all-zero breakdown.
    pub fn compute(gross: Decimal, rate: Decimal) -> Result<FeeBreakdown> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(FeeError::RateOutOfRange(rate));
        }
        if gross < Decimal::ZERO {
            return Err(FeeError::NegativeGross(gross));
        }

        let platform_fee = gross * rate;
        let net_amount = gross - platform_fee;

        Ok(FeeBreakdown {
            gross_amount: gross,
            platform_fee,
            net_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ten_percent_split() {
        let split = FeeCalculator::compute(dec!(100), dec!(0.10)).unwrap();
        assert_eq!(split.platform_fee, dec!(10));
        assert_eq!(split.net_amount, dec!(90));
    }

    #[test]
    fn test_zero_rate_keeps_full_amount() {
        let split = FeeCalculator::compute(dec!(50), dec!(0)).unwrap();
        assert_eq!(split.platform_fee, dec!(0));
        assert_eq!(split.net_amount, dec!(50));
    }

    #[test]
    fn test_zero_gross_is_all_zero() {
        let split = FeeCalculator::compute(dec!(0), dec!(0.15)).unwrap();
        assert_eq!(split.platform_fee, dec!(0));
        assert_eq!(split.net_amount, dec!(0));
    }

    #[test]
    fn test_split_recombines_exactly() {
        let split = FeeCalculator::compute(dec!(45.00), dec!(0.10)).unwrap();
        assert_eq!(split.platform_fee, dec!(4.50));
        assert_eq!(split.net_amount, dec!(40.50));
        assert_eq!(split.platform_fee + split.net_amount, split.gross_amount);
    }

    #[test]
    fn test_awkward_rate_still_recombines() {
        let split = FeeCalculator::compute(dec!(19.99), dec!(0.137)).unwrap();
        assert_eq!(split.platform_fee + split.net_amount, dec!(19.99));
    }

    #[test]
    fn test_rate_out_of_range() {
        assert!(matches!(
            FeeCalculator::compute(dec!(10), dec!(1.5)),
            Err(FeeError::RateOutOfRange(_))
        ));
        assert!(matches!(
            FeeCalculator::compute(dec!(10), dec!(-0.1)),
            Err(FeeError::RateOutOfRange(_))
        ));
    }

    #[test]
    fn test_negative_gross_rejected() {
        assert!(matches!(
            FeeCalculator::compute(dec!(-1), dec!(0.1)),
            Err(FeeError::NegativeGross(_))
        ));
    }

    #[test]
    fn test_fee_percentage_is_display_only() {
        let split = FeeCalculator::compute(dec!(30), dec!(0.3333)).unwrap();
        // Rounded for presentation; underlying amounts stay exact.
        assert_eq!(split.fee_percentage(), dec!(33.33));
        assert_eq!(split.platform_fee + split.net_amount, dec!(30));
    }
}

use crate::error::PaymentError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a monetary value rounded to paise (2 decimal places).
///
/// This is a wrapper around `rust_decimal::Decimal` so fee components can only be
/// produced through the rounding rule the checkout uses everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

/// Represents a donation amount.
///
/// Ensures that the donor never pays less than one currency unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const MINIMUM: Decimal = Decimal::ONE;

    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value >= Self::MINIMUM {
            Ok(Self(value))
        } else {
            Err(PaymentError::InvalidAmount(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Money {
    fn from(amount: Amount) -> Self {
        Self::new(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Rounds half away from zero to two decimal places.
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Applies a rate (e.g. `0.024`) and rounds the result. `None` on overflow.
    pub fn percent_of(base: Decimal, rate: Decimal) -> Option<Self> {
        base.checked_mul(rate).map(Self::new)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Integer paise, as the gateway expects.
    pub fn to_minor_units(&self) -> Result<i64, PaymentError> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|paise| i64::try_from(paise.trunc()).ok())
            .ok_or(PaymentError::AmountOverflow(self.0))
    }

    pub fn from_minor_units(paise: i64) -> Self {
        Self(Decimal::new(paise, 2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1)).is_ok());
        assert!(Amount::new(dec!(1000.50)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.99)),
            Err(PaymentError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(dec!(0)),
            Err(PaymentError::InvalidAmount(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-5)),
            Err(PaymentError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_amount_deserialization_rejects_small_values() {
        let ok: Amount = serde_json::from_str("250").unwrap();
        assert_eq!(ok.value(), dec!(250));
        assert!(serde_json::from_str::<Amount>("0.5").is_err());
    }

    #[test]
    fn test_money_rounding() {
        assert_eq!(Money::new(dec!(7.915)).value(), dec!(7.92));
        assert_eq!(Money::new(dec!(7.914)).value(), dec!(7.91));
        assert_eq!(
            Money::percent_of(dec!(999), dec!(0.024)).unwrap().value(),
            dec!(23.98)
        );
    }

    #[test]
    fn test_money_minor_units() {
        assert_eq!(Money::new(dec!(1051.92)).to_minor_units().unwrap(), 105192);
        assert_eq!(Money::from_minor_units(105192), Money::new(dec!(1051.92)));
        assert!(matches!(
            Money::new(Decimal::MAX).to_minor_units(),
            Err(PaymentError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_money_arithmetic_is_checked() {
        let total = Money::new(dec!(10.10)).checked_add(Money::new(dec!(0.05)));
        assert_eq!(total, Some(Money::new(dec!(10.15))));
        assert_eq!(Money::new(Decimal::MAX).checked_add(Money::new(dec!(1))), None);
        assert_eq!(Money::percent_of(Decimal::MAX, dec!(1.5)), None);
    }
}

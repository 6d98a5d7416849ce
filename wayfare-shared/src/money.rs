use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount in the currency's minor unit (cents for USD).
///
/// Every stored price, booking total and payment amount uses this type, and the
/// payment processor receives `amount_minor` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount_minor: i64,
    pub currency: String,
}

impl Money {
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> Self {
        Self {
            amount_minor,
            currency: currency.into().to_uppercase(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(0, currency)
    }

    /// Multiply by a unit count (nights, seats, guests). `None` on overflow.
    pub fn times(&self, units: u32) -> Option<Self> {
        self.amount_minor
            .checked_mul(i64::from(units))
            .map(|amount_minor| Self::new(amount_minor, self.currency.clone()))
    }

    /// Add two amounts of the same currency. `None` on currency mismatch or overflow.
    pub fn checked_add(&self, other: &Money) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        self.amount_minor
            .checked_add(other.amount_minor)
            .map(|amount_minor| Self::new(amount_minor, self.currency.clone()))
    }
}

/// ISO 4217 currencies whose minor unit is not a hundredth.
const ZERO_DECIMAL: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];
const THREE_DECIMAL: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Digits after the decimal point for `currency`.
pub fn minor_unit_exponent(currency: &str) -> u32 {
    if ZERO_DECIMAL.contains(&currency) {
        0
    } else if THREE_DECIMAL.contains(&currency) {
        3
    } else {
        2
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        let exponent = minor_unit_exponent(&self.currency);
        if exponent == 0 {
            return write!(f, "{} {}{}", self.currency, sign, abs);
        }
        let scale = 10u64.pow(exponent);
        write!(
            f,
            "{} {}{}.{:0width$}",
            self.currency,
            sign,
            abs / scale,
            abs % scale,
            width = exponent as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times_multiplies_minor_units() {
        let nightly = Money::new(12_550, "usd");
        let total = nightly.times(3).unwrap();
        assert_eq!(total.amount_minor, 37_650);
        assert_eq!(total.currency, "USD");
    }

    #[test]
    fn test_times_overflow_is_none() {
        assert!(Money::new(i64::MAX, "USD").times(2).is_none());
    }

    #[test]
    fn test_checked_add_rejects_mixed_currency() {
        let usd = Money::new(100, "USD");
        let eur = Money::new(100, "EUR");
        assert!(usd.checked_add(&eur).is_none());
        assert_eq!(usd.checked_add(&usd).unwrap().amount_minor, 200);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(123_456, "USD").to_string(), "USD 1234.56");
        assert_eq!(Money::new(-5, "EUR").to_string(), "EUR -0.05");
    }

    #[test]
    fn test_display_follows_currency_exponent() {
        assert_eq!(Money::new(15_000, "JPY").to_string(), "JPY 15000");
        assert_eq!(Money::new(1_250, "KWD").to_string(), "KWD 1.250");
        assert_eq!(minor_unit_exponent("USD"), 2);
    }
}

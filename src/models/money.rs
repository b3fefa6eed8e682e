use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("'{0}' is not a whole number of minor currency units")]
    NotWhole(String),

    #[error("'{0}' is not a monetary amount")]
    Invalid(String),

    #[error("Amount out of range")]
    Overflow,
}

/// An exact amount of money, counted in minor currency units (e.g. pence).
///
/// Serializes as a bare integer, so fractional JSON numbers are rejected
/// when a request is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn add(self, other: Money) -> Result<Money, MoneyError> {
        self.0.checked_add(other.0).map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn subtract(self, other: Money) -> Result<Money, MoneyError> {
        self.0.checked_sub(other.0).map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn scale(self, factor: i64) -> Result<Money, MoneyError> {
        self.0.checked_mul(factor).map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn compare(self, other: Money) -> Ordering {
        self.0.cmp(&other.0)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Sum of any number of amounts; empty input is zero.
    pub fn total<I>(amounts: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts.into_iter().try_fold(Money::ZERO, Money::add)
    }

    /// Like [`Money::total`] for amounts that may themselves have failed.
    pub fn try_total<I>(amounts: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = Result<Money, MoneyError>>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |sum, amount| sum.add(amount?))
    }

    /// Render for display, e.g. `£1,234.56` or `-£5.00`.
    pub fn format(self, currency: &Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = group_thousands(abs / 100);
        format!("{}{}{}.{:02}", sign, currency.symbol, major, abs % 100)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Money(minor)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses a whole count of minor units. `"12.50"` is refused rather
    /// than silently rounded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(minor) = trimmed.parse::<i64>() {
            return Ok(Money(minor));
        }
        if trimmed.parse::<f64>().is_ok() {
            return Err(MoneyError::NotWhole(trimmed.to_string()));
        }
        Err(MoneyError::Invalid(trimmed.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display currency, taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub name: String,
    pub symbol: String,
}

impl Default for Currency {
    fn default() -> Self {
        Self {
            name: "GBP".to_string(),
            symbol: "£".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1500);
        let b = Money::from_minor(400);

        assert_eq!(a.add(b), Ok(Money::from_minor(1900)));
        assert_eq!(a.subtract(b), Ok(Money::from_minor(1100)));
        assert_eq!(b.subtract(a), Ok(Money::from_minor(-1100)));
        assert_eq!(b.scale(3), Ok(Money::from_minor(1200)));
        assert_eq!(a.compare(b), Ordering::Greater);
        assert_eq!(Money::ZERO.compare(Money::ZERO), Ordering::Equal);
    }

    #[test]
    fn test_total_of_nothing_is_zero() {
        assert_eq!(Money::total(Vec::new()), Ok(Money::ZERO));
        assert_eq!(
            Money::total(vec![Money::from_minor(1), Money::from_minor(2), Money::from_minor(-5)]),
            Ok(Money::from_minor(-2))
        );
    }

    #[test]
    fn test_arithmetic_out_of_range() {
        let max = Money::from_minor(i64::MAX);
        let min = Money::from_minor(i64::MIN);

        assert_eq!(max.add(Money::from_minor(1)), Err(MoneyError::Overflow));
        assert_eq!(min.subtract(Money::from_minor(1)), Err(MoneyError::Overflow));
        assert_eq!(Money::from_minor(100).scale(i64::MAX), Err(MoneyError::Overflow));
        assert_eq!(Money::total(vec![max, max]), Err(MoneyError::Overflow));
        assert_eq!(
            Money::try_total(vec![Ok(Money::from_minor(1)), Err(MoneyError::Overflow)]),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_format() {
        let gbp = Currency::default();
        assert_eq!(Money::from_minor(0).format(&gbp), "£0.00");
        assert_eq!(Money::from_minor(5).format(&gbp), "£0.05");
        assert_eq!(Money::from_minor(123456).format(&gbp), "£1,234.56");
        assert_eq!(Money::from_minor(100000000).format(&gbp), "£1,000,000.00");
        assert_eq!(Money::from_minor(-500).format(&gbp), "-£5.00");

        let usd = Currency { name: "USD".to_string(), symbol: "$".to_string() };
        assert_eq!(Money::from_minor(99999).format(&usd), "$999.99");
    }

    #[test]
    fn test_parse_rejects_fractions() {
        assert_eq!("2500".parse::<Money>(), Ok(Money::from_minor(2500)));
        assert_eq!(" -10 ".parse::<Money>(), Ok(Money::from_minor(-10)));
        assert!(matches!("12.50".parse::<Money>(), Err(MoneyError::NotWhole(_))));
        assert!(matches!("ten".parse::<Money>(), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_json_requires_integers() {
        let m: Money = serde_json::from_str("3000").unwrap();
        assert_eq!(m, Money::from_minor(3000));
        assert_eq!(serde_json::to_string(&m).unwrap(), "3000");
        assert!(serde_json::from_str::<Money>("30.5").is_err());
    }
}

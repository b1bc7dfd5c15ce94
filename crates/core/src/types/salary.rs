//! Salary amounts and salary bands using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Salary`] or [`SalaryBand`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SalaryError {
    /// The input could not be parsed as a decimal number.
    #[error("Please enter a valid amount")]
    NotANumber,
    /// The amount is below zero.
    #[error("Amount must be 0 or greater")]
    Negative,
    /// The band minimum is not strictly below its maximum.
    #[error("Minimum salary must be less than maximum salary")]
    InvertedBand,
}

/// A non-negative annual salary amount.
///
/// Serialized as a JSON number, which is what the HR API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Salary(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Salary {
    /// Zero salary.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a salary, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`SalaryError::Negative`] if `amount < 0`.
    pub fn new(amount: Decimal) -> Result<Self, SalaryError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(SalaryError::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a user-entered amount. Accepts thousands separators and a
    /// leading currency symbol (`$75,000.00`).
    ///
    /// # Errors
    ///
    /// Returns [`SalaryError::NotANumber`] or [`SalaryError::Negative`].
    pub fn parse(input: &str) -> Result<Self, SalaryError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let amount = cleaned
            .parse::<Decimal>()
            .map_err(|_| SalaryError::NotANumber)?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Salary {
    /// Formats as US currency with two decimals and thousands separators.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", group_thousands(self.0.round_dp(2)))
    }
}

/// An inclusive salary band (`min < max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryBand {
    min: Salary,
    max: Salary,
}

impl SalaryBand {
    /// Create a band, requiring the minimum to be strictly below the maximum.
    ///
    /// # Errors
    ///
    /// Returns [`SalaryError::InvertedBand`] if `min >= max`.
    pub fn new(min: Salary, max: Salary) -> Result<Self, SalaryError> {
        if min >= max {
            return Err(SalaryError::InvertedBand);
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub const fn min(&self) -> Salary {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Salary {
        self.max
    }

    /// Whether `salary` falls inside the band (inclusive).
    #[must_use]
    pub fn contains(&self, salary: Salary) -> bool {
        self.min <= salary && salary <= self.max
    }
}

fn group_thousands(amount: Decimal) -> String {
    let text = format!("{amount:.2}");
    let (sign, digits) = text
        .strip_prefix('-')
        .map_or(("", text.as_str()), |rest| ("-", rest));
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}.{frac}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_formatted() {
        assert_eq!(
            Salary::parse("75000").unwrap().amount(),
            Decimal::new(75000, 0)
        );
        assert_eq!(
            Salary::parse("$75,000.50").unwrap().amount(),
            Decimal::new(7_500_050, 2)
        );
    }

    #[test]
    fn test_parse_rejects_negative_and_garbage() {
        assert_eq!(Salary::parse("-1"), Err(SalaryError::Negative));
        assert_eq!(Salary::parse("abc"), Err(SalaryError::NotANumber));
        assert_eq!(Salary::parse(""), Err(SalaryError::NotANumber));
    }

    #[test]
    fn test_zero_is_allowed() {
        assert_eq!(Salary::parse("0").unwrap(), Salary::ZERO);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Salary::parse("1234567.8").unwrap().to_string(), "$1,234,567.80");
        assert_eq!(Salary::parse("950").unwrap().to_string(), "$950.00");
        assert_eq!(Salary::parse("100000").unwrap().to_string(), "$100,000.00");
    }

    #[test]
    fn test_band_requires_min_below_max() {
        let low = Salary::parse("40000").unwrap();
        let high = Salary::parse("60000").unwrap();
        assert!(SalaryBand::new(low, high).is_ok());
        assert_eq!(SalaryBand::new(high, low), Err(SalaryError::InvertedBand));
        assert_eq!(SalaryBand::new(low, low), Err(SalaryError::InvertedBand));
    }

    #[test]
    fn test_band_contains() {
        let band = SalaryBand::new(
            Salary::parse("40000").unwrap(),
            Salary::parse("60000").unwrap(),
        )
        .unwrap();
        assert!(band.contains(Salary::parse("40000").unwrap()));
        assert!(band.contains(Salary::parse("60000").unwrap()));
        assert!(!band.contains(Salary::parse("60000.01").unwrap()));
    }

    #[test]
    fn test_serializes_as_number() {
        let salary = Salary::parse("52000.5").unwrap();
        assert_eq!(serde_json::to_string(&salary).unwrap(), "52000.5");
        let back: Salary = serde_json::from_str("52000.5").unwrap();
        assert_eq!(back, salary);
    }
}

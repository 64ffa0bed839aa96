//! Fixed-point amounts.
//!
//! Prices and totals are counted in minor units (cents) and percentages in
//! basis points, so checkout arithmetic never touches floating point. Both
//! types travel over the wire as decimal strings (`"25.00"`, `"20.00"`).

use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

const MINOR_UNITS: i64 = 100;
const FULL_PERCENT_BPS: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("`{0}` is not a decimal number")]
    Malformed(String),
    #[error("at most two decimal places are allowed")]
    TooPrecise,
    #[error("amount must not be negative")]
    Negative,
    #[error("amount is out of range")]
    OutOfRange,
    #[error("percentage must be between 0 and 100")]
    PercentageRange,
}

/// Parses a non-negative decimal with at most two fractional digits and
/// returns it scaled by 100.
fn parse_hundredths(input: &str) -> Result<i64, AmountError> {
    let trimmed = input.trim();
    let value =
        Decimal::from_str(trimmed).map_err(|_| AmountError::Malformed(trimmed.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountError::Negative);
    }
    if value.normalize().scale() > 2 {
        return Err(AmountError::TooPrecise);
    }
    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.to_i64())
        .ok_or(AmountError::OutOfRange)
}

fn format_hundredths(value: i64) -> String {
    Decimal::new(value, 2).to_string()
}

/// Integer division rounding half away from zero, for non-negative operands.
fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    (numerator + denominator / 2) / denominator
}

/// A monetary amount in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// The share of this amount covered by `rate`, rounded half-up to the cent.
    pub fn portion(self, rate: Percentage) -> Money {
        let scaled = i128::from(self.0) * i128::from(rate.basis_points());
        let rounded = div_round_half_up(scaled, i128::from(FULL_PERCENT_BPS));
        // rate <= 100% keeps the portion within the input amount
        Money(rounded as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hundredths(self.0))
    }
}

impl FromStr for Money {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hundredths(s).map(Money)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(HundredthsVisitor("a decimal amount such as \"25.00\""))
            .map(Money)
    }
}

/// A percentage in basis points (`2000` is 20%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(i32);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);

    pub fn from_basis_points(bps: i32) -> Result<Self, AmountError> {
        if (0..=FULL_PERCENT_BPS as i32).contains(&bps) {
            Ok(Self(bps))
        } else {
            Err(AmountError::PercentageRange)
        }
    }

    pub const fn basis_points(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hundredths(i64::from(self.0)))
    }
}

impl FromStr for Percentage {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bps = parse_hundredths(s)?;
        let bps = i32::try_from(bps).map_err(|_| AmountError::PercentageRange)?;
        Percentage::from_basis_points(bps)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bps = deserializer
            .deserialize_any(HundredthsVisitor("a percentage between \"0\" and \"100\""))?;
        i32::try_from(bps)
            .map_err(|_| AmountError::PercentageRange)
            .and_then(Percentage::from_basis_points)
            .map_err(de::Error::custom)
    }
}

/// Accepts decimal strings and JSON numbers, yielding hundredths.
struct HundredthsVisitor(&'static str);

impl de::Visitor<'_> for HundredthsVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        parse_hundredths(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(MINOR_UNITS))
            .ok_or_else(|| E::custom(AmountError::OutOfRange))
    }

    // `f64`'s Display is the shortest round-trip form, so `19.99` stays `19.99`.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        parse_hundredths(&v.to_string()).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        if v < 0 {
            return Err(E::custom(AmountError::Negative));
        }
        v.checked_mul(MINOR_UNITS)
            .ok_or_else(|| E::custom(AmountError::OutOfRange))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_two_decimal_places() {
        assert_eq!("25.00".parse::<Money>().unwrap(), Money::from_cents(2500));
        assert_eq!("25".parse::<Money>().unwrap(), Money::from_cents(2500));
        assert_eq!("0.5".parse::<Money>().unwrap(), Money::from_cents(50));
        assert_eq!(" 19.99 ".parse::<Money>().unwrap(), Money::from_cents(1999));
        assert_eq!(Money::from_cents(7200).to_string(), "72.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn rejects_bad_amounts() {
        assert_eq!("1.005".parse::<Money>(), Err(AmountError::TooPrecise));
        assert_eq!("-3".parse::<Money>(), Err(AmountError::Negative));
        assert!(matches!("abc".parse::<Money>(), Err(AmountError::Malformed(_))));
        // trailing zeros beyond two places are harmless
        assert_eq!("1.500".parse::<Money>().unwrap(), Money::from_cents(150));
    }

    #[test]
    fn money_json_accepts_strings_and_integers() {
        let from_str: Money = serde_json::from_str("\"40.00\"").unwrap();
        let from_int: Money = serde_json::from_str("40").unwrap();
        assert_eq!(from_str, from_int);
        assert_eq!(serde_json::to_string(&from_str).unwrap(), "\"40.00\"");
        assert!(serde_json::from_str::<Money>("12.345").is_err());
    }

    #[test]
    fn huge_amounts_are_out_of_range() {
        assert_eq!(
            "79228162514264337593543950335".parse::<Money>(),
            Err(AmountError::OutOfRange)
        );
        assert_eq!(
            "99999999999999999999".parse::<Money>(),
            Err(AmountError::OutOfRange)
        );
        assert_eq!(
            "79228162514264337593543950335".parse::<Percentage>(),
            Err(AmountError::OutOfRange)
        );
        assert!(serde_json::from_str::<Money>("\"79228162514264337593543950335\"").is_err());
    }

    #[test]
    fn money_json_accepts_fractional_numbers() {
        let price: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(price, Money::from_cents(1999));
        let price: Money = serde_json::from_str("0.1").unwrap();
        assert_eq!(price, Money::from_cents(10));
        let percent: Percentage = serde_json::from_str("12.5").unwrap();
        assert_eq!(percent.basis_points(), 1250);

        assert!(serde_json::from_str::<Money>("-1.5").is_err());
        assert!(serde_json::from_str::<Money>("1e30").is_err());
        assert!(serde_json::from_str::<Percentage>("150.5").is_err());
    }

    #[test]
    fn percentage_bounds() {
        assert_eq!("20".parse::<Percentage>().unwrap().basis_points(), 2000);
        assert_eq!("12.5".parse::<Percentage>().unwrap().basis_points(), 1250);
        assert_eq!("100".parse::<Percentage>().unwrap().basis_points(), 10_000);
        assert_eq!("100.01".parse::<Percentage>(), Err(AmountError::PercentageRange));
        assert!(serde_json::from_str::<Percentage>("\"150\"").is_err());
        assert_eq!(Percentage::from_basis_points(800).unwrap().to_string(), "8.00");
    }

    #[test]
    fn portion_rounds_half_up() {
        let twenty = Percentage::from_basis_points(2000).unwrap();
        assert_eq!(Money::from_cents(9000).portion(twenty), Money::from_cents(1800));

        let eight = Percentage::from_basis_points(800).unwrap();
        // 0.08 * 0.06 = 0.0048 -> 0.00, 0.08 * 0.07 = 0.0056 -> 0.01
        assert_eq!(Money::from_cents(6).portion(eight), Money::ZERO);
        assert_eq!(Money::from_cents(7).portion(eight), Money::from_cents(1));
        // 12.5% of 0.04 is exactly half a cent
        let eighth = Percentage::from_basis_points(1250).unwrap();
        assert_eq!(Money::from_cents(4).portion(eighth), Money::from_cents(1));
    }
}

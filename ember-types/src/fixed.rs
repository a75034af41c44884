//! Exact decimal arithmetic at a fixed number of fractional digits.
//!
//! A [`Fixed`] is an integer magnitude plus a decimal scale: `value = 1234`
//! with `decimal = 2` is `12.34`. Every operation is checked and reports
//! overflow as an error instead of wrapping.
//!
//! Scale rules:
//! - `add`/`sub` promote the operand with fewer fractional digits to the
//!   larger scale; the result carries the larger scale.
//! - `multiply` keeps the scale of the left operand; the right operand's
//!   fractional digits are divided out after a 128-bit product.
//! - `div` and `mul_ratio` keep the scale of the receiver.
//! - Division always truncates toward zero.
//! - Comparisons align scales first, so `1.0` at 8 digits equals `1` at 0.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::AMOUNT_DECIMALS;
use crate::error::EmberError;

/// Largest supported number of fractional digits.
pub const MAX_DECIMALS: u32 = 18;

/// Fixed-point decimal value.
#[derive(Debug, Clone, Copy, BorshSerialize, BorshDeserialize)]
pub struct Fixed {
    value: i128,
    decimal: u32,
}

fn pow10(exp: u32) -> Result<i128, EmberError> {
    10i128
        .checked_pow(exp)
        .ok_or(EmberError::Overflow { op: "pow10" })
}

fn scale_up(value: i128, by: u32) -> Option<i128> {
    if value == 0 {
        return Some(0);
    }
    10i128.checked_pow(by).and_then(|p| value.checked_mul(p))
}

fn check_scale(decimal: u32) -> Result<(), EmberError> {
    if decimal > MAX_DECIMALS {
        return Err(EmberError::ScaleTooLarge {
            decimal,
            max: MAX_DECIMALS,
        });
    }
    Ok(())
}

impl Fixed {
    /// Build a value directly from its scaled integer representation.
    pub const fn from_raw(value: i128, decimal: u32) -> Self {
        Self { value, decimal }
    }

    /// Zero at the given scale.
    pub const fn zero(decimal: u32) -> Self {
        Self { value: 0, decimal }
    }

    /// Whole units at the given scale (`from_int(3, 8)` is `3.00000000`).
    pub fn from_int(units: i64, decimal: u32) -> Result<Self, EmberError> {
        check_scale(decimal)?;
        let value = (units as i128)
            .checked_mul(pow10(decimal)?)
            .ok_or(EmberError::Overflow { op: "from_int" })?;
        Ok(Self { value, decimal })
    }

    /// Parse a decimal string such as `"10"`, `"0.5"` or `"-3.25"`.
    ///
    /// More fractional digits than `decimal` is an error; nothing is
    /// silently truncated.
    pub fn parse(s: &str, decimal: u32) -> Result<Self, EmberError> {
        check_scale(decimal)?;
        let invalid = |reason: &str| EmberError::InvalidAmount {
            reason: format!("{reason}: {s:?}"),
        };

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("empty amount"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("non-digit character"));
        }
        if frac_part.len() > decimal as usize {
            return Err(invalid(&format!("more than {decimal} fractional digits")));
        }

        let mut value: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as i128))
                .ok_or(EmberError::Overflow { op: "parse" })?;
        }
        let pad = decimal - frac_part.len() as u32;
        value = value
            .checked_mul(pow10(pad)?)
            .ok_or(EmberError::Overflow { op: "parse" })?;
        if negative {
            value = -value;
        }
        Ok(Self { value, decimal })
    }

    /// Parse a decimal string that must be strictly positive.
    pub fn parse_positive(s: &str, decimal: u32) -> Result<Self, EmberError> {
        let parsed = Self::parse(s, decimal)?;
        if !parsed.is_positive() {
            return Err(EmberError::InvalidAmount {
                reason: format!("amount must be positive: {s:?}"),
            });
        }
        Ok(parsed)
    }

    /// The scaled integer magnitude.
    pub fn value(&self) -> i128 {
        self.value
    }

    /// Number of fractional digits.
    pub fn decimal(&self) -> u32 {
        self.decimal
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn is_positive(&self) -> bool {
        self.value > 0
    }

    pub fn is_negative(&self) -> bool {
        self.value < 0
    }

    /// Convert to another scale. Increasing the scale is always exact;
    /// decreasing it fails if non-zero digits would be dropped.
    pub fn rescale(&self, decimal: u32) -> Result<Self, EmberError> {
        check_scale(decimal)?;
        match decimal.cmp(&self.decimal) {
            Ordering::Equal => Ok(*self),
            Ordering::Greater => {
                let value = scale_up(self.value, decimal - self.decimal)
                    .ok_or(EmberError::Overflow { op: "rescale" })?;
                Ok(Self { value, decimal })
            }
            Ordering::Less => {
                let p = pow10(self.decimal - decimal)?;
                if self.value % p != 0 {
                    return Err(EmberError::InvalidAmount {
                        reason: format!("{self} cannot be represented with {decimal} digits"),
                    });
                }
                Ok(Self {
                    value: self.value / p,
                    decimal,
                })
            }
        }
    }

    fn aligned(&self, other: &Fixed) -> Result<(i128, i128, u32), EmberError> {
        let decimal = self.decimal.max(other.decimal);
        let a = self.rescale(decimal)?.value;
        let b = other.rescale(decimal)?.value;
        Ok((a, b, decimal))
    }

    pub fn add(&self, other: &Fixed) -> Result<Fixed, EmberError> {
        let (a, b, decimal) = self.aligned(other)?;
        let value = a
            .checked_add(b)
            .ok_or(EmberError::Overflow { op: "add" })?;
        Ok(Self { value, decimal })
    }

    pub fn sub(&self, other: &Fixed) -> Result<Fixed, EmberError> {
        let (a, b, decimal) = self.aligned(other)?;
        let value = a
            .checked_sub(b)
            .ok_or(EmberError::Overflow { op: "sub" })?;
        Ok(Self { value, decimal })
    }

    pub fn neg(&self) -> Result<Fixed, EmberError> {
        let value = self
            .value
            .checked_neg()
            .ok_or(EmberError::Overflow { op: "neg" })?;
        Ok(Self {
            value,
            decimal: self.decimal,
        })
    }

    /// Multiply two fixed-point values; the result keeps `self`'s scale.
    pub fn multiply(&self, other: &Fixed) -> Result<Fixed, EmberError> {
        let product = self
            .value
            .checked_mul(other.value)
            .ok_or(EmberError::Overflow { op: "multiply" })?;
        Ok(Self {
            value: product / pow10(other.decimal)?,
            decimal: self.decimal,
        })
    }

    /// Divide by an integer, truncating toward zero.
    pub fn div(&self, divisor: i64) -> Result<Fixed, EmberError> {
        if divisor == 0 {
            return Err(EmberError::DivisionByZero);
        }
        let value = self
            .value
            .checked_div(divisor as i128)
            .ok_or(EmberError::Overflow { op: "div" })?;
        Ok(Self {
            value,
            decimal: self.decimal,
        })
    }

    /// Compute `self * numerator / denominator` with a single truncation at
    /// the end.
    pub fn mul_ratio(&self, numerator: i128, denominator: i128) -> Result<Fixed, EmberError> {
        if denominator == 0 {
            return Err(EmberError::DivisionByZero);
        }
        let product = self
            .value
            .checked_mul(numerator)
            .ok_or(EmberError::Overflow { op: "mul_ratio" })?;
        let value = product
            .checked_div(denominator)
            .ok_or(EmberError::Overflow { op: "mul_ratio" })?;
        Ok(Self {
            value,
            decimal: self.decimal,
        })
    }

    pub fn less_than(&self, other: &Fixed) -> bool {
        self < other
    }
}

impl PartialEq for Fixed {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fixed {}

impl PartialOrd for Fixed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fixed {
    fn cmp(&self, other: &Self) -> Ordering {
        // When scaling up overflows, the scaled side is larger in magnitude
        // than anything the other side can hold, so its sign decides.
        match self.decimal.cmp(&other.decimal) {
            Ordering::Equal => self.value.cmp(&other.value),
            Ordering::Less => match scale_up(self.value, other.decimal - self.decimal) {
                Some(v) => v.cmp(&other.value),
                None if self.value < 0 => Ordering::Less,
                None => Ordering::Greater,
            },
            Ordering::Greater => match scale_up(other.value, self.decimal - other.decimal) {
                Some(v) => self.value.cmp(&v),
                None if other.value < 0 => Ordering::Greater,
                None => Ordering::Less,
            },
        }
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10u128.checked_pow(self.decimal).ok_or(fmt::Error)?;
        let abs = self.value.unsigned_abs();
        let (int, frac) = (abs / scale, abs % scale);
        if self.value < 0 {
            f.write_str("-")?;
        }
        write!(f, "{int}")?;
        if frac != 0 {
            let digits = format!("{:0width$}", frac, width = self.decimal as usize);
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

/// Parses at the token amount scale ([`AMOUNT_DECIMALS`]).
impl FromStr for Fixed {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fixed::parse(s, AMOUNT_DECIMALS)
    }
}

impl Serialize for Fixed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fixed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

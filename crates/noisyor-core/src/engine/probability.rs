//! Exact probabilities.
//!
//! Every probability the engine handles is a [`BigRational`] in `[0, 1]`.
//! The number of terms summed during marginalization grows as `2^k` with the
//! fan-in `k`, so rounding is avoided entirely until a value crosses the public
//! query boundary as an `f64`.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::engine::errors::ExecError;

/// Largest decimal exponent accepted when parsing text such as `"1e-3"`.
const MAX_DECIMAL_EXPONENT: u32 = 512;

/// A probability held as an exact rational number in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Probability(BigRational);

impl Probability {
    /// Wraps a rational, rejecting values outside `[0, 1]`.
    pub fn new(value: BigRational) -> Result<Self, ExecError> {
        if value.is_negative() || value > BigRational::one() {
            return Err(ExecError::ValidationError(format!(
                "probability {} is outside [0, 1]",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Builds `numer / denom`.
    pub fn from_ratio(numer: i64, denom: i64) -> Result<Self, ExecError> {
        if denom == 0 {
            return Err(ExecError::Numerical(format!(
                "probability {}/{} has a zero denominator",
                numer, denom
            )));
        }
        Self::new(BigRational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    /// Converts the exact binary value of `value`.
    ///
    /// `0.1_f64` is not one tenth; use [`Probability::from_decimal_str`] when
    /// the decimal reading is what matters.
    pub fn from_f64(value: f64) -> Result<Self, ExecError> {
        let ratio = BigRational::from_float(value).ok_or_else(|| {
            ExecError::Numerical(format!("probability {} is not finite", value))
        })?;
        Self::new(ratio)
    }

    /// Parses decimal (`"0.001"`, `"1e-3"`) or rational (`"1/3"`) text exactly.
    pub fn from_decimal_str(text: &str) -> Result<Self, ExecError> {
        let ratio = parse_exact(text).ok_or_else(|| {
            ExecError::ParseError(format!("'{}' is not a decimal or rational number", text))
        })?;
        Self::new(ratio)
    }

    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    /// `1 - p`.
    pub fn complement(&self) -> Self {
        Self(BigRational::one() - &self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }

    pub fn into_ratio(self) -> BigRational {
        self.0
    }

    /// Nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        // Only fails for magnitudes outside the f64 range.
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Probability {
    type Err = ExecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl TryFrom<f64> for Probability {
    type Error = ExecError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_f64(value)
    }
}

impl From<Probability> for BigRational {
    fn from(p: Probability) -> Self {
        p.0
    }
}

fn parse_exact(text: &str) -> Option<BigRational> {
    let text = text.trim();
    if let Some((numer, denom)) = text.split_once('/') {
        let numer: BigInt = numer.trim().parse().ok()?;
        let denom: BigInt = denom.trim().parse().ok()?;
        if denom.is_zero() {
            return None;
        }
        return Some(BigRational::new(numer, denom));
    }

    let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => (&text[..pos], text[pos + 1..].parse::<i64>().ok()?),
        None => (text, 0),
    };
    let (negative, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part
        .bytes()
        .chain(frac_part.bytes())
        .all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut numer: BigInt = format!("{}{}", int_part, frac_part).parse().ok()?;
    if negative {
        numer = -numer;
    }
    let scale = exponent.saturating_sub(frac_part.len() as i64);
    if scale.unsigned_abs() > u64::from(MAX_DECIMAL_EXPONENT) {
        return None;
    }
    let ten = BigInt::from(10u32);
    let magnitude = num_traits::pow(ten, scale.unsigned_abs() as usize);
    Some(if scale >= 0 {
        BigRational::from_integer(numer * magnitude)
    } else {
        BigRational::new(numer, magnitude)
    })
}

//! Resource quantities in the Kubernetes notation
//!
//! A quantity is a signed decimal number followed by an optional suffix:
//! binary SI (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`), decimal SI (`n`, `u`, `m`,
//! `k`, `M`, `G`, `T`, `P`, `E`) or a decimal exponent (`e3`, `E-2`).
//! Parsing keeps only the integer value, rounded up when the quantity is
//! fractional.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Parsed resource quantity, held as its integer value
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Quantity(i64);

/// Quantity parse failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The string does not start with a number
    #[error(
        "quantity {input:?} must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'"
    )]
    Format {
        /// Rejected input
        input: String,
    },

    /// The number is followed by an unknown suffix
    #[error("unable to parse quantity's suffix in {input:?}")]
    Suffix {
        /// Rejected input
        input: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    /// Multiply by 2^n
    Binary(u32),
    /// Multiply by 10^n
    Decimal(i32),
}

impl Scale {
    fn parse(suffix: &str) -> Option<Self> {
        let scale = match suffix {
            "" => Self::Decimal(0),
            "n" => Self::Decimal(-9),
            "u" => Self::Decimal(-6),
            "m" => Self::Decimal(-3),
            "k" => Self::Decimal(3),
            "M" => Self::Decimal(6),
            "G" => Self::Decimal(9),
            "T" => Self::Decimal(12),
            "P" => Self::Decimal(15),
            "E" => Self::Decimal(18),
            "Ki" => Self::Binary(10),
            "Mi" => Self::Binary(20),
            "Gi" => Self::Binary(30),
            "Ti" => Self::Binary(40),
            "Pi" => Self::Binary(50),
            "Ei" => Self::Binary(60),
            _ => {
                let exponent = suffix.strip_prefix(['e', 'E'])?;
                return exponent.parse::<i32>().ok().map(Self::Decimal);
            }
        };
        Some(scale)
    }
}

impl Quantity {
    /// Create from an integer value
    #[must_use]
    pub const fn from_value(value: i64) -> Self {
        Self(value)
    }

    /// Integer value of the quantity
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(input: &str) -> Result<Self, QuantityError> {
        let format_error = || QuantityError::Format {
            input: input.to_string(),
        };

        let (negative, unsigned) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            Some(_) => (false, input),
            None => return Err(format_error()),
        };

        let whole_len = unsigned.bytes().take_while(u8::is_ascii_digit).count();
        let (whole, rest) = unsigned.split_at(whole_len);
        let (fraction, suffix) = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let fraction_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(fraction_len)
            }
            None => ("", rest),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(format_error());
        }

        let scale = Scale::parse(suffix).ok_or_else(|| QuantityError::Suffix {
            input: input.to_string(),
        })?;

        let value = i64::try_from(scaled_magnitude(whole, fraction, scale)).unwrap_or(i64::MAX);
        Ok(Self(if negative { -value } else { value }))
    }
}

/// Significant digits kept before scaling; the binary limit leaves room for `Ei`
const MAX_DECIMAL_DIGITS: usize = 38;
const MAX_BINARY_DIGITS: usize = 19;

/// Absolute value of `whole.fraction * scale`, rounded up, saturating at `u128::MAX`
///
/// Zeros on either end of the digits never reach the mantissa: leading zeros
/// are dropped and trailing zeros move into the decimal exponent. Digits past
/// the precision limit are cut off, bumping the mantissa when any was non-zero.
fn scaled_magnitude(whole: &str, fraction: &str, scale: Scale) -> u128 {
    let fraction = fraction.trim_end_matches('0');
    let digits = format!("{whole}{fraction}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return 0;
    }

    let significant = digits.trim_end_matches('0');
    let trailing_zeros = digits.len() - significant.len();

    let (shift, decimal_exponent, max_digits) = match scale {
        Scale::Binary(shift) => (shift, 0, MAX_BINARY_DIGITS),
        Scale::Decimal(exp) => (0, exp, MAX_DECIMAL_DIGITS),
    };

    let (kept, dropped) = significant.split_at(significant.len().min(max_digits));
    let Ok(mut mantissa) = kept.parse::<u128>() else {
        return u128::MAX;
    };
    if dropped.bytes().any(|b| b != b'0') {
        mantissa += 1;
    }

    let Some(mantissa) = mantissa.checked_mul(1_u128 << shift) else {
        return u128::MAX;
    };

    let exponent = i64::from(decimal_exponent) + len_i64(trailing_zeros) + len_i64(dropped.len())
        - len_i64(fraction.len());
    let power = u32::try_from(exponent.unsigned_abs())
        .ok()
        .and_then(|e| 10_u128.checked_pow(e));

    if exponent >= 0 {
        power
            .and_then(|p| mantissa.checked_mul(p))
            .unwrap_or(u128::MAX)
    } else {
        // A divisor beyond u128 leaves a non-zero value below one
        power.map_or(1, |divisor| mantissa.div_ceil(divisor))
    }
}

fn len_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

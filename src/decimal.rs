use core::fmt;
use core::str::FromStr;

use crate::error::JsonErrorKind;

/// Maximum digits to the right of the decimal point, mirroring 128-bit
/// base-10 decimal semantics.
const MAX_SCALE: u8 = 28;

/// A 128-bit base-10 decimal: `mantissa * 10^-scale`.
///
/// Values are kept normalized (no trailing zero digits in the mantissa
/// while the scale is positive), so derived equality is value equality.
/// Preserves at least 28–29 significant digits; inputs needing more fail
/// with *number-out-of-range* instead of rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    /// `mantissa * 10^-scale`, normalized. `None` when the scale exceeds
    /// the supported range.
    pub fn from_parts(mantissa: i128, scale: u8) -> Option<Decimal> {
        if scale > MAX_SCALE {
            return None;
        }
        Some(Decimal { mantissa, scale }.normalized())
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    fn normalized(mut self) -> Decimal {
        if self.mantissa == 0 {
            self.scale = 0;
            return self;
        }
        while self.scale > 0 && self.mantissa % 10 == 0 {
            self.mantissa /= 10;
            self.scale -= 1;
        }
        self
    }

    /// Parse JSON number text (integer, fraction, scientific forms).
    pub(crate) fn parse(text: &str) -> Result<Decimal, JsonErrorKind> {
        let bytes = text.as_bytes();
        let mut i = 0;
        let negative = bytes.first() == Some(&b'-');
        if negative {
            i += 1;
        }

        let mut mantissa: i128 = 0;
        let mut int_digits = 0usize;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add((bytes[i] - b'0') as i128))
                .ok_or(JsonErrorKind::NumberOutOfRange)?;
            int_digits += 1;
            i += 1;
        }
        if int_digits == 0 {
            return Err(JsonErrorKind::InvalidNumber);
        }

        let mut frac_digits = 0i32;
        if i < bytes.len() && bytes[i] == b'.' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                mantissa = mantissa
                    .checked_mul(10)
                    .and_then(|m| m.checked_add((bytes[i] - b'0') as i128))
                    .ok_or(JsonErrorKind::NumberOutOfRange)?;
                frac_digits += 1;
                i += 1;
            }
            if frac_digits == 0 {
                return Err(JsonErrorKind::InvalidNumber);
            }
        }

        let mut exponent = 0i32;
        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            i += 1;
            let exp_negative = match bytes.get(i) {
                Some(b'-') => {
                    i += 1;
                    true
                }
                Some(b'+') => {
                    i += 1;
                    false
                }
                _ => false,
            };
            let mut digits = 0;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                exponent = exponent
                    .checked_mul(10)
                    .and_then(|e| e.checked_add((bytes[i] - b'0') as i32))
                    .ok_or(JsonErrorKind::NumberOutOfRange)?;
                digits += 1;
                i += 1;
            }
            if digits == 0 {
                return Err(JsonErrorKind::InvalidNumber);
            }
            if exp_negative {
                exponent = -exponent;
            }
        }

        if i != bytes.len() {
            return Err(JsonErrorKind::InvalidNumber);
        }
        if negative {
            mantissa = -mantissa;
        }

        // Fold the exponent into the scale; a negative effective scale
        // multiplies the mantissa out instead.
        let mut scale = frac_digits - exponent;
        while scale < 0 {
            mantissa = mantissa
                .checked_mul(10)
                .ok_or(JsonErrorKind::NumberOutOfRange)?;
            scale += 1;
        }
        let mut dec = Decimal {
            mantissa,
            scale: 0,
        };
        dec.scale = u8::try_from(scale).map_err(|_| JsonErrorKind::NumberOutOfRange)?;
        dec = dec.normalized();
        if dec.scale > MAX_SCALE {
            return Err(JsonErrorKind::NumberOutOfRange);
        }
        Ok(dec)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        if self.mantissa < 0 {
            f.write_str("-")?;
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if digits.len() <= scale {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        } else {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{int}.{frac}")
        }
    }
}

impl FromStr for Decimal {
    type Err = JsonErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::parse(s)
    }
}

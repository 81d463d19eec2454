//! Scaled decimal used for `xs:decimal` literals.
//!
//! A [`Decie`] is an unscaled [`Biggie`] together with the number of digits
//! that sit to the right of the decimal point, so `value == unscaled / 10^scale`
//! holds exactly and no binary rounding ever happens.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_integer::Integer;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::biggie::Biggie;
use crate::error::ValueError;

/// Fractional digits produced by [`Decie::div`] when no precision is given.
pub const DEFAULT_DIVISION_PRECISION: u32 = 24;

/// Largest scale `rust_decimal::Decimal` can carry.
const RUST_DECIMAL_MAX_SCALE: u32 = 28;

#[derive(Debug, Clone)]
pub struct Decie {
    unscaled: Biggie,
    scale: u32,
}

impl Decie {
    pub fn new(unscaled: Biggie, scale: u32) -> Self {
        Self { unscaled, scale }
    }

    pub fn zero() -> Self {
        Self::new(Biggie::zero(), 0)
    }

    /// Rounds `value * 10^scale` to the nearest integer and keeps `scale`.
    pub fn from_f64(value: f64, scale: u32) -> Result<Self, ValueError> {
        if !value.is_finite() {
            return Err(ValueError::NonFinite(value.to_string()));
        }
        let exp = i32::try_from(scale).map_err(|_| ValueError::ScaleOutOfRange {
            scale: u64::from(scale),
            max: i32::MAX as u64,
        })?;
        let unscaled = Biggie::from_f64_rounded(value * 10f64.powi(exp))?;
        Ok(Self::new(unscaled, scale))
    }

    pub fn unscaled(&self) -> &Biggie {
        &self.unscaled
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.unscaled.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.unscaled.is_negative()
    }

    /// Brings both operands to the larger scale.
    fn normalize(a: &Decie, b: &Decie) -> (u32, Biggie, Biggie) {
        match a.scale.cmp(&b.scale) {
            Ordering::Equal => (a.scale, a.unscaled.clone(), b.unscaled.clone()),
            Ordering::Greater => (
                a.scale,
                a.unscaled.clone(),
                b.unscaled.mul(&Biggie::pow10(a.scale - b.scale)),
            ),
            Ordering::Less => (
                b.scale,
                a.unscaled.mul(&Biggie::pow10(b.scale - a.scale)),
                b.unscaled.clone(),
            ),
        }
    }

    pub fn add(&self, other: &Decie) -> Decie {
        let (scale, a, b) = Self::normalize(self, other);
        Decie::new(a.add(&b), scale)
    }

    pub fn sub(&self, other: &Decie) -> Decie {
        let (scale, a, b) = Self::normalize(self, other);
        Decie::new(a.sub(&b), scale)
    }

    /// Fails when the combined scale does not fit in a `u32`.
    pub fn mul(&self, other: &Decie) -> Result<Decie, ValueError> {
        let scale = self.scale.checked_add(other.scale).ok_or(ValueError::ScaleOutOfRange {
            scale: u64::from(self.scale) + u64::from(other.scale),
            max: u64::from(u32::MAX),
        })?;
        Ok(Decie::new(self.unscaled.mul(&other.unscaled), scale).trim_scale())
    }

    /// Long division, producing at most `precision` fractional digits.
    ///
    /// Without an explicit precision the larger operand scale is used, but
    /// never fewer than [`DEFAULT_DIVISION_PRECISION`] digits. Digits past
    /// the precision are truncated and trailing zeros are trimmed.
    pub fn div(&self, other: &Decie, precision: Option<u32>) -> Result<Decie, ValueError> {
        if other.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        let (scale, a, b) = Self::normalize(self, other);
        let precision =
            precision.unwrap_or_else(|| scale.max(DEFAULT_DIVISION_PRECISION));

        let ten = Biggie::from(10u8);
        let mut quotient = a.idiv(&b)?;
        let mut remainder = a.modulo(&b)?;
        let mut digits = 0;
        while digits < precision && !remainder.is_zero() {
            let next = remainder.mul(&ten);
            quotient = quotient.mul(&ten).add(&next.idiv(&b)?);
            remainder = next.modulo(&b)?;
            digits += 1;
        }
        Ok(Decie::new(quotient, digits).trim_scale())
    }

    /// Truncating integer division.
    pub fn idiv(&self, other: &Decie) -> Result<Biggie, ValueError> {
        let (_, a, b) = Self::normalize(self, other);
        a.idiv(&b)
    }

    /// Remainder of [`Decie::idiv`], carrying the sign of `self`.
    pub fn modulo(&self, other: &Decie) -> Result<Decie, ValueError> {
        let (scale, a, b) = Self::normalize(self, other);
        Ok(Decie::new(a.modulo(&b)?, scale).trim_scale())
    }

    /// Rounds to `places` fractional digits, halves toward positive infinity.
    ///
    /// Negative `places` round to tens, hundreds and so on.
    pub fn round(&self, places: i32) -> Result<Decie, ValueError> {
        let current = i64::from(self.scale);
        let target = i64::from(places);
        match target.cmp(&current) {
            Ordering::Equal => Ok(self.clone()),
            Ordering::Greater => {
                // places > scale >= 0, so the cast is lossless
                let target = places as u32;
                Ok(Decie::new(
                    self.unscaled.mul(&Biggie::pow10(target - self.scale)),
                    target,
                ))
            }
            Ordering::Less => {
                let dropped = current - target;
                let dropped = u32::try_from(dropped).map_err(|_| ValueError::ScaleOutOfRange {
                    scale: dropped.unsigned_abs(),
                    max: u64::from(u32::MAX),
                })?;
                let divisor = Biggie::pow10(dropped);
                let (quotient, remainder) = self
                    .unscaled
                    .as_bigint()
                    .div_mod_floor(divisor.as_bigint());
                let mut rounded = Biggie::from(quotient);
                if Biggie::from(remainder * 2u8) >= divisor {
                    rounded = rounded.add(&Biggie::one());
                }
                Ok(if places < 0 {
                    Decie::new(rounded.mul(&Biggie::pow10(places.unsigned_abs())), 0)
                } else {
                    Decie::new(rounded, places as u32)
                })
            }
        }
    }

    /// Smallest integral value not less than `self`.
    pub fn ceil(&self) -> Decie {
        if self.scale == 0 {
            return self.clone();
        }
        let divisor = Biggie::pow10(self.scale);
        let (quotient, remainder) = self
            .unscaled
            .as_bigint()
            .div_mod_floor(divisor.as_bigint());
        let mut value = Biggie::from(quotient);
        if !Biggie::from(remainder).is_zero() {
            value = value.add(&Biggie::one());
        }
        Decie::new(value, 0)
    }

    /// Largest integral value not greater than `self`.
    pub fn floor(&self) -> Decie {
        if self.scale == 0 {
            return self.clone();
        }
        let divisor = Biggie::pow10(self.scale);
        Decie::new(
            Biggie::from(self.unscaled.as_bigint().div_floor(divisor.as_bigint())),
            0,
        )
    }

    /// Drops trailing zero digits from the fraction.
    pub fn trim_scale(&self) -> Decie {
        if self.scale == 0 {
            return self.clone();
        }
        let (removed, unscaled) = self.unscaled.trim_right_zero(self.scale);
        if removed == 0 {
            return self.clone();
        }
        Decie::new(unscaled, self.scale - removed)
    }

    /// Integer part, truncated toward zero.
    pub fn to_integral(&self) -> Biggie {
        Biggie::from(self.unscaled.as_bigint() / Biggie::pow10(self.scale).as_bigint())
    }

    pub fn to_f64(&self) -> f64 {
        let text = self.to_string();
        text.parse().unwrap_or_else(|_| self.unscaled.to_f64() / 10f64.powi(self.scale as i32))
    }

    /// Rounds to `places` and renders, dropping the `.0` of whole results.
    pub fn to_fixed(&self, places: i32) -> Result<String, ValueError> {
        let text = self.round(places)?.to_string();
        if places <= 0 {
            return Ok(text.strip_suffix(".0").map(str::to_owned).unwrap_or(text));
        }
        Ok(text)
    }
}

impl PartialEq for Decie {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decie {}

impl PartialOrd for Decie {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decie {
    fn cmp(&self, other: &Self) -> Ordering {
        let (_, a, b) = Self::normalize(self, other);
        a.cmp(&b)
    }
}

impl FromStr for Decie {
    type Err = ValueError;

    /// Accepts `123`, `3.14`, `.5`, `1.` with an optional sign.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (body, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(ValueError::invalid_number(s));
        }

        let mut digits = String::with_capacity(int_part.len() + frac_part.len() + 1);
        if negative {
            digits.push('-');
        }
        digits.push_str(int_part);
        digits.push_str(frac_part);
        if digits.trim_start_matches('-').is_empty() {
            digits.push('0');
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| ValueError::ScaleOutOfRange {
            scale: frac_part.len() as u64,
            max: u64::from(u32::MAX),
        })?;
        Ok(Decie::new(digits.parse()?, scale))
    }
}

impl fmt::Display for Decie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = self.scale as usize;
        let mut digits = self.unscaled.abs().to_string();
        if digits.len() <= scale {
            digits.insert_str(0, &"0".repeat(scale + 1 - digits.len()));
        }
        let split = digits.len() - scale;
        if self.is_negative() {
            f.write_str("-")?;
        }
        let fraction = if scale == 0 { "0" } else { &digits[split..] };
        write!(f, "{}.{}", &digits[..split], fraction)
    }
}

impl Serialize for Decie {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Biggie> for Decie {
    fn from(value: Biggie) -> Self {
        Decie::new(value, 0)
    }
}

impl From<Decimal> for Decie {
    fn from(value: Decimal) -> Self {
        Decie::new(Biggie::from(value.mantissa()), value.scale())
    }
}

impl TryFrom<&Decie> for Decimal {
    type Error = ValueError;

    fn try_from(value: &Decie) -> Result<Self, Self::Error> {
        let trimmed = value.trim_scale();
        if trimmed.scale > RUST_DECIMAL_MAX_SCALE {
            return Err(ValueError::ScaleOutOfRange {
                scale: u64::from(trimmed.scale),
                max: u64::from(RUST_DECIMAL_MAX_SCALE),
            });
        }
        trimmed
            .unscaled
            .to_i128()
            .and_then(|mantissa| Decimal::try_from_i128_with_scale(mantissa, trimmed.scale).ok())
            .ok_or_else(|| ValueError::invalid_number(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decie {
        s.parse().unwrap()
    }

    fn approx(v: f64, scale: u32) -> Decie {
        Decie::from_f64(v, scale).unwrap()
    }

    #[test]
    fn test_basic_usage() {
        assert_eq!(dec("123").to_f64(), 123.0);
        assert_eq!(dec("0.1").to_f64(), 0.1);
        assert_eq!(dec("3.14").to_f64(), 3.14);
        assert_eq!(approx(3.14, 2).to_f64(), 3.14);
    }

    #[test]
    fn test_display_keeps_scale() {
        assert_eq!(dec("3.14").to_string(), "3.14");
        assert_eq!(approx(3.14, 2).to_string(), "3.14");
        assert_eq!(approx(3.14, 4).to_string(), "3.1400");
        assert_eq!(dec("0.0000100").to_string(), "0.0000100");
        assert_eq!(approx(0.00001, 7).to_string(), "0.0000100");
        assert_eq!(dec("42").to_string(), "42.0");
        assert_eq!(dec(".5").to_string(), "0.5");
        assert_eq!(dec("1.").to_string(), "1.0");
        assert_eq!(dec("-0.25").to_string(), "-0.25");
    }

    #[test]
    fn test_ceil_and_floor() {
        assert_eq!(approx(1000.70001, 7).ceil().to_fixed(0).unwrap(), "1001");
        assert_eq!(approx(0.00001, 7).ceil().to_fixed(0).unwrap(), "1");
        assert_eq!(approx(-0.00001, 7).ceil().to_fixed(0).unwrap(), "0");
        assert_eq!(dec("-2.5").floor().to_fixed(0).unwrap(), "-3");
        assert_eq!(dec("2.5").floor().to_fixed(0).unwrap(), "2");
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(approx(0.00001, 7).round(0).unwrap().to_fixed(0).unwrap(), "0");
        assert_eq!(approx(-0.00001, 7).round(0).unwrap().to_fixed(0).unwrap(), "0");
        assert_eq!(approx(1000.70001, 7).round(0).unwrap().to_fixed(0).unwrap(), "1001");
        assert_eq!(approx(1000.70500, 7).round(2).unwrap().to_string(), "1000.71");
        assert_eq!(approx(1000.70490, 7).round(2).unwrap().to_string(), "1000.70");
        assert_eq!(dec("-2.5").round(0).unwrap().to_fixed(0).unwrap(), "-2");
        assert_eq!(dec("1250").round(-2).unwrap().to_fixed(0).unwrap(), "1300");
        assert_eq!(dec("1.5").round(3).unwrap().to_string(), "1.500");
    }

    #[test]
    fn test_arithmetic_normalizes_scale() {
        assert_eq!(dec("1.5").add(&dec("0.25")).to_string(), "1.75");
        assert_eq!(dec("1.5").sub(&dec("0.25")).to_string(), "1.25");
        assert_eq!(dec("0.1").add(&dec("0.2")), dec("0.3"));
        assert_eq!(dec("1.50").mul(&dec("2.0")).unwrap().to_string(), "3.0");
        assert_eq!(dec("1.25").mul(&dec("0.2")).unwrap().to_string(), "0.25");
    }

    #[test]
    fn test_extreme_scales_are_errors() {
        let tiny = Decie::new(Biggie::one(), u32::MAX);
        assert!(matches!(
            tiny.mul(&dec("0.5")),
            Err(ValueError::ScaleOutOfRange { .. })
        ));
        assert!(matches!(
            tiny.round(i32::MIN),
            Err(ValueError::ScaleOutOfRange { .. })
        ));
        assert!(matches!(
            tiny.to_fixed(i32::MIN),
            Err(ValueError::ScaleOutOfRange { .. })
        ));
        assert_eq!(dec("0.5").mul(&dec("0.5")).unwrap().scale(), 2);
    }

    #[test]
    fn test_division() {
        assert_eq!(dec("1.0").div(&dec("4.0"), None).unwrap().to_string(), "0.25");
        assert_eq!(dec("-1").div(&dec("4"), None).unwrap().to_string(), "-0.25");
        assert_eq!(dec("1").div(&dec("-8"), None).unwrap().to_string(), "-0.125");
        assert_eq!(
            dec("1").div(&dec("3"), Some(5)).unwrap().to_string(),
            "0.33333"
        );
        let third = dec("1").div(&dec("3"), None).unwrap();
        assert_eq!(third.scale(), DEFAULT_DIVISION_PRECISION);
        assert_eq!(dec("6").div(&dec("3"), None).unwrap().to_string(), "2.0");
        assert_eq!(
            dec("1").div(&Decie::zero(), None),
            Err(ValueError::DivisionByZero)
        );
    }

    #[test]
    fn test_idiv_and_modulo() {
        assert_eq!(dec("7.5").idiv(&dec("2")).unwrap(), Biggie::from(3));
        assert_eq!(dec("7.5").modulo(&dec("2")).unwrap().to_string(), "1.5");
        assert_eq!(dec("-7.5").modulo(&dec("2")).unwrap().to_string(), "-1.5");
        assert!(dec("1").modulo(&Decie::zero()).is_err());
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(dec("1.50"), dec("1.5"));
        assert!(dec("1.05") < dec("1.5"));
        assert!(dec("-3") < dec("0.001"));
    }

    #[test]
    fn test_rejects_malformed_text() {
        assert!("".parse::<Decie>().is_err());
        assert!(".".parse::<Decie>().is_err());
        assert!("1.2.3".parse::<Decie>().is_err());
        assert!("1e5".parse::<Decie>().is_err());
    }

    #[test]
    fn test_rust_decimal_interop() {
        let d = Decimal::new(31400, 4);
        let decie = Decie::from(d);
        assert_eq!(decie.to_string(), "3.1400");
        let back = Decimal::try_from(&decie).unwrap();
        assert_eq!(back, Decimal::new(314, 2));

        let too_fine = Decie::new(Biggie::one(), 40);
        assert!(matches!(
            Decimal::try_from(&too_fine),
            Err(ValueError::ScaleOutOfRange { .. })
        ));
    }
}

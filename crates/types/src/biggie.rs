//! Unbounded integer used for `xs:integer` literals.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use serde::{Serialize, Serializer};

use crate::error::ValueError;

/// An exact, arbitrarily large integer.
///
/// Division truncates toward zero and [`Biggie::modulo`] takes the sign of
/// the dividend, matching `idiv` and `mod` on `xs:integer`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Biggie(BigInt);

impl Biggie {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn one() -> Self {
        Self(BigInt::one())
    }

    /// `10^order`.
    pub fn magnitude(order: i64) -> Result<Self, ValueError> {
        if order < 0 {
            return Err(ValueError::NegativeMagnitude(order));
        }
        let exp = u32::try_from(order).map_err(|_| ValueError::ScaleOutOfRange {
            scale: order.unsigned_abs(),
            max: u64::from(u32::MAX),
        })?;
        Ok(Self(BigInt::from(10u8).pow(exp)))
    }

    pub(crate) fn pow10(exp: u32) -> Self {
        Self(BigInt::from(10u8).pow(exp))
    }

    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    pub fn into_bigint(self) -> BigInt {
        self.0
    }

    pub fn add(&self, other: &Biggie) -> Biggie {
        Biggie(&self.0 + &other.0)
    }

    pub fn sub(&self, other: &Biggie) -> Biggie {
        Biggie(&self.0 - &other.0)
    }

    pub fn mul(&self, other: &Biggie) -> Biggie {
        Biggie(&self.0 * &other.0)
    }

    /// Integer division truncating toward zero.
    pub fn idiv(&self, other: &Biggie) -> Result<Biggie, ValueError> {
        if other.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        Ok(Biggie(&self.0 / &other.0))
    }

    /// Remainder of [`Biggie::idiv`]; carries the sign of `self`.
    pub fn modulo(&self, other: &Biggie) -> Result<Biggie, ValueError> {
        if other.is_zero() {
            return Err(ValueError::DivisionByZero);
        }
        Ok(Biggie(&self.0 % &other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// True when both values are negative or both are non-negative.
    pub fn same_sign(&self, other: &Biggie) -> bool {
        self.is_negative() == other.is_negative()
    }

    pub fn abs(&self) -> Biggie {
        Biggie(self.0.abs())
    }

    /// Floor of the base-10 logarithm.
    pub fn ilog10(&self) -> Result<Biggie, ValueError> {
        if !self.0.is_positive() {
            return Err(ValueError::NonPositiveLogarithm);
        }
        let digits = self.0.to_str_radix(10).len();
        Ok(Biggie::from(digits as u64 - 1))
    }

    /// Strips up to `max` trailing zero digits.
    ///
    /// Returns how many digits were removed together with the reduced value.
    /// Zero has nothing significant to keep, so it reports `max` removals.
    pub fn trim_right_zero(&self, max: u32) -> (u32, Biggie) {
        if self.is_zero() {
            return (max, Biggie::zero());
        }
        let ten = BigInt::from(10u8);
        let mut value = self.0.clone();
        let mut removed = 0;
        while removed < max {
            let (quotient, remainder) = (&value / &ten, &value % &ten);
            if !remainder.is_zero() {
                break;
            }
            value = quotient;
            removed += 1;
        }
        (removed, Biggie(value))
    }

    /// Nearest double; values beyond the `f64` range saturate to infinity.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(if self.is_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        })
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    pub fn to_i128(&self) -> Option<i128> {
        self.0.to_i128()
    }

    /// Rounds a finite double to the nearest integer.
    pub fn from_f64_rounded(value: f64) -> Result<Biggie, ValueError> {
        BigInt::from_f64(value.round())
            .map(Biggie)
            .ok_or_else(|| ValueError::NonFinite(value.to_string()))
    }
}

impl FromStr for Biggie {
    type Err = ValueError;

    /// Accepts an optional sign followed by ASCII digits only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
        if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValueError::invalid_number(s));
        }
        let digits = s.strip_prefix('+').unwrap_or(s);
        BigInt::from_str(digits)
            .map(Biggie)
            .map_err(|_| ValueError::invalid_number(s))
    }
}

impl fmt::Display for Biggie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Biggie {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

macro_rules! biggie_from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Biggie {
                fn from(value: $t) -> Self {
                    Biggie(BigInt::from(value))
                }
            }
        )*
    };
}

biggie_from_primitive!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, usize);

impl From<BigInt> for Biggie {
    fn from(value: BigInt) -> Self {
        Biggie(value)
    }
}

macro_rules! biggie_binop {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<'a> $trait<&'a Biggie> for &'a Biggie {
            type Output = Biggie;
            fn $method(self, rhs: &'a Biggie) -> Biggie {
                Biggie(&self.0 $op &rhs.0)
            }
        }
    };
}

biggie_binop!(Add, add, +);
biggie_binop!(Sub, sub, -);
biggie_binop!(Mul, mul, *);

impl Neg for Biggie {
    type Output = Biggie;

    fn neg(self) -> Biggie {
        Biggie(-self.0)
    }
}

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const KZT_CURRENCY_CODE: &str = "KZT";
pub const KZT_CURRENCY_CODE_LOWER: &str = "kzt";

//--------------------------------------        Tenge        ---------------------------------------------------------
/// An amount of Kazakhstani tenge. The menu works in whole tenge, so no fractional unit is carried.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Tenge(i64);

op!(binary Tenge, Add, add);
op!(binary Tenge, Sub, sub);
op!(inplace Tenge, SubAssign, sub_assign);
op!(unary Tenge, Neg, neg);

impl Mul<i64> for Tenge {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Tenge {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in tenge: {0}")]
pub struct TengeConversionError(String);

impl From<i64> for Tenge {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Tenge {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Tenge {}

impl TryFrom<u64> for Tenge {
    type Error = TengeConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(TengeConversionError(format!("Value {} is too large to convert to Tenge", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Renders the way prices appear in chat messages, e.g. `1400 Т`.
impl Display for Tenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Т", self.0)
    }
}

impl Tenge {
    pub const fn from_i64(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

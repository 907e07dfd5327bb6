use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

/// The number of stored units in one loyalty point.
const UNITS_PER_POINT: i64 = 100;

//--------------------------------------       Points        ---------------------------------------------------------
/// A quantity of loyalty points.
///
/// Points are stored as a whole number of hundredths so that sums are exact. On the wire they are plain decimal
/// numbers, e.g. `500` or `729.98`.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash)]
#[sqlx(transparent)]
pub struct Points(i64);

/// Forwards an arithmetic operator to the underlying count of hundredths.
macro_rules! units_op {
    ($op:ident::$f:ident) => {
        impl $op for Points {
            type Output = Self;

            fn $f(self, rhs: Self) -> Self {
                Self(self.0.$f(rhs.0))
            }
        }
    };
    (assign $op:ident::$f:ident) => {
        impl $op for Points {
            fn $f(&mut self, rhs: Self) {
                self.0.$f(rhs.0)
            }
        }
    };
}

units_op!(Add::add);
units_op!(Sub::sub);
units_op!(assign AddAssign::add_assign);
units_op!(assign SubAssign::sub_assign);

impl Neg for Points {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in points: {0}")]
pub struct PointsConversionError(String);

impl From<i64> for Points {
    /// Converts a number of whole points, clamping at the limits of the representable range.
    fn from(value: i64) -> Self {
        Self(value.saturating_mul(UNITS_PER_POINT))
    }
}

impl TryFrom<f64> for Points {
    type Error = PointsConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let units = (value * UNITS_PER_POINT as f64).round();
        if !units.is_finite() || units > i64::MAX as f64 || units < i64::MIN as f64 {
            return Err(PointsConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(units as i64))
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = UNITS_PER_POINT.unsigned_abs();
        write!(f, "{sign}{}.{:02}pts", abs / per, abs % per)
    }
}

impl Points {
    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    /// The raw number of hundredths of a point.
    pub fn units(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / UNITS_PER_POINT as f64
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `None` if the result does not fit.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Totals the amounts, or `None` if the total does not fit.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts.into_iter().try_fold(Self::default(), Self::checked_add)
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::try_from(value).map_err(D::Error::custom)
    }
}

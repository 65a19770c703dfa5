//! Review points measured in exact half-point units.

use std::fmt;

use super::error::PipelineDomainError;

/// Accumulated review points for a single artifact category.
///
/// Review weights are multiples of one half (a model review contributes
/// 0.5, a human review 1.0), so points are stored as a whole number of
/// half-point units. Totals therefore compare exactly against stage
/// thresholds with no floating-point drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Points(u32);

impl Points {
    /// The zero score every idea starts from.
    pub const ZERO: Self = Self(0);

    /// Creates a points value from a count of half-point units.
    #[must_use]
    pub const fn from_half_points(units: u32) -> Self {
        Self(units)
    }

    /// Returns the count of half-point units.
    #[must_use]
    pub const fn half_points(self) -> u32 {
        self.0
    }

    /// Parses a decimal points value, accepting only non-negative
    /// multiples of 0.5.
    ///
    /// Decimal values appear at configuration and wire boundaries; all
    /// internal arithmetic stays in half-point units.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidPointsValue`] when the value
    /// is negative, non-finite, not a multiple of 0.5, or too large to
    /// represent.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "decimal input is converted to half-point units once at this boundary"
    )]
    pub fn try_from_f64(value: f64) -> Result<Self, PipelineDomainError> {
        if !value.is_finite() || value < 0.0 {
            return Err(PipelineDomainError::InvalidPointsValue { value });
        }
        let doubled = value * 2.0;
        if doubled.fract() != 0.0 || doubled > u32::MAX as f64 {
            return Err(PipelineDomainError::InvalidPointsValue { value });
        }
        Ok(Self(doubled as u32))
    }

    /// Returns the decimal rendering of the points value.
    #[expect(
        clippy::float_arithmetic,
        reason = "half-point units convert exactly to a binary fraction"
    )]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    /// Adds two points values, saturating at the representable maximum.
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Reports whether this total satisfies the given threshold.
    #[must_use]
    pub const fn meets(self, threshold: Self) -> bool {
        self.0 >= threshold.0
    }
}

impl fmt::Display for Points {
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "half-point units split exactly into whole and fractional digits"
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 2;
        if self.0 % 2 == 0 {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.5")
        }
    }
}

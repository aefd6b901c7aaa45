//! Unit-of-measure rounding for stock quantities.

use core::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Rounding precision of a unit of measure (e.g. `1` for units, `0.001` for kg).
///
/// Quantity comparisons in the consumption workflow always go through the
/// product's rounding: two quantities closer than half a rounding step are equal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct UomRounding(Decimal);

impl UomRounding {
    /// Rounding of countable units.
    pub const UNIT: UomRounding = UomRounding(Decimal::ONE);

    pub fn new(precision: Decimal) -> DomainResult<Self> {
        if precision <= Decimal::ZERO {
            return Err(DomainError::validation("uom rounding must be positive"));
        }
        Ok(Self(precision))
    }

    pub fn precision(&self) -> Decimal {
        self.0
    }

    /// Round `qty` to the nearest multiple of the precision (half away from zero).
    pub fn round(&self, qty: Decimal) -> Decimal {
        let steps = (qty / self.0).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        (steps * self.0).normalize()
    }

    pub fn is_zero(&self, qty: Decimal) -> bool {
        self.round(qty).is_zero()
    }

    /// Compare two quantities at this precision.
    pub fn compare(&self, a: Decimal, b: Decimal) -> Ordering {
        let delta = a - b;
        if self.is_zero(delta) {
            Ordering::Equal
        } else if delta.is_sign_negative() {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

impl TryFrom<Decimal> for UomRounding {
    type Error = DomainError;

    fn try_from(precision: Decimal) -> Result<Self, Self::Error> {
        Self::new(precision)
    }
}

impl From<UomRounding> for Decimal {
    fn from(rounding: UomRounding) -> Self {
        rounding.0
    }
}

impl Default for UomRounding {
    fn default() -> Self {
        Self::UNIT
    }
}

impl ValueObject for UomRounding {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounding_must_be_positive() {
        assert!(UomRounding::new(dec!(0)).is_err());
        assert!(UomRounding::new(dec!(-0.01)).is_err());
        assert!(UomRounding::new(dec!(0.01)).is_ok());
    }

    #[test]
    fn deserialization_rejects_non_positive_rounding() {
        assert!(serde_json::from_str::<UomRounding>("\"0\"").is_err());
        assert!(serde_json::from_str::<UomRounding>("\"-1\"").is_err());

        let kg: UomRounding = serde_json::from_str("\"0.001\"").unwrap();
        assert_eq!(kg.precision(), dec!(0.001));
        assert_eq!(serde_json::to_string(&kg).unwrap(), "\"0.001\"");
    }

    #[test]
    fn sub_precision_noise_compares_equal() {
        let kg = UomRounding::new(dec!(0.01)).unwrap();
        assert!(kg.is_zero(dec!(0.004)));
        assert!(!kg.is_zero(dec!(0.005)));
        assert_eq!(kg.compare(dec!(1.001), dec!(1.0)), Ordering::Equal);
        assert_eq!(kg.compare(dec!(0.98), dec!(1.0)), Ordering::Less);
        assert_eq!(kg.compare(dec!(1.02), dec!(1.0)), Ordering::Greater);
    }

    #[test]
    fn unit_rounding_rounds_half_away_from_zero() {
        assert_eq!(UomRounding::UNIT.round(dec!(2.5)), dec!(3));
        assert_eq!(UomRounding::UNIT.round(dec!(-2.5)), dec!(-3));
        assert_eq!(UomRounding::UNIT.round(dec!(2.4)), dec!(2));
    }

    proptest! {
        #[test]
        fn compare_is_antisymmetric(a in -100_000i64..100_000, b in -100_000i64..100_000) {
            let r = UomRounding::new(dec!(0.01)).unwrap();
            let a = Decimal::new(a, 3);
            let b = Decimal::new(b, 3);
            prop_assert_eq!(r.compare(a, b), r.compare(b, a).reverse());
        }
    }
}

//! Macro aggregation
//!
//! Converts weighed food portions (per-100 g facts) into absolute totals
//! and a normalized per-100 g profile.

use serde::{Deserialize, Serialize};

use super::{round_tenth, EngineError, EngineResult};
use crate::models::NutritionFact;

/// A weighed quantity of a food item carrying per-100 g nutrition facts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portion {
    pub quantity_kg: f64,
    pub facts: NutritionFact,
}

impl Portion {
    pub fn new(quantity_kg: f64, facts: NutritionFact) -> Self {
        Self { quantity_kg, facts }
    }
}

/// Aggregated totals for a set of portions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    /// Absolute totals, unrounded (retained at full precision for summation)
    pub total: NutritionFact,
    /// Normalized per-100 g profile, rounded to one decimal
    pub per_100g: NutritionFact,
    /// Combined weight of all portions in grams
    pub total_weight_g: f64,
}

/// Aggregate a list of weighed portions.
///
/// Each portion contributes `facts.field * quantity_kg * 10` (per-100 g
/// values scaled to the portion weight), summed per field independently.
/// The per-100 g profile divides the totals by the combined weight; an
/// empty or zero-weight input yields a zero profile rather than an error
/// so downstream averaging stays total.
pub fn aggregate(portions: &[Portion]) -> EngineResult<MacroTotals> {
    let mut total = NutritionFact::zero();
    let mut total_weight_g = 0.0;

    for (i, portion) in portions.iter().enumerate() {
        if !portion.quantity_kg.is_finite() || portion.quantity_kg <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "portion {} has non-positive quantity: {}",
                i, portion.quantity_kg
            )));
        }
        if !portion.facts.is_valid() {
            return Err(EngineError::InvalidInput(format!(
                "portion {} has a negative or non-finite nutrition fact",
                i
            )));
        }

        // quantity_kg * 1000 / 100 grams of "per-100g units"
        total = total + portion.facts.scale(portion.quantity_kg * 10.0);
        total_weight_g += portion.quantity_kg * 1000.0;
    }

    let per_100g = if total_weight_g > 0.0 {
        let profile = total.scale(100.0 / total_weight_g);
        NutritionFact {
            kcal: round_tenth(profile.kcal),
            protein_g: round_tenth(profile.protein_g),
            fat_g: round_tenth(profile.fat_g),
            carbs_g: round_tenth(profile.carbs_g),
            fiber_g: round_tenth(profile.fiber_g),
        }
    } else {
        NutritionFact::zero()
    };

    Ok(MacroTotals {
        total,
        per_100g,
        total_weight_g,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kcal_only(kcal: f64) -> NutritionFact {
        NutritionFact {
            kcal,
            ..NutritionFact::zero()
        }
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let totals = aggregate(&[]).unwrap();
        assert_eq!(totals.total, NutritionFact::zero());
        assert_eq!(totals.per_100g, NutritionFact::zero());
        assert_eq!(totals.total_weight_g, 0.0);
    }

    #[test]
    fn test_three_portion_scenario() {
        // 200g chicken, 100g apple, 50g oil
        let portions = vec![
            Portion::new(0.2, kcal_only(165.0)),
            Portion::new(0.1, kcal_only(52.0)),
            Portion::new(0.05, kcal_only(900.0)),
        ];

        let totals = aggregate(&portions).unwrap();
        // 165*2 + 52*1 + 900*0.5 = 832
        assert!((totals.total.kcal - 832.0).abs() < 1e-9);
        assert_eq!(totals.total_weight_g, 350.0);
        // 832 / 350 * 100 = 237.714... -> 237.7
        assert_eq!(totals.per_100g.kcal, 237.7);
    }

    #[test]
    fn test_all_fields_scale_independently() {
        let facts = NutritionFact {
            kcal: 100.0,
            protein_g: 10.0,
            fat_g: 5.0,
            carbs_g: 20.0,
            fiber_g: 2.5,
        };
        let totals = aggregate(&[Portion::new(0.25, facts)]).unwrap();

        assert!((totals.total.kcal - 250.0).abs() < 1e-9);
        assert!((totals.total.protein_g - 25.0).abs() < 1e-9);
        assert!((totals.total.fat_g - 12.5).abs() < 1e-9);
        assert!((totals.total.carbs_g - 50.0).abs() < 1e-9);
        assert!((totals.total.fiber_g - 6.25).abs() < 1e-9);
        // A single portion's per-100g profile is its own facts
        assert_eq!(totals.per_100g, facts);
    }

    #[test]
    fn test_linearity_in_quantity() {
        let facts = NutritionFact {
            kcal: 120.0,
            protein_g: 8.0,
            fat_g: 3.0,
            carbs_g: 15.0,
            fiber_g: 1.0,
        };
        let base = aggregate(&[Portion::new(0.3, facts)]).unwrap();
        let tripled = aggregate(&[Portion::new(0.9, facts)]).unwrap();

        assert!((tripled.total.kcal - base.total.kcal * 3.0).abs() < 1e-9);
        assert!((tripled.total.protein_g - base.total.protein_g * 3.0).abs() < 1e-9);
        assert_eq!(tripled.total_weight_g, base.total_weight_g * 3.0);
        // per-100g is scale invariant
        assert_eq!(tripled.per_100g, base.per_100g);
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        assert!(aggregate(&[Portion::new(0.0, kcal_only(100.0))]).is_err());
        assert!(aggregate(&[Portion::new(-0.1, kcal_only(100.0))]).is_err());
        assert!(aggregate(&[Portion::new(f64::NAN, kcal_only(100.0))]).is_err());
    }

    #[test]
    fn test_rejects_negative_facts() {
        let bad = NutritionFact {
            protein_g: -1.0,
            ..NutritionFact::zero()
        };
        assert!(matches!(
            aggregate(&[Portion::new(0.1, bad)]),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_facts_contribute_zero() {
        // Absent catalog fields deserialize to 0 and simply add nothing
        let portions = vec![
            Portion::new(0.1, kcal_only(52.0)),
            Portion::new(0.2, NutritionFact::zero()),
        ];
        let totals = aggregate(&portions).unwrap();
        assert!((totals.total.kcal - 52.0).abs() < 1e-9);
        assert_eq!(totals.total.protein_g, 0.0);
        assert_eq!(totals.total_weight_g, 300.0);
    }

    #[test]
    fn test_per_100g_rounding() {
        // 832/350*100 = 237.714..., one decimal, half away from zero
        let totals = aggregate(&[Portion::new(0.35, kcal_only(237.714285714))]).unwrap();
        assert_eq!(totals.per_100g.kcal, 237.7);
    }
}

//! Shared nutrition data structure
//!
//! Used across catalog ingredients, meals, logged entries, and ledgers.
//! Catalog values are stored per 100 g; logged entries store absolute
//! totals in the same shape.

use serde::{Deserialize, Serialize};

/// Nutrition facts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFact {
    #[serde(default)]
    pub kcal: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
}

impl NutritionFact {
    /// Create a new NutritionFact with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            kcal: self.kcal * multiplier,
            protein_g: self.protein_g * multiplier,
            fat_g: self.fat_g * multiplier,
            carbs_g: self.carbs_g * multiplier,
            fiber_g: self.fiber_g * multiplier,
        }
    }

    /// Add another nutrition fact to this one
    pub fn add(&self, other: &NutritionFact) -> Self {
        Self {
            kcal: self.kcal + other.kcal,
            protein_g: self.protein_g + other.protein_g,
            fat_g: self.fat_g + other.fat_g,
            carbs_g: self.carbs_g + other.carbs_g,
            fiber_g: self.fiber_g + other.fiber_g,
        }
    }

    /// True if every field is a finite, non-negative number
    pub fn is_valid(&self) -> bool {
        [self.kcal, self.protein_g, self.fat_g, self.carbs_g, self.fiber_g]
            .into_iter()
            .all(|v| v.is_finite() && v >= 0.0)
    }
}

impl std::ops::Add for NutritionFact {
    type Output = NutritionFact;

    fn add(self, other: NutritionFact) -> NutritionFact {
        NutritionFact::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for NutritionFact {
    type Output = NutritionFact;

    fn mul(self, multiplier: f64) -> NutritionFact {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for NutritionFact {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NutritionFact::zero(), |acc, n| acc + n)
    }
}

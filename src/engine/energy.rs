//! Energy expenditure estimation
//!
//! Converts a logged activity occurrence (duration or repetitions) plus a
//! MET rating and body weight into a burned-calorie estimate.
//!
//! Formula: `kcal = MET * 3.5 * weight_kg / 200 * minutes`. Rep-mode
//! records derive minutes from a configurable seconds-per-rep; intensity
//! scales the effective MET (never the seconds-per-rep, so there is a
//! single scaling axis).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{round_tenth, EngineError, EngineResult};

/// Default seconds per repetition when no category override applies
pub const BASE_SECONDS_PER_REP: f64 = 3.5;

/// MET scale factors for intensity levels 1..=5 (level 3 is neutral)
pub const INTENSITY_MET_SCALE: [f64; 5] = [0.8, 0.9, 1.0, 1.1, 1.2];

/// Intensity level used when a record does not supply one
pub const DEFAULT_INTENSITY_LEVEL: u8 = 3;

/// Injected configuration for the energy calculator.
///
/// Owned by the service and passed into every estimate so per-deployment
/// tables (seconds-per-rep overrides, intensity scale, optional weight
/// fallback) can be swapped without touching the math.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Seconds per rep when the activity category has no override
    pub base_seconds_per_rep: f64,
    /// Per-category seconds-per-rep overrides (e.g., "strength" reps take longer)
    pub category_seconds_per_rep: HashMap<String, f64>,
    /// MET multipliers for intensity levels 1..=5
    pub intensity_met_scale: [f64; 5],
    /// Body-weight fallback for records without one; None means a missing
    /// weight is an error
    pub default_weight_kg: Option<f64>,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        let mut category_seconds_per_rep = HashMap::new();
        category_seconds_per_rep.insert("strength".to_string(), 5.0);
        category_seconds_per_rep.insert("hiit".to_string(), 2.5);

        Self {
            base_seconds_per_rep: BASE_SECONDS_PER_REP,
            category_seconds_per_rep,
            intensity_met_scale: INTENSITY_MET_SCALE,
            default_weight_kg: None,
        }
    }
}

impl EnergyConfig {
    /// Seconds per rep for an activity category
    pub fn seconds_per_rep(&self, category: Option<&str>) -> f64 {
        category
            .and_then(|c| self.category_seconds_per_rep.get(c).copied())
            .unwrap_or(self.base_seconds_per_rep)
    }
}

/// The engine's view of an activity definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySpec {
    pub met_value: f64,
    pub supports_rep: bool,
    pub supports_hour: bool,
    pub category: Option<String>,
}

/// One logged occurrence of an activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Effort {
    pub duration_minutes: Option<f64>,
    pub reps: Option<f64>,
    pub intensity_level: Option<u8>,
    pub weight_kg: Option<f64>,
}

/// Outcome of an energy estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyEstimate {
    /// Burned calories, rounded to one decimal
    pub kcal_burned: f64,
    /// Effective minutes used in the formula (derived for rep mode)
    pub minutes: f64,
    /// Body weight the estimate was computed with
    pub weight_kg: f64,
}

/// Estimate calories burned for one activity record.
///
/// Mode mismatches (reps supplied for an hour-mode activity and vice
/// versa), non-positive MET or weight, and out-of-range intensity are
/// errors, never a silent 0.
pub fn estimate_kcal_burned(
    activity: &ActivitySpec,
    effort: &Effort,
    config: &EnergyConfig,
) -> EngineResult<EnergyEstimate> {
    if activity.supports_rep == activity.supports_hour {
        return Err(EngineError::InconsistentActivity(
            "activity must declare exactly one of rep or hour mode".to_string(),
        ));
    }
    if !activity.met_value.is_finite() || activity.met_value <= 0.0 {
        return Err(EngineError::InvalidActivityRecord(format!(
            "MET value must be positive, got {}",
            activity.met_value
        )));
    }

    let weight_kg = match effort.weight_kg.or(config.default_weight_kg) {
        Some(w) if w.is_finite() && w > 0.0 => w,
        Some(w) => {
            return Err(EngineError::InvalidActivityRecord(format!(
                "body weight must be positive, got {}",
                w
            )))
        }
        None => {
            return Err(EngineError::InvalidActivityRecord(
                "no body weight on record and no configured default".to_string(),
            ))
        }
    };

    let level = effort.intensity_level.unwrap_or(DEFAULT_INTENSITY_LEVEL);
    if !(1..=5).contains(&level) {
        return Err(EngineError::InvalidActivityRecord(format!(
            "intensity level must be 1..=5, got {}",
            level
        )));
    }
    let met = activity.met_value * config.intensity_met_scale[(level - 1) as usize];

    let minutes = if activity.supports_hour {
        if effort.reps.is_some() {
            return Err(EngineError::InvalidActivityRecord(
                "reps supplied for a duration-mode activity".to_string(),
            ));
        }
        match effort.duration_minutes {
            Some(m) if m.is_finite() && m >= 0.0 => m,
            Some(m) => {
                return Err(EngineError::InvalidActivityRecord(format!(
                    "duration must be a non-negative number, got {}",
                    m
                )))
            }
            None => {
                return Err(EngineError::InvalidActivityRecord(
                    "duration-mode activity requires duration_minutes".to_string(),
                ))
            }
        }
    } else {
        if effort.duration_minutes.is_some() {
            return Err(EngineError::InvalidActivityRecord(
                "duration supplied for a rep-mode activity".to_string(),
            ));
        }
        let reps = match effort.reps {
            Some(r) if r.is_finite() && r >= 0.0 => r,
            Some(r) => {
                return Err(EngineError::InvalidActivityRecord(format!(
                    "reps must be a non-negative number, got {}",
                    r
                )))
            }
            None => {
                return Err(EngineError::InvalidActivityRecord(
                    "rep-mode activity requires reps".to_string(),
                ))
            }
        };
        reps * config.seconds_per_rep(activity.category.as_deref()) / 60.0
    };

    let kcal = met * 3.5 * weight_kg / 200.0 * minutes;
    if !kcal.is_finite() {
        return Err(EngineError::InvalidActivityRecord(
            "energy estimate overflowed to a non-finite value".to_string(),
        ));
    }

    Ok(EnergyEstimate {
        kcal_burned: round_tenth(kcal),
        minutes,
        weight_kg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour_activity(met: f64) -> ActivitySpec {
        ActivitySpec {
            met_value: met,
            supports_rep: false,
            supports_hour: true,
            category: None,
        }
    }

    fn rep_activity(met: f64, category: Option<&str>) -> ActivitySpec {
        ActivitySpec {
            met_value: met,
            supports_rep: true,
            supports_hour: false,
            category: category.map(String::from),
        }
    }

    #[test]
    fn test_duration_mode_reference_scenario() {
        // MET=8, 70kg, 30min -> 8 * 3.5 * 70 / 200 * 30 = 294
        let effort = Effort {
            duration_minutes: Some(30.0),
            weight_kg: Some(70.0),
            ..Effort::default()
        };
        let est = estimate_kcal_burned(&hour_activity(8.0), &effort, &EnergyConfig::default())
            .unwrap();
        assert_eq!(est.kcal_burned, 294.0);
        assert_eq!(est.minutes, 30.0);
        assert_eq!(est.weight_kg, 70.0);
    }

    #[test]
    fn test_rep_mode_uses_base_seconds_per_rep() {
        // 120 reps * 3.5s / 60 = 7 minutes; MET=6, 80kg
        // 6 * 3.5 * 80 / 200 * 7 = 58.8
        let effort = Effort {
            reps: Some(120.0),
            weight_kg: Some(80.0),
            ..Effort::default()
        };
        let est = estimate_kcal_burned(&rep_activity(6.0, None), &effort, &EnergyConfig::default())
            .unwrap();
        assert_eq!(est.minutes, 7.0);
        assert_eq!(est.kcal_burned, 58.8);
    }

    #[test]
    fn test_rep_mode_category_override() {
        // Strength reps take 5.0s by default config: 60 reps -> 5 minutes
        let effort = Effort {
            reps: Some(60.0),
            weight_kg: Some(80.0),
            ..Effort::default()
        };
        let est = estimate_kcal_burned(
            &rep_activity(6.0, Some("strength")),
            &effort,
            &EnergyConfig::default(),
        )
        .unwrap();
        assert_eq!(est.minutes, 5.0);
    }

    #[test]
    fn test_intensity_scales_met() {
        let base = Effort {
            duration_minutes: Some(30.0),
            weight_kg: Some(70.0),
            intensity_level: Some(3),
            ..Effort::default()
        };
        let hard = Effort {
            intensity_level: Some(5),
            ..base.clone()
        };
        let config = EnergyConfig::default();
        let activity = hour_activity(8.0);

        let at3 = estimate_kcal_burned(&activity, &base, &config).unwrap();
        let at5 = estimate_kcal_burned(&activity, &hard, &config).unwrap();
        assert_eq!(at3.kcal_burned, 294.0);
        assert_eq!(at5.kcal_burned, round_tenth(294.0 * 1.2));
    }

    #[test]
    fn test_missing_intensity_defaults_to_midpoint() {
        let explicit = Effort {
            duration_minutes: Some(30.0),
            weight_kg: Some(70.0),
            intensity_level: Some(3),
            ..Effort::default()
        };
        let omitted = Effort {
            intensity_level: None,
            ..explicit.clone()
        };
        let config = EnergyConfig::default();
        let activity = hour_activity(8.0);
        assert_eq!(
            estimate_kcal_burned(&activity, &explicit, &config).unwrap(),
            estimate_kcal_burned(&activity, &omitted, &config).unwrap()
        );
    }

    #[test]
    fn test_mode_mismatch_is_an_error() {
        let config = EnergyConfig::default();

        let reps_for_hour = Effort {
            reps: Some(20.0),
            weight_kg: Some(70.0),
            ..Effort::default()
        };
        assert!(matches!(
            estimate_kcal_burned(&hour_activity(8.0), &reps_for_hour, &config),
            Err(EngineError::InvalidActivityRecord(_))
        ));

        let duration_for_rep = Effort {
            duration_minutes: Some(30.0),
            weight_kg: Some(70.0),
            ..Effort::default()
        };
        assert!(matches!(
            estimate_kcal_burned(&rep_activity(6.0, None), &duration_for_rep, &config),
            Err(EngineError::InvalidActivityRecord(_))
        ));
    }

    #[test]
    fn test_both_or_neither_mode_flag_is_inconsistent() {
        let config = EnergyConfig::default();
        let effort = Effort {
            duration_minutes: Some(10.0),
            weight_kg: Some(70.0),
            ..Effort::default()
        };

        let both = ActivitySpec {
            met_value: 5.0,
            supports_rep: true,
            supports_hour: true,
            category: None,
        };
        assert!(matches!(
            estimate_kcal_burned(&both, &effort, &config),
            Err(EngineError::InconsistentActivity(_))
        ));

        let neither = ActivitySpec {
            met_value: 5.0,
            supports_rep: false,
            supports_hour: false,
            category: None,
        };
        assert!(matches!(
            estimate_kcal_burned(&neither, &effort, &config),
            Err(EngineError::InconsistentActivity(_))
        ));
    }

    #[test]
    fn test_non_positive_met_and_weight_rejected() {
        let config = EnergyConfig::default();
        let effort = Effort {
            duration_minutes: Some(30.0),
            weight_kg: Some(70.0),
            ..Effort::default()
        };
        assert!(estimate_kcal_burned(&hour_activity(0.0), &effort, &config).is_err());
        assert!(estimate_kcal_burned(&hour_activity(-2.0), &effort, &config).is_err());

        let weightless = Effort {
            duration_minutes: Some(30.0),
            weight_kg: Some(0.0),
            ..Effort::default()
        };
        assert!(estimate_kcal_burned(&hour_activity(8.0), &weightless, &config).is_err());
    }

    #[test]
    fn test_missing_weight_requires_configured_default() {
        let effort = Effort {
            duration_minutes: Some(30.0),
            ..Effort::default()
        };
        let activity = hour_activity(8.0);

        // No record weight, no configured fallback: error
        assert!(matches!(
            estimate_kcal_burned(&activity, &effort, &EnergyConfig::default()),
            Err(EngineError::InvalidActivityRecord(_))
        ));

        // Configured fallback is substituted
        let config = EnergyConfig {
            default_weight_kg: Some(70.0),
            ..EnergyConfig::default()
        };
        let est = estimate_kcal_burned(&activity, &effort, &config).unwrap();
        assert_eq!(est.kcal_burned, 294.0);
        assert_eq!(est.weight_kg, 70.0);
    }

    #[test]
    fn test_out_of_range_intensity_rejected() {
        let effort = Effort {
            duration_minutes: Some(30.0),
            weight_kg: Some(70.0),
            intensity_level: Some(6),
            ..Effort::default()
        };
        assert!(
            estimate_kcal_burned(&hour_activity(8.0), &effort, &EnergyConfig::default()).is_err()
        );
    }
}

//! Challenge progress scoring
//!
//! Accumulates activity-record contributions against a challenge's target
//! metrics and reports a bounded completion percentage. A challenge with
//! several targets is only as complete as its least-satisfied metric.

use serde::{Deserialize, Serialize};

use super::round_tenth;

/// The closed set of metrics a challenge target can score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMetric {
    DurationMinutes,
    KcalBurned,
}

impl TargetMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetMetric::DurationMinutes => "duration_minutes",
            TargetMetric::KcalBurned => "kcal_burned",
        }
    }
}

/// A challenge's required thresholds, one slot per supported metric.
///
/// A metric participates in scoring only when its threshold is a finite
/// number greater than zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChallengeTarget {
    pub duration_minutes: Option<f64>,
    pub kcal_burned: Option<f64>,
}

impl ChallengeTarget {
    fn threshold(&self, metric: TargetMetric) -> Option<f64> {
        match metric {
            TargetMetric::DurationMinutes => self.duration_minutes,
            TargetMetric::KcalBurned => self.kcal_burned,
        }
    }

    /// Metrics whose threshold qualifies for scoring
    pub fn qualifying(&self) -> Vec<(TargetMetric, f64)> {
        [TargetMetric::DurationMinutes, TargetMetric::KcalBurned]
            .into_iter()
            .filter_map(|m| {
                self.threshold(m)
                    .filter(|t| t.is_finite() && *t > 0.0)
                    .map(|t| (m, t))
            })
            .collect()
    }
}

/// One activity record's contribution to challenge metrics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetricSample {
    pub duration_minutes: f64,
    pub kcal_burned: f64,
}

impl MetricSample {
    fn value(&self, metric: TargetMetric) -> f64 {
        match metric {
            TargetMetric::DurationMinutes => self.duration_minutes,
            TargetMetric::KcalBurned => self.kcal_burned,
        }
    }
}

/// Per-metric progress snapshot
#[derive(Debug, Clone, Serialize)]
pub struct MetricProgress {
    pub metric: TargetMetric,
    pub achieved: f64,
    pub target: f64,
    pub percent: f64,
}

/// Stateful accumulator for one scoring request.
///
/// Short-lived and single-threaded; duplicate `add` calls double-count by
/// design (de-duplication is the caller's concern, keyed by record id).
#[derive(Debug, Clone)]
pub struct ProgressAccumulator {
    targets: Vec<(TargetMetric, f64)>,
    achieved: Vec<f64>,
}

impl ProgressAccumulator {
    /// Capture the qualifying metrics of a target template
    pub fn new(target: &ChallengeTarget) -> Self {
        let targets = target.qualifying();
        let achieved = vec![0.0; targets.len()];
        Self { targets, achieved }
    }

    /// True if no metric qualifies for scoring
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Accumulate one record's contribution.
    ///
    /// A non-finite or non-positive value contributes 0 for that metric
    /// only; the record still counts toward the others.
    pub fn add(&mut self, sample: &MetricSample) {
        for (i, (metric, _)) in self.targets.iter().enumerate() {
            let value = sample.value(*metric);
            if value.is_finite() && value > 0.0 {
                self.achieved[i] += value;
            }
        }
    }

    /// Completion percentage in [0, 100], rounded to one decimal.
    ///
    /// The minimum across qualifying metrics governs; no qualifying
    /// metrics means 0, never 100.
    pub fn percent(&self) -> f64 {
        let mut worst: Option<f64> = None;
        for (i, (_, target)) in self.targets.iter().enumerate() {
            let pct = (self.achieved[i] / target * 100.0).min(100.0);
            worst = Some(match worst {
                Some(w) => w.min(pct),
                None => pct,
            });
        }
        match worst {
            Some(p) => round_tenth(p),
            None => 0.0,
        }
    }

    /// Per-metric breakdown for reporting
    pub fn breakdown(&self) -> Vec<MetricProgress> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, (metric, target))| MetricProgress {
                metric: *metric,
                achieved: self.achieved[i],
                target: *target,
                percent: round_tenth((self.achieved[i] / target * 100.0).min(100.0)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_semantics_minimum_governs() {
        let target = ChallengeTarget {
            duration_minutes: Some(30.0),
            kcal_burned: Some(300.0),
        };
        let mut acc = ProgressAccumulator::new(&target);
        acc.add(&MetricSample {
            duration_minutes: 30.0,
            kcal_burned: 0.0,
        });
        // Duration fully met, kcal untouched: least-satisfied metric wins
        assert_eq!(acc.percent(), 0.0);
    }

    #[test]
    fn test_zero_target_metric_is_excluded() {
        let target = ChallengeTarget {
            duration_minutes: Some(0.0),
            kcal_burned: Some(200.0),
        };
        let mut acc = ProgressAccumulator::new(&target);
        acc.add(&MetricSample {
            duration_minutes: 0.0,
            kcal_burned: 200.0,
        });
        assert_eq!(acc.percent(), 100.0);
    }

    #[test]
    fn test_no_qualifying_metric_is_always_zero() {
        let target = ChallengeTarget {
            duration_minutes: Some(0.0),
            kcal_burned: None,
        };
        let mut acc = ProgressAccumulator::new(&target);
        assert!(acc.is_empty());
        assert_eq!(acc.percent(), 0.0);

        acc.add(&MetricSample {
            duration_minutes: 500.0,
            kcal_burned: 500.0,
        });
        assert_eq!(acc.percent(), 0.0);
    }

    #[test]
    fn test_non_finite_target_is_excluded() {
        let target = ChallengeTarget {
            duration_minutes: Some(f64::INFINITY),
            kcal_burned: Some(100.0),
        };
        let acc = ProgressAccumulator::new(&target);
        assert_eq!(acc.breakdown().len(), 1);
    }

    #[test]
    fn test_monotone_in_added_records() {
        let target = ChallengeTarget {
            duration_minutes: Some(60.0),
            kcal_burned: Some(600.0),
        };
        let mut acc = ProgressAccumulator::new(&target);
        let mut last = acc.percent();
        for _ in 0..5 {
            acc.add(&MetricSample {
                duration_minutes: 10.0,
                kcal_burned: 90.0,
            });
            let now = acc.percent();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_clamped_at_100() {
        let target = ChallengeTarget {
            duration_minutes: Some(10.0),
            kcal_burned: None,
        };
        let mut acc = ProgressAccumulator::new(&target);
        acc.add(&MetricSample {
            duration_minutes: 500.0,
            kcal_burned: 0.0,
        });
        assert_eq!(acc.percent(), 100.0);
    }

    #[test]
    fn test_non_positive_sample_contributes_zero_per_metric() {
        let target = ChallengeTarget {
            duration_minutes: Some(30.0),
            kcal_burned: Some(300.0),
        };
        let mut acc = ProgressAccumulator::new(&target);
        // Negative duration is ignored for that metric, kcal still counts
        acc.add(&MetricSample {
            duration_minutes: -15.0,
            kcal_burned: 150.0,
        });
        let breakdown = acc.breakdown();
        assert_eq!(breakdown[0].achieved, 0.0);
        assert_eq!(breakdown[1].achieved, 150.0);
        assert_eq!(acc.percent(), 0.0);
    }

    #[test]
    fn test_duplicate_adds_double_count() {
        let target = ChallengeTarget {
            duration_minutes: Some(40.0),
            kcal_burned: None,
        };
        let mut acc = ProgressAccumulator::new(&target);
        let sample = MetricSample {
            duration_minutes: 10.0,
            kcal_burned: 0.0,
        };
        acc.add(&sample);
        acc.add(&sample);
        assert_eq!(acc.percent(), 50.0);
    }

    #[test]
    fn test_percent_is_repeatable() {
        let target = ChallengeTarget {
            duration_minutes: Some(30.0),
            kcal_burned: None,
        };
        let mut acc = ProgressAccumulator::new(&target);
        acc.add(&MetricSample {
            duration_minutes: 10.0,
            kcal_burned: 0.0,
        });
        assert_eq!(acc.percent(), acc.percent());
    }

    #[test]
    fn test_percent_rounded_to_one_decimal() {
        let target = ChallengeTarget {
            duration_minutes: Some(70.0),
            kcal_burned: None,
        };
        let mut acc = ProgressAccumulator::new(&target);
        acc.add(&MetricSample {
            duration_minutes: 10.0,
            kcal_burned: 0.0,
        });
        // 10/70*100 = 14.2857... -> 14.3
        assert_eq!(acc.percent(), 14.3);
    }
}

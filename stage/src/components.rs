use serde::{Deserialize, Serialize};

use crate::StageError;

/// Thresholds of the projection rank heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Minimum cumulative explained variance (default: 0.70).
    pub variance_threshold: f64,
    /// Marginal gain below which one more component is not worth it
    /// (default: 0.05).
    pub increment_threshold: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            variance_threshold: 0.70,
            increment_threshold: 0.05,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), StageError> {
        for (name, v) in [
            ("variance_threshold", self.variance_threshold),
            ("increment_threshold", self.increment_threshold),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(StageError::InvalidModel(format!(
                    "{name} must be in (0, 1], got {v}"
                )));
            }
        }
        Ok(())
    }

    pub fn select(&self, cumulative: &[f64]) -> usize {
        select_components(cumulative, self.variance_threshold, self.increment_threshold)
    }
}

/// Picks the projection rank from a cumulative explained-variance sequence.
///
/// Returns `i + 1` for the first index `i` whose cumulative variance reaches
/// `variance_threshold` while the next component adds less than
/// `increment_threshold`. Falls through to the full length when no index
/// qualifies. Never returns 0.
pub fn select_components(
    cumulative: &[f64],
    variance_threshold: f64,
    increment_threshold: f64,
) -> usize {
    let n = cumulative.len();
    for i in 0..n.saturating_sub(1) {
        let next_increment = cumulative[i + 1] - cumulative[i];
        if cumulative[i] >= variance_threshold && next_increment < increment_threshold {
            return i + 1;
        }
    }
    n.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knee_after_threshold() {
        let cum = [0.3, 0.5, 0.72, 0.76, 0.95, 1.0];
        assert_eq!(select_components(&cum, 0.70, 0.05), 3);
    }

    #[test]
    fn test_full_rank_when_increments_stay_large() {
        let cum = [0.4, 0.72, 0.82, 0.92, 1.0];
        assert_eq!(select_components(&cum, 0.70, 0.05), 5);
    }

    #[test]
    fn test_threshold_not_reached_until_end() {
        let cum = [0.2, 0.4, 0.6, 1.0];
        assert_eq!(select_components(&cum, 0.70, 0.05), 4);
    }

    #[test]
    fn test_first_component_suffices() {
        let cum = [0.98, 0.99, 1.0];
        assert_eq!(select_components(&cum, 0.70, 0.05), 1);
    }

    #[test]
    fn test_never_zero() {
        assert_eq!(select_components(&[1.0], 0.70, 0.05), 1);
        assert_eq!(select_components(&[], 0.70, 0.05), 1);
    }

    #[test]
    fn test_config_default_and_validate() {
        let cfg = SelectionConfig::default();
        assert_eq!(cfg.select(&[0.3, 0.5, 0.72, 0.76, 0.95, 1.0]), 3);
        assert!(cfg.validate().is_ok());
        let bad = SelectionConfig {
            variance_threshold: 0.0,
            ..cfg
        };
        assert!(bad.validate().is_err());
    }
}

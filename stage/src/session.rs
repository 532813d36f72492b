use serde::{Deserialize, Serialize};

use crate::{Label, StageError};

/// Final outcome of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum Decision {
    Male { confidence: f64 },
    Female { confidence: f64 },
    /// Mean probability exactly 0.5; the caller should re-run the session.
    Undecided,
}

impl Decision {
    /// Maps a mean class-1 probability onto a decision.
    pub fn from_mean(mean: f64) -> Self {
        if mean > 0.5 {
            Self::Male { confidence: mean }
        } else if mean < 0.5 {
            Self::Female {
                confidence: 1.0 - mean,
            }
        } else {
            Self::Undecided
        }
    }

    pub fn label(&self) -> Option<Label> {
        match self {
            Self::Male { .. } => Some(Label::Male),
            Self::Female { .. } => Some(Label::Female),
            Self::Undecided => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Self::Male { confidence } | Self::Female { confidence } => Some(*confidence),
            Self::Undecided => None,
        }
    }
}

/// Per-session running state of stage probabilities.
///
/// Owned by one session; stages are accumulated strictly in prompt order
/// and a decision is only produced once every configured stage is in.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAccumulator {
    stages: usize,
    sum: f64,
    scores: Vec<f64>,
}

impl SessionAccumulator {
    pub fn new(stages: usize) -> Self {
        Self {
            stages,
            sum: 0.0,
            scores: Vec::with_capacity(stages),
        }
    }

    pub fn stages(&self) -> usize {
        self.stages
    }

    pub fn completed(&self) -> usize {
        self.scores.len()
    }

    pub fn is_complete(&self) -> bool {
        self.scores.len() == self.stages
    }

    /// 1-based position of the next expected prompt, if any.
    pub fn next_position(&self) -> Option<usize> {
        (!self.is_complete()).then(|| self.scores.len() + 1)
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Checks that `position` (1-based) may be recorded next.
    pub fn check_next(&self, position: usize) -> Result<(), StageError> {
        if self.is_complete() {
            return Err(StageError::SessionComplete(self.stages));
        }
        let expected = self.scores.len() + 1;
        if position != expected {
            return Err(StageError::StageOutOfOrder {
                expected,
                got: position,
            });
        }
        Ok(())
    }

    /// Adds the probability of stage `position` (1-based).
    pub fn update(&mut self, position: usize, probability: f64) -> Result<(), StageError> {
        self.check_next(position)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(StageError::InvalidProbability(probability));
        }
        self.sum += probability;
        self.scores.push(probability);
        Ok(())
    }

    /// Mean probability over all configured stages and its decision.
    pub fn finalize(&self) -> Result<Decision, StageError> {
        if !self.is_complete() || self.stages == 0 {
            return Err(StageError::IncompleteSession {
                completed: self.scores.len(),
                required: self.stages,
            });
        }
        let mean = self.sum / self.stages as f64;
        tracing::debug!(mean, stages = self.stages, "stage: session finalized");
        Ok(Decision::from_mean(mean))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(probs: &[f64]) -> Result<Decision, StageError> {
        let mut acc = SessionAccumulator::new(6);
        for (i, &p) in probs.iter().enumerate() {
            acc.update(i + 1, p)?;
        }
        acc.finalize()
    }

    #[test]
    fn test_male_decision() {
        let d = run(&[0.9, 0.8, 0.7, 0.6, 0.55, 0.51]).unwrap();
        match d {
            Decision::Male { confidence } => assert!((confidence - 0.676_666).abs() < 1e-5),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(d.label(), Some(Label::Male));
    }

    #[test]
    fn test_exact_half_is_undecided() {
        let d = run(&[0.5; 6]).unwrap();
        assert_eq!(d, Decision::Undecided);
        assert_eq!(d.label(), None);
        assert_eq!(d.confidence(), None);
    }

    #[test]
    fn test_female_decision() {
        let d = run(&[0.1, 0.2, 0.1, 0.0, 0.3, 0.2]).unwrap();
        match d {
            Decision::Female { confidence } => assert!((confidence - 0.85).abs() < 1e-12),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_partial_session_fails() {
        let err = run(&[0.9, 0.8, 0.7]).unwrap_err();
        assert!(matches!(
            err,
            StageError::IncompleteSession {
                completed: 3,
                required: 6
            }
        ));
    }

    #[test]
    fn test_order_and_overflow() {
        let mut acc = SessionAccumulator::new(2);
        assert!(matches!(
            acc.update(2, 0.4),
            Err(StageError::StageOutOfOrder { expected: 1, got: 2 })
        ));
        acc.update(1, 0.4).unwrap();
        assert_eq!(acc.next_position(), Some(2));
        acc.update(2, 0.4).unwrap();
        assert_eq!(acc.next_position(), None);
        assert!(matches!(acc.update(3, 0.4), Err(StageError::SessionComplete(2))));
        assert_eq!(acc.completed(), 2);
    }

    #[test]
    fn test_invalid_probability_leaves_state() {
        let mut acc = SessionAccumulator::new(6);
        assert!(acc.update(1, 1.5).is_err());
        assert!(acc.update(1, f64::NAN).is_err());
        assert_eq!(acc.completed(), 0);
    }

    #[test]
    fn test_decision_serde() {
        let json = serde_json::to_string(&Decision::Female { confidence: 0.75 }).unwrap();
        assert_eq!(json, r#"{"decision":"female","confidence":0.75}"#);
        let json = serde_json::to_string(&Decision::Undecided).unwrap();
        assert_eq!(json, r#"{"decision":"undecided"}"#);
    }
}

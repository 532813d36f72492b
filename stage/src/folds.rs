use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::StageError;

/// Cross-validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Number of folds (default: 5).
    pub folds: usize,
    /// Shuffle seed (default: 42).
    pub seed: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { folds: 5, seed: 42 }
    }
}

/// One train/test split, as indices into the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffled, class-balanced k-fold splitter for binary labels.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    folds: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(cfg: ValidationConfig) -> Result<Self, StageError> {
        if cfg.folds < 2 {
            return Err(StageError::InvalidDataset(format!(
                "cross-validation needs at least 2 folds, got {}",
                cfg.folds
            )));
        }
        Ok(Self {
            folds: cfg.folds,
            seed: cfg.seed,
        })
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Splits sample indices by label.
    ///
    /// Each class is shuffled on its own and dealt round-robin onto the
    /// folds; dealing continues where the previous class stopped so fold
    /// sizes differ by at most one. The same labels and seed always yield
    /// the same folds.
    pub fn split(&self, labels: &[u8]) -> Result<Vec<Fold>, StageError> {
        let k = self.folds;
        if labels.len() < k {
            return Err(StageError::InvalidDataset(format!(
                "{} samples cannot fill {k} folds",
                labels.len()
            )));
        }
        if labels.iter().any(|&y| y > 1) {
            return Err(StageError::InvalidDataset("labels must be 0 or 1".into()));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut fold_of = vec![0usize; labels.len()];
        let mut offset = 0;
        for class in [0u8, 1] {
            let mut members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, y)| **y == class)
                .map(|(i, _)| i)
                .collect();
            match members.len() {
                0 => {
                    return Err(StageError::InvalidDataset(format!(
                        "no samples of class {class}"
                    )));
                }
                1 => {
                    return Err(StageError::InvalidDataset(format!(
                        "class {class} has a single sample; every training fold needs both classes"
                    )));
                }
                n if n < k => {
                    tracing::warn!(
                        class,
                        members = n,
                        folds = k,
                        "stage: class has fewer members than folds"
                    );
                }
                _ => {}
            }

            members.shuffle(&mut rng);
            for (j, &i) in members.iter().enumerate() {
                fold_of[i] = (offset + j) % k;
            }
            offset = (offset + members.len()) % k;
        }

        Ok((0..k)
            .map(|f| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&i| fold_of[i] == f);
                Fold { train, test }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(zeros: usize, ones: usize) -> Vec<u8> {
        let mut y = vec![0u8; zeros];
        y.extend(std::iter::repeat_n(1u8, ones));
        y
    }

    #[test]
    fn test_folds_partition_and_stratify() {
        let y = labels(12, 8);
        let folds = StratifiedKFold::new(ValidationConfig::default())
            .unwrap()
            .split(&y)
            .unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen = vec![0; y.len()];
        for fold in &folds {
            assert_eq!(fold.test.len(), 4);
            assert_eq!(fold.train.len() + fold.test.len(), y.len());
            for &i in &fold.test {
                seen[i] += 1;
            }
            let ones = fold.test.iter().filter(|&&i| y[i] == 1).count();
            assert!((1..=2).contains(&ones));
            assert!(fold.train.iter().any(|&i| y[i] == 0));
            assert!(fold.train.iter().any(|&i| y[i] == 1));
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_seeded_determinism() {
        let y = labels(9, 11);
        let kf = StratifiedKFold::new(ValidationConfig { folds: 4, seed: 7 }).unwrap();
        assert_eq!(kf.split(&y).unwrap(), kf.split(&y).unwrap());
    }

    #[test]
    fn test_rejects_bad_datasets() {
        let kf = StratifiedKFold::new(ValidationConfig::default()).unwrap();
        assert!(kf.split(&labels(3, 0)).is_err());
        assert!(kf.split(&labels(10, 0)).is_err());
        assert!(kf.split(&labels(9, 1)).is_err());
        assert!(StratifiedKFold::new(ValidationConfig { folds: 1, seed: 0 }).is_err());
    }

    #[test]
    fn test_small_class_still_in_every_training_fold() {
        let y = labels(10, 2);
        let folds = StratifiedKFold::new(ValidationConfig::default())
            .unwrap()
            .split(&y)
            .unwrap();
        for fold in &folds {
            assert!(fold.train.iter().any(|&i| y[i] == 1));
        }
    }
}

use serde::Serialize;

use crate::{
    ArtifactStore, Dataset, LogisticClassifier, LogisticConfig, Projector, SelectionConfig,
    StageError, StageModel, Standardizer, StratifiedKFold, ValidationConfig,
};

/// Training settings shared by every position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainConfig {
    pub selection: SelectionConfig,
    pub validation: ValidationConfig,
    pub logistic: LogisticConfig,
}

/// Diagnostics of one position's training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub position: usize,
    pub samples: usize,
    pub male: usize,
    pub female: usize,
    pub features: usize,
    /// Selected projection rank.
    pub rank: usize,
    /// Cumulative explained variance at the selected rank.
    pub explained_variance: f64,
    pub fold_accuracy: Vec<f64>,
    pub mean_accuracy: f64,
}

/// A persisted-ready model with its report.
#[derive(Debug, Clone)]
pub struct TrainedStage {
    pub model: StageModel,
    pub report: StageReport,
}

/// Offline fitter of stage models.
#[derive(Debug, Clone)]
pub struct Trainer {
    cfg: TrainConfig,
}

impl Trainer {
    pub fn new(cfg: TrainConfig) -> Result<Self, StageError> {
        cfg.selection.validate()?;
        StratifiedKFold::new(cfg.validation)?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.cfg
    }

    /// Fits one position's model from its full labeled dataset.
    ///
    /// Standardizes all rows, picks the projection rank from the full-rank
    /// variance profile, refits the projector at that rank, cross-validates
    /// a classifier on the projected rows, then fits the final classifier
    /// on every projected row. Cross-validation only reports; it does not
    /// change the returned model.
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainedStage, StageError> {
        dataset.validate()?;
        let labels = dataset.classes();
        let folds = StratifiedKFold::new(self.cfg.validation)?.split(&labels)?;
        let position = dataset.position;

        let standardizer = Standardizer::fit(dataset.columns.clone(), &dataset.rows())?;
        let standardized = dataset
            .rows()
            .into_iter()
            .map(|r| standardizer.transform(r))
            .collect::<Result<Vec<_>, _>>()?;

        let full = Projector::fit_full(&standardized)?;
        let cumulative = full.cumulative_variance();
        let rank = self.cfg.selection.select(&cumulative);
        let explained_variance = cumulative.get(rank - 1).copied().unwrap_or(1.0);
        tracing::info!(
            position,
            rank,
            max_rank = full.rank(),
            explained_variance,
            "stage: projection rank selected"
        );

        let projector = Projector::fit(&standardized, rank)?;
        let projected = standardized
            .iter()
            .map(|r| projector.transform(r))
            .collect::<Result<Vec<_>, _>>()?;

        let mut fold_accuracy = Vec::with_capacity(folds.len());
        for (i, fold) in folds.iter().enumerate() {
            let train_x: Vec<&[f64]> = fold.train.iter().map(|&j| projected[j].as_slice()).collect();
            let train_y: Vec<u8> = fold.train.iter().map(|&j| labels[j]).collect();
            let clf = LogisticClassifier::fit(&train_x, &train_y, &self.cfg.logistic)?;

            let mut correct = 0;
            for &j in &fold.test {
                if clf.predict(&projected[j])? == labels[j] {
                    correct += 1;
                }
            }
            let accuracy = correct as f64 / fold.test.len() as f64;
            tracing::debug!(position, fold = i + 1, accuracy, "stage: fold evaluated");
            fold_accuracy.push(accuracy);
        }
        let mean_accuracy = fold_accuracy.iter().sum::<f64>() / fold_accuracy.len() as f64;
        tracing::info!(position, mean_accuracy, "stage: cross-validation done");

        let classifier = LogisticClassifier::fit(&projected, &labels, &self.cfg.logistic)?;
        let model = StageModel::from_parts(standardizer, projector, classifier)?;

        let (male, female) = dataset.class_counts();
        Ok(TrainedStage {
            model,
            report: StageReport {
                position,
                samples: dataset.len(),
                male,
                female,
                features: dataset.columns.len(),
                rank,
                explained_variance,
                fold_accuracy,
                mean_accuracy,
            },
        })
    }

    /// Fits a position and writes its artifacts to `store`.
    pub fn train_and_save(
        &self,
        dataset: &Dataset,
        store: &dyn ArtifactStore,
    ) -> Result<StageReport, StageError> {
        let trained = self.fit(dataset)?;
        store.save(dataset.position, &trained.model)?;
        Ok(trained.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Label, LabeledSample, MemoryStore};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use voxid_features::{FeatureSchema, FeatureVector};

    /// Two Gaussian-ish clusters separated along the first two columns,
    /// with noise columns and one constant column.
    fn synthetic(position: usize, per_class: usize, seed: u64) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        let columns = FeatureSchema::new((0..6).map(|i| format!("f{i}")).collect());
        let mut ds = Dataset::new(position, columns);
        for i in 0..2 * per_class {
            let label = if i % 2 == 0 { Label::Male } else { Label::Female };
            let center = if label == Label::Male { 2.0 } else { -2.0 };
            let mut noise = || rng.gen_range(-1.0..1.0) + rng.gen_range(-1.0..1.0);
            let values = vec![
                center + noise(),
                0.5 * center + noise(),
                noise(),
                noise() * 0.1,
                3.0,
                noise(),
            ];
            ds.push(LabeledSample {
                source: format!("s{i}"),
                label,
                features: FeatureVector::new(values),
            })
            .unwrap();
        }
        ds
    }

    #[test]
    fn test_fit_reports_and_separates() {
        let trainer = Trainer::new(TrainConfig::default()).unwrap();
        let ds = synthetic(1, 30, 1);
        let trained = trainer.fit(&ds).unwrap();
        let report = &trained.report;

        assert_eq!(report.samples, 60);
        assert_eq!((report.male, report.female), (30, 30));
        assert_eq!(report.fold_accuracy.len(), 5);
        assert!(report.rank >= 1 && report.rank <= 6);
        assert_eq!(trained.model.rank(), report.rank);
        assert!(report.mean_accuracy > 0.8, "accuracy {}", report.mean_accuracy);

        let male = FeatureVector::new(vec![2.5, 1.0, 0.0, 0.0, 3.0, 0.0]);
        let female = FeatureVector::new(vec![-2.5, -1.0, 0.0, 0.0, 3.0, 0.0]);
        assert!(trained.model.score(&male).unwrap() > 0.5);
        assert!(trained.model.score(&female).unwrap() < 0.5);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let trainer = Trainer::new(TrainConfig::default()).unwrap();
        let ds = synthetic(2, 20, 9);
        let a = trainer.fit(&ds).unwrap();
        let b = trainer.fit(&ds).unwrap();
        assert_eq!(a.model, b.model);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_cross_validation_does_not_change_model() {
        let ds = synthetic(1, 20, 3);
        let a = Trainer::new(TrainConfig::default()).unwrap().fit(&ds).unwrap();
        let cfg = TrainConfig {
            validation: ValidationConfig { folds: 3, seed: 99 },
            ..TrainConfig::default()
        };
        let b = Trainer::new(cfg).unwrap().fit(&ds).unwrap();
        assert_eq!(a.model, b.model);
        assert_eq!(b.report.fold_accuracy.len(), 3);
    }

    #[test]
    fn test_rejects_single_class() {
        let mut ds = synthetic(1, 10, 4);
        ds.samples.retain(|s| s.label == Label::Male);
        let err = Trainer::new(TrainConfig::default()).unwrap().fit(&ds).unwrap_err();
        assert!(matches!(err, StageError::InvalidDataset(_)));
    }

    #[test]
    fn test_train_and_save() {
        let store = MemoryStore::new();
        let trainer = Trainer::new(TrainConfig::default()).unwrap();
        let report = trainer.train_and_save(&synthetic(4, 15, 5), &store).unwrap();
        assert_eq!(report.position, 4);
        assert_eq!(store.load(4).unwrap().rank(), report.rank);
    }
}

use voxid_features::{FeatureSchema, FeatureVector};

use crate::{LogisticClassifier, Projector, StageError, Standardizer};

/// One prompt position's frozen pipeline: standardize, project, classify.
#[derive(Debug, Clone, PartialEq)]
pub struct StageModel {
    standardizer: Standardizer,
    projector: Projector,
    classifier: LogisticClassifier,
}

impl StageModel {
    /// Assembles a model, checking that the three parts chain together.
    pub fn from_parts(
        standardizer: Standardizer,
        projector: Projector,
        classifier: LogisticClassifier,
    ) -> Result<Self, StageError> {
        standardizer.validate()?;
        projector.validate()?;
        if projector.input_len() != standardizer.len() {
            return Err(StageError::InvalidModel(format!(
                "projector expects {} inputs, standardizer yields {}",
                projector.input_len(),
                standardizer.len()
            )));
        }
        if classifier.input_len() != projector.rank() {
            return Err(StageError::InvalidModel(format!(
                "classifier expects {} inputs, projector yields {}",
                classifier.input_len(),
                projector.rank()
            )));
        }
        Ok(Self {
            standardizer,
            projector,
            classifier,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.standardizer.columns()
    }

    pub fn rank(&self) -> usize {
        self.projector.rank()
    }

    pub fn standardizer(&self) -> &Standardizer {
        &self.standardizer
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn classifier(&self) -> &LogisticClassifier {
        &self.classifier
    }

    pub fn into_parts(self) -> (Standardizer, Projector, LogisticClassifier) {
        (self.standardizer, self.projector, self.classifier)
    }

    /// Projected representation of a raw feature row.
    pub fn project(&self, row: &[f64]) -> Result<Vec<f64>, StageError> {
        let standardized = self.standardizer.transform(row)?;
        self.projector.transform(&standardized)
    }

    /// Probability of class 1 for a feature vector of this model's schema.
    pub fn score(&self, vector: &FeatureVector) -> Result<f64, StageError> {
        let projected = self.project(vector.values())?;
        self.classifier.probability(&projected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["a".into(), "b".into(), "c".into()])
    }

    fn rows() -> Vec<Vec<f64>> {
        (0..12)
            .map(|i| {
                let x = i as f64;
                vec![x, 2.0 * x + (i % 2) as f64, 5.0 - x * 0.5]
            })
            .collect()
    }

    fn model() -> StageModel {
        let rows = rows();
        let standardizer = Standardizer::fit(schema(), &rows).unwrap();
        let z: Vec<Vec<f64>> = rows.iter().map(|r| standardizer.transform(r).unwrap()).collect();
        let projector = Projector::fit(&z, 2).unwrap();
        let classifier = LogisticClassifier::new(vec![1.5, -0.5], 0.1);
        StageModel::from_parts(standardizer, projector, classifier).unwrap()
    }

    #[test]
    fn test_score_is_idempotent() {
        let m = model();
        let v = FeatureVector::new(vec![3.0, 7.0, 2.0]);
        let a = m.score(&v).unwrap();
        let b = m.score(&v).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn test_score_rejects_wrong_schema() {
        let err = model().score(&FeatureVector::new(vec![1.0])).unwrap_err();
        assert!(err.is_input_validation());
    }

    #[test]
    fn test_from_parts_checks_chain() {
        let (s, p, _) = model().into_parts();
        let err = StageModel::from_parts(s, p, LogisticClassifier::new(vec![1.0], 0.0)).unwrap_err();
        assert!(matches!(err, StageError::InvalidModel(_)));
    }
}

use serde::{Deserialize, Serialize};
use voxid_features::FeatureSchema;

use crate::StageError;

/// Per-column centering and unit-variance scaling.
///
/// Parameters are estimated once on a stage's full training set and frozen.
/// The fitted column schema travels with the parameters so that a vector
/// from a different feature configuration is rejected instead of scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    columns: FeatureSchema,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Standardizer {
    /// Fits on `rows`, each of which must have `columns.len()` values.
    ///
    /// Uses the population standard deviation; a constant column gets
    /// scale 1 so it maps to zero instead of dividing by zero.
    pub fn fit<R: AsRef<[f64]>>(columns: FeatureSchema, rows: &[R]) -> Result<Self, StageError> {
        if rows.is_empty() {
            return Err(StageError::InvalidDataset("no rows to standardize".into()));
        }
        let p = columns.len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; p];
        for row in rows {
            let row = check_len(row.as_ref(), p)?;
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; p];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row.as_ref()).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }
        let scale = var
            .into_iter()
            .map(|v| {
                let sd = (v / n).sqrt();
                if sd < 10.0 * f64::EPSILON { 1.0 } else { sd }
            })
            .collect();

        Ok(Self { columns, mean, scale })
    }

    pub fn columns(&self) -> &FeatureSchema {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, StageError> {
        let row = check_len(row, self.mean.len())?;
        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((x, m), s)| (x - m) / s)
            .collect())
    }

    pub(crate) fn validate(&self) -> Result<(), StageError> {
        if self.mean.len() != self.columns.len() || self.scale.len() != self.columns.len() {
            return Err(StageError::InvalidModel(format!(
                "standardizer has {} columns but {} means and {} scales",
                self.columns.len(),
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(StageError::InvalidModel("standardizer scale must be positive".into()));
        }
        Ok(())
    }
}

fn check_len(row: &[f64], expected: usize) -> Result<&[f64], StageError> {
    if row.len() != expected {
        return Err(StageError::SchemaMismatch {
            expected,
            got: row.len(),
        });
    }
    Ok(row)
}

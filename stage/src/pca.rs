use serde::{Deserialize, Serialize};

use crate::linalg::{dot, symmetric_eigen};
use crate::StageError;

/// Orthogonal linear projection onto the leading principal components.
///
/// Fitting is deliberately two-step during training: [`Projector::fit_full`]
/// exposes the explained-variance profile, the rank is chosen from it, then
/// [`Projector::fit`] refits at exactly that rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projector {
    mean: Vec<f64>,
    /// One unit-length component per row, by descending variance.
    components: Vec<Vec<f64>>,
    explained_variance: Vec<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl Projector {
    /// Fits at the maximum rank, `min(n_samples, n_features)`.
    pub fn fit_full<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, StageError> {
        let max = max_rank(rows)?;
        Self::fit(rows, max)
    }

    /// Fits keeping the `rank` leading components.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R], rank: usize) -> Result<Self, StageError> {
        let max = max_rank(rows)?;
        if rank == 0 || rank > max {
            return Err(StageError::InvalidModel(format!(
                "projection rank {rank} outside 1..={max}"
            )));
        }
        let n = rows.len();
        let p = rows[0].as_ref().len();
        if rows.iter().any(|r| r.as_ref().len() != p) {
            return Err(StageError::InvalidDataset("rows have different lengths".into()));
        }

        let mut mean = vec![0.0; p];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row.as_ref()) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n as f64);

        let centered: Vec<Vec<f64>> = rows
            .iter()
            .map(|r| r.as_ref().iter().zip(&mean).map(|(x, m)| x - m).collect())
            .collect();
        let ddof = if n > 1 { (n - 1) as f64 } else { 1.0 };
        let mut cov = vec![vec![0.0; p]; p];
        for row in &centered {
            for i in 0..p {
                if row[i] == 0.0 {
                    continue;
                }
                for j in i..p {
                    cov[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..p {
            for j in i..p {
                cov[i][j] /= ddof;
                cov[j][i] = cov[i][j];
            }
        }
        let total_variance: f64 = (0..p).map(|i| cov[i][i]).sum();

        let mut pairs = symmetric_eigen(cov);
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));
        pairs.truncate(rank);

        let mut components = Vec::with_capacity(rank);
        let mut explained_variance = Vec::with_capacity(rank);
        let mut explained_variance_ratio = Vec::with_capacity(rank);
        for (value, mut vector) in pairs {
            let dominant = vector
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            if dominant < 0.0 {
                vector.iter_mut().for_each(|x| *x = -*x);
            }
            let value = value.max(0.0);
            components.push(vector);
            explained_variance.push(value);
            explained_variance_ratio.push(if total_variance > 0.0 {
                value / total_variance
            } else {
                0.0
            });
        }

        tracing::debug!(samples = n, features = p, rank, "stage: projector fitted");
        Ok(Self {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    pub fn rank(&self) -> usize {
        self.components.len()
    }

    pub fn input_len(&self) -> usize {
        self.mean.len()
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }

    /// Running sum of the explained-variance ratios.
    pub fn cumulative_variance(&self) -> Vec<f64> {
        self.explained_variance_ratio
            .iter()
            .scan(0.0, |acc, r| {
                *acc += r;
                Some(*acc)
            })
            .collect()
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, StageError> {
        if row.len() != self.mean.len() {
            return Err(StageError::SchemaMismatch {
                expected: self.mean.len(),
                got: row.len(),
            });
        }
        let centered: Vec<f64> = row.iter().zip(&self.mean).map(|(x, m)| x - m).collect();
        Ok(self.components.iter().map(|c| dot(c, &centered)).collect())
    }

    pub(crate) fn validate(&self) -> Result<(), StageError> {
        let p = self.mean.len();
        if self.components.is_empty() {
            return Err(StageError::InvalidModel("projector has no components".into()));
        }
        if self.components.iter().any(|c| c.len() != p) {
            return Err(StageError::InvalidModel(format!(
                "projector components must have {p} loadings"
            )));
        }
        Ok(())
    }
}

fn max_rank<R: AsRef<[f64]>>(rows: &[R]) -> Result<usize, StageError> {
    let p = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
    if rows.is_empty() || p == 0 {
        return Err(StageError::InvalidDataset("no data to project".into()));
    }
    Ok(rows.len().min(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_data() -> Vec<Vec<f64>> {
        // Points along (1, 1) with a little spread on (1, -1).
        (0..20)
            .map(|i| {
                let t = i as f64 - 9.5;
                let e = if i % 2 == 0 { 0.1 } else { -0.1 };
                vec![t + e, t - e]
            })
            .collect()
    }

    #[test]
    fn test_fit_full_profile() {
        let pca = Projector::fit_full(&line_data()).unwrap();
        assert_eq!(pca.rank(), 2);
        let ratio = pca.explained_variance_ratio();
        assert!(ratio[0] > 0.99);
        assert!(ratio[0] >= ratio[1]);
        let cum = pca.cumulative_variance();
        assert!((cum[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_leading_component_direction() {
        let pca = Projector::fit(&line_data(), 1).unwrap();
        let projected = pca.transform(&[1.0, 1.0]).unwrap();
        assert_eq!(projected.len(), 1);
        assert!((projected[0] - 2f64.sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_rank_bounded_by_samples() {
        let rows = vec![vec![1.0, 2.0, 3.0], vec![2.0, 0.0, 1.0]];
        assert_eq!(Projector::fit_full(&rows).unwrap().rank(), 2);
        assert!(Projector::fit(&rows, 3).is_err());
        assert!(Projector::fit(&rows, 0).is_err());
    }

    #[test]
    fn test_transform_schema_mismatch() {
        let pca = Projector::fit_full(&line_data()).unwrap();
        assert!(matches!(
            pca.transform(&[1.0]),
            Err(StageError::SchemaMismatch { expected: 2, got: 1 })
        ));
    }
}

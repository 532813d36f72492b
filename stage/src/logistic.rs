use serde::{Deserialize, Serialize};

use crate::linalg::{dot, solve};
use crate::StageError;

/// Logistic regression fitting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticConfig {
    /// Inverse L2 regularization strength (default: 1.0).
    pub c: f64,
    /// Newton iteration limit (default: 100).
    pub max_iter: usize,
    /// Convergence tolerance on the largest parameter step (default: 1e-8).
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-8,
        }
    }
}

/// Binary linear probabilistic classifier.
///
/// `probability` is the predicted probability of class 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticClassifier {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// Fits by Newton's method on the L2-penalized log loss. The intercept
    /// is not penalized. Labels must be 0 or 1 and both must be present.
    pub fn fit<R: AsRef<[f64]>>(
        rows: &[R],
        labels: &[u8],
        cfg: &LogisticConfig,
    ) -> Result<Self, StageError> {
        if rows.len() != labels.len() {
            return Err(StageError::InvalidDataset(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if !labels.contains(&0) || !labels.contains(&1) {
            return Err(StageError::InvalidDataset(
                "classifier needs samples of both classes".into(),
            ));
        }
        if labels.iter().any(|&y| y > 1) {
            return Err(StageError::InvalidDataset("labels must be 0 or 1".into()));
        }
        let d = rows[0].as_ref().len();
        if rows.iter().any(|r| r.as_ref().len() != d) {
            return Err(StageError::InvalidDataset("rows have different lengths".into()));
        }

        // theta = [w_0 .. w_{d-1}, b]
        let mut theta = vec![0.0; d + 1];
        let mut loss = objective(rows, labels, &theta, cfg.c);
        let mut converged = false;

        for iter in 0..cfg.max_iter {
            let (grad, hess) = gradient_and_hessian(rows, labels, &theta, cfg.c);
            let step = solve(hess, grad).ok_or_else(|| {
                StageError::Numerical(format!("singular hessian at newton iteration {iter}"))
            })?;

            let mut t = 1.0;
            let mut candidate = theta.clone();
            let mut candidate_loss = f64::INFINITY;
            for _ in 0..30 {
                candidate
                    .iter_mut()
                    .zip(theta.iter().zip(&step))
                    .for_each(|(c, (th, s))| *c = th - t * s);
                candidate_loss = objective(rows, labels, &candidate, cfg.c);
                if candidate_loss <= loss {
                    break;
                }
                t *= 0.5;
            }

            let max_step = step.iter().fold(0.0f64, |m, s| m.max((t * s).abs()));
            if candidate_loss <= loss {
                theta = candidate;
                loss = candidate_loss;
            }
            if max_step < cfg.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::warn!(
                max_iter = cfg.max_iter,
                "stage: logistic regression did not converge"
            );
        }

        let intercept = theta[d];
        theta.truncate(d);
        Ok(Self {
            weights: theta,
            intercept,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn input_len(&self) -> usize {
        self.weights.len()
    }

    pub fn decision(&self, x: &[f64]) -> Result<f64, StageError> {
        if x.len() != self.weights.len() {
            return Err(StageError::SchemaMismatch {
                expected: self.weights.len(),
                got: x.len(),
            });
        }
        Ok(dot(&self.weights, x) + self.intercept)
    }

    pub fn probability(&self, x: &[f64]) -> Result<f64, StageError> {
        self.decision(x).map(sigmoid)
    }

    /// Class 1 iff the decision value is strictly positive.
    pub fn predict(&self, x: &[f64]) -> Result<u8, StageError> {
        Ok(u8::from(self.decision(x)? > 0.0))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// log(1 + exp(-m)) without overflow.
fn log_loss(margin: f64) -> f64 {
    if margin > 0.0 {
        (-margin).exp().ln_1p()
    } else {
        -margin + margin.exp().ln_1p()
    }
}

fn linear<R: AsRef<[f64]>>(row: &R, theta: &[f64]) -> f64 {
    let d = theta.len() - 1;
    dot(row.as_ref(), &theta[..d]) + theta[d]
}

fn objective<R: AsRef<[f64]>>(rows: &[R], labels: &[u8], theta: &[f64], c: f64) -> f64 {
    let d = theta.len() - 1;
    let penalty = 0.5 * dot(&theta[..d], &theta[..d]);
    let data: f64 = rows
        .iter()
        .zip(labels)
        .map(|(row, &y)| {
            let sign = if y == 1 { 1.0 } else { -1.0 };
            log_loss(sign * linear(row, theta))
        })
        .sum();
    penalty + c * data
}

fn gradient_and_hessian<R: AsRef<[f64]>>(
    rows: &[R],
    labels: &[u8],
    theta: &[f64],
    c: f64,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let d = theta.len() - 1;
    let mut grad = vec![0.0; d + 1];
    let mut hess = vec![vec![0.0; d + 1]; d + 1];

    for (row, &y) in rows.iter().zip(labels) {
        let x = row.as_ref();
        let p = sigmoid(linear(row, theta));
        let r = c * (p - f64::from(y));
        let s = c * p * (1.0 - p);
        for i in 0..d {
            grad[i] += r * x[i];
            for j in i..d {
                hess[i][j] += s * x[i] * x[j];
            }
            hess[i][d] += s * x[i];
        }
        grad[d] += r;
        hess[d][d] += s;
    }
    for i in 0..d {
        grad[i] += theta[i];
        hess[i][i] += 1.0;
        for j in 0..i {
            hess[i][j] = hess[j][i];
        }
        hess[d][i] = hess[i][d];
    }
    (grad, hess)
}

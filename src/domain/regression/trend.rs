//! Additive trend + seasonality + regressor model
//!
//! `y = a + b*t + weekly(t) + yearly(t) + sum(beta_i * z_i)` where `t` is the
//! scaled day offset from the first observation, the seasonal terms are Fourier
//! series anchored on the calendar, and `z_i` are the standardized extra
//! regressors. Coefficients are solved jointly by ridge-regularised least
//! squares.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{FeatureRow, ModelError, RegressionFitter, RegressionModel, TrainingSeries};

const MIN_OBSERVATIONS: usize = 2;
const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
const WEEKLY_MIN_SPAN_DAYS: i64 = 14;
const YEARLY_PERIOD: f64 = 365.25;
const YEARLY_ORDER: usize = 10;
const YEARLY_MIN_SPAN_DAYS: i64 = 730;
const RIDGE_LAMBDA: f64 = 1e-6;
const EPSILON: f64 = 1e-12;

/// Fitter for [`TrendRegression`]
///
/// Seasonal components are only enabled when the history spans at least two
/// full periods, regardless of the toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRegressionFitter {
    weekly_seasonality: bool,
    yearly_seasonality: bool,
}

impl Default for TrendRegressionFitter {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendRegressionFitter {
    pub fn new() -> Self {
        Self {
            weekly_seasonality: true,
            yearly_seasonality: true,
        }
    }

    pub fn with_weekly_seasonality(mut self, enabled: bool) -> Self {
        self.weekly_seasonality = enabled;
        self
    }

    pub fn with_yearly_seasonality(mut self, enabled: bool) -> Self {
        self.yearly_seasonality = enabled;
        self
    }
}

impl RegressionFitter for TrendRegressionFitter {
    type Model = TrendRegression;

    fn fit(&self, series: &TrainingSeries) -> Result<TrendRegression, ModelError> {
        let observations = series.observations();

        if observations.len() < MIN_OBSERVATIONS {
            return Err(ModelError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: observations.len(),
            });
        }

        let dates: BTreeSet<NaiveDate> = observations.iter().map(|o| o.features.date()).collect();

        if dates.len() < MIN_OBSERVATIONS {
            return Err(ModelError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: dates.len(),
            });
        }

        let (Some(&origin), Some(&last)) = (dates.first(), dates.last()) else {
            return Err(ModelError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: 0,
            });
        };
        let span_days = (last - origin).num_days();

        let regressors = series.regressors().to_vec();
        let mut raw = Vec::with_capacity(observations.len());
        let mut targets = Vec::with_capacity(observations.len());

        for observation in observations {
            raw.push(regressor_values(&regressors, &observation.features)?);

            if !observation.target.is_finite() {
                return Err(ModelError::Numerical(format!(
                    "target on {} is not finite",
                    observation.features.date()
                )));
            }
            targets.push(observation.target);
        }

        let (regressor_means, regressor_scales) = standardization(&raw, regressors.len());

        let y_scale = targets.iter().fold(0.0_f64, |acc, y| acc.max(y.abs()));
        let y_scale = if y_scale > EPSILON { y_scale } else { 1.0 };

        let mut model = TrendRegression {
            regressors,
            origin,
            t_scale: span_days as f64,
            weekly_order: if self.weekly_seasonality && span_days >= WEEKLY_MIN_SPAN_DAYS {
                WEEKLY_ORDER
            } else {
                0
            },
            yearly_order: if self.yearly_seasonality && span_days >= YEARLY_MIN_SPAN_DAYS {
                YEARLY_ORDER
            } else {
                0
            },
            regressor_means,
            regressor_scales,
            y_scale,
            coefficients: Vec::new(),
            n_observations: observations.len(),
            r_squared: 0.0,
        };

        let x: Vec<Vec<f64>> = observations
            .iter()
            .zip(raw.iter())
            .map(|(o, values)| model.design_row(o.features.date(), values))
            .collect();
        let y: Vec<f64> = targets.iter().map(|t| t / y_scale).collect();

        model.coefficients = solve_ridge(&x, &y)?;
        model.r_squared = r_squared(&x, &y, &model.coefficients);

        Ok(model)
    }
}

/// Fitted additive trend regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRegression {
    regressors: Vec<String>,
    origin: NaiveDate,
    t_scale: f64,
    weekly_order: usize,
    yearly_order: usize,
    regressor_means: Vec<f64>,
    regressor_scales: Vec<f64>,
    y_scale: f64,
    coefficients: Vec<f64>,
    n_observations: usize,
    r_squared: f64,
}

impl TrendRegression {
    /// First date of the training history
    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Coefficient of determination on the training history
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    fn design_width(&self) -> usize {
        2 + 2 * (self.weekly_order + self.yearly_order) + self.regressors.len()
    }

    fn design_row(&self, date: NaiveDate, values: &[f64]) -> Vec<f64> {
        let t = (date - self.origin).num_days() as f64 / self.t_scale;
        let day = date.num_days_from_ce() as f64;

        let mut row = Vec::with_capacity(self.design_width());
        row.push(1.0);
        row.push(t);
        push_fourier_terms(&mut row, day, WEEKLY_PERIOD, self.weekly_order);
        push_fourier_terms(&mut row, day, YEARLY_PERIOD, self.yearly_order);

        for (i, value) in values.iter().enumerate() {
            row.push((value - self.regressor_means[i]) / self.regressor_scales[i]);
        }

        row
    }
}

impl RegressionModel for TrendRegression {
    fn regressors(&self) -> &[String] {
        &self.regressors
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.is_empty() {
            return Err(ModelError::NotFitted);
        }

        let regressors = self.regressors.len();
        if self.regressor_means.len() != regressors || self.regressor_scales.len() != regressors {
            return Err(ModelError::Numerical(format!(
                "{} regressors but {} means and {} scales",
                regressors,
                self.regressor_means.len(),
                self.regressor_scales.len()
            )));
        }

        if self.coefficients.len() != self.design_width() {
            return Err(ModelError::Numerical(format!(
                "design row has {} columns, model has {} coefficients",
                self.design_width(),
                self.coefficients.len()
            )));
        }

        if !(self.t_scale > 0.0 && self.t_scale.is_finite()) {
            return Err(ModelError::Numerical(format!(
                "time scale {} is not positive",
                self.t_scale
            )));
        }

        let parameters = self
            .coefficients
            .iter()
            .chain(&self.regressor_means)
            .chain(&self.regressor_scales)
            .chain(std::iter::once(&self.y_scale));
        for value in parameters {
            if !value.is_finite() {
                return Err(ModelError::Numerical("non-finite model parameter".to_string()));
            }
        }

        if self.regressor_scales.iter().any(|s| *s <= 0.0) {
            return Err(ModelError::Numerical("regressor scale is not positive".to_string()));
        }

        Ok(())
    }

    fn predict(&self, features: &FeatureRow) -> Result<f64, ModelError> {
        self.validate()?;

        let values = regressor_values(&self.regressors, features)?;
        let row = self.design_row(features.date(), &values);
        let estimate = dot(&row, &self.coefficients) * self.y_scale;

        if !estimate.is_finite() {
            return Err(ModelError::Numerical("prediction is not finite".to_string()));
        }

        Ok(estimate)
    }
}

fn regressor_values(regressors: &[String], features: &FeatureRow) -> Result<Vec<f64>, ModelError> {
    regressors
        .iter()
        .map(|name| {
            let value = features
                .get(name)
                .ok_or_else(|| ModelError::MissingRegressor(name.clone()))?;

            if !value.is_finite() {
                return Err(ModelError::Numerical(format!(
                    "regressor '{}' is not finite",
                    name
                )));
            }

            Ok(value)
        })
        .collect()
}

/// Column means and standard deviations. Constant columns keep a unit scale.
fn standardization(raw: &[Vec<f64>], columns: usize) -> (Vec<f64>, Vec<f64>) {
    let n = raw.len().max(1) as f64;
    let mut means = vec![0.0; columns];
    let mut scales = vec![1.0; columns];

    for j in 0..columns {
        let mean = raw.iter().map(|row| row[j]).sum::<f64>() / n;
        let variance = raw.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        means[j] = mean;
        if std > EPSILON {
            scales[j] = std;
        }
    }

    (means, scales)
}

fn push_fourier_terms(row: &mut Vec<f64>, day: f64, period: f64, order: usize) {
    for k in 1..=order {
        let x = 2.0 * PI * k as f64 * day / period;
        row.push(x.sin());
        row.push(x.cos());
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Solve `(X^T X + lambda*I) beta = X^T y` with partial-pivot Gauss-Jordan elimination
fn solve_ridge(x: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>, ModelError> {
    let p = x.first().map(Vec::len).unwrap_or(0);

    if p == 0 {
        return Err(ModelError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: x.len(),
        });
    }

    let mut a = vec![vec![0.0; p]; p];
    let mut b = vec![0.0; p];

    for (row, &target) in x.iter().zip(y.iter()) {
        for i in 0..p {
            b[i] += row[i] * target;
            for j in 0..p {
                a[i][j] += row[i] * row[j];
            }
        }
    }

    for (d, row) in a.iter_mut().enumerate() {
        row[d] += RIDGE_LAMBDA;
    }

    for i in 0..p {
        let pivot_row = (i..p)
            .max_by(|&r1, &r2| a[r1][i].abs().total_cmp(&a[r2][i].abs()))
            .unwrap_or(i);

        if pivot_row != i {
            a.swap(i, pivot_row);
            b.swap(i, pivot_row);
        }

        let pivot = a[i][i];
        if pivot.abs() < EPSILON {
            return Err(ModelError::Numerical("singular design matrix".to_string()));
        }

        let inv = 1.0 / pivot;
        for j in i..p {
            a[i][j] *= inv;
        }
        b[i] *= inv;

        for r in 0..p {
            if r == i {
                continue;
            }

            let factor = a[r][i];
            if factor == 0.0 {
                continue;
            }

            for j in i..p {
                a[r][j] -= factor * a[i][j];
            }
            b[r] -= factor * b[i];
        }
    }

    if b.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Numerical(
            "non-finite coefficient in solution".to_string(),
        ));
    }

    Ok(b)
}

fn r_squared(x: &[Vec<f64>], y: &[f64], coefficients: &[f64]) -> f64 {
    let n = y.len().max(1) as f64;
    let mean = y.iter().sum::<f64>() / n;
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(row, v)| (v - dot(row, coefficients)).powi(2))
        .sum();

    if ss_tot > EPSILON {
        1.0 - ss_res / ss_tot
    } else {
        1.0
    }
}

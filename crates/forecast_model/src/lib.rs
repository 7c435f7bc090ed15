//! Univariate price forecasting model.
//!
//! Fits an additive model (linear trend plus weekly Fourier seasonality)
//! to a daily price series by ordinary least squares, and produces point
//! forecasts with uncertainty bounds over an extended daily axis.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

mod artifact;
mod training;

pub use artifact::{load_artifact, save_artifact};
pub use training::fit;

/// Period of the seasonal component, in days.
const WEEKLY_PERIOD: f64 = 7.0;

/// Width of the uncertainty interval in residual standard deviations.
const INTERVAL_Z: f64 = 1.96;

/// Configuration for fitting the forecast model.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Number of Fourier terms for the weekly seasonal component.
    /// Clamped down when the series is too short to support it.
    pub weekly_order: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { weekly_order: 3 }
    }
}

/// A single observed point of the training series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub ds: NaiveDate,
    pub y: f64,
}

/// One row of a generated forecast: a future calendar date and the
/// model's central estimate for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub yhat: f64,
}

/// A prediction with uncertainty bounds, used by the training job's
/// forecast output file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// A fitted forecast model.
///
/// Immutable once fitted; serialized as the on-disk artifact consumed by
/// the serving path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastModel {
    /// First date of the training series.
    pub start_ds: NaiveDate,
    /// Last date of the training series.
    pub end_ds: NaiveDate,
    /// Effective number of weekly Fourier terms used.
    pub weekly_order: usize,
    /// Fitted coefficients: intercept, trend slope, then the sin/cos
    /// pair for each Fourier term.
    pub coefficients: Vec<f64>,
    /// Residual standard deviation of the fit.
    pub sigma: f64,
}

impl ForecastModel {
    /// Central estimate for a single date.
    #[must_use]
    pub fn predict(&self, ds: NaiveDate) -> f64 {
        let t = (ds - self.start_ds).num_days() as f64;
        regressors(t, self.weekly_order)
            .iter()
            .zip(&self.coefficients)
            .map(|(x, c)| x * c)
            .sum()
    }

    /// Central estimate plus uncertainty interval for a single date.
    #[must_use]
    pub fn predict_with_bounds(&self, ds: NaiveDate) -> Prediction {
        let yhat = self.predict(ds);
        let margin = INTERVAL_Z * self.sigma;

        Prediction {
            ds,
            yhat,
            yhat_lower: yhat - margin,
            yhat_upper: yhat + margin,
        }
    }

    /// Generates a forecast for the given number of days past the end of
    /// the training series.
    ///
    /// Builds the extended daily axis covering the training span plus
    /// `horizon_days` future points, predicts every point on it, and
    /// returns the trailing `horizon_days` rows in chronological order.
    ///
    /// Total for any horizon; a zero horizon yields an empty vector.
    #[must_use]
    pub fn forecast(&self, horizon_days: u32) -> Vec<ForecastRow> {
        let rows: Vec<ForecastRow> = self
            .extended_axis(horizon_days)
            .into_iter()
            .map(|ds| ForecastRow {
                ds,
                yhat: self.predict(ds),
            })
            .collect();

        let future_start = rows.len().saturating_sub(horizon_days as usize);
        rows[future_start..].to_vec()
    }

    /// As [`forecast`](Self::forecast), but with uncertainty bounds on
    /// every row.
    #[must_use]
    pub fn forecast_with_bounds(&self, horizon_days: u32) -> Vec<Prediction> {
        self.forecast(horizon_days)
            .into_iter()
            .map(|row| self.predict_with_bounds(row.ds))
            .collect()
    }

    /// The daily axis from the start of training through `horizon_days`
    /// past its end.
    fn extended_axis(&self, horizon_days: u32) -> Vec<NaiveDate> {
        let mut axis = Vec::new();
        let mut ds = self.start_ds;
        let last = self
            .end_ds
            .checked_add_days(Days::new(u64::from(horizon_days)))
            .unwrap_or(self.end_ds);

        while ds <= last {
            axis.push(ds);
            ds = match ds.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }

        axis
    }
}

/// Design-matrix row for elapsed time `t` (days since the series start):
/// intercept, trend, then sin/cos pairs for each weekly Fourier term.
fn regressors(t: f64, weekly_order: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + 2 * weekly_order);
    row.push(1.0);
    row.push(t);

    for k in 1..=weekly_order {
        let angle = 2.0 * std::f64::consts::PI * (k as f64) * t / WEEKLY_PERIOD;
        row.push(angle.sin());
        row.push(angle.cos());
    }

    row
}

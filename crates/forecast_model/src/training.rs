//! Fitting logic for the forecast model.

use anyhow::{Result, bail};

use crate::{ForecastModel, ModelConfig, PricePoint, regressors};

/// Fits the additive trend + weekly seasonality model to the given series
/// by ordinary least squares.
///
/// The seasonal order is clamped so the design matrix never has more
/// columns than observations.
///
/// # Errors
///
/// Returns an error if the series is empty, spans a single date, or
/// produces a degenerate design matrix.
pub fn fit(points: &[PricePoint], config: &ModelConfig) -> Result<ForecastModel> {
    if points.is_empty() {
        bail!("No training data provided");
    }

    let start_ds = points.iter().map(|p| p.ds).min().unwrap_or(points[0].ds);
    let end_ds = points.iter().map(|p| p.ds).max().unwrap_or(points[0].ds);
    if start_ds == end_ds {
        bail!("Training series spans a single date; cannot fit a trend");
    }

    // Keep the system overdetermined: 2 trend columns + 2 per Fourier term.
    let max_order = points.len().saturating_sub(2) / 2;
    let weekly_order = config.weekly_order.min(max_order);
    let num_coefficients = 2 + 2 * weekly_order;

    let rows: Vec<Vec<f64>> = points
        .iter()
        .map(|p| regressors((p.ds - start_ds).num_days() as f64, weekly_order))
        .collect();
    let targets: Vec<f64> = points.iter().map(|p| p.y).collect();

    let coefficients = solve_least_squares(&rows, &targets, num_coefficients)?;

    // Residual spread drives the uncertainty interval width.
    let residual_sq_sum: f64 = rows
        .iter()
        .zip(&targets)
        .map(|(row, y)| {
            let yhat: f64 = row.iter().zip(&coefficients).map(|(x, c)| x * c).sum();
            (y - yhat).powi(2)
        })
        .sum();
    let dof = points.len().saturating_sub(num_coefficients).max(1);
    let sigma = (residual_sq_sum / dof as f64).sqrt();

    Ok(ForecastModel {
        start_ds,
        end_ds,
        weekly_order,
        coefficients,
        sigma,
    })
}

/// Solves `argmin ||X c - y||` via the normal equations.
fn solve_least_squares(rows: &[Vec<f64>], targets: &[f64], dim: usize) -> Result<Vec<f64>> {
    // Accumulate X^T X and X^T y.
    let mut xtx = vec![vec![0.0_f64; dim]; dim];
    let mut xty = vec![0.0_f64; dim];

    for (row, &y) in rows.iter().zip(targets) {
        for i in 0..dim {
            xty[i] += row[i] * y;
            for j in 0..dim {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    solve_linear_system(&mut xtx, &mut xty)
}

/// Gaussian elimination with partial pivoting on an in-place augmented
/// system.
fn solve_linear_system(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> Result<Vec<f64>> {
    let n = rhs.len();

    for col in 0..n {
        // Pivot on the largest remaining entry in this column.
        let pivot_row = (col..n)
            .max_by(|&a, &b| {
                matrix[a][col]
                    .abs()
                    .total_cmp(&matrix[b][col].abs())
            })
            .unwrap_or(col);

        if matrix[pivot_row][col].abs() < 1e-12 {
            bail!("Degenerate design matrix; training series lacks variation");
        }

        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution.
    let mut solution = vec![0.0_f64; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn fit_recovers_a_linear_trend() {
        let start = date(2024, 1, 1);
        let points: Vec<PricePoint> = (0..60)
            .map(|i| PricePoint {
                ds: start.checked_add_days(Days::new(i)).expect("valid date"),
                y: 5.0 + 2.0 * i as f64,
            })
            .collect();

        let model = fit(&points, &ModelConfig::default()).expect("fit");

        // Ten days past the training end the trend should extrapolate.
        let future = date(2024, 3, 10);
        let expected = 5.0 + 2.0 * f64::from((future - start).num_days() as i32);
        assert!((model.predict(future) - expected).abs() < 1.0);

        // A noiseless series leaves almost no residual.
        assert!(model.sigma < 1e-6, "sigma was {}", model.sigma);
    }

    #[test]
    fn fit_rejects_empty_input() {
        assert!(fit(&[], &ModelConfig::default()).is_err());
    }

    #[test]
    fn fit_rejects_single_date_series() {
        let points = vec![
            PricePoint {
                ds: date(2024, 1, 1),
                y: 1.0,
            },
            PricePoint {
                ds: date(2024, 1, 1),
                y: 2.0,
            },
        ];
        assert!(fit(&points, &ModelConfig::default()).is_err());
    }

    #[test]
    fn seasonal_order_is_clamped_for_short_series() {
        let start = date(2024, 1, 1);
        let points: Vec<PricePoint> = (0..6)
            .map(|i| PricePoint {
                ds: start.checked_add_days(Days::new(i)).expect("valid date"),
                y: i as f64,
            })
            .collect();

        let model = fit(&points, &ModelConfig { weekly_order: 10 }).expect("fit");
        assert!(model.weekly_order <= 2);
        assert_eq!(model.coefficients.len(), 2 + 2 * model.weekly_order);
    }

    #[test]
    fn solver_handles_a_known_system() {
        // 2x + y = 5, x + 3y = 10  =>  x = 1, y = 3.
        let mut matrix = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let mut rhs = vec![5.0, 10.0];

        let solution = solve_linear_system(&mut matrix, &mut rhs).expect("solve");
        assert!((solution[0] - 1.0).abs() < 1e-9);
        assert!((solution[1] - 3.0).abs() < 1e-9);
    }
}

//! Database model types.

use chrono::NaiveDate;

/// One persisted prediction: at most one record exists per date, and a
/// later write for the same date overwrites the stored value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub predicted_price: f64,
}

impl PredictionRecord {
    #[must_use]
    pub const fn new(date: NaiveDate, predicted_price: f64) -> Self {
        Self {
            date,
            predicted_price,
        }
    }
}

//! Derived statistics over a sensor's history window
//!
//! Recomputed on demand by consumers, never stored.

use serde::Serialize;

use crate::aggregator::types::HistoryPoint;

/// Summary statistics of a history window
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub avg_temp: f64,
    pub avg_hum: f64,
    pub max_temp: f64,
    pub max_hum: f64,
    pub min_temp: f64,
    pub min_hum: f64,
}

impl Stats {
    /// Compute statistics over `history`
    ///
    /// Averages are rounded to two decimals. An empty history yields all
    /// zeros.
    pub fn from_history<'a, I>(history: I) -> Self
    where
        I: IntoIterator<Item = &'a HistoryPoint>,
    {
        let mut count = 0usize;
        let mut sum_temp = 0.0;
        let mut sum_hum = 0.0;
        let mut max_temp = f64::NEG_INFINITY;
        let mut max_hum = f64::NEG_INFINITY;
        let mut min_temp = f64::INFINITY;
        let mut min_hum = f64::INFINITY;

        for point in history {
            count += 1;
            sum_temp += point.temp;
            sum_hum += point.hum;
            max_temp = max_temp.max(point.temp);
            max_hum = max_hum.max(point.hum);
            min_temp = min_temp.min(point.temp);
            min_hum = min_hum.min(point.hum);
        }

        if count == 0 {
            return Self::default();
        }

        Self {
            avg_temp: round2(sum_temp / count as f64),
            avg_hum: round2(sum_hum / count as f64),
            max_temp,
            max_hum,
            min_temp,
            min_hum,
        }
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Weight progression trend using linear regression (linfa)

use chrono::{DateTime, Utc};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

/// Minimum sessions required for a trend
const MIN_DATA_POINTS: usize = 3;

/// Fitted trend of best weight over time
#[derive(Debug, Clone)]
pub struct Progression {
    slope: f64,
    intercept: f64,
    r2_score: f64,
    data_points: usize,
    first_date: DateTime<Utc>,
    last_date: DateTime<Utc>,
}

impl Progression {
    /// Fit a trend from (date, best weight) points
    pub fn fit(points: &[(DateTime<Utc>, f64)]) -> Option<Self> {
        if points.len() < MIN_DATA_POINTS {
            return None;
        }

        let first_date = points.iter().map(|(d, _)| *d).min()?;
        let last_date = points.iter().map(|(d, _)| *d).max()?;

        // X = days since first session, Y = weight
        let x_data: Vec<f64> = points
            .iter()
            .map(|(d, _)| (*d - first_date).num_seconds() as f64 / 86_400.0)
            .collect();
        let y_data: Vec<f64> = points.iter().map(|(_, w)| *w).collect();
        let n_samples = x_data.len();

        let records = Array2::from_shape_vec((n_samples, 1), x_data).ok()?;
        let targets = Array1::from_vec(y_data);
        let dataset = Dataset::new(records, targets);

        let model = LinearRegression::default().fit(&dataset).ok()?;
        let slope = model.params()[0];
        let intercept = model.intercept();

        let predictions = model.predict(&dataset);
        let r2_score = predictions.r2(&dataset).unwrap_or(0.0);

        Some(Self {
            slope,
            intercept,
            r2_score,
            data_points: n_samples,
            first_date,
            last_date,
        })
    }

    /// Weight gained per week along the trend
    pub fn weekly_gain(&self) -> f64 {
        self.slope * 7.0
    }

    /// Trend value n days after the last session
    pub fn projected(&self, days_ahead: i64) -> f64 {
        let span = (self.last_date - self.first_date).num_seconds() as f64 / 86_400.0;
        self.slope * (span + days_ahead as f64) + self.intercept
    }

    /// Model fit quality, 0-1
    pub fn r2_score(&self) -> f64 {
        self.r2_score
    }

    pub fn data_points(&self) -> usize {
        self.data_points
    }

    pub fn format(&self) -> String {
        let gain = self.weekly_gain();
        let sign = if gain >= 0.0 { "+" } else { "" };
        format!(
            "Tendance : {}{:.1} kg/semaine (R² {:.2}, {} séances)\nDans 4 semaines : ~{:.1} kg",
            sign,
            gain,
            self.r2_score,
            self.data_points,
            self.projected(28)
        )
    }
}

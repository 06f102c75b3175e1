//! Shared least-squares fitting
//!
//! Both the efficiency estimator and the correlation view overlay a fitted
//! line on a scatter of per-activity values. The x axis is usually a
//! timestamp ordinal, so the sums are computed on centered values; raw
//! second-since-epoch ordinals squared would otherwise dwarf the signal.

use serde::{Deserialize, Serialize};

/// A fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares fit of y against x
///
/// Returns `None` when the fit is underdetermined: mismatched or
/// too-short inputs, all x values identical, or non-finite sums.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<TrendLine> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    if sxx == 0.0 || !sxx.is_finite() || !sxy.is_finite() {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return None;
    }

    Some(TrendLine { slope, intercept })
}

/// Pearson correlation coefficient
///
/// `None` when either series is constant (zero variance) or the inputs
/// are too short to correlate.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }

    Some(sxy / denominator)
}

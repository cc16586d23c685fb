//! Population standard deviation (divides by N, not N-1).

use crate::domain::indicator::{finite, sma::mean};

pub fn population_stddev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    finite(variance.sqrt())
}

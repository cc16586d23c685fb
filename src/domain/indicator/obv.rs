//! OBV (On-Balance Volume).

use crate::domain::indicator::{finite, tail};

/// Running volume sum starting from zero:
///
/// If close[i] > close[i-1]: OBV += volume[i]
/// If close[i] < close[i-1]: OBV -= volume[i]
/// If close[i] == close[i-1]: unchanged
///
/// `None` with fewer than two bars.
pub fn obv(closes: &[f64], volumes: &[f64]) -> Option<f64> {
    let n = closes.len().min(volumes.len());
    if n < 2 {
        return None;
    }
    let (closes, volumes) = (tail(closes, n), tail(volumes, n));

    let mut total = 0.0;
    for i in 1..n {
        if closes[i] > closes[i - 1] {
            total += volumes[i];
        } else if closes[i] < closes[i - 1] {
            total -= volumes[i];
        }
    }
    finite(total)
}

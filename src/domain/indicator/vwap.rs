//! Volume Weighted Average Price over the full supplied history.

use crate::domain::indicator::{finite, tail};

/// Σ(price × volume) / Σ(volume). `None` when either slice is empty or the
/// total volume is zero.
pub fn vwap(prices: &[f64], volumes: &[f64]) -> Option<f64> {
    let n = prices.len().min(volumes.len());
    if n == 0 {
        return None;
    }
    let prices = tail(prices, n);
    let volumes = tail(volumes, n);

    let total_volume: f64 = volumes.iter().sum();
    if total_volume == 0.0 {
        return None;
    }
    let weighted: f64 = prices.iter().zip(volumes).map(|(p, v)| p * v).sum();
    finite(weighted / total_volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vwap_weights_by_volume() {
        let v = vwap(&[10.0, 20.0], &[1.0, 3.0]).unwrap();
        assert_relative_eq!(v, 17.5);
    }

    #[test]
    fn vwap_zero_volume() {
        assert_eq!(vwap(&[10.0, 20.0], &[0.0, 0.0]), None);
    }

    #[test]
    fn vwap_empty() {
        assert_eq!(vwap(&[], &[1.0]), None);
        assert_eq!(vwap(&[1.0], &[]), None);
    }

    #[test]
    fn vwap_mismatched_lengths_right_aligned() {
        // The oldest price is dropped so the newest bars line up.
        let v = vwap(&[999.0, 10.0, 20.0], &[1.0, 3.0]).unwrap();
        assert_relative_eq!(v, 17.5);
    }
}

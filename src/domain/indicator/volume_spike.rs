//! Volume spike detection.
//!
//! ratio = current volume / mean of the previous n volumes (current bar
//! excluded). Insufficient history or a zero average gives the neutral
//! `(false, 1.0)`.

use crate::domain::indicator::sma::mean;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSpike {
    pub is_spike: bool,
    pub ratio: f64,
}

impl VolumeSpike {
    pub const NEUTRAL: VolumeSpike = VolumeSpike {
        is_spike: false,
        ratio: 1.0,
    };
}

pub fn volume_spike(volumes: &[f64], period: usize, multiplier: f64) -> VolumeSpike {
    let Some(needed) = period.checked_add(1) else {
        return VolumeSpike::NEUTRAL;
    };
    if period == 0 || volumes.len() < needed {
        return VolumeSpike::NEUTRAL;
    }
    let current = volumes[volumes.len() - 1];
    let previous = &volumes[volumes.len() - 1 - period..volumes.len() - 1];

    let average = match mean(previous) {
        Some(avg) if avg != 0.0 => avg,
        _ => return VolumeSpike::NEUTRAL,
    };
    let ratio = current / average;
    if !ratio.is_finite() {
        return VolumeSpike::NEUTRAL;
    }

    VolumeSpike {
        is_spike: ratio > multiplier,
        ratio,
    }
}

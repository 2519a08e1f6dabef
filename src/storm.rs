//! Storm force model.
//!
//! The horizontal kick has the same magnitude on both axes and does not point
//! along the radius from the eye. Grains speed up with distance but are not
//! steered away from the centre. Keep it that way; a direction-resolved
//! radial force changes every result downstream.

use crate::config::{RADIAL_NORMALIZATION, StormParams};

/// Velocity increments applied to one grain in one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kick {
    /// Added to both `vx` and `vy`.
    pub horizontal: f64,
    /// Added to `vz` (always negative for positive fall rates).
    pub vertical: f64,
}

/// Normalised horizontal distance of `(x, y)` from the storm eye.
#[inline]
pub fn radial_distance(storm: &StormParams, x: f64, y: f64) -> f64 {
    let dx = (storm.eye.x - x).abs();
    let dy = (storm.eye.y - y).abs();
    (dx * dx + dy * dy).sqrt() / RADIAL_NORMALIZATION
}

/// Velocity increments for a grain at horizontal position `(x, y)`.
#[inline]
pub fn storm_kick(storm: &StormParams, x: f64, y: f64) -> Kick {
    let r = radial_distance(storm, x, y);
    Kick {
        horizontal: storm.storm_force * r,
        vertical: -storm.fall_rate / (r * r + storm.epsilon),
    }
}

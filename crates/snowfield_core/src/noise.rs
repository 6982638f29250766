//! Opaque deterministic noise consumed for wind micro-texture.
//!
//! Implementations live outside the core; the director only requires smooth
//! values that are stable for a given coordinate pair.

pub trait NoiseSource {
    /// Returns a value in roughly [-1, 1] for the given coordinates.
    fn sample(&self, x: f64, y: f64) -> f64;
}

/// Fixed-value source for hosts and tests that do not care about texture.
pub struct ConstantNoise(pub f64);

impl NoiseSource for ConstantNoise {
    fn sample(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }
}

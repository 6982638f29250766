//! Deterministic lattice value noise for wind micro-texture. The core
//! consumes this opaquely through the `NoiseSource` trait.

use snowfield_core::noise::NoiseSource;

pub struct ValueNoise {
    seed: u64,
}

impl ValueNoise {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Hash a lattice point to [-1, 1].
    fn lattice(&self, xi: i64, yi: i64) -> f64 {
        let mut h = self
            .seed
            .wrapping_add((xi as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
            .wrapping_add((yi as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F));
        h ^= h >> 33;
        h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        h ^= h >> 33;
        (h >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

impl NoiseSource for ValueNoise {
    fn sample(&self, x: f64, y: f64) -> f64 {
        let xi = x.floor() as i64;
        let yi = y.floor() as i64;
        let tx = smoothstep(x - xi as f64);
        let ty = smoothstep(y - yi as f64);

        let a = self.lattice(xi, yi);
        let b = self.lattice(xi + 1, yi);
        let c = self.lattice(xi, yi + 1);
        let d = self.lattice(xi + 1, yi + 1);

        let top = a + (b - a) * tx;
        let bottom = c + (d - c) * tx;
        top + (bottom - top) * ty
    }
}

use rand::{rngs::StdRng, Rng, SeedableRng};

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

pub const HALF_WIDTH_MM: f64 = A4_WIDTH_MM / 2.0;
pub const HALF_HEIGHT_MM: f64 = A4_HEIGHT_MM / 2.0;

/// Rounds an offset to the 0.1 mm resolution impacts are reported with.
pub fn round_to_tenth(value_mm: f64) -> f64 {
    (value_mm * 10.0).round() / 10.0
}

/// Random impact offsets spread uniformly over the target sheet.
pub struct ShotGenerator {
    rng: StdRng,
}

impl ShotGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Next `(x_mm, y_mm)` offset from the sheet centre.
    pub fn next_offset(&mut self) -> (f64, f64) {
        let x = self.rng.gen_range(-HALF_WIDTH_MM..=HALF_WIDTH_MM);
        let y = self.rng.gen_range(-HALF_HEIGHT_MM..=HALF_HEIGHT_MM);
        (round_to_tenth(x), round_to_tenth(y))
    }

    /// Access to the underlying generator for callers drawing other patterns.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use zerocore::target::{round_to_tenth, ShotGenerator, HALF_HEIGHT_MM, HALF_WIDTH_MM};

/// How synthetic impacts are scattered over the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolleyProfile {
    /// Fixed seed for replayable volleys; entropy when unset.
    pub seed: Option<u64>,
    /// Centre of the group relative to the sheet centre.
    pub group_center_mm: (f64, f64),
    /// Radius of a uniform disk around the group centre. Without it shots
    /// land anywhere on the sheet.
    pub group_radius_mm: Option<f64>,
}

impl Default for VolleyProfile {
    fn default() -> Self {
        Self {
            seed: None,
            group_center_mm: (0.0, 0.0),
            group_radius_mm: None,
        }
    }
}

/// Stream of impact offsets drawn according to a [`VolleyProfile`].
pub struct Volley {
    generator: ShotGenerator,
    profile: VolleyProfile,
}

impl Volley {
    pub fn new(profile: VolleyProfile) -> Self {
        let generator = profile
            .seed
            .map(ShotGenerator::seeded)
            .unwrap_or_else(ShotGenerator::from_entropy);
        Self { generator, profile }
    }

    pub fn next_shot(&mut self) -> (f64, f64) {
        let Some(radius) = self.profile.group_radius_mm.filter(|r| *r > 0.0) else {
            return self.generator.next_offset();
        };
        let rng = self.generator.rng_mut();
        // sqrt keeps the density uniform over the disk area
        let distance = radius * rng.gen::<f64>().sqrt();
        let angle = rng.gen_range(0.0..TAU);
        let (cx, cy) = self.profile.group_center_mm;
        let x = (cx + distance * angle.cos()).clamp(-HALF_WIDTH_MM, HALF_WIDTH_MM);
        let y = (cy + distance * angle.sin()).clamp(-HALF_HEIGHT_MM, HALF_HEIGHT_MM);
        (round_to_tenth(x), round_to_tenth(y))
    }
}

//! RGB color resource.

use serde::{Serialize, Serializer};

/// An RGB triplet with components in `[0, 1]`. Two colors are the same
/// resource when they quantize to the same 8-bit channels, i.e. when they
/// serialize to the same `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbColor {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn equals(&self, r: f64, g: f64, b: f64) -> bool {
        self.to_rgb8() == Self::new(r, g, b).to_rgb8()
    }

    /// Channels scaled to `0..=255`.
    pub fn to_rgb8(&self) -> [u8; 3] {
        fn channel(v: f64) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [channel(self.r), channel(self.g), channel(self.b)]
    }

    /// `#rrggbb` form used in serialized output.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl Serialize for RgbColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

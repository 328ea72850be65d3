//! Color and transparency encodings.
//!
//! - ACI: small integer color index, 1..=255 are real colors, 0 is BYBLOCK and
//!   256 is BYLAYER.
//! - True color: 24 bit integer `0x00RRGGBB`.
//! - Transparency: 32 bit integer, low byte is the alpha value (255 = opaque),
//!   bit 25 flags "a real transparency value", bit 24 flags BYBLOCK.

use crate::error::{DxfError, Result};
use std::fmt;

pub const ACI_BYBLOCK: i32 = 0;
pub const ACI_BYLAYER: i32 = 256;

pub const TRANSPARENCY_BYBLOCK: i32 = 0x0100_0000;
pub const TRANSPARENCY_FLAG: i32 = 0x0200_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_int(self) -> i32 {
        rgb2int(self)
    }

    pub fn from_int(value: i32) -> Self {
        int2rgb(value)
    }
}

impl TryFrom<(i32, i32, i32)> for Rgb {
    type Error = DxfError;

    fn try_from(value: (i32, i32, i32)) -> Result<Self> {
        if !is_valid_rgb(value) {
            return Err(DxfError::InvalidValue(format!(
                "invalid RGB value: {:?}",
                value
            )));
        }
        let (r, g, b) = value;
        Ok(Rgb::new(r as u8, g as u8, b as u8))
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Rgb::new(r, g, b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

pub fn is_valid_rgb((r, g, b): (i32, i32, i32)) -> bool {
    [r, g, b].iter().all(|c| (0..=255).contains(c))
}

pub fn rgb2int(rgb: Rgb) -> i32 {
    (i32::from(rgb.r) << 16) | (i32::from(rgb.g) << 8) | i32::from(rgb.b)
}

pub fn int2rgb(value: i32) -> Rgb {
    Rgb::new(
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
    )
}

/// Encodes a transparency in `[0, 1]` (0 = opaque) as flagged raw value.
pub fn float2transparency(value: f64) -> i32 {
    (((1.0 - value) * 255.0) as i32) | TRANSPARENCY_FLAG
}

/// Decodes the low byte of a raw transparency value, ignoring the flags.
pub fn transparency2float(value: i32) -> f64 {
    1.0 - f64::from(value & 0xFF) / 255.0
}

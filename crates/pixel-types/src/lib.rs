use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core constants shared by the pipelines
pub const CHANNELS: usize = 4;
pub const MIN_TARGET_COLORS: u32 = 2;
pub const MAX_TARGET_COLORS: u32 = 256;

/// An RGB triple. Used both for pixel samples and palette entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// One of the three color channels, in R, G, B order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
}

/// Decoded RGBA image: row-major, top-to-bottom, 4 interleaved bytes per pixel.
///
/// Construction validates that both dimensions are positive and that the
/// byte length is exactly `width * height * 4`. Once built the buffer is
/// never mutated; pipelines always return a fresh buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PixelError> {
        let expected = expected_len(width, height)?;
        if data.len() != expected {
            return Err(PixelError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { width, height, data })
    }

    /// A buffer where every pixel is `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, PixelError> {
        let expected = expected_len(width, height)?;
        let data = rgba.iter().copied().cycle().take(expected).collect();
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value at (x, y). Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    /// RGB part of every pixel, in scan order.
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| Color::new(px[0], px[1], px[2]))
    }
}

fn expected_len(width: u32, height: u32) -> Result<usize, PixelError> {
    if width == 0 || height == 0 {
        return Err(PixelError::InvalidDimensions { width, height });
    }

    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(PixelError::InvalidDimensions { width, height })
}

/// Ordered, non-empty list of palette colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Color>", into = "Vec<Color>")]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Result<Self, PixelError> {
        if colors.is_empty() {
            return Err(PixelError::EmptyPalette);
        }
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false for a palette built through [`Palette::new`].
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    /// Flat `[r, g, b, r, g, b, ...]` bytes.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| c.to_array()).collect()
    }
}

impl TryFrom<Vec<Color>> for Palette {
    type Error = PixelError;

    fn try_from(colors: Vec<Color>) -> Result<Self, Self::Error> {
        Palette::new(colors)
    }
}

impl From<Palette> for Vec<Color> {
    fn from(palette: Palette) -> Self {
        palette.colors
    }
}

/// Structured error taxonomy with stable codes
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PixelError {
    #[error("E_PARAM_COLORS: target color count must be between 2 and 256, got {requested}")]
    InvalidTargetColors { requested: u32 },

    #[error("E_PARAM_DIMENSIONS: dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("E_PARAM_METHOD: unknown interpolation method '{name}' (expected nearest, bilinear or bicubic)")]
    UnknownInterpolation { name: String },

    #[error("E_PARAM_PERCENT: percentage {percent} out of range: {message}")]
    InvalidPercent { percent: f64, message: String },

    #[error("E_PARAM_PALETTE: palette must contain at least one color")]
    EmptyPalette,

    #[error("E_INPUT_BUFFER: expected {expected} RGBA bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

impl PixelError {
    /// Get structured error code for logging and reports
    pub fn code(&self) -> &'static str {
        match self {
            PixelError::InvalidTargetColors { .. } => "E_PARAM_COLORS",
            PixelError::InvalidDimensions { .. } => "E_PARAM_DIMENSIONS",
            PixelError::UnknownInterpolation { .. } => "E_PARAM_METHOD",
            PixelError::InvalidPercent { .. } => "E_PARAM_PERCENT",
            PixelError::EmptyPalette => "E_PARAM_PALETTE",
            PixelError::BufferSizeMismatch { .. } => "E_INPUT_BUFFER",
        }
    }
}

/// Fail fast on a target color count outside `[2, 256]`.
pub fn validate_target_colors(target_colors: u32) -> Result<(), PixelError> {
    if !(MIN_TARGET_COLORS..=MAX_TARGET_COLORS).contains(&target_colors) {
        return Err(PixelError::InvalidTargetColors {
            requested: target_colors,
        });
    }
    Ok(())
}

/// RGB distance helpers
pub mod distance {
    use super::Color;

    /// Squared Euclidean distance in RGB. Ordering matches the true distance.
    pub fn squared_rgb(a: Color, b: Color) -> u32 {
        let dr = a.r as i32 - b.r as i32;
        let dg = a.g as i32 - b.g as i32;
        let db = a.b as i32 - b.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    pub fn euclidean_rgb(a: Color, b: Color) -> f64 {
        (squared_rgb(a, b) as f64).sqrt()
    }
}

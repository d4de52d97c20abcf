use std::fmt;
use std::str::FromStr;

use pixel_types::{PixelBuffer, PixelError, CHANNELS};
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod sampling;

/// Interpolation strategy for [`resample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Copy the pixel at the rounded source coordinate.
    Nearest,
    /// Blend the four surrounding pixels.
    #[default]
    Bilinear,
    /// Cubic convolution over a 4x4 neighbourhood (a = -0.5).
    Bicubic,
}

impl Interpolation {
    pub const ALL: [Interpolation; 3] = [
        Interpolation::Nearest,
        Interpolation::Bilinear,
        Interpolation::Bicubic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Bicubic => "bicubic",
        }
    }

    fn sample(&self, image: &PixelBuffer, src_x: f64, src_y: f64) -> [u8; 4] {
        match self {
            Interpolation::Nearest => sampling::nearest(image, src_x, src_y),
            Interpolation::Bilinear => sampling::bilinear(image, src_x, src_y),
            Interpolation::Bicubic => sampling::bicubic(image, src_x, src_y),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Interpolation::Nearest),
            "bilinear" => Ok(Interpolation::Bilinear),
            "bicubic" => Ok(Interpolation::Bicubic),
            _ => Err(PixelError::UnknownInterpolation {
                name: s.to_string(),
            }),
        }
    }
}

/// Resample `image` to `target_width` x `target_height`.
///
/// Output pixel (x, y) samples the source at `(x * src_w / target_w,
/// y * src_h / target_h)`. The mapping is anchored at the top-left corner
/// rather than at pixel centres, so it leans slightly toward the origin.
/// Every output pixel is computed independently.
#[tracing::instrument(level = "info", skip(image), fields(src_width = image.width(), src_height = image.height()))]
pub fn resample(
    image: &PixelBuffer,
    target_width: u32,
    target_height: u32,
    method: Interpolation,
) -> Result<PixelBuffer, PixelError> {
    if target_width == 0 || target_height == 0 {
        return Err(PixelError::InvalidDimensions {
            width: target_width,
            height: target_height,
        });
    }

    let start_time = std::time::Instant::now();

    let scale_x = image.width() as f64 / target_width as f64;
    let scale_y = image.height() as f64 / target_height as f64;

    let mut output = Vec::with_capacity(target_width as usize * target_height as usize * CHANNELS);
    for y in 0..target_height {
        let src_y = y as f64 * scale_y;
        for x in 0..target_width {
            let src_x = x as f64 * scale_x;
            output.extend_from_slice(&method.sample(image, src_x, src_y));
        }
    }

    info!(
        stage = "resample",
        %method,
        target_width,
        target_height,
        duration_ms = start_time.elapsed().as_millis() as u64,
        "Resampling completed"
    );

    PixelBuffer::new(target_width, target_height, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_methods() {
        assert_eq!("nearest".parse::<Interpolation>().unwrap(), Interpolation::Nearest);
        assert_eq!("Bilinear".parse::<Interpolation>().unwrap(), Interpolation::Bilinear);
        assert_eq!(" BICUBIC ".parse::<Interpolation>().unwrap(), Interpolation::Bicubic);
    }

    #[test]
    fn test_parse_unknown_method() {
        let err = "lanczos".parse::<Interpolation>().unwrap_err();
        assert_eq!(err.code(), "E_PARAM_METHOD");
        assert_eq!(
            err,
            PixelError::UnknownInterpolation {
                name: "lanczos".to_string()
            }
        );
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for method in Interpolation::ALL {
            assert_eq!(method.to_string().parse::<Interpolation>().unwrap(), method);
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Interpolation::Bicubic).unwrap(), "\"bicubic\"");
        let parsed: Interpolation = serde_json::from_str("\"nearest\"").unwrap();
        assert_eq!(parsed, Interpolation::Nearest);
    }

    #[test]
    fn test_rejects_zero_target() {
        let img = PixelBuffer::filled(4, 4, [1, 2, 3, 4]).unwrap();
        let err = resample(&img, 0, 3, Interpolation::Nearest).unwrap_err();
        assert_eq!(err, PixelError::InvalidDimensions { width: 0, height: 3 });
    }

    #[test]
    fn test_nearest_downscale_picks_forward_mapped_pixels() {
        // 4x1 row 0,1,2,3 -> 2x1 samples source x = 0 and 2.
        let data = (0..4u8).flat_map(|v| [v, v, v, 255]).collect();
        let img = PixelBuffer::new(4, 1, data).unwrap();
        let out = resample(&img, 2, 1, Interpolation::Nearest).unwrap();
        assert_eq!(out.as_bytes(), &[0, 0, 0, 255, 2, 2, 2, 255]);
    }
}

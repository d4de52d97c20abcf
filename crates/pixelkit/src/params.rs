//! Caller-side parameter helpers.
//!
//! These turn the percentage and aspect-ratio inputs a batch tool offers into
//! the plain color counts and dimensions the pipelines take. Nothing here is
//! clamped silently: out-of-range input is an error.

use pixel_types::{PixelError, MIN_TARGET_COLORS};

const BASE_COLORS: f64 = 256.0;
const MAX_REDUCTION_PERCENT: f64 = 99.0;

fn percent_error(percent: f64, message: &str) -> PixelError {
    PixelError::InvalidPercent {
        percent,
        message: message.to_string(),
    }
}

/// Color count for "reduce colors by `percent`%", assuming a 256-color start.
///
/// `max(2, floor(256 * (1 - percent / 100)))`; `percent` must lie in `[0, 99]`.
pub fn target_colors_from_reduction(percent: f64) -> Result<u32, PixelError> {
    if !percent.is_finite() || !(0.0..=MAX_REDUCTION_PERCENT).contains(&percent) {
        return Err(percent_error(percent, "reduction must be between 0 and 99"));
    }

    let colors = (BASE_COLORS * (1.0 - percent / 100.0)).floor() as u32;
    Ok(colors.max(MIN_TARGET_COLORS))
}

/// Dimensions scaled by `percent`, each rounded to the nearest pixel.
pub fn scaled_dimensions(width: u32, height: u32, percent: f64) -> Result<(u32, u32), PixelError> {
    if !percent.is_finite() || percent <= 0.0 {
        return Err(percent_error(percent, "scale must be positive"));
    }

    let new_width = (width as f64 * percent / 100.0).round() as u32;
    let new_height = (height as f64 * percent / 100.0).round() as u32;
    if new_width == 0 || new_height == 0 {
        return Err(PixelError::InvalidDimensions {
            width: new_width,
            height: new_height,
        });
    }

    Ok((new_width, new_height))
}

/// Height that keeps the `src_width:src_height` aspect ratio at `width`.
pub fn height_for_width(width: u32, src_width: u32, src_height: u32) -> Result<u32, PixelError> {
    check_source(src_width, src_height)?;
    let aspect = src_width as f64 / src_height as f64;
    let height = (width as f64 / aspect).round() as u32;
    if width == 0 || height == 0 {
        return Err(PixelError::InvalidDimensions { width, height });
    }
    Ok(height)
}

/// Width that keeps the `src_width:src_height` aspect ratio at `height`.
pub fn width_for_height(height: u32, src_width: u32, src_height: u32) -> Result<u32, PixelError> {
    check_source(src_width, src_height)?;
    let aspect = src_width as f64 / src_height as f64;
    let width = (height as f64 * aspect).round() as u32;
    if width == 0 || height == 0 {
        return Err(PixelError::InvalidDimensions { width, height });
    }
    Ok(width)
}

fn check_source(src_width: u32, src_height: u32) -> Result<(), PixelError> {
    if src_width == 0 || src_height == 0 {
        return Err(PixelError::InvalidDimensions {
            width: src_width,
            height: src_height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_to_colors() {
        assert_eq!(target_colors_from_reduction(0.0).unwrap(), 256);
        assert_eq!(target_colors_from_reduction(50.0).unwrap(), 128);
        assert_eq!(target_colors_from_reduction(90.0).unwrap(), 25);
        assert_eq!(target_colors_from_reduction(99.0).unwrap(), 2);
        assert_eq!(target_colors_from_reduction(33.3).unwrap(), 170);
    }

    #[test]
    fn test_reduction_out_of_range() {
        for bad in [-1.0, 99.5, 100.0, f64::NAN, f64::INFINITY] {
            let err = target_colors_from_reduction(bad).unwrap_err();
            assert_eq!(err.code(), "E_PARAM_PERCENT");
        }
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(640, 480, 50.0).unwrap(), (320, 240));
        assert_eq!(scaled_dimensions(3, 3, 50.0).unwrap(), (2, 2));
        assert_eq!(scaled_dimensions(10, 10, 250.0).unwrap(), (25, 25));
        assert!(scaled_dimensions(10, 10, 0.0).is_err());
        assert_eq!(
            scaled_dimensions(10, 1, 10.0).unwrap_err(),
            PixelError::InvalidDimensions { width: 1, height: 0 }
        );
    }

    #[test]
    fn test_aspect_helpers() {
        assert_eq!(height_for_width(320, 640, 480).unwrap(), 240);
        assert_eq!(width_for_height(100, 1920, 1080).unwrap(), 178);
        assert!(height_for_width(10, 0, 5).is_err());
        assert!(height_for_width(0, 4, 3).is_err());
    }
}

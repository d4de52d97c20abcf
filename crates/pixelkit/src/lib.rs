//! Host-facing entry points for the quantization and resampling pipelines.
//!
//! Both pipelines are pure: a decoded [`PixelBuffer`] and a few parameters
//! go in, a new buffer comes out. Decoding and encoding files is left to the
//! host.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub mod params;

pub use median_quant::{build_palette, quantize, MedianCutQuantizer, QuantizedImage};
pub use params::{height_for_width, scaled_dimensions, target_colors_from_reduction, width_for_height};
pub use pixel_types::{validate_target_colors, Color, Palette, PixelBuffer, PixelError};
pub use resample::Interpolation;

static INIT: Once = Once::new();

/// Install a fmt subscriber honouring `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call has an effect, and an
/// already-installed global subscriber is left alone.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

/// Median-cut palette of `target_colors` entries, then map the image onto it.
pub fn build_and_apply_palette(
    image: &PixelBuffer,
    target_colors: u32,
    use_dithering: bool,
) -> Result<PixelBuffer, PixelError> {
    let quantizer = MedianCutQuantizer::new(target_colors)?.with_dithering(use_dithering);
    Ok(quantizer.quantize_image(image)?.image)
}

/// Resize `image` with the given interpolation.
///
/// Stage timing is logged by the resampler under `stage = "resample"`.
pub fn resample(
    image: &PixelBuffer,
    target_width: u32,
    target_height: u32,
    method: Interpolation,
) -> Result<PixelBuffer, PixelError> {
    ::resample::resample(image, target_width, target_height, method)
}

/// Like [`resample`], with the method given by name.
pub fn resample_by_name(
    image: &PixelBuffer,
    target_width: u32,
    target_height: u32,
    method: &str,
) -> Result<PixelBuffer, PixelError> {
    resample(image, target_width, target_height, method.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn test_build_and_apply_rejects_bad_count() {
        let img = PixelBuffer::filled(2, 2, [1, 1, 1, 255]).unwrap();
        assert_eq!(
            build_and_apply_palette(&img, 1, false).unwrap_err(),
            PixelError::InvalidTargetColors { requested: 1 }
        );
    }

    #[test]
    fn test_resample_matches_stage_crate() {
        let data = (0..24u8).map(|v| v * 10).collect();
        let img = PixelBuffer::new(3, 2, data).unwrap();
        for method in Interpolation::ALL {
            assert_eq!(
                resample(&img, 5, 4, method).unwrap(),
                ::resample::resample(&img, 5, 4, method).unwrap()
            );
        }
    }

    #[test]
    fn test_resample_by_name() {
        let img = PixelBuffer::filled(4, 4, [128, 128, 128, 255]).unwrap();
        let out = resample_by_name(&img, 2, 2, "bicubic").unwrap();
        assert_eq!(out.dimensions(), (2, 2));

        let err = resample_by_name(&img, 2, 2, "area").unwrap_err();
        assert_eq!(err.code(), "E_PARAM_METHOD");
    }
}

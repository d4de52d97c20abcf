use tracing::{info, span, Level};
use pixel_types::{validate_target_colors, Palette, PixelBuffer, PixelError};

pub mod color_mapper;
pub mod palette_builder;

pub use color_mapper::{map_indices, nearest_index, quantize};
pub use palette_builder::{build_palette, distinct_colors, ColorCount};

/// Median-cut quantizer: palette construction followed by palette mapping
#[derive(Debug, Clone)]
pub struct MedianCutQuantizer {
    target_colors: u32,
    dither: bool,
}

impl Default for MedianCutQuantizer {
    fn default() -> Self {
        Self {
            target_colors: 16,
            dither: false,
        }
    }
}

/// Palette together with the image mapped onto it
#[derive(Debug, Clone)]
pub struct QuantizedImage {
    pub palette: Palette,
    pub image: PixelBuffer,
    pub processing_time_ms: u64,
}

impl MedianCutQuantizer {
    /// Fails fast when `target_colors` is outside `[2, 256]`.
    pub fn new(target_colors: u32) -> Result<Self, PixelError> {
        validate_target_colors(target_colors)?;
        Ok(Self {
            target_colors,
            ..Default::default()
        })
    }

    pub fn with_dithering(mut self, dither: bool) -> Self {
        self.dither = dither;
        self
    }

    pub fn target_colors(&self) -> u32 {
        self.target_colors
    }

    pub fn dithering(&self) -> bool {
        self.dither
    }

    /// Build a palette from `image` and map `image` onto it
    #[tracing::instrument(level = "info", skip(self, image))]
    pub fn quantize_image(&self, image: &PixelBuffer) -> Result<QuantizedImage, PixelError> {
        let span = span!(
            Level::INFO,
            "quantize_image",
            width = image.width(),
            height = image.height()
        );
        let _guard = span.enter();

        let start_time = std::time::Instant::now();

        let palette = build_palette(image, self.target_colors)?;
        let mapped = quantize(image, &palette, self.dither)?;

        let processing_time = start_time.elapsed().as_millis() as u64;

        info!(
            stage = "quantize",
            target_colors = self.target_colors,
            palette_size = palette.len(),
            dither = self.dither,
            duration_ms = processing_time,
            "Quantization completed"
        );

        Ok(QuantizedImage {
            palette,
            image: mapped,
            processing_time_ms: processing_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantizer_creation() {
        let quantizer = MedianCutQuantizer::new(8).unwrap().with_dithering(true);
        assert_eq!(quantizer.target_colors(), 8);
        assert!(quantizer.dithering());
    }

    #[test]
    fn test_quantizer_rejects_bad_color_count() {
        assert_eq!(
            MedianCutQuantizer::new(0).unwrap_err().code(),
            "E_PARAM_COLORS"
        );
        assert!(MedianCutQuantizer::new(300).is_err());
    }

    #[test]
    fn test_quantization_workflow() {
        let mut data = Vec::new();
        for y in 0..16u8 {
            for x in 0..16u8 {
                data.extend_from_slice(&[x * 16, y * 16, 128, 255]);
            }
        }
        let image = PixelBuffer::new(16, 16, data).unwrap();

        let result = MedianCutQuantizer::new(8).unwrap().quantize_image(&image).unwrap();

        assert_eq!(result.palette.len(), 8);
        assert_eq!(result.image.dimensions(), (16, 16));
        for color in result.image.colors() {
            assert!(result.palette.colors().contains(&color));
        }
    }
}

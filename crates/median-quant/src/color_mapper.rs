//! Nearest-color mapping with optional Floyd-Steinberg error diffusion.

use pixel_types::{distance, Color, Palette, PixelBuffer, PixelError, CHANNELS};
use tracing::info;

/// Floyd-Steinberg neighbours as `(dx, dy, fraction)`:
///
/// ```text
///        X   7
///    3   5   1
/// ```
const FLOYD_STEINBERG: [(isize, isize, f64); 4] = [
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

/// Index of the palette entry closest to `color` in RGB.
///
/// Ties resolve to the earliest entry.
pub fn nearest_index(color: Color, palette: &Palette) -> usize {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;

    for (idx, &candidate) in palette.colors().iter().enumerate() {
        let dist = distance::squared_rgb(color, candidate);
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }

    best_idx
}

/// Palette index for every pixel, without dithering.
pub fn map_indices(image: &PixelBuffer, palette: &Palette) -> Vec<usize> {
    image
        .colors()
        .map(|color| nearest_index(color, palette))
        .collect()
}

/// Replace every pixel's RGB with a palette color. Alpha is copied through.
#[tracing::instrument(level = "info", skip(image, palette), fields(palette_size = palette.len()))]
pub fn quantize(
    image: &PixelBuffer,
    palette: &Palette,
    dither: bool,
) -> Result<PixelBuffer, PixelError> {
    let start_time = std::time::Instant::now();

    let data = if dither {
        floyd_steinberg(image, palette)
    } else {
        map_independent(image, palette)
    };

    info!(
        stage = "map",
        dither,
        pixels = image.pixel_count(),
        duration_ms = start_time.elapsed().as_millis() as u64,
        "Palette mapping completed"
    );

    PixelBuffer::new(image.width(), image.height(), data)
}

fn map_independent(image: &PixelBuffer, palette: &Palette) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.as_bytes().len());

    for px in image.as_bytes().chunks_exact(CHANNELS) {
        let mapped = palette.colors()[nearest_index(Color::new(px[0], px[1], px[2]), palette)];
        out.extend_from_slice(&[mapped.r, mapped.g, mapped.b, px[3]]);
    }

    out
}

/// Error diffusion over a single working copy in scan order.
///
/// Each pixel is read after all earlier pixels have pushed error into it,
/// so the loop order is part of the output.
fn floyd_steinberg(image: &PixelBuffer, palette: &Palette) -> Vec<u8> {
    let width = image.width() as isize;
    let height = image.height() as isize;
    let mut working = image.as_bytes().to_vec();

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize * CHANNELS;
            let current = Color::new(working[idx], working[idx + 1], working[idx + 2]);
            let mapped = palette.colors()[nearest_index(current, palette)];

            working[idx] = mapped.r;
            working[idx + 1] = mapped.g;
            working[idx + 2] = mapped.b;

            let error = [
                current.r as i32 - mapped.r as i32,
                current.g as i32 - mapped.g as i32,
                current.b as i32 - mapped.b as i32,
            ];
            if error == [0, 0, 0] {
                continue;
            }

            for &(dx, dy, fraction) in &FLOYD_STEINBERG {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || nx >= width || ny >= height {
                    continue;
                }

                let n_idx = (ny * width + nx) as usize * CHANNELS;
                for channel in 0..3 {
                    let adjusted = working[n_idx + channel] as f64 + error[channel] as f64 * fraction;
                    working[n_idx + channel] = store_channel(adjusted);
                }
            }
        }
    }

    working
}

/// Clamp to the byte range and round half to even, the way a clamped byte
/// store does.
fn store_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

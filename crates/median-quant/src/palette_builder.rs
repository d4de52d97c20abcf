//! Median-cut palette construction.
//!
//! Distinct colors are collected once into a fixed sample array. Buckets are
//! contiguous index ranges over that array; splitting a bucket sorts its
//! range in place and hands the upper half to a new bucket, so no color is
//! ever copied between buckets.

use std::collections::HashMap;

use pixel_types::{validate_target_colors, Channel, Color, Palette, PixelBuffer, PixelError};
use tracing::{debug, info};

/// A distinct color and how many pixels carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCount {
    pub color: Color,
    pub count: u32,
}

/// Distinct RGB colors in first-seen (scan) order. Alpha is ignored.
pub fn distinct_colors(image: &PixelBuffer) -> Vec<ColorCount> {
    let mut slots: HashMap<Color, usize> = HashMap::new();
    let mut colors: Vec<ColorCount> = Vec::new();

    for color in image.colors() {
        match slots.get(&color) {
            Some(&slot) => colors[slot].count += 1,
            None => {
                slots.insert(color, colors.len());
                colors.push(ColorCount { color, count: 1 });
            }
        }
    }

    colors
}

/// Half-open range `[start, end)` into the sample array.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    start: usize,
    end: usize,
}

impl Bucket {
    fn len(&self) -> usize {
        self.end - self.start
    }

    /// Per-channel `max - min` over the bucket's colors.
    fn ranges(&self, samples: &[Color]) -> [u8; 3] {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];

        for color in &samples[self.start..self.end] {
            for (i, &channel) in Channel::ALL.iter().enumerate() {
                let v = color.channel(channel);
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }

        [max[0] - min[0], max[1] - min[1], max[2] - min[2]]
    }

    fn mean(&self, samples: &[Color]) -> Color {
        let members = &samples[self.start..self.end];
        let n = members.len() as f64;
        let mut sums = [0u64; 3];
        for color in members {
            sums[0] += color.r as u64;
            sums[1] += color.g as u64;
            sums[2] += color.b as u64;
        }

        // f64::round rounds half away from zero; all means are non-negative.
        Color::new(
            (sums[0] as f64 / n).round() as u8,
            (sums[1] as f64 / n).round() as u8,
            (sums[2] as f64 / n).round() as u8,
        )
    }
}

/// Build a palette of at most `target_colors` entries by median cut.
///
/// When the image has no more distinct colors than requested, the distinct
/// colors are returned verbatim in first-seen order.
#[tracing::instrument(level = "info", skip(image), fields(width = image.width(), height = image.height()))]
pub fn build_palette(image: &PixelBuffer, target_colors: u32) -> Result<Palette, PixelError> {
    validate_target_colors(target_colors)?;
    let target = target_colors as usize;

    let distinct = distinct_colors(image);
    info!(
        stage = "palette",
        distinct_colors = distinct.len(),
        target_colors,
        "Collected distinct colors"
    );

    if distinct.len() <= target {
        return Palette::new(distinct.into_iter().map(|c| c.color).collect());
    }

    let mut samples: Vec<Color> = distinct.into_iter().map(|c| c.color).collect();
    let mut buckets = vec![Bucket {
        start: 0,
        end: samples.len(),
    }];

    while buckets.len() < target {
        let Some((bucket_idx, channel, range)) = pick_split(&buckets, &samples) else {
            debug!(stage = "palette", buckets = buckets.len(), "No bucket left to split");
            break;
        };

        let bucket = buckets[bucket_idx];
        // Stable: equal channel values keep their first-seen order.
        samples[bucket.start..bucket.end].sort_by_key(|c| c.channel(channel));

        let mid = bucket.start + bucket.len() / 2;
        buckets[bucket_idx].end = mid;
        buckets.push(Bucket {
            start: mid,
            end: bucket.end,
        });

        debug!(
            stage = "palette",
            bucket = bucket_idx,
            ?channel,
            range,
            lower = mid - bucket.start,
            upper = bucket.end - mid,
            "Split bucket"
        );
    }

    let colors: Vec<Color> = buckets.iter().map(|b| b.mean(&samples)).collect();

    info!(
        stage = "palette",
        palette_size = colors.len(),
        "Median cut completed"
    );

    Palette::new(colors)
}

/// The bucket with the widest single-channel range, and that channel.
///
/// Ties go to the lowest bucket index, then to R before G before B. Returns
/// `None` when every bucket holds a single color.
fn pick_split(buckets: &[Bucket], samples: &[Color]) -> Option<(usize, Channel, u8)> {
    let mut best: Option<(usize, Channel, u8)> = None;

    for (idx, bucket) in buckets.iter().enumerate() {
        let ranges = bucket.ranges(samples);
        let widest = ranges[0].max(ranges[1]).max(ranges[2]);
        let best_range = best.map_or(0, |(_, _, r)| r);

        if widest > best_range {
            let channel = Channel::ALL
                .into_iter()
                .zip(ranges)
                .find_map(|(channel, r)| (r == widest).then_some(channel))
                .unwrap_or(Channel::Red);
            best = Some((idx, channel, widest));
        }
    }

    best
}

use pixel_types::{PixelBuffer, CHANNELS};

/// Cubic convolution parameter (Catmull-Rom style).
const CUBIC_A: f64 = -0.5;

fn get_pixel(image: &PixelBuffer, x: usize, y: usize) -> [u8; 4] {
    let idx = (y * image.width() as usize + x) * CHANNELS;
    let data = image.as_bytes();
    [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]
}

fn clamp_index(v: i64, len: u32) -> usize {
    v.clamp(0, len as i64 - 1) as usize
}

/// Round the source coordinate and copy that pixel.
pub fn nearest(image: &PixelBuffer, src_x: f64, src_y: f64) -> [u8; 4] {
    let x = clamp_index(src_x.round() as i64, image.width());
    let y = clamp_index(src_y.round() as i64, image.height());
    get_pixel(image, x, y)
}

/// Four-corner blend around the floor coordinate.
pub fn bilinear(image: &PixelBuffer, src_x: f64, src_y: f64) -> [u8; 4] {
    let x1 = clamp_index(src_x.floor() as i64, image.width());
    let y1 = clamp_index(src_y.floor() as i64, image.height());
    let x2 = clamp_index(x1 as i64 + 1, image.width());
    let y2 = clamp_index(y1 as i64 + 1, image.height());

    let fx = src_x - x1 as f64;
    let fy = src_y - y1 as f64;

    let top_left = get_pixel(image, x1, y1);
    let top_right = get_pixel(image, x2, y1);
    let bottom_left = get_pixel(image, x1, y2);
    let bottom_right = get_pixel(image, x2, y2);

    let mut result = [0u8; 4];
    for i in 0..CHANNELS {
        let value = top_left[i] as f64 * (1.0 - fx) * (1.0 - fy)
            + top_right[i] as f64 * fx * (1.0 - fy)
            + bottom_left[i] as f64 * (1.0 - fx) * fy
            + bottom_right[i] as f64 * fx * fy;
        result[i] = value.round().clamp(0.0, 255.0) as u8;
    }
    result
}

/// 1-D cubic convolution weight for distance `t`.
pub fn cubic_kernel(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        (CUBIC_A + 2.0) * t * t * t - (CUBIC_A + 3.0) * t * t + 1.0
    } else if t <= 2.0 {
        CUBIC_A * t * t * t - 5.0 * CUBIC_A * t * t + 8.0 * CUBIC_A * t - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Separable 4x4 cubic convolution, normalised by the total weight.
pub fn bicubic(image: &PixelBuffer, src_x: f64, src_y: f64) -> [u8; 4] {
    let x1 = src_x.floor() as i64;
    let y1 = src_y.floor() as i64;
    let fx = src_x - x1 as f64;
    let fy = src_y - y1 as f64;

    let mut sums = [0.0f64; 4];
    let mut weight_sum = 0.0f64;

    for dy in -1i64..=2 {
        for dx in -1i64..=2 {
            let pixel = get_pixel(
                image,
                clamp_index(x1 + dx, image.width()),
                clamp_index(y1 + dy, image.height()),
            );
            let weight = cubic_kernel(fx - dx as f64) * cubic_kernel(fy - dy as f64);

            for (sum, &channel) in sums.iter_mut().zip(pixel.iter()) {
                *sum += channel as f64 * weight;
            }
            weight_sum += weight;
        }
    }

    let mut result = [0u8; 4];
    for (out, sum) in result.iter_mut().zip(sums) {
        *out = (sum / weight_sum).clamp(0.0, 255.0).round() as u8;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_2x2() -> PixelBuffer {
        PixelBuffer::new(
            2,
            2,
            vec![
                0, 0, 0, 0, //
                100, 100, 100, 100, //
                200, 200, 200, 200, //
                255, 255, 255, 255,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cubic_kernel_values() {
        assert_eq!(cubic_kernel(0.0), 1.0);
        assert_eq!(cubic_kernel(1.0), 0.0);
        assert_eq!(cubic_kernel(2.0), 0.0);
        assert_eq!(cubic_kernel(2.5), 0.0);
        assert!((cubic_kernel(0.5) - 0.5625).abs() < 1e-12);
        assert!((cubic_kernel(-1.5) + 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_kernel_partition_of_unity() {
        for step in 0..10 {
            let f = step as f64 / 10.0;
            let total: f64 = (-1..=2).map(|d| cubic_kernel(f - d as f64)).sum();
            assert!((total - 1.0).abs() < 1e-9, "weights at {} sum to {}", f, total);
        }
    }

    #[test]
    fn test_nearest_rounds_half_up_and_clamps() {
        let img = ramp_2x2();
        assert_eq!(nearest(&img, 0.49, 0.0)[0], 0);
        assert_eq!(nearest(&img, 0.5, 0.0)[0], 100);
        assert_eq!(nearest(&img, 1.7, 1.7)[0], 255);
    }

    #[test]
    fn test_bilinear_midpoint() {
        let img = ramp_2x2();
        // (0 + 100 + 200 + 255) / 4 = 138.75
        assert_eq!(bilinear(&img, 0.5, 0.5), [139, 139, 139, 139]);
        // Right edge clamps x2 to x1.
        assert_eq!(bilinear(&img, 1.0, 0.0), [100, 100, 100, 100]);
    }

    #[test]
    fn test_bicubic_on_sample_point_is_exact() {
        let img = ramp_2x2();
        assert_eq!(bicubic(&img, 0.0, 0.0), [0, 0, 0, 0]);
        assert_eq!(bicubic(&img, 1.0, 1.0), [255, 255, 255, 255]);
    }
}

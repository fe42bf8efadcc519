// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deskew — estimates the dominant rotation of the printed text block
// from foreground-pixel geometry and straightens the page.
//
// The estimate comes from the minimum-area bounding rectangle of the
// thresholded foreground pixels: its long axis tracks the text block
// orientation on typical scans. Rotation samples with edge-replicated
// borders so straightening never introduces blank corners.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use tracing::debug;

/// Foreground points below this count give too weak a signal to trust.
const MIN_FOREGROUND_POINTS: usize = 64;

/// Estimate the skew angle of the page's text block in degrees.
///
/// The sign matches [`rotate_edge_replicated`]: rotating the page by
/// the negated estimate straightens it. The result is
/// folded into (-45°, 45°] — a portrait text column's long axis must
/// not be mistaken for a quarter-turn. Returns `None` when the page has
/// too little foreground to measure.
pub fn estimate_skew_angle(page: &RgbImage) -> Option<f32> {
    let gray = image::imageops::grayscale(page);
    let threshold = otsu_threshold(&gray);

    let points = foreground_points(&gray, threshold);
    if points.len() < MIN_FOREGROUND_POINTS {
        debug!(
            points = points.len(),
            threshold, "Too few foreground points for skew estimation"
        );
        return None;
    }

    let corners = min_area_rect(&points);
    let angle = dominant_edge_angle(&corners);
    debug!(angle, points = points.len(), "Skew estimated");
    Some(angle)
}

/// Rotate the page content by `degrees` about its center, in the same
/// angle convention [`estimate_skew_angle`] reports — rotating by the
/// negated estimate straightens the page. Out-of-bounds samples come
/// from the nearest edge pixel so the corners stay filled with page
/// texture.
pub fn rotate_edge_replicated(page: &RgbImage, degrees: f32) -> RgbImage {
    let (width, height) = page.dimensions();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;

    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    RgbImage::from_fn(width, height, |x, y| {
        // Inverse mapping: rotate the destination coordinate back into
        // the source frame, then sample bilinearly with clamped edges.
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let src_x = cx + cos * dx + sin * dy;
        let src_y = cy - sin * dx + cos * dy;
        sample_bilinear_clamped(page, src_x, src_y)
    })
}

/// Collect foreground (darker than threshold) pixel coordinates,
/// striding on large pages to bound the point count.
fn foreground_points(gray: &GrayImage, threshold: u8) -> Vec<Point<i32>> {
    let (width, height) = gray.dimensions();
    let stride = 1 + width.max(height) / 1024;

    let mut points = Vec::new();
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            if gray.get_pixel(x, y).0[0] < threshold {
                points.push(Point::new(x as i32, y as i32));
            }
            x += stride;
        }
        y += stride;
    }
    points
}

/// Angle in degrees of the longest edge of a rectangle, folded into
/// (-45°, 45°].
fn dominant_edge_angle(corners: &[Point<i32>; 4]) -> f32 {
    let mut best_len = -1.0f32;
    let mut best_angle = 0.0f32;

    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let dx = (b.x - a.x) as f32;
        let dy = (b.y - a.y) as f32;
        let len = dx * dx + dy * dy;
        if len > best_len {
            best_len = len;
            best_angle = dy.atan2(dx).to_degrees();
        }
    }

    // Fold into (-45, 45]: the nearest axis is the reading direction.
    let mut angle = best_angle;
    while angle > 45.0 {
        angle -= 90.0;
    }
    while angle <= -45.0 {
        angle += 90.0;
    }
    angle
}

/// Bilinear sample with coordinates clamped to the image bounds
/// (edge replication).
fn sample_bilinear_clamped(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;

    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = image.get_pixel(x0, y0).0;
    let p10 = image.get_pixel(x1, y0).0;
    let p01 = image.get_pixel(x0, y1).0;
    let p11 = image.get_pixel(x1, y1).0;

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// Compute the Otsu threshold for a grayscale image.
///
/// Finds the threshold value that minimises the intra-class variance of
/// the dark and light pixel groups.
fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total_pixels = gray.width() as u64 * gray.height() as u64;
    if total_pixels == 0 {
        return 128;
    }

    let mut sum_total: f64 = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        sum_total += i as f64 * count as f64;
    }

    let mut sum_background: f64 = 0.0;
    let mut weight_background: u64 = 0;
    let mut max_variance: f64 = 0.0;
    let mut best_threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total_pixels - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_total - sum_background) / weight_foreground as f64;

        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Draw a dark bar rotated by `degrees` onto a white page.
    fn page_with_rotated_bar(degrees: f32) -> RgbImage {
        let mut page = RgbImage::from_pixel(600, 400, Rgb([255, 255, 255]));
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        let (cx, cy) = (300.0f32, 200.0f32);

        for t in -220..220 {
            for s in -12..12 {
                let x = cx + cos * t as f32 - sin * s as f32;
                // Image y grows downward, so a positive visual angle is
                // a negative y offset.
                let y = cy - (sin * t as f32 + cos * s as f32);
                if x >= 0.0 && y >= 0.0 && x < 600.0 && y < 400.0 {
                    page.put_pixel(x as u32, y as u32, Rgb([0, 0, 0]));
                }
            }
        }
        page
    }

    #[test]
    fn estimates_straight_bar_near_zero() {
        let page = page_with_rotated_bar(0.0);
        let angle = estimate_skew_angle(&page).expect("estimation failed");
        assert!(angle.abs() < 1.0, "expected ~0, got {angle}");
    }

    #[test]
    fn estimates_tilted_bar_magnitude() {
        let page = page_with_rotated_bar(5.0);
        let angle = estimate_skew_angle(&page).expect("estimation failed");
        assert!(
            (angle.abs() - 5.0).abs() < 1.5,
            "expected magnitude ~5, got {angle}"
        );
    }

    #[test]
    fn blank_page_gives_no_estimate() {
        let page = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
        assert!(estimate_skew_angle(&page).is_none());
    }

    #[test]
    fn rotation_preserves_dimensions_and_fills_corners() {
        let mut page = RgbImage::from_pixel(100, 60, Rgb([200, 180, 160]));
        for x in 0..100 {
            page.put_pixel(x, 0, Rgb([30, 30, 30]));
        }

        let rotated = rotate_edge_replicated(&page, 10.0);
        assert_eq!(rotated.dimensions(), (100, 60));
        // Edge replication: no pixel may be the default black of an
        // unfilled canvas corner — every output pixel comes from some
        // clamped source pixel, so values stay within observed channels.
        for pixel in rotated.pixels() {
            assert!(pixel.0[0] >= 30);
        }
    }

    #[test]
    fn rotation_and_estimate_agree_on_sign() {
        // Rotating a straight bar by +4° must yield an estimate of ~+4,
        // so that applying the negated estimate straightens the page.
        let straight = page_with_rotated_bar(0.0);
        let rotated = rotate_edge_replicated(&straight, 4.0);
        let estimated = estimate_skew_angle(&rotated).expect("estimation failed");
        assert!(
            (estimated - 4.0).abs() < 1.5,
            "expected ~+4, got {estimated}"
        );

        let straightened = rotate_edge_replicated(&rotated, -estimated);
        let residual = estimate_skew_angle(&straightened).expect("estimation failed");
        assert!(residual.abs() < 1.0, "residual skew {residual}");
    }

    #[test]
    fn zero_rotation_is_identity() {
        let mut page = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        page.put_pixel(10, 20, Rgb([1, 2, 3]));
        let rotated = rotate_edge_replicated(&page, 0.0);
        assert_eq!(rotated.as_raw(), page.as_raw());
    }
}

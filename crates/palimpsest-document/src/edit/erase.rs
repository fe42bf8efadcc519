// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content eraser — removes original pixel content under the erase mask
// while preserving the surrounding texture.
//
// The fill algorithm itself is an external capability behind the
// `ContentFill` trait. Whatever the implementation, it is invoked once
// over the whole unioned mask — filling adjacent regions independently
// produces visible seams, while a single pass gives the algorithm the
// full surrounding context.

use image::RgbImage;
use palimpsest_core::error::{PalimpsestError, Result};
use tracing::{debug, info, instrument};

use super::region::EraseMask;

/// The external content-aware fill capability: replace the masked
/// pixels of `page` using the surrounding texture. `radius` is the
/// neighbourhood the algorithm may draw samples from.
pub trait ContentFill: Send + Sync {
    fn fill(&self, page: &mut RgbImage, mask: &EraseMask, radius: u32) -> Result<()>;
}

/// Invokes the fill capability over the unioned mask.
pub struct ContentEraser {
    fill_radius: u32,
}

impl ContentEraser {
    pub fn new(fill_radius: u32) -> Self {
        Self { fill_radius }
    }

    /// Erase the masked content from the working page.
    ///
    /// An entirely empty mask is a no-op fast path: the page is
    /// returned unchanged without touching the capability.
    ///
    /// # Errors
    ///
    /// Returns [`PalimpsestError::Erase`] when the mask and page
    /// dimensions disagree or the capability fails.
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    pub fn erase(
        &self,
        fill: &dyn ContentFill,
        page: &RgbImage,
        mask: &EraseMask,
    ) -> Result<RgbImage> {
        if mask.dimensions() != page.dimensions() {
            return Err(PalimpsestError::Erase(format!(
                "mask {:?} does not match page {:?}",
                mask.dimensions(),
                page.dimensions()
            )));
        }

        if mask.is_empty() {
            debug!("Empty mask — skipping fill");
            return Ok(page.clone());
        }

        let mut erased = page.clone();
        fill.fill(&mut erased, mask, self.fill_radius)?;
        info!(fill_radius = self.fill_radius, "Masked content erased");
        Ok(erased)
    }
}

/// Bundled deterministic fill: onion-peel diffusion.
///
/// Repeatedly assigns each still-unknown masked pixel that borders
/// known territory the average of the known pixels within the fill
/// radius, peeling the mask from its boundary inward. All pixels of a
/// peel are computed from the previous state before any is written, so
/// the result does not depend on scan order. It reconstructs flat and
/// gently textured backgrounds well — which is what surrounds printed
/// words on a scanned page.
pub struct DiffusionFill;

impl ContentFill for DiffusionFill {
    #[instrument(skip_all, fields(radius))]
    fn fill(&self, page: &mut RgbImage, mask: &EraseMask, radius: u32) -> Result<()> {
        let (width, height) = page.dimensions();
        let radius = radius.max(1) as i64;

        let mut unknown: Vec<bool> = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                unknown.push(mask.is_marked(x, y));
            }
        }

        let mut remaining: usize = unknown.iter().filter(|&&u| u).count();
        if remaining == (width * height) as usize {
            // Nothing known to diffuse from — blank the page.
            for pixel in page.pixels_mut() {
                pixel.0 = [255, 255, 255];
            }
            return Ok(());
        }

        let index = |x: u32, y: u32| (y * width + x) as usize;

        while remaining > 0 {
            // One peel: every unknown pixel with at least one known
            // pixel in its radius gets the average of those pixels.
            let mut updates: Vec<(u32, u32, [u8; 3])> = Vec::new();

            for y in 0..height {
                for x in 0..width {
                    if !unknown[index(x, y)] {
                        continue;
                    }

                    let mut sum = [0u64; 3];
                    let mut count = 0u64;
                    for dy in -radius..=radius {
                        for dx in -radius..=radius {
                            let nx = x as i64 + dx;
                            let ny = y as i64 + dy;
                            if nx < 0
                                || ny < 0
                                || nx >= width as i64
                                || ny >= height as i64
                            {
                                continue;
                            }
                            let (nx, ny) = (nx as u32, ny as u32);
                            if unknown[index(nx, ny)] {
                                continue;
                            }
                            let p = page.get_pixel(nx, ny).0;
                            sum[0] += p[0] as u64;
                            sum[1] += p[1] as u64;
                            sum[2] += p[2] as u64;
                            count += 1;
                        }
                    }

                    if count > 0 {
                        updates.push((
                            x,
                            y,
                            [
                                (sum[0] / count) as u8,
                                (sum[1] / count) as u8,
                                (sum[2] / count) as u8,
                            ],
                        ));
                    }
                }
            }

            if updates.is_empty() {
                // Disconnected unknown islands larger than the radius
                // cannot occur for rectangular masks, but guard against
                // infinite loops anyway.
                break;
            }

            for &(x, y, rgb) in &updates {
                page.get_pixel_mut(x, y).0 = rgb;
                unknown[index(x, y)] = false;
            }
            remaining -= updates.len();
        }

        Ok(())
    }
}

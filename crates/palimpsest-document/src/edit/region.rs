// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit region resolver — validates a batch of edit requests against the
// working page, collecting every per-region fault, and derives the
// union erase mask.
//
// The mask is a set union: each validated region, expanded by the erase
// margin, is rasterized additively, so overlapping edits produce one
// coherent erase pass and the mask is bit-for-bit identical regardless
// of input order.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use palimpsest_core::error::{PalimpsestError, Result};
use palimpsest_core::{EditRequest, RegionFault, ValidatedEdit};
use tracing::{debug, instrument, warn};

/// Binary raster marking the pixels to be content-aware filled. Same
/// dimensions as the working page; non-zero means "erase".
#[derive(Debug, Clone, PartialEq)]
pub struct EraseMask {
    inner: GrayImage,
}

impl EraseMask {
    /// An all-clear mask for a page of the given dimensions.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            inner: GrayImage::new(width, height),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.inner.dimensions()
    }

    /// Whether no pixel is marked (the no-op fast path).
    pub fn is_empty(&self) -> bool {
        self.inner.pixels().all(|p| p.0[0] == 0)
    }

    /// Whether the pixel at (x, y) is marked for erasure.
    pub fn is_marked(&self, x: u32, y: u32) -> bool {
        self.inner.get_pixel(x, y).0[0] != 0
    }

    /// Borrow the mask raster.
    pub fn as_image(&self) -> &GrayImage {
        &self.inner
    }

    /// Additively mark a rectangle (clamped to the mask bounds).
    fn mark_rect(&mut self, x: u32, y: u32, w: u32, h: u32) {
        if w == 0 || h == 0 {
            return;
        }
        draw_filled_rect_mut(
            &mut self.inner,
            Rect::at(x as i32, y as i32).of_size(w, h),
            Luma([255u8]),
        );
    }
}

/// Output of region resolution: the union mask, the validated edits in
/// input order, and the faults for any rejected regions.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub mask: EraseMask,
    pub edits: Vec<ValidatedEdit>,
    pub faults: Vec<RegionFault>,
}

/// Validates and geometrically normalizes edit batches.
pub struct EditRegionResolver {
    /// Padding added around each region in the mask, covering
    /// anti-aliased glyph edges left by the original rendering.
    erase_margin: u32,
}

impl EditRegionResolver {
    pub fn new(erase_margin: u32) -> Self {
        Self { erase_margin }
    }

    /// Resolve a batch of edit requests against the page dimensions.
    ///
    /// Each region is clamped to page bounds; regions that are
    /// degenerate (zero or negative extent) or entirely outside the
    /// page are rejected with a per-region fault. Faults do not abort
    /// the rest of the batch — the whole call fails with
    /// [`PalimpsestError::InvalidRegion`] only when edits were
    /// submitted and none survived.
    ///
    /// The validated list preserves input order; the mask union is
    /// commutative.
    #[instrument(skip(self, edits), fields(edit_count = edits.len()))]
    pub fn resolve(
        &self,
        page_width: u32,
        page_height: u32,
        edits: &[EditRequest],
    ) -> Result<Resolution> {
        let mut mask = EraseMask::empty(page_width, page_height);
        let mut validated = Vec::with_capacity(edits.len());
        let mut faults = Vec::new();

        for (index, edit) in edits.iter().enumerate() {
            match clamp_region(edit, page_width, page_height) {
                Ok(region) => {
                    let (mx, my, mw, mh) = expand_region(
                        region,
                        self.erase_margin,
                        page_width,
                        page_height,
                    );
                    mask.mark_rect(mx, my, mw, mh);

                    let (x, y, w, h) = region;
                    validated.push(ValidatedEdit {
                        index,
                        x,
                        y,
                        w,
                        h,
                        new_text: edit.new_text.clone(),
                        font_size: edit
                            .font_size
                            .and_then(|v| (v > 0).then_some(v as u32)),
                        color: edit.color.clone(),
                    });
                }
                Err(detail) => {
                    warn!(index, %detail, "Rejecting edit region");
                    faults.push(RegionFault { index, detail });
                }
            }
        }

        if validated.is_empty() && !edits.is_empty() {
            return Err(PalimpsestError::InvalidRegion(faults));
        }

        debug!(
            validated = validated.len(),
            rejected = faults.len(),
            "Edit regions resolved"
        );
        Ok(Resolution {
            mask,
            edits: validated,
            faults,
        })
    }
}

/// Clamp one request's region to the page, or explain why it is unusable.
fn clamp_region(
    edit: &EditRequest,
    page_width: u32,
    page_height: u32,
) -> std::result::Result<(u32, u32, u32, u32), String> {
    if edit.w <= 0 || edit.h <= 0 {
        return Err(format!("degenerate extent {}x{}", edit.w, edit.h));
    }

    let x0 = i64::from(edit.x).max(0);
    let y0 = i64::from(edit.y).max(0);
    let x1 = (i64::from(edit.x) + i64::from(edit.w)).min(i64::from(page_width));
    let y1 = (i64::from(edit.y) + i64::from(edit.h)).min(i64::from(page_height));

    if x1 <= x0 || y1 <= y0 {
        return Err(format!(
            "region ({}, {}) {}x{} lies outside the {}x{} page",
            edit.x, edit.y, edit.w, edit.h, page_width, page_height
        ));
    }

    Ok((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// Expand a clamped region by the erase margin, staying inside the page.
fn expand_region(
    (x, y, w, h): (u32, u32, u32, u32),
    margin: u32,
    page_width: u32,
    page_height: u32,
) -> (u32, u32, u32, u32) {
    let x0 = x.saturating_sub(margin);
    let y0 = y.saturating_sub(margin);
    let x1 = (x + w + margin).min(page_width);
    let y1 = (y + h + margin).min(page_height);
    (x0, y0, x1 - x0, y1 - y0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(x: i32, y: i32, w: i32, h: i32) -> EditRequest {
        EditRequest {
            x,
            y,
            w,
            h,
            new_text: String::new(),
            font_size: None,
            color: None,
        }
    }

    #[test]
    fn negative_origin_clamps_without_error() {
        let resolver = EditRegionResolver::new(0);
        let resolution = resolver
            .resolve(200, 200, &[request(-5, 10, 30, 20)])
            .unwrap();

        assert!(resolution.faults.is_empty());
        let edit = &resolution.edits[0];
        assert_eq!((edit.x, edit.y, edit.w, edit.h), (0, 10, 25, 20));
    }

    #[test]
    fn zero_width_is_a_fault_but_batch_continues() {
        let resolver = EditRegionResolver::new(0);
        let resolution = resolver
            .resolve(200, 200, &[request(10, 10, 0, 20), request(50, 50, 20, 20)])
            .unwrap();

        assert_eq!(resolution.faults.len(), 1);
        assert_eq!(resolution.faults[0].index, 0);
        assert_eq!(resolution.edits.len(), 1);
        assert_eq!(resolution.edits[0].x, 50);
        // The survivor keeps its submitted position, not its list slot.
        assert_eq!(resolution.edits[0].index, 1);
    }

    #[test]
    fn all_invalid_fails_with_every_fault() {
        let resolver = EditRegionResolver::new(0);
        let result = resolver.resolve(
            100,
            100,
            &[request(10, 10, 0, 5), request(500, 500, 20, 20)],
        );

        match result {
            Err(PalimpsestError::InvalidRegion(faults)) => {
                assert_eq!(faults.len(), 2);
                assert_eq!(faults[0].index, 0);
                assert_eq!(faults[1].index, 1);
            }
            other => panic!("expected InvalidRegion, got {other:?}"),
        }
    }

    #[test]
    fn empty_batch_yields_empty_mask() {
        let resolver = EditRegionResolver::new(4);
        let resolution = resolver.resolve(64, 64, &[]).unwrap();
        assert!(resolution.mask.is_empty());
        assert!(resolution.edits.is_empty());
    }

    #[test]
    fn mask_includes_erase_margin() {
        let resolver = EditRegionResolver::new(3);
        let resolution = resolver
            .resolve(100, 100, &[request(20, 20, 10, 10)])
            .unwrap();

        let mask = &resolution.mask;
        assert!(mask.is_marked(17, 17), "margin corner should be marked");
        assert!(mask.is_marked(32, 32), "far margin corner should be marked");
        assert!(!mask.is_marked(16, 16), "beyond margin must stay clear");
    }

    #[test]
    fn mask_union_is_order_independent() {
        let resolver = EditRegionResolver::new(4);
        let edits = vec![
            request(10, 10, 30, 12),
            request(25, 15, 30, 12), // overlaps the first
            request(60, 60, 20, 20),
        ];
        let mut reversed = edits.clone();
        reversed.reverse();

        let forward = resolver.resolve(120, 120, &edits).unwrap();
        let backward = resolver.resolve(120, 120, &reversed).unwrap();

        assert_eq!(
            forward.mask.as_image().as_raw(),
            backward.mask.as_image().as_raw(),
            "mask must be bit-for-bit identical under permutation"
        );
    }

    #[test]
    fn validated_list_preserves_input_order() {
        let resolver = EditRegionResolver::new(0);
        let resolution = resolver
            .resolve(
                200,
                200,
                &[request(50, 0, 10, 10), request(10, 0, 10, 10)],
            )
            .unwrap();
        assert_eq!(resolution.edits[0].x, 50);
        assert_eq!(resolution.edits[1].x, 10);
    }

    #[test]
    fn non_positive_explicit_font_size_is_discarded() {
        let resolver = EditRegionResolver::new(0);
        let mut edit = request(10, 10, 40, 20);
        edit.font_size = Some(-3);
        let resolution = resolver.resolve(100, 100, &[edit]).unwrap();
        assert_eq!(resolution.edits[0].font_size, None);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembly — wrap edited raster pages in a PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::RgbImage;
use palimpsest_core::error::{PalimpsestError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

const MM_PER_INCH: f32 = 25.4;

/// Title embedded in the PDF /Info dictionary.
const DOC_TITLE: &str = "Edited Document";

/// Assembles edited working pages into a PDF document.
///
/// Each page of the output is sized to the exact pixel dimensions of its
/// raster at the export DPI, with the image placed edge to edge at 1:1
/// scale. No resampling happens here: the bytes drawn by the edit stage
/// are the bytes embedded in the PDF.
pub struct PageExporter {
    /// Resolution used to map pixels to physical page size.
    dpi: f32,
}

impl PageExporter {
    pub fn new(dpi: f32) -> Self {
        Self { dpi }
    }

    /// Produce PDF bytes containing one page per input raster.
    ///
    /// An empty input is an assembly error: a document with no pages is
    /// never a valid export.
    #[instrument(skip_all, fields(page_count = pages.len(), dpi = self.dpi))]
    pub fn export(&self, pages: &[RgbImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(PalimpsestError::Assembly(
                "cannot export a document with no pages".into(),
            ));
        }

        let mut doc = PdfDocument::new(DOC_TITLE);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for page in pages {
            let (px_w, px_h) = page.dimensions();
            let page_w = Mm(px_w as f32 / self.dpi * MM_PER_INCH);
            let page_h = Mm(px_h as f32 / self.dpi * MM_PER_INCH);

            let raw = RawImage {
                pixels: RawImageData::U8(page.as_raw().clone()),
                width: px_w as usize,
                height: px_h as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // Edge to edge at native resolution: with `dpi` set, a unit
            // scale maps the raster exactly onto the page rectangle.
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];

            debug!(px_w, px_h, page_w = page_w.0, page_h = page_h.0, "Page placed");
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        info!(bytes = output.len(), "PDF assembled");
        Ok(output)
    }
}

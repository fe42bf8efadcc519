// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page ingestor — normalizes an uploaded artifact into one canonical
// working page: an opaque RGB8 raster at a fixed supersampling scale.
//
// PDF artifacts have exactly their first page rendered via PDFium; image
// artifacts are decoded directly. The supersample factor is the single
// scale all downstream coordinates are measured against, so it must be
// the same value for the analysis and edit phases of a session.

use image::{ImageFormat, RgbImage};
use palimpsest_core::error::{PalimpsestError, Result};
use palimpsest_core::{ArtifactKind, PipelineConfig};
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument, warn};

use super::deskew;

/// Normalizes raw upload bytes into the session's canonical working page.
pub struct PageIngestor {
    config: PipelineConfig,
}

impl PageIngestor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Turn an uploaded artifact into the canonical working page.
    ///
    /// Paged formats have their first page rendered at the configured
    /// supersample factor; raster formats are decoded as declared. The
    /// result is opaque full-colour RGB8 with no alpha. When deskew is
    /// enabled, the returned page is the rotated one — downstream
    /// coordinates (and what the caller displays) always refer to it.
    ///
    /// # Errors
    ///
    /// Returns [`PalimpsestError::Ingest`] on unreadable or corrupt
    /// input, or when the bytes do not match the declared kind.
    #[instrument(skip(self, artifact), fields(bytes_len = artifact.len(), ?kind))]
    pub fn ingest(&self, artifact: &[u8], kind: ArtifactKind) -> Result<RgbImage> {
        let page = if kind.is_paged() {
            self.render_first_pdf_page(artifact)?
        } else {
            self.decode_raster(artifact, kind)?
        };

        info!(
            width = page.width(),
            height = page.height(),
            "Working page normalized"
        );

        if !self.config.deskew {
            return Ok(page);
        }

        match deskew::estimate_skew_angle(&page) {
            Some(angle) if angle.abs() >= self.config.deskew_min_angle_deg => {
                info!(angle, "Deskewing working page");
                Ok(deskew::rotate_edge_replicated(&page, -angle))
            }
            Some(angle) => {
                debug!(angle, "Skew below threshold; leaving page untouched");
                Ok(page)
            }
            None => {
                debug!("No usable foreground for skew estimation");
                Ok(page)
            }
        }
    }

    /// Decode a raster artifact and strip any alpha channel.
    fn decode_raster(&self, artifact: &[u8], kind: ArtifactKind) -> Result<RgbImage> {
        let format = raster_format(kind)?;
        let decoded = image::load_from_memory_with_format(artifact, format)
            .map_err(|err| {
                PalimpsestError::Ingest(format!("failed to decode {kind:?} artifact: {err}"))
            })?;
        Ok(decoded.to_rgb8())
    }

    /// Render exactly the first page of a PDF artifact at the configured
    /// supersample factor.
    fn render_first_pdf_page(&self, artifact: &[u8]) -> Result<RgbImage> {
        let pdfium = create_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(artifact, None)
            .map_err(|err| PalimpsestError::Ingest(format!("failed to open PDF: {err:?}")))?;

        let page = document.pages().first().map_err(|err| {
            PalimpsestError::Ingest(format!("PDF has no renderable first page: {err:?}"))
        })?;

        let render_config =
            PdfRenderConfig::new().scale_page_by_factor(self.config.supersample);
        let bitmap = page.render_with_config(&render_config).map_err(|err| {
            PalimpsestError::Ingest(format!("failed to render first PDF page: {err:?}"))
        })?;

        let rendered = bitmap.as_image().to_rgb8();
        debug!(
            width = rendered.width(),
            height = rendered.height(),
            supersample = self.config.supersample,
            "First PDF page rendered"
        );
        Ok(rendered)
    }
}

/// Map a raster artifact kind to the decoder format.
fn raster_format(kind: ArtifactKind) -> Result<ImageFormat> {
    match kind {
        ArtifactKind::Jpeg => Ok(ImageFormat::Jpeg),
        ArtifactKind::Png => Ok(ImageFormat::Png),
        ArtifactKind::Tiff => Ok(ImageFormat::Tiff),
        ArtifactKind::Webp => Ok(ImageFormat::WebP),
        ArtifactKind::Pdf => Err(PalimpsestError::Ingest(
            "PDF artifacts are rendered, not decoded as raster".into(),
        )),
    }
}

/// Bind to a PDFium library (dynamically linked).
///
/// Searches the current directory, then `vendor/pdfium/lib/`, then the
/// system library paths.
fn create_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "./vendor/pdfium/lib/",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|err| {
            warn!(?err, "No PDFium library available");
            PalimpsestError::Ingest(format!(
                "failed to load the PDFium library needed for PDF uploads: {err:?}"
            ))
        })?;

    Ok(Pdfium::new(bindings))
}

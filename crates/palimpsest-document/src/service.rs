// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit service — the facade a transport (HTTP handler, CLI, desktop
// shell) drives. Two entry points mirror the two user actions: upload a
// page and analyse it, then submit edit batches against the session.
//
// The page persisted at analysis time is canonical: every edit
// submission starts from that raster, so resubmitting the same batch
// yields the same output rather than compounding on earlier edits.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use palimpsest_core::error::{PalimpsestError, Result};
use palimpsest_core::{
    ArtifactKind, EditRequest, PipelineConfig, RegionFault, Session, SessionId, WordBox,
};
use tracing::{info, instrument};

use crate::detect::{TextDetector, WordIndex};
use crate::edit::compose::TextCompositor;
use crate::edit::erase::{ContentEraser, ContentFill};
use crate::edit::region::EditRegionResolver;
use crate::export::PageExporter;
use crate::ingest::PageIngestor;
use crate::session::{BLOB_EXPORT, BLOB_PAGE, BLOB_SESSION, SessionStore};

/// Result of analysing an uploaded artifact: the persisted session, the
/// canonical page as PNG bytes, and the indexed words.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub session: Session,
    pub page_png: Vec<u8>,
    pub words: Vec<WordBox>,
}

/// Result of applying an edit batch: the exported PDF and the faults of
/// any regions that were rejected while the rest went through.
#[derive(Debug)]
pub struct EditOutcome {
    pub export_pdf: Vec<u8>,
    pub rejected: Vec<RegionFault>,
}

/// Drives the full pipeline: ingest, detect, resolve, erase, compose,
/// export, persist. Detection, content fill, and persistence are
/// supplied by the caller; everything else is built from the config.
pub struct EditService {
    ingestor: PageIngestor,
    word_index: WordIndex,
    resolver: EditRegionResolver,
    eraser: ContentEraser,
    compositor: TextCompositor,
    exporter: PageExporter,
    store: Box<dyn SessionStore>,
    detector: Box<dyn TextDetector>,
    fill: Box<dyn ContentFill>,
}

impl EditService {
    pub fn new(
        config: PipelineConfig,
        store: Box<dyn SessionStore>,
        detector: Box<dyn TextDetector>,
        fill: Box<dyn ContentFill>,
    ) -> Self {
        Self {
            word_index: WordIndex::new(config.confidence_floor),
            resolver: EditRegionResolver::new(config.erase_margin),
            eraser: ContentEraser::new(config.fill_radius),
            compositor: TextCompositor::new(&config),
            exporter: PageExporter::new(config.export_dpi),
            ingestor: PageIngestor::new(config),
            store,
            detector,
            fill,
        }
    }

    /// Ingest an uploaded artifact, persist the canonical page, and
    /// index the words on it.
    #[instrument(skip(self, artifact), fields(artifact_len = artifact.len()))]
    pub fn analyze(&self, artifact: &[u8], kind: ArtifactKind) -> Result<AnalysisOutcome> {
        let page = self.ingestor.ingest(artifact, kind)?;
        let (width, height) = page.dimensions();

        let words = self.word_index.detect(self.detector.as_ref(), &page)?;

        let session = Session::new(width, height);
        let page_png = encode_png(&page)?;
        self.store.put(&session.id, BLOB_PAGE, &page_png)?;
        self.store
            .put(&session.id, BLOB_SESSION, &serde_json::to_vec(&session)?)?;

        info!(
            session = %session.id,
            width,
            height,
            words = words.len(),
            "Analysis complete"
        );
        Ok(AnalysisOutcome {
            session,
            page_png,
            words,
        })
    }

    /// Apply an edit batch to a session's canonical page and export the
    /// result as a PDF.
    ///
    /// Edits always start from the page persisted at analysis time, so
    /// submitting the same batch twice yields the same rendered page.
    /// The export blob is overwritten on each call.
    #[instrument(skip(self, edits), fields(session = %session, edit_count = edits.len()))]
    pub fn apply_edits(&self, session: &SessionId, edits: &[EditRequest]) -> Result<EditOutcome> {
        let meta: Session = serde_json::from_slice(&self.store.get(session, BLOB_SESSION)?)?;
        let page_png = self.store.get(session, BLOB_PAGE)?;
        let page = decode_png(&page_png, &meta)?;

        let (rendered, rejected) = self.render_edits(&page, edits)?;

        let export_pdf = self.exporter.export(std::slice::from_ref(&rendered))?;
        self.store.put(session, BLOB_EXPORT, &export_pdf)?;

        info!(
            applied = edits.len() - rejected.len(),
            rejected = rejected.len(),
            export_bytes = export_pdf.len(),
            "Edit batch applied"
        );
        Ok(EditOutcome {
            export_pdf,
            rejected,
        })
    }

    /// Fetch the most recent export for a session.
    pub fn export_blob(&self, session: &SessionId) -> Result<Vec<u8>> {
        self.store.get(session, BLOB_EXPORT)
    }

    /// Resolve, erase, and compose one batch against a page.
    fn render_edits(
        &self,
        page: &RgbImage,
        edits: &[EditRequest],
    ) -> Result<(RgbImage, Vec<RegionFault>)> {
        let (width, height) = page.dimensions();
        let resolution = self.resolver.resolve(width, height, edits)?;

        let mut rendered = self
            .eraser
            .erase(self.fill.as_ref(), page, &resolution.mask)?;
        self.compositor.compose(&mut rendered, &resolution.edits)?;

        Ok((rendered, resolution.faults))
    }
}

/// Parse a JSON edit batch (`[{"x": …, "y": …, …}, …]`) at the transport
/// boundary.
pub fn parse_edit_payload(payload: &str) -> Result<Vec<EditRequest>> {
    Ok(serde_json::from_str(payload)?)
}

fn encode_png(page: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    page.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| PalimpsestError::Ingest(format!("failed to encode working page: {e}")))?;
    Ok(bytes)
}

fn decode_png(bytes: &[u8], meta: &Session) -> Result<RgbImage> {
    let page = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| {
            PalimpsestError::Session(format!("corrupt page blob for session {}: {e}", meta.id))
        })?
        .to_rgb8();
    if page.dimensions() != (meta.page_width, meta.page_height) {
        return Err(PalimpsestError::Session(format!(
            "page blob dimensions {}x{} disagree with session {}x{}",
            page.width(),
            page.height(),
            meta.page_width,
            meta.page_height
        )));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::DetectedWord;
    use crate::edit::erase::DiffusionFill;
    use crate::session::FsSessionStore;
    use image::Rgb;

    /// Detector returning a fixed word list, standing in for the OCR
    /// capability.
    struct StubDetector(Vec<DetectedWord>);

    impl TextDetector for StubDetector {
        fn detect(&self, _page: &RgbImage) -> Result<Vec<DetectedWord>> {
            Ok(self.0.clone())
        }
    }

    /// A synthetic invoice page: white with one dark word block.
    fn invoice_page() -> Vec<u8> {
        let mut page = RgbImage::from_pixel(1000, 1400, Rgb([255, 255, 255]));
        for y in 100..140 {
            for x in 100..300 {
                page.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        let mut bytes = Vec::new();
        page.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn service(root: &std::path::Path) -> EditService {
        let config = PipelineConfig {
            deskew: false,
            font_paths: Vec::new(),
            ..PipelineConfig::default()
        };
        let detector = StubDetector(vec![DetectedWord {
            text: "INVOICE".into(),
            x: 100,
            y: 100,
            w: 200,
            h: 40,
            confidence: 92.0,
        }]);
        EditService::new(
            config,
            Box::new(FsSessionStore::new(root)),
            Box::new(detector),
            Box::new(DiffusionFill),
        )
    }

    fn replace_word() -> EditRequest {
        EditRequest {
            x: 100,
            y: 100,
            w: 200,
            h: 40,
            new_text: "RECEIPT".into(),
            font_size: None,
            color: Some("#FF0000".into()),
        }
    }

    #[test]
    fn analyze_persists_page_and_indexes_words() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let outcome = svc.analyze(&invoice_page(), ArtifactKind::Png).unwrap();
        assert_eq!(outcome.session.page_width, 1000);
        assert_eq!(outcome.session.page_height, 1400);
        assert_eq!(outcome.words.len(), 1);
        assert_eq!(outcome.words[0].text, "INVOICE");
        assert!(!outcome.page_png.is_empty());
    }

    #[test]
    fn apply_edits_erases_and_retypes() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let analysis = svc.analyze(&invoice_page(), ArtifactKind::Png).unwrap();

        let outcome = svc
            .apply_edits(&analysis.session.id, &[replace_word()])
            .unwrap();
        assert!(outcome.rejected.is_empty());
        assert!(outcome.export_pdf.starts_with(b"%PDF"));

        // Inspect the rendered page directly: the original dark block
        // must be gone and red replacement ink present inside the region.
        let page = decode_png(
            &svc.store.get(&analysis.session.id, BLOB_PAGE).unwrap(),
            &analysis.session,
        )
        .unwrap();
        let (rendered, _) = svc.render_edits(&page, &[replace_word()]).unwrap();

        let mut red_pixels = 0u32;
        for y in 100..140 {
            for x in 100..300 {
                let p = rendered.get_pixel(x, y).0;
                assert!(
                    p != [20, 20, 20],
                    "original ink survived at ({x},{y})"
                );
                if p == [255, 0, 0] {
                    red_pixels += 1;
                }
            }
        }
        assert!(red_pixels > 0, "no replacement ink drawn");
    }

    #[test]
    fn resubmitting_the_same_batch_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let analysis = svc.analyze(&invoice_page(), ArtifactKind::Png).unwrap();

        let page = decode_png(
            &svc.store.get(&analysis.session.id, BLOB_PAGE).unwrap(),
            &analysis.session,
        )
        .unwrap();

        let (first, _) = svc.render_edits(&page, &[replace_word()]).unwrap();
        let (second, _) = svc.render_edits(&page, &[replace_word()]).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn export_blob_is_overwritten_per_submission() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let analysis = svc.analyze(&invoice_page(), ArtifactKind::Png).unwrap();

        svc.apply_edits(&analysis.session.id, &[replace_word()])
            .unwrap();
        let first = svc.export_blob(&analysis.session.id).unwrap();

        let mut erase_only = replace_word();
        erase_only.new_text.clear();
        svc.apply_edits(&analysis.session.id, &[erase_only]).unwrap();
        let second = svc.export_blob(&analysis.session.id).unwrap();

        assert!(first.starts_with(b"%PDF") && second.starts_with(b"%PDF"));
    }

    #[test]
    fn color_fault_after_rejected_region_names_submitted_edit() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let analysis = svc.analyze(&invoice_page(), ArtifactKind::Png).unwrap();

        // Index 0 is rejected for its degenerate extent; the colour
        // error on the survivor must still name submitted index 1.
        let degenerate = EditRequest {
            x: 10,
            y: 10,
            w: 0,
            h: 20,
            new_text: String::new(),
            font_size: None,
            color: None,
        };
        let mut bad_color = replace_word();
        bad_color.color = Some("#zzz".into());

        match svc.apply_edits(&analysis.session.id, &[degenerate, bad_color]) {
            Err(PalimpsestError::InvalidColor { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidColor, got {other:?}"),
        }
    }

    #[test]
    fn unknown_session_is_a_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        match svc.apply_edits(&SessionId::new(), &[replace_word()]) {
            Err(PalimpsestError::Session(_)) => {}
            other => panic!("expected Session error, got {other:?}"),
        }
    }

    #[test]
    fn parse_edit_payload_round_trip() {
        let payload = r#"[{"x": 5, "y": 6, "w": 40, "h": 12, "new_text": "PAID"}]"#;
        let edits = parse_edit_payload(payload).unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "PAID");

        assert!(parse_edit_payload("{not json").is_err());
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line front end for the page edit pipeline.
//
//   palimpsest analyze <page.{png,jpg,tiff,webp,pdf}>
//       Ingest the page, print the session id and detected words as JSON.
//
//   palimpsest edit <session-id> <edits.json> <output.pdf>
//       Apply a JSON edit batch to the session's page and write the
//       exported PDF.
//
// Sessions are stored under PALIMPSEST_STORE (default
// `./palimpsest-sessions`). Without the `ocr` build feature, analysis
// reports no words but edits still work against explicit coordinates.

use std::process::ExitCode;

use palimpsest_core::error::Result;
use palimpsest_core::{ArtifactKind, PipelineConfig, SessionId};
use palimpsest_document::{DiffusionFill, EditService, FsSessionStore, TextDetector};
use palimpsest_document::service::parse_edit_payload;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = match args.first().map(String::as_str) {
        Some("analyze") if args.len() == 2 => analyze(&args[1]),
        Some("edit") if args.len() == 4 => edit(&args[1], &args[2], &args[3]),
        _ => {
            eprintln!("usage: palimpsest analyze <page>");
            eprintln!("       palimpsest edit <session-id> <edits.json> <output.pdf>");
            return ExitCode::from(2);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn store_root() -> String {
    std::env::var("PALIMPSEST_STORE").unwrap_or_else(|_| "./palimpsest-sessions".into())
}

fn service() -> EditService {
    EditService::new(
        PipelineConfig::default(),
        Box::new(FsSessionStore::new(store_root())),
        detector(),
        Box::new(DiffusionFill),
    )
}

#[cfg(feature = "ocr")]
fn detector() -> Box<dyn TextDetector> {
    match palimpsest_document::OcrsDetector::with_defaults() {
        Ok(engine) => Box::new(engine),
        Err(err) => {
            tracing::warn!(%err, "OCR engine unavailable; analysis will report no words");
            Box::new(NoDetector)
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn detector() -> Box<dyn TextDetector> {
    Box::new(NoDetector)
}

/// Stand-in detector for builds without an OCR engine.
struct NoDetector;

impl TextDetector for NoDetector {
    fn detect(
        &self,
        _page: &image::RgbImage,
    ) -> Result<Vec<palimpsest_document::detect::DetectedWord>> {
        Ok(Vec::new())
    }
}

fn artifact_kind(path: &str) -> Result<ArtifactKind> {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ArtifactKind::from_extension)
        .ok_or_else(|| {
            palimpsest_core::PalimpsestError::Ingest(format!(
                "unsupported or missing file extension: {path}"
            ))
        })
}

fn analyze(path: &str) -> Result<()> {
    let kind = artifact_kind(path)?;
    let artifact = std::fs::read(path)?;

    let outcome = service().analyze(&artifact, kind)?;
    let report = serde_json::json!({
        "session": outcome.session.id.to_string(),
        "page_width": outcome.session.page_width,
        "page_height": outcome.session.page_height,
        "words": outcome.words,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn edit(session: &str, edits_path: &str, output_path: &str) -> Result<()> {
    let session: SessionId = session.parse().map_err(|_| {
        palimpsest_core::PalimpsestError::Session(format!("malformed session id: {session}"))
    })?;
    let payload = std::fs::read_to_string(edits_path)?;
    let edits = parse_edit_payload(&payload)?;

    let outcome = service().apply_edits(&session, &edits)?;
    std::fs::write(output_path, &outcome.export_pdf)?;

    for fault in &outcome.rejected {
        eprintln!("skipped {fault}");
    }
    println!("{output_path}");
    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR-backed text detector using the `ocrs` crate, a pure-Rust OCR
// engine backed by neural network models executed via `rten`.
//
// # Feature Gate
//
// Only available when the `ocr` feature is enabled:
//
// ```toml
// palimpsest-document = { path = "crates/palimpsest-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs two ONNX model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Models can be obtained by running the `ocrs-cli` tool once:
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png  # downloads models to ~/.cache/ocrs/
//   ```
//
// The default cache directory is `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use image::RgbImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use palimpsest_core::error::{PalimpsestError, Result};
use rten::Model;
use tracing::{debug, info, instrument};

use super::{DetectedWord, TextDetector};

/// Default directory for cached OCR model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`,
/// falling back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        // Last resort — current directory.
        PathBuf::from("ocrs-models")
    }
}

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Configuration for constructing an [`OcrsDetector`].
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        let dir = default_model_dir();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }
}

impl OcrsConfig {
    /// Create a config with explicit model directory, expected to hold
    /// `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(PalimpsestError::Detection(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// `ocrs`-backed implementation of [`TextDetector`].
///
/// Model loading is the expensive step — keep the detector around and
/// reuse it across pages. `ocrs` reports no per-word confidence, so
/// detected words carry a confidence of 100 and the configured floor
/// only bites for capabilities that do report one.
pub struct OcrsDetector {
    engine: OcrEngine,
}

impl OcrsDetector {
    /// Create a detector, loading models from the paths in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PalimpsestError::Detection`] if model files are missing
    /// or corrupt.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrsConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            PalimpsestError::Detection(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                PalimpsestError::Detection(format!(
                    "failed to load recognition model from {}: {}",
                    config.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            PalimpsestError::Detection(format!("failed to initialise OCR engine: {}", err))
        })?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Create a detector using the default model cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrsConfig::default())
    }
}

impl TextDetector for OcrsDetector {
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    fn detect(&self, page: &RgbImage) -> Result<Vec<DetectedWord>> {
        let (width, height) = page.dimensions();

        let source = ImageSource::from_bytes(page.as_raw(), (width, height)).map_err(|err| {
            PalimpsestError::Detection(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self.engine.prepare_input(source).map_err(|err| {
            PalimpsestError::Detection(format!("OCR preprocessing failed: {}", err))
        })?;

        let word_rects = self.engine.detect_words(&input).map_err(|err| {
            PalimpsestError::Detection(format!("word detection failed: {}", err))
        })?;
        debug!(word_count = word_rects.len(), "Words detected");

        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| {
                PalimpsestError::Detection(format!("line recognition failed: {}", err))
            })?;

        // Flatten recognised lines into per-word boxes, keeping the
        // engine's reading order.
        let mut words = Vec::new();
        for line in line_texts.iter().flatten() {
            for word in line.words() {
                let rect = word.rotated_rect().bounding_rect();
                words.push(DetectedWord {
                    text: word.to_string(),
                    x: rect.left() as i32,
                    y: rect.top() as i32,
                    w: rect.width() as i32,
                    h: rect.height() as i32,
                    confidence: 100.0,
                });
            }
        }

        debug!(recognized_words = words.len(), "OCR detection complete");
        Ok(words)
    }
}

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use cardscan_config::ocr::OcrConfig;
use cardscan_core::error::OcrError;
use cardscan_core::services::{OcrService, ProgressFn};
use cardscan_types::types::{Frame, OcrProgress, RawOcrResult, RegionOfInterest};
use image::RgbaImage;
use tokio::process::Command;

/// OCR service backed by the system `tesseract` binary.
///
/// The region of interest is cropped out of the frame, written to a
/// temporary PNG, and handed to `tesseract <input> stdout -l <lang>`.
pub struct TesseractOcr {
    binary: String,
    language: Mutex<String>,
    ready: AtomicBool,
    progress: Mutex<Option<ProgressFn>>,
}

impl TesseractOcr {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            binary: config.binary.unwrap_or_else(|| "tesseract".to_string()),
            language: Mutex::new(config.language),
            ready: AtomicBool::new(false),
            progress: Mutex::new(None),
        }
    }

    fn progress_fn(&self) -> MutexGuard<'_, Option<ProgressFn>> {
        self.progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn language(&self) -> MutexGuard<'_, String> {
        self.language.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn report(&self, stage: &str, fraction: f32) {
        if let Some(progress) = self.progress_fn().as_ref() {
            progress(OcrProgress {
                stage: stage.to_string(),
                fraction,
            });
        }
    }
}

#[async_trait]
impl OcrService for TesseractOcr {
    async fn initialize(&self, language: &str, progress: ProgressFn) -> Result<(), OcrError> {
        *self.progress_fn() = Some(progress);
        *self.language() = language.to_string();

        // Idempotent: the availability probe runs once.
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let output = Command::new(&self.binary)
            .arg("--version")
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| OcrError::Engine(format!("tesseract not available: {e}")))?;
        if !output.status.success() {
            return Err(OcrError::Engine("tesseract --version failed".to_string()));
        }

        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn recognize(
        &self,
        frame: &Frame,
        region: RegionOfInterest,
    ) -> Result<RawOcrResult, OcrError> {
        if !self.is_ready() {
            return Err(OcrError::NotInitialized);
        }
        self.report("recognizing text", 0.0);

        let rect = region.to_pixel_rect(frame.width, frame.height);
        let image = RgbaImage::from_raw(frame.width, frame.height, frame.pixels.clone())
            .ok_or_else(|| OcrError::Engine("frame buffer does not match dimensions".to_string()))?;

        let input = tokio::task::spawn_blocking(move || -> Result<tempfile::NamedTempFile, OcrError> {
            let crop =
                image::imageops::crop_imm(&image, rect.x, rect.y, rect.width, rect.height)
                    .to_image();
            let file = tempfile::Builder::new()
                .suffix(".png")
                .tempfile()
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            crop.save_with_format(file.path(), image::ImageFormat::Png)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(file)
        })
        .await
        .map_err(|e| OcrError::Engine(e.to_string()))??;

        let language = self.language().clone();
        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&language)
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| OcrError::Engine(e.to_string()))?;
        if !output.status.success() {
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}",
                output.status
            )));
        }

        self.report("recognizing text", 1.0);
        Ok(RawOcrResult {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            confidence: None,
        })
    }
}

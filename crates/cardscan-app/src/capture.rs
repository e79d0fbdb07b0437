use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use cardscan_core::error::CaptureError;
use cardscan_core::services::FrameSource;
use cardscan_types::types::Frame;
use image::imageops;

/// Frame source backed by a queue of image files, one frame per capture.
/// Active while the queue is non-empty.
pub struct FileFrameSource {
    queue: Mutex<VecDeque<PathBuf>>,
}

impl FileFrameSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            queue: Mutex::new(paths.into()),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<PathBuf>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    fn is_active(&self) -> bool {
        !self.queue().is_empty()
    }

    async fn capture_frame(&self, mirror: bool) -> Result<Frame, CaptureError> {
        let path = self.queue().pop_front().ok_or(CaptureError::Inactive)?;
        tracing::debug!("capturing frame from {}", path.display());

        tokio::task::spawn_blocking(move || load_frame(&path, mirror))
            .await
            .map_err(|e| CaptureError::Failed(e.to_string()))?
    }
}

fn load_frame(path: &Path, mirror: bool) -> Result<Frame, CaptureError> {
    let image = image::open(path)
        .map_err(|e| CaptureError::Failed(format!("{}: {e}", path.display())))?;

    let mut rgba = image.to_rgba8();
    if mirror {
        rgba = imageops::flip_horizontal(&rgba);
    }

    let (width, height) = rgba.dimensions();
    Ok(Frame::new(width, height, rgba.into_raw()))
}

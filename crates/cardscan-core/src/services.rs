use std::sync::Arc;

use async_trait::async_trait;
use cardscan_types::types::{CardRecord, Frame, OcrProgress, RawOcrResult, RegionOfInterest};

use crate::error::{CaptureError, LookupError, OcrError};

/// Callback for engine progress during initialization and recognition.
pub type ProgressFn = Arc<dyn Fn(OcrProgress) + Send + Sync>;

/// Camera capability: yields frames on demand.
#[async_trait]
pub trait FrameSource: Send + Sync {
    fn is_active(&self) -> bool;

    /// Capture one frame. `mirror` flips horizontally so the captured
    /// region matches a mirrored live preview.
    async fn capture_frame(&self, mirror: bool) -> Result<Frame, CaptureError>;
}

/// Async text-recognition engine.
///
/// `initialize` must complete once before `recognize` is usable; calling
/// it again is a no-op apart from re-registering the progress callback.
#[async_trait]
pub trait OcrService: Send + Sync {
    async fn initialize(&self, language: &str, progress: ProgressFn) -> Result<(), OcrError>;

    fn is_ready(&self) -> bool;

    async fn recognize(
        &self,
        frame: &Frame,
        region: RegionOfInterest,
    ) -> Result<RawOcrResult, OcrError>;
}

/// Remote fuzzy name resolver. `Ok(None)` means the service affirmatively
/// reported no match; transport and decode failures are errors.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<CardRecord>, LookupError>;
}

/// Receives pipeline observations: a status line on each state transition
/// and a collection change on each successful resolution. Both are called
/// synchronously from the scanning task.
pub trait ScanObserver: Send + Sync {
    fn status(&self, text: &str);

    fn collection_changed(&self, added: &CardRecord, collection: &[CardRecord]);
}

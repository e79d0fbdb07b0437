use thiserror::Error;

/// Terminal failure kinds for one scan attempt. All of these settle the
/// attempt and return the pipeline to idle; none are fatal and none are
/// retried automatically.
///
/// The `Display` text is the user-visible status line for the kind, so
/// every kind reads distinctly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("camera is not active")]
    FrameUnavailable,
    #[error("OCR engine is not ready yet")]
    OcrUnready,
    #[error("a scan is already in progress")]
    Busy,
    #[error("no usable text found, try again")]
    NoUsableText,
    #[error("recognition failed: {0}")]
    Recognition(String),
    #[error("could not find a card matching \"{candidate}\"")]
    LookupNotFound { candidate: String },
    #[error("card lookup failed: {0}")]
    LookupService(String),
    #[error("already collected \"{0}\"")]
    DuplicateCard(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("frame source is inactive")]
    Inactive,
    #[error("capture failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("engine not initialized")]
    NotInitialized,
    #[error("engine error: {0}")]
    Engine(String),
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
}

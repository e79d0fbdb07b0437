use serde::{Deserialize, Serialize};

/// One still image captured from the live video source, RGBA8.
///
/// Owned exclusively by the scan attempt that captured it and discarded
/// once recognition completes.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A frame with a zero dimension carries nothing to recognize.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Fractional subrectangle of a frame targeted for recognition.
///
/// All four values lie in [0, 1], with `left + width <= 1` and
/// `top + height <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl RegionOfInterest {
    pub fn try_new(left: f32, top: f32, width: f32, height: f32) -> Option<Self> {
        let unit = |v: f32| (0.0..=1.0).contains(&v);
        if unit(left)
            && unit(top)
            && unit(width)
            && unit(height)
            && left + width <= 1.0
            && top + height <= 1.0
        {
            Some(Self {
                left,
                top,
                width,
                height,
            })
        } else {
            None
        }
    }

    /// Resolve against actual frame dimensions. The result is clamped to
    /// the frame and never degenerates to a zero-size rectangle.
    pub fn to_pixel_rect(&self, frame_width: u32, frame_height: u32) -> PixelRect {
        let x = ((self.left * frame_width as f32) as u32).min(frame_width.saturating_sub(1));
        let y = ((self.top * frame_height as f32) as u32).min(frame_height.saturating_sub(1));
        let width = ((self.width * frame_width as f32) as u32)
            .clamp(1, frame_width.saturating_sub(x).max(1));
        let height = ((self.height * frame_height as f32) as u32)
            .clamp(1, frame_height.saturating_sub(y).max(1));
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }
}

/// The band where a card's name sits when the card fills the preview
/// outline.
impl Default for RegionOfInterest {
    fn default() -> Self {
        Self {
            left: 0.10,
            top: 0.40,
            width: 0.80,
            height: 0.20,
        }
    }
}

/// A region resolved to whole pixels within a specific frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Raw engine output for one recognition pass, consumed immediately by
/// normalization.
#[derive(Debug, Clone)]
pub struct RawOcrResult {
    pub text: String,
    pub confidence: Option<f32>,
}

/// Engine progress report: a status tag plus a 0.0-1.0 fraction.
#[derive(Debug, Clone)]
pub struct OcrProgress {
    pub stage: String,
    pub fraction: f32,
}

/// Image reference for display, with a placeholder marker the
/// presentation layer understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Url(String),
    Placeholder,
}

/// One face of a split or double-faced card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFace {
    pub name: String,
    pub image: Option<String>,
}

/// Canonical card data returned by the lookup service. `name` is the
/// dedup key for the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub name: String,
    pub type_line: String,
    pub set_name: String,
    pub image: ImageRef,
    pub faces: Vec<CardFace>,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    TriggerScan,
    StatusUpdate {
        status: String,
        scanning: bool,
    },
    CollectionChanged {
        added: CardRecord,
        collection: Vec<CardRecord>,
    },
    BackendReady,
    Shutdown,
}

use serde::{Deserialize, Serialize};

use self::capture::CaptureConfig;
use self::lookup::LookupConfig;
use self::ocr::OcrConfig;

pub mod capture;
pub mod lookup;
pub mod ocr;

#[derive(Default, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub ocr: OcrConfig,
    pub lookup: LookupConfig,
}

impl Config {
    /// Build from environment variables, falling back to defaults.
    pub fn new() -> Self {
        Config {
            capture: CaptureConfig::new(),
            ocr: OcrConfig::new(),
            lookup: LookupConfig::new(),
        }
    }
}

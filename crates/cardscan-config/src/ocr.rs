use std::env;

use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "eng".to_string()
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    /// Language hint passed to the engine
    #[serde(default = "default_language")]
    pub language: String,
    /// Path to the tesseract binary, if not on PATH
    pub binary: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            binary: None,
        }
    }
}

impl OcrConfig {
    pub fn new() -> Self {
        let language = env::var("OCR_LANGUAGE").unwrap_or_else(|_| default_language());
        let binary = env::var("OCR_BINARY").ok();

        Self { language, binary }
    }
}

use std::env;

use cardscan_types::types::RegionOfInterest;
use serde::{Deserialize, Serialize};

fn default_mirror() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CaptureConfig {
    /// Mirror captures horizontally to match a mirrored live preview
    #[serde(default = "default_mirror")]
    pub mirror: bool,
    /// Fraction of the frame handed to recognition
    pub region: RegionOfInterest,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            mirror: default_mirror(),
            region: RegionOfInterest::default(),
        }
    }
}

impl CaptureConfig {
    pub fn new() -> Self {
        let mirror = env::var("SCAN_MIRROR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_mirror);

        let region = region_from_env().unwrap_or_default();

        Self { mirror, region }
    }
}

fn region_from_env() -> Option<RegionOfInterest> {
    let fraction = |key: &str| env::var(key).ok().and_then(|v| v.parse::<f32>().ok());

    RegionOfInterest::try_new(
        fraction("SCAN_ROI_LEFT")?,
        fraction("SCAN_ROI_TOP")?,
        fraction("SCAN_ROI_WIDTH")?,
        fraction("SCAN_ROI_HEIGHT")?,
    )
}

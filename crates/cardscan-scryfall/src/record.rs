use cardscan_types::types::{CardFace, CardRecord, ImageRef};
use serde::Deserialize;

/// Subset of the Scryfall card schema the scanner consumes.
///
/// `name` is mandatory; a response without it fails the decode. Every
/// other field is optional with a documented fallback.
#[derive(Debug, Deserialize)]
pub struct ScryfallCard {
    pub name: String,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    #[serde(default)]
    pub card_faces: Option<Vec<ScryfallFace>>,
}

#[derive(Debug, Deserialize)]
pub struct ImageUris {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub normal: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScryfallFace {
    pub name: String,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

impl ScryfallCard {
    /// Collapse into the canonical record. The primary image falls back
    /// to the first face's image, then to the placeholder marker.
    pub fn into_record(self) -> CardRecord {
        let faces: Vec<CardFace> = self
            .card_faces
            .unwrap_or_default()
            .into_iter()
            .map(|face| CardFace {
                name: face.name,
                image: face.image_uris.and_then(ImageUris::preferred),
            })
            .collect();

        let image = self
            .image_uris
            .and_then(ImageUris::preferred)
            .or_else(|| faces.first().and_then(|face| face.image.clone()))
            .map(ImageRef::Url)
            .unwrap_or(ImageRef::Placeholder);

        CardRecord {
            name: self.name,
            type_line: self.type_line.unwrap_or_default(),
            set_name: self.set_name.unwrap_or_default(),
            image,
            faces,
        }
    }
}

impl ImageUris {
    fn preferred(self) -> Option<String> {
        self.small.or(self.normal)
    }
}

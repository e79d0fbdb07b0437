use std::sync::Arc;

use cardscan_types::types::CardRecord;

use crate::collection::CollectionStore;
use crate::services::LookupService;

/// Outcome of resolving one candidate name against the catalog.
#[derive(Debug)]
pub enum Resolution {
    /// New card; the caller commits the insert.
    Added(CardRecord),
    /// Already collected, keyed on the canonical name.
    Duplicate(String),
    /// The service affirmatively found nothing.
    NotFound,
    /// The call itself failed.
    ServiceError(String),
}

pub struct CardResolver {
    lookup: Arc<dyn LookupService>,
}

impl CardResolver {
    pub fn new(lookup: Arc<dyn LookupService>) -> Self {
        Self { lookup }
    }

    /// Resolve a candidate name.
    ///
    /// The duplicate check runs after the lookup and is keyed on the
    /// canonical name the service returns, not the OCR candidate: a
    /// misread like "Lightning Bot" can still resolve to an
    /// already-collected "Lightning Bolt".
    pub async fn resolve(&self, candidate: &str, collection: &CollectionStore) -> Resolution {
        match self.lookup.lookup(candidate).await {
            Ok(Some(record)) => {
                if collection.contains(&record.name) {
                    Resolution::Duplicate(record.name)
                } else {
                    Resolution::Added(record)
                }
            }
            Ok(None) => Resolution::NotFound,
            Err(e) => {
                tracing::warn!("lookup failed for '{candidate}': {e}");
                Resolution::ServiceError(e.to_string())
            }
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;
use cardscan_core::error::LookupError;
use cardscan_core::services::LookupService;
use cardscan_types::types::CardRecord;
use reqwest::StatusCode;

use crate::record::ScryfallCard;

/// Client for Scryfall's fuzzy named-card endpoint.
///
/// One operation: `GET {endpoint}?fuzzy=<name>`. A 404 is the service
/// affirmatively reporting no match; every other failure, including the
/// request timeout, is a service error.
#[derive(Clone)]
pub struct ScryfallClient {
    endpoint: String,
    client: reqwest::Client,
}

impl ScryfallClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl LookupService for ScryfallClient {
    async fn lookup(&self, name: &str) -> Result<Option<CardRecord>, LookupError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("fuzzy", name)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::Transport(e.to_string())
                }
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let card: ScryfallCard = response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))?;

        Ok(Some(card.into_record()))
    }
}

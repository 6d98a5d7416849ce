use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuggestion {
    pub place_id: String,
    pub description: String,
}

/// Maps/places autocomplete service.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn autocomplete(&self, input: &str) -> CoreResult<Vec<PlaceSuggestion>>;
}

/// Used when no maps API key is configured: every lookup is empty.
pub struct DisabledPlaces;

#[async_trait]
impl PlacesProvider for DisabledPlaces {
    async fn autocomplete(&self, input: &str) -> CoreResult<Vec<PlaceSuggestion>> {
        tracing::debug!("Places autocomplete disabled, ignoring '{}'", input);
        Ok(Vec::new())
    }
}

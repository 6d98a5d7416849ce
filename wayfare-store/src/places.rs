use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use wayfare_core::places::{PlaceSuggestion, PlacesProvider};
use wayfare_core::{CoreError, CoreResult};
use wayfare_shared::Masked;

const AUTOCOMPLETE_URL: &str = "https://maps.googleapis.com/maps/api/place/autocomplete/json";

/// Google Places autocomplete, restricted to cities and regions.
pub struct GooglePlaces {
    client: Client,
    api_key: Masked<String>,
}

impl GooglePlaces {
    pub fn new(api_key: Masked<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct Prediction {
    place_id: String,
    description: String,
}

fn suggestions(response: AutocompleteResponse) -> CoreResult<Vec<PlaceSuggestion>> {
    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(response
            .predictions
            .into_iter()
            .map(|p| PlaceSuggestion {
                place_id: p.place_id,
                description: p.description,
            })
            .collect()),
        other => Err(CoreError::ExternalService(format!(
            "Places lookup failed: {} {}",
            other,
            response.error_message.unwrap_or_default()
        ))),
    }
}

#[async_trait]
impl PlacesProvider for GooglePlaces {
    async fn autocomplete(&self, input: &str) -> CoreResult<Vec<PlaceSuggestion>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(AUTOCOMPLETE_URL)
            .query(&[
                ("input", input),
                ("types", "(regions)"),
                ("key", self.api_key.expose().as_str()),
            ])
            .send()
            .await
            .map_err(|e| CoreError::ExternalService(format!("Places request failed: {}", e)))?
            .json::<AutocompleteResponse>()
            .await
            .map_err(|e| CoreError::ExternalService(format!("Invalid places response: {}", e)))?;

        suggestions(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_results_is_empty() {
        let response: AutocompleteResponse =
            serde_json::from_str(r#"{"status":"ZERO_RESULTS","predictions":[]}"#).unwrap();
        assert!(suggestions(response).unwrap().is_empty());
    }

    #[test]
    fn test_denied_is_external_error() {
        let response: AutocompleteResponse = serde_json::from_str(
            r#"{"status":"REQUEST_DENIED","error_message":"bad key"}"#,
        )
        .unwrap();
        assert!(matches!(suggestions(response), Err(CoreError::ExternalService(_))));
    }

    #[test]
    fn test_predictions_map_to_suggestions() {
        let response: AutocompleteResponse = serde_json::from_str(
            r#"{"status":"OK","predictions":[{"place_id":"abc","description":"Lisbon, Portugal"}]}"#,
        )
        .unwrap();
        let out = suggestions(response).unwrap();
        assert_eq!(out[0].description, "Lisbon, Portugal");
    }
}

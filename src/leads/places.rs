use crate::config::{read_api_key, PlacesConfig};
use crate::leads::{Place, PlaceSearch};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const FIELD_MASK: &str = "places.id,places.displayName,places.types,places.websiteUri,\
places.nationalPhoneNumber,places.internationalPhoneNumber,places.formattedAddress,\
places.regularOpeningHours";

/// Google Places text-search client
#[derive(Clone)]
pub struct GooglePlacesClient {
    http_client: Client,
    endpoint: String,
    api_key: String,
}

impl GooglePlacesClient {
    /// Creates a client whose requests give up after `timeout`
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HarvestError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Builds the client from config, reading the key from the named env var
    pub fn from_config(config: &PlacesConfig) -> Result<Self, HarvestError> {
        let api_key = read_api_key(&config.api_key_env)?;
        Self::new(&config.endpoint, api_key, config.timeout())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<ApiPlace>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiPlace {
    id: String,
    display_name: Option<DisplayName>,
    types: Vec<String>,
    website_uri: String,
    national_phone_number: String,
    international_phone_number: String,
    formatted_address: String,
    regular_opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DisplayName {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OpeningHours {
    weekday_descriptions: Vec<String>,
}

impl From<ApiPlace> for Place {
    fn from(api: ApiPlace) -> Self {
        Place {
            id: api.id,
            name: api.display_name.map(|n| n.text).unwrap_or_default(),
            website_url: api.website_uri,
            national_phone: api.national_phone_number,
            international_phone: api.international_phone_number,
            address: api.formatted_address,
            opening_hours: api
                .regular_opening_hours
                .map(|h| h.weekday_descriptions)
                .unwrap_or_default(),
            categories: api.types,
        }
    }
}

#[async_trait]
impl PlaceSearch for GooglePlacesClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>, HarvestError> {
        debug!(query, limit, "Searching places");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&json!({
                "textQuery": query,
                "maxResultCount": limit,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarvestError::Places(format!("HTTP {}: {}", status, body)));
        }

        let result: SearchResponse = response.json().await?;
        let places: Vec<Place> = result.places.into_iter().map(Place::from).collect();

        info!(query, found = places.len(), "Places search finished");
        Ok(places)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_from_full_record() {
        let api: ApiPlace = serde_json::from_value(json!({
            "id": "abc",
            "displayName": {"text": "Moose Run Golf Course", "languageCode": "en"},
            "types": ["golf_course", "point_of_interest"],
            "websiteUri": "https://mooserun.example.com/",
            "nationalPhoneNumber": "(907) 555-0100",
            "internationalPhoneNumber": "+1 907-555-0100",
            "formattedAddress": "27000 Arctic Valley Rd, Anchorage, AK",
            "regularOpeningHours": {"weekdayDescriptions": ["Monday: Closed"]}
        }))
        .unwrap();

        let place = Place::from(api);
        assert_eq!(place.id, "abc");
        assert_eq!(place.name, "Moose Run Golf Course");
        assert_eq!(place.website_url, "https://mooserun.example.com/");
        assert_eq!(place.opening_hours, vec!["Monday: Closed"]);
        assert_eq!(place.categories.len(), 2);
    }

    #[test]
    fn test_place_missing_fields_are_empty() {
        let api: ApiPlace = serde_json::from_value(json!({"id": "x"})).unwrap();
        let place = Place::from(api);
        assert_eq!(place.id, "x");
        assert!(place.name.is_empty());
        assert!(place.website_url.is_empty());
        assert!(place.opening_hours.is_empty());
    }

    #[test]
    fn test_empty_response() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.places.is_empty());
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Macrostrat geological map API client

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{validate_coordinates, SuggestionReport};
use crate::config::GeologyConfig;
use crate::retry::with_retry;
use crate::{Result, RockhoundError};

/// Client for `geologic_units/map` lookups
pub struct MacrostratClient {
    client: Client,
    base_url: String,
    retries: u32,
}

impl MacrostratClient {
    pub fn new(config: &GeologyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.macrostrat_url.trim_end_matches('/').to_string(),
            retries: config.retries,
        })
    }

    /// URL of the map-unit query for a point
    pub fn units_url(&self, lat: f64, lng: f64) -> String {
        format!("{}/geologic_units/map?lat={}&lng={}&format=json", self.base_url, lat, lng)
    }

    /// Raw map-unit payload for a point
    pub async fn units_at(&self, lat: f64, lng: f64) -> Result<serde_json::Value> {
        validate_coordinates(lat, lng)?;
        let url = self.units_url(lat, lng);
        let url = url.as_str();
        let client = &self.client;

        with_retry("geological lookup", self.retries, move || async move {
            debug!("Fetching geological data from {}", url);
            let response = client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(RockhoundError::ServiceUnavailable(format!(
                    "Macrostrat returned status {}",
                    response.status()
                )));
            }

            Ok(response.json::<serde_json::Value>().await?)
        })
        .await
    }

    /// Rock guide for a point
    pub async fn report_at(&self, lat: f64, lng: f64) -> Result<SuggestionReport> {
        let payload = self.units_at(lat, lng).await?;
        Ok(SuggestionReport::from_payload(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_url() {
        let config = GeologyConfig {
            macrostrat_url: "https://macrostrat.org/api/v2/".to_string(),
            ..Default::default()
        };
        let client = MacrostratClient::new(&config).unwrap();
        assert_eq!(
            client.units_url(40.7128, -74.006),
            "https://macrostrat.org/api/v2/geologic_units/map?lat=40.7128&lng=-74.006&format=json"
        );
    }

    #[test]
    fn test_out_of_range_rejected_before_request() {
        let client = MacrostratClient::new(&GeologyConfig::default()).unwrap();
        let err = tokio_test::block_on(client.units_at(123.0, 0.0)).unwrap_err();
        assert!(matches!(err, RockhoundError::InvalidInput(_)));
    }
}

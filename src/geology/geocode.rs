// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Reverse geocoding via a Nominatim-compatible service

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::validate_coordinates;
use crate::config::GeologyConfig;
use crate::retry::with_retry;
use crate::{Result, RockhoundError};

/// Label used when a point has no usable address
pub const CURRENT_LOCATION: &str = "Current Location";

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<RawAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    road: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

/// Address parts for a point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub city: Option<String>,
    pub name: Option<String>,
    pub street: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl From<ReverseResponse> for Address {
    fn from(response: ReverseResponse) -> Self {
        let raw = response.address.unwrap_or_default();
        Self {
            city: raw.city.or(raw.town).or(raw.village),
            name: response.name,
            street: raw.road,
            region: raw.state,
            postal_code: raw.postcode,
            country: raw.country,
        }
    }
}

impl Address {
    /// Non-empty parts joined with ", "
    pub fn format(&self) -> String {
        let parts: Vec<&str> = [
            &self.city,
            &self.name,
            &self.street,
            &self.region,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            CURRENT_LOCATION.to_string()
        } else {
            parts.join(", ")
        }
    }
}

pub struct GeocodeClient {
    client: Client,
    base_url: String,
    retries: u32,
}

impl GeocodeClient {
    pub fn new(config: &GeologyConfig) -> Result<Self> {
        // Nominatim rejects requests without an identifying User-Agent
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.geocode_url.trim_end_matches('/').to_string(),
            retries: config.retries,
        })
    }

    pub fn reverse_url(&self, lat: f64, lng: f64) -> String {
        format!("{}/reverse?format=jsonv2&lat={}&lon={}", self.base_url, lat, lng)
    }

    /// Address for a point
    pub async fn reverse(&self, lat: f64, lng: f64) -> Result<Address> {
        validate_coordinates(lat, lng)?;
        let url = self.reverse_url(lat, lng);
        let url = url.as_str();
        let client = &self.client;

        let response: ReverseResponse = with_retry("reverse geocode", self.retries, move || async move {
            debug!("Reverse geocoding via {}", url);
            let response = client.get(url).send().await?;

            if !response.status().is_success() {
                return Err(RockhoundError::ServiceUnavailable(format!(
                    "Geocoder returned status {}",
                    response.status()
                )));
            }

            Ok(response.json::<ReverseResponse>().await?)
        })
        .await?;

        Ok(response.into())
    }
}

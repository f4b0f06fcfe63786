// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Identification results returned by the vision model
//!
//! The model is asked for a JSON object but frequently wraps it in prose or
//! markdown fences, or answers with something else entirely. [`parse`] always
//! produces a usable [`IdentificationResult`]; text it cannot make sense of
//! degrades to [`FallbackResult::unknown`].

pub mod vision;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::record::{lenient_string, lenient_text, PhysicalProperties, Property};

/// Name used when nothing better is known
pub const UNKNOWN_ROCK: &str = "Unknown Rock";

/// A full identification in the shape requested from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResult {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub common_name: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    /// Percentage in 0..=100
    #[serde(default, deserialize_with = "lenient_confidence", skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub physical_properties: PhysicalProperties,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub formation_process: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub common_locations: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub collecting_value: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub fun_facts: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A minimal answer: a name and a description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackResult {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<Property>,
}

impl FallbackResult {
    /// Placeholder for replies that could not be understood
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_ROCK.to_string(),
            description: "Unable to accurately identify this rock. The image might be unclear \
                          or the rock might have unusual characteristics."
                .to_string(),
            properties: vec![Property::new(
                "Note",
                "Please try with a clearer image or different angle.",
            )],
        }
    }
}

/// Outcome of an identification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentificationResult {
    Structured(StructuredResult),
    Fallback(FallbackResult),
}

impl IdentificationResult {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Structured(s) if !s.common_name.trim().is_empty() => s.common_name.as_str(),
            Self::Fallback(f) if !f.name.trim().is_empty() => f.name.as_str(),
            _ => UNKNOWN_ROCK,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Structured(s) => s.description.as_deref(),
            Self::Fallback(f) if !f.description.is_empty() => Some(f.description.as_str()),
            Self::Fallback(_) => None,
        }
    }

    pub fn classification(&self) -> Option<&str> {
        match self {
            Self::Structured(s) => s.classification.as_deref(),
            Self::Fallback(_) => None,
        }
    }

    pub fn physical_properties(&self) -> Option<&PhysicalProperties> {
        match self {
            Self::Structured(s) => Some(&s.physical_properties),
            Self::Fallback(_) => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Self::Structured(s) => s.confidence_level,
            Self::Fallback(_) => None,
        }
    }

    /// Display properties in presentation order
    pub fn properties(&self) -> Vec<Property> {
        match self {
            Self::Fallback(f) => f.properties.clone(),
            Self::Structured(s) => [
                ("Scientific Name", s.scientific_name.as_ref()),
                ("Formation", s.formation_process.as_ref()),
                ("Common Locations", s.common_locations.as_ref()),
                ("Collecting Value", s.collecting_value.as_ref()),
                ("Fun Facts", s.fun_facts.as_ref()),
            ]
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| Property::new(name, v.clone())))
            .collect(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Parse raw model output into an identification
pub fn parse(text: &str) -> IdentificationResult {
    let candidate = json_span(text).unwrap_or(text);

    let value: serde_json::Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(e) => {
            warn!("Identification reply is not JSON ({}), using fallback", e);
            return IdentificationResult::Fallback(FallbackResult::unknown());
        }
    };

    let has = |field: &str| {
        value
            .get(field)
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.trim().is_empty())
    };
    let structured = has("commonName");
    let named = has("name");

    if structured {
        match serde_json::from_value::<StructuredResult>(value) {
            Ok(result) => {
                debug!("Parsed structured identification: {}", result.common_name);
                IdentificationResult::Structured(result)
            }
            Err(e) => {
                warn!("Identification JSON has unexpected shape ({}), using fallback", e);
                IdentificationResult::Fallback(FallbackResult::unknown())
            }
        }
    } else if named {
        match serde_json::from_value::<FallbackResult>(value) {
            Ok(result) => IdentificationResult::Fallback(result),
            Err(e) => {
                warn!("Fallback identification has unexpected shape ({}), using placeholder", e);
                IdentificationResult::Fallback(FallbackResult::unknown())
            }
        }
    } else {
        warn!("Identification JSON names no rock, using fallback");
        IdentificationResult::Fallback(FallbackResult::unknown())
    }
}

/// Span from the first `{` to the last `}`, inclusive
fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn lenient_confidence<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let number = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    Ok(number.filter(|n: &f64| n.is_finite()).map(|n| n.clamp(0.0, 100.0)))
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

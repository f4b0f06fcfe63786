// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Saved rock identification records

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::identify::IdentificationResult;
use crate::{Result, RockhoundError};

/// A named display property, kept in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Physical properties reported for a specimen
///
/// Every field accepts a string, number, or list from the wire; lists are
/// joined with ", " so the luster filter can tokenize them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalProperties {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub hardness: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub luster: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub color_range: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub streak_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub cleavage_fracture: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub crystal_structure: Option<String>,
}

/// A saved rock or mineral in the user's collection
///
/// Records are immutable once saved; an update replaces the whole value.
/// Field names serialize in camelCase so existing collection blobs load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub image_uri: String,
    #[serde(default)]
    pub properties: Vec<Property>,
    /// RFC 3339 creation timestamp
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_properties: Option<PhysicalProperties>,
}

impl Record {
    /// Create a record stamped with the current time
    pub fn new(id: impl Into<String>, name: impl Into<String>, image_uri: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RockhoundError::InvalidInput("record name must not be empty".to_string()));
        }

        Ok(Self {
            id: id.into(),
            name,
            description: None,
            image_uri: image_uri.into(),
            properties: Vec::new(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            notes: None,
            location: None,
            classification: None,
            physical_properties: None,
        })
    }

    /// Build the record saved when the user confirms an identification
    pub fn from_identification(
        result: &IdentificationResult,
        image_uri: impl Into<String>,
        notes: Option<&str>,
        location: Option<&str>,
    ) -> Self {
        Self {
            id: new_record_id(),
            name: result.display_name().to_string(),
            description: result.description().map(String::from),
            image_uri: image_uri.into(),
            properties: result.properties(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            notes: non_blank(notes),
            location: non_blank(location),
            classification: result.classification().map(String::from),
            physical_properties: result.physical_properties().cloned(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    pub fn with_physical_properties(mut self, props: PhysicalProperties) -> Self {
        self.physical_properties = Some(props);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    /// Hardness string, if any
    pub fn hardness(&self) -> Option<&str> {
        self.physical_properties.as_ref()?.hardness.as_deref()
    }

    /// Luster string, if any
    pub fn luster(&self) -> Option<&str> {
        self.physical_properties.as_ref()?.luster.as_deref()
    }
}

/// Generate a new id for a collection record
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Accept a string, number, bool, or list of scalars as text
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_text))
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn value_to_text(value: serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(value_to_text).collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        other @ Value::Object(_) => Some(other.to_string()),
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Lithology extraction from geological map unit payloads
//!
//! Map units report rock types in several shapes: a list of tagged objects,
//! a comma-separated string, or only a prose description. Anything that
//! does not match an expected shape contributes nothing.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use super::normalize_name;

/// Rock names searched for in free-text unit descriptions
pub const DESCRIPTION_VOCABULARY: [&str; 10] = [
    "Sandstone", "Shale", "Limestone", "Granite", "Gneiss",
    "Schist", "Basalt", "Quartzite", "Marble", "Slate",
];

/// Unit fields tried, in order, for a region name
const REGION_FIELDS: [&str; 5] = ["col_name", "gp_name", "Fm", "Mbr", "strat_name_long"];

const UNKNOWN_REGION: &str = "Region name unavailable";

lazy_static! {
    static ref ROCK_WORD: Regex = Regex::new(&format!(
        r"(?i)\b({})\b",
        DESCRIPTION_VOCABULARY.join("|")
    )).unwrap();
    static ref ROCK_MENTION: Regex = Regex::new(&format!(
        r"(?i)({})",
        DESCRIPTION_VOCABULARY.join("|")
    )).unwrap();
}

/// The topmost map unit of a `{"success": {"data": [...]}}` payload
pub fn primary_unit(payload: &Value) -> Option<&Value> {
    let unit = payload.pointer("/success/data/0")?;
    if unit.is_object() {
        Some(unit)
    } else {
        warn!("Primary map unit is not an object: {}", unit);
        None
    }
}

/// Most specific non-empty name for the unit's region
pub fn region_name(unit: &Value) -> String {
    REGION_FIELDS
        .iter()
        .filter_map(|field| non_empty_str(unit, field))
        .next()
        .unwrap_or(UNKNOWN_REGION)
        .to_string()
}

/// Raw lithology names reported for a unit
pub fn lithologies(unit: &Value) -> Vec<String> {
    let mut names = match unit.get("lith") {
        Some(Value::Array(items)) => from_tagged_list(items),
        Some(Value::String(list)) => from_comma_list(list),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!("Unexpected lith shape, ignoring: {}", other);
            Vec::new()
        }
    };

    if names.is_empty() {
        if let Some(description) = non_empty_str(unit, "descrip") {
            names = mine_description(description);
        }
    }

    if names.is_empty() {
        if let Some(name) = non_empty_str(unit, "name") {
            if ROCK_MENTION.is_match(name) {
                names.push(name.to_string());
            }
        }
    }

    debug!("Extracted lithologies: {:?}", names);
    names
}

/// Vocabulary rock names mentioned in prose, capitalised, first mention only
pub fn mine_description(description: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in ROCK_WORD.find_iter(description) {
        let name = normalize_name(m.as_str());
        if !found.contains(&name) {
            found.push(name);
        }
    }
    found
}

fn from_tagged_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => non_empty_str(item, "lith").or_else(|| non_empty_str(item, "name")),
            Value::String(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        })
        .map(|s| s.trim().to_string())
        .collect()
}

fn from_comma_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty_str<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

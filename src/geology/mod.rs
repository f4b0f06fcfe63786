// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Regional rock guide
//!
//! Lithology names from the geological map service are free text. This
//! module maps them onto a small fixed guide of common rock types, dropping
//! broad category terms that would not help anyone recognise a rock.

pub mod extract;
pub mod geocode;
pub mod macrostrat;

use serde::Serialize;
use std::collections::HashSet;

use crate::{Result, RockhoundError};

/// Field-guide entry for one rock type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RockDetails {
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub grain_size: &'static str,
    pub hardness: &'static str,
    pub luster: &'static str,
    pub streak: &'static str,
    pub features: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confusion: Option<&'static str>,
}

pub static ROCK_GUIDE: [RockDetails; 12] = [
    RockDetails {
        name: "Granite",
        description: "Intrusive igneous rock, cooled slowly from magma deep underground.",
        color: "Varied (Pink, white, gray, black)",
        grain_size: "Coarse (visible crystals)",
        hardness: "6-7",
        luster: "Dull to vitreous (quartz/feldspar)",
        streak: "White",
        features: "Visible interlocking crystals of quartz (gray/glassy), feldspar (white/pink), mica (black/shiny flakes), +/- hornblende.",
        confusion: Some("Gneiss (look for banding in Gneiss), Diorite (less quartz)."),
    },
    RockDetails {
        name: "Basalt",
        description: "Extrusive igneous rock, cooled quickly from lava on the surface.",
        color: "Dark gray to black",
        grain_size: "Fine (crystals usually too small to see)",
        hardness: "5.5-6.5",
        luster: "Dull",
        streak: "Grayish-black",
        features: "Often dense and heavy. May contain small holes (vesicles) from gas bubbles (Vesicular Basalt). Columnar jointing possible.",
        confusion: Some("Shale (much softer), Limestone (fizzes with acid)."),
    },
    RockDetails {
        name: "Obsidian",
        description: "Extrusive igneous rock (volcanic glass), cooled extremely rapidly.",
        color: "Black (usually), can have reddish streaks or snowflakes (Snowflake Obsidian).",
        grain_size: "Glassy (no crystals)",
        hardness: "5-5.5",
        luster: "Vitreous (glassy)",
        streak: "White",
        features: "Very sharp edges, conchoidal fracture (curved breaks like glass).",
        confusion: Some("Chert/Flint (usually duller luster)."),
    },
    RockDetails {
        name: "Sandstone",
        description: "Sedimentary rock formed from cemented sand grains.",
        color: "Varied (Tan, brown, red, pink, white)",
        grain_size: "Medium (sand-sized grains, feels gritty)",
        hardness: "Variable (depends on cement), often 6-7 if quartz-rich.",
        luster: "Dull",
        streak: "White/gray/reddish (depends on cement)",
        features: "Feels like sandpaper. May show layering (bedding) or cross-bedding. Can contain fossils.",
        confusion: Some("Quartzite (much harder, grains fused)."),
    },
    RockDetails {
        name: "Shale",
        description: "Sedimentary rock formed from compacted mud or clay.",
        color: "Gray, black, brown, red",
        grain_size: "Very fine (smooth to the touch)",
        hardness: "~3",
        luster: "Dull",
        streak: "Variable (often gray)",
        features: "Often splits into thin layers or plates (fissile). May contain fossils. Can have a 'muddy' smell when wet.",
        confusion: Some("Slate (harder, rings when tapped)."),
    },
    RockDetails {
        name: "Limestone",
        description: "Sedimentary rock primarily composed of calcium carbonate (calcite).",
        color: "White, gray, tan, black",
        grain_size: "Variable (fine to coarse, can contain shells/fossils)",
        hardness: "3",
        luster: "Dull to vitreous",
        streak: "White",
        features: "Fizzes readily with dilute acid (like vinegar). Often contains visible fossils (Fossiliferous Limestone). Oolitic limestone has small, round grains.",
        confusion: Some("Marble (metamorphosed, crystalline), Dolomite (fizzes weakly or only when powdered)."),
    },
    RockDetails {
        name: "Conglomerate",
        description: "Sedimentary rock composed of rounded gravel-sized clasts cemented together.",
        color: "Highly variable depending on clasts and matrix.",
        grain_size: "Coarse (visible pebbles/cobbles, rounded)",
        hardness: "Variable",
        luster: "Dull",
        streak: "Variable",
        features: "Contains rounded pebbles, cobbles, or boulders in a finer matrix (sand/silt). Like natural concrete.",
        confusion: Some("Breccia (clasts are angular)."),
    },
    RockDetails {
        name: "Gneiss",
        description: "Metamorphic rock formed under high heat and pressure, typically from granite or sedimentary rocks.",
        color: "Alternating light and dark bands",
        grain_size: "Medium to coarse",
        hardness: "Variable (~7)",
        luster: "Vitreous to dull",
        streak: "White/gray",
        features: "Distinct compositional banding (gneissic banding) - alternating layers of different minerals (e.g., quartz/feldspar vs. mica/hornblende).",
        confusion: Some("Granite (no banding), Schist (more platy minerals, less distinct bands)."),
    },
    RockDetails {
        name: "Schist",
        description: "Metamorphic rock formed under moderate to high heat and pressure, often from shale or basalt.",
        color: "Variable (often silvery, gray, green, brown)",
        grain_size: "Medium to coarse (visible platy minerals)",
        hardness: "Variable",
        luster: "Often sparkly/shiny due to mica (muscovite/biotite)",
        streak: "Variable",
        features: "Characterized by parallel alignment of platy minerals (micas) causing foliation (schistosity). Often glitters. May contain larger crystals like garnet.",
        confusion: Some("Gneiss (less platy, more distinct bands), Phyllite (finer grained)."),
    },
    RockDetails {
        name: "Marble",
        description: "Metamorphic rock formed from limestone subjected to heat and pressure.",
        color: "White (pure), can be gray, pink, green, black due to impurities",
        grain_size: "Medium to coarse (interlocking calcite crystals)",
        hardness: "3",
        luster: "Vitreous to pearly",
        streak: "White",
        features: "Crystalline texture (sparkles). Fizzes with dilute acid. Often smooth. Banding or swirls may be present from impurities.",
        confusion: Some("Limestone (less crystalline), Quartzite (much harder)."),
    },
    RockDetails {
        name: "Quartzite",
        description: "Metamorphic rock formed from sandstone subjected to heat and pressure.",
        color: "White, gray, pink, red, yellow",
        grain_size: "Medium (sand grains fused together)",
        hardness: "7",
        luster: "Vitreous to somewhat dull",
        streak: "White",
        features: "Very hard and durable. Grains are interlocked and fused; fracture cuts through grains (unlike sandstone where it breaks around grains). Smoother feel than sandstone.",
        confusion: Some("Sandstone (softer, grittier), Marble (much softer, fizzes with acid)."),
    },
    RockDetails {
        name: "Slate",
        description: "Metamorphic rock formed from shale under low-grade heat and pressure.",
        color: "Gray, black, green, red, purple",
        grain_size: "Very fine (crystals not visible)",
        hardness: "~3-4",
        luster: "Dull to slight sheen",
        streak: "Gray/black",
        features: "Splits into very flat, smooth sheets (slaty cleavage). Rings when tapped lightly (unlike shale).",
        confusion: Some("Shale (softer, duller, doesn't ring), Phyllite (shinier, slightly wavy cleavage)."),
    },
];

/// Base rock types a qualified name like "Red Sandstone" falls back to
const SUFFIX_FALLBACKS: [&str; 8] = [
    "Sandstone", "Limestone", "Shale", "Granite", "Gneiss", "Schist", "Basalt", "Marble",
];

/// Category terms too broad to describe a specific rock
pub const GENERIC_TERMS: [&str; 27] = [
    "rock", "rocks", "igneous rock", "sedimentary rock", "metamorphic rock",
    "volcanic rock", "plutonic rock", "intrusive rock", "extrusive rock",
    "clastic rock", "carbonate rock", "siliciclastic rock",
    "igneous rocks", "sedimentary rocks", "metamorphic rocks",
    "volcanic rocks", "plutonic rocks", "intrusive rocks", "extrusive rocks",
    "clastic rocks", "carbonate rocks", "siliciclastic rocks",
    "metasedimentary rocks", "metavolcanic rocks",
    "undifferentiated", "unconsolidated sediments", "sediments",
];

/// Trim, upper-case the first character and lower-case the rest
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

fn entry(name: &str) -> Option<&'static RockDetails> {
    ROCK_GUIDE.iter().find(|d| d.name == name)
}

/// Guide entry for a lithology name, if one applies
pub fn lookup(raw: &str) -> Option<&'static RockDetails> {
    let normalized = normalize_name(raw);
    if let Some(details) = entry(&normalized) {
        return Some(details);
    }

    let lower = normalized.to_lowercase();
    SUFFIX_FALLBACKS
        .iter()
        .find(|base| {
            lower
                .strip_suffix(base.to_lowercase().as_str())
                .is_some_and(|head| head.ends_with(' '))
        })
        .and_then(|base| entry(base))
}

/// True if the name is one of the broad category terms
pub fn is_generic(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    GENERIC_TERMS.contains(&lower.as_str())
}

/// Drop broad category terms, keeping order and duplicates
pub fn filter_generic<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !is_generic(name))
        .map(String::from)
        .collect()
}

/// A lithology name paired with its guide entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub details: &'static RockDetails,
}

/// Guide entries for the specific, recognised names in `raw_names`
pub fn build_suggestions<S: AsRef<str>>(raw_names: &[S]) -> Vec<Suggestion> {
    dedupe(filter_generic(raw_names))
        .into_iter()
        .filter_map(|name| lookup(&name).map(|details| Suggestion { name, details }))
        .collect()
}

/// Stable de-duplication, first occurrence wins
fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

/// How a region lookup turned out
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "terms", rename_all = "snake_case")]
pub enum Outcome {
    /// At least one suggestion was produced
    Found,
    /// The service had no map unit at the location
    NoUnits,
    /// A unit was found but it named no lithologies
    NoLithology,
    /// Every lithology was a broad category term
    OnlyGeneric(Vec<String>),
    /// Specific terms were found that the guide does not cover
    Unrecognized(Vec<String>),
}

/// Region name, extracted lithologies and guide suggestions for a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionReport {
    pub region: Option<String>,
    pub lithologies: Vec<String>,
    pub suggestions: Vec<Suggestion>,
    pub outcome: Outcome,
}

impl SuggestionReport {
    /// Build a report from a geological map service payload
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        match extract::primary_unit(payload) {
            Some(unit) => Self::from_unit(extract::region_name(unit), extract::lithologies(unit)),
            None => Self {
                region: None,
                lithologies: Vec::new(),
                suggestions: Vec::new(),
                outcome: Outcome::NoUnits,
            },
        }
    }

    /// Build a report from an already extracted region and lithology list
    pub fn from_unit(region: String, lithologies: Vec<String>) -> Self {
        let suggestions = build_suggestions(&lithologies);
        let outcome = if !suggestions.is_empty() {
            Outcome::Found
        } else {
            let specific = dedupe(filter_generic(&lithologies));
            if !lithologies.is_empty() && specific.is_empty() {
                Outcome::OnlyGeneric(lithologies.clone())
            } else if !specific.is_empty() {
                Outcome::Unrecognized(specific)
            } else {
                Outcome::NoLithology
            }
        };

        Self {
            region: Some(region),
            lithologies,
            suggestions,
            outcome,
        }
    }

    /// User-facing explanation when no suggestions were produced
    pub fn message(&self) -> Option<String> {
        let detail = match &self.outcome {
            Outcome::Found => return None,
            Outcome::NoUnits => return Some("Geological data not found for this location.".to_string()),
            Outcome::NoLithology => "No specific rock types recognized from the data.".to_string(),
            Outcome::OnlyGeneric(terms) => format!(
                "The API returned general terms like '{}', which are too broad for detailed lookup.",
                terms.join(", ")
            ),
            Outcome::Unrecognized(terms) => format!(
                "Could not find details for the following specific terms from the API: {}.",
                terms.join(", ")
            ),
        };
        Some(format!("Found geological region, but {}", detail))
    }
}

/// Reject coordinates outside the valid latitude/longitude ranges
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(RockhoundError::InvalidInput(format!("latitude {} out of range", lat)));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(RockhoundError::InvalidInput(format!("longitude {} out of range", lng)));
    }
    Ok(())
}

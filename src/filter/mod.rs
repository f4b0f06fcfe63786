// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Search and facet filtering over collection records
//!
//! Every active predicate must pass; input order is preserved.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::record::Record;

/// Threshold meaning "no hardness restriction"
pub const MAX_HARDNESS: f64 = 10.0;
/// Lowest selectable threshold on the Mohs scale
pub const MIN_HARDNESS: f64 = 1.0;

/// Canonical classification names offered as facets
pub const ROCK_TYPES: [&str; 4] = ["Igneous", "Sedimentary", "Metamorphic", "Mineral"];

/// Luster names offered as facets, with a short hint for each
pub const LUSTERS: [(&str, &str); 9] = [
    ("Metallic", "Looks shiny like metal (Pyrite, Galena)"),
    ("Vitreous", "Glassy, like broken glass (Quartz)"),
    ("Pearly", "Iridescent, like a pearl (Talc)"),
    ("Silky", "Soft sheen, like silk threads (Satin spar gypsum)"),
    ("Resinous", "Like resin or plastic (Amber)"),
    ("Greasy", "Looks oily or slippery (Nepheline)"),
    ("Waxy", "Like wax (Opal)"),
    ("Dull", "Earthy, no shine (Kaolinite)"),
    ("Adamantine", "Brilliant, diamond-like (Diamond)"),
];

/// Mohs reference minerals: (hardness, mineral, scratch comparison)
pub static MOHS_SCALE: [(u8, &str, &str); 10] = [
    (1, "Talc", "Very soft, can be scratched with a fingernail"),
    (2, "Gypsum", "Found in chalk, also scratchable with a fingernail"),
    (3, "Calcite", "Can be scratched with a copper coin"),
    (4, "Fluorite", "Can be scratched with a knife"),
    (5, "Apatite", "Just about as hard as a steel nail"),
    (6, "Orthoclase", "Scratches glass"),
    (7, "Quartz", "Very hard, can scratch most metals and glass"),
    (8, "Topaz", "Even harder, scratches quartz"),
    (9, "Corundum", "Extremely hard, includes rubies and sapphires"),
    (10, "Diamond", "The hardest natural substance on Earth"),
];

/// Reference mineral whose hardness is the floor of `hardness`
pub fn mohs_reference(hardness: f64) -> Option<&'static (u8, &'static str, &'static str)> {
    if !(MIN_HARDNESS..=MAX_HARDNESS).contains(&hardness) {
        return None;
    }
    MOHS_SCALE.iter().rev().find(|(h, _, _)| f64::from(*h) <= hardness)
}

/// Search text plus facet selections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub search: String,
    pub classifications: BTreeSet<String>,
    pub lusters: BTreeSet<String>,
    #[serde(deserialize_with = "clamped_hardness")]
    max_hardness: f64,
}

fn clamp_hardness(threshold: f64) -> f64 {
    if threshold.is_nan() {
        MAX_HARDNESS
    } else {
        threshold.clamp(MIN_HARDNESS, MAX_HARDNESS)
    }
}

fn clamped_hardness<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(clamp_hardness(f64::deserialize(deserializer)?))
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            classifications: BTreeSet::new(),
            lusters: BTreeSet::new(),
            max_hardness: MAX_HARDNESS,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classifications.insert(classification.into());
        self
    }

    pub fn with_luster(mut self, luster: impl Into<String>) -> Self {
        self.lusters.insert(luster.into());
        self
    }

    pub fn with_max_hardness(mut self, threshold: f64) -> Self {
        self.set_max_hardness(threshold);
        self
    }

    /// Set the threshold, clamped into 1..=10
    pub fn set_max_hardness(&mut self, threshold: f64) {
        self.max_hardness = clamp_hardness(threshold);
    }

    pub fn max_hardness(&self) -> f64 {
        self.max_hardness
    }

    /// Add the classification if absent, remove it if present
    pub fn toggle_classification(&mut self, classification: &str) {
        if !self.classifications.remove(classification) {
            self.classifications.insert(classification.to_string());
        }
    }

    /// Add the luster if absent, remove it if present
    pub fn toggle_luster(&mut self, luster: &str) {
        if !self.lusters.remove(luster) {
            self.lusters.insert(luster.to_string());
        }
    }

    /// Number of active facet filters, not counting search text
    pub fn active_count(&self) -> usize {
        usize::from(!self.classifications.is_empty())
            + usize::from(!self.lusters.is_empty())
            + usize::from(self.hardness_active())
    }

    /// True when nothing would be filtered out
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.active_count() == 0
    }

    fn hardness_active(&self) -> bool {
        self.max_hardness < MAX_HARDNESS
    }

    /// Whether a single record passes every active predicate
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record)
            && self.matches_classification(record)
            && self.matches_luster(record)
            && self.matches_hardness(record)
    }

    fn matches_search(&self, record: &Record) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        let contains = |field: Option<&str>| {
            field.is_some_and(|text| text.to_lowercase().contains(&needle))
        };

        contains(Some(record.name.as_str()))
            || contains(record.description.as_deref())
            || contains(record.notes.as_deref())
            || contains(record.location.as_deref())
    }

    fn matches_classification(&self, record: &Record) -> bool {
        if self.classifications.is_empty() {
            return true;
        }
        record
            .classification
            .as_ref()
            .is_some_and(|c| self.classifications.contains(c))
    }

    fn matches_luster(&self, record: &Record) -> bool {
        if self.lusters.is_empty() {
            return true;
        }
        let Some(luster) = record.luster() else {
            return false;
        };
        let wanted: BTreeSet<String> = self.lusters.iter().map(|l| l.trim().to_lowercase()).collect();
        luster_tokens(luster).any(|token| wanted.contains(&token))
    }

    fn matches_hardness(&self, record: &Record) -> bool {
        if !self.hardness_active() {
            return true;
        }
        record
            .hardness()
            .and_then(parse_hardness)
            .is_some_and(|h| h <= self.max_hardness)
    }
}

/// Records passing `state`, in their original order
pub fn apply(records: &[Record], state: &FilterState) -> Vec<Record> {
    records.iter().filter(|r| state.matches(r)).cloned().collect()
}

/// Lower-cased luster names from a comma or whitespace separated list
pub fn luster_tokens(luster: &str) -> impl Iterator<Item = String> + '_ {
    luster
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Lower bound of a Mohs hardness string such as `"6-7"` or `"5.5"`
///
/// Only a leading decimal number is read; text like `"~3"` or
/// `"Variable"` yields `None`.
pub fn parse_hardness(hardness: &str) -> Option<f64> {
    let lower = hardness.split('-').next()?.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in lower.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    let number = lower[..end].parse::<f64>().ok()?;
    number.is_finite().then_some(number)
}

/// Editing lifecycle of the filter panel
///
/// Opening seeds a draft from the committed state. The draft is only
/// committed by [`FilterSession::apply`]; [`FilterSession::cancel`] drops it.
#[derive(Debug, Clone, Default)]
pub struct FilterSession {
    active: FilterState,
    draft: Option<FilterState>,
}

impl FilterSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed state used for filtering
    pub fn active(&self) -> &FilterState {
        &self.active
    }

    /// Replace the committed search text; search is edited outside the panel
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.active.search = text.into();
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Open the panel, discarding any earlier unsaved draft
    pub fn open(&mut self) -> &mut FilterState {
        self.draft.insert(self.active.clone())
    }

    /// The draft being edited, if the panel is open
    pub fn draft_mut(&mut self) -> Option<&mut FilterState> {
        self.draft.as_mut()
    }

    /// Clear the draft's facets without closing the panel
    pub fn clear_draft(&mut self) {
        if let Some(draft) = self.draft.as_mut() {
            let search = std::mem::take(&mut draft.search);
            *draft = FilterState::default().with_search(search);
        }
    }

    /// Commit the draft and close
    pub fn apply(&mut self) {
        if let Some(draft) = self.draft.take() {
            self.active = draft;
        }
    }

    /// Clear both draft and committed state, including search text, and close
    pub fn reset(&mut self) {
        self.draft = None;
        self.active = FilterState::default();
    }

    /// Close without committing
    pub fn cancel(&mut self) {
        self.draft = None;
    }

    /// Filter records with the committed state
    pub fn apply_to(&self, records: &[Record]) -> Vec<Record> {
        apply(records, &self.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PhysicalProperties;

    fn rock(id: &str, classification: Option<&str>, hardness: Option<&str>, luster: Option<&str>) -> Record {
        let mut record = Record::new(id, format!("Rock {}", id), "file:///r.jpg").unwrap();
        record.classification = classification.map(String::from);
        if hardness.is_some() || luster.is_some() {
            record.physical_properties = Some(PhysicalProperties {
                hardness: hardness.map(String::from),
                luster: luster.map(String::from),
                ..Default::default()
            });
        }
        record
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_empty_state_keeps_everything() {
        let records = vec![rock("1", None, None, None), rock("2", Some("Igneous"), None, None)];
        assert_eq!(apply(&records, &FilterState::new()), records);
    }

    #[test]
    fn test_search_any_text_field_case_insensitive() {
        let records = vec![
            Record::new("1", "Granite", "a").unwrap(),
            Record::new("2", "Pebble", "b").unwrap().with_description("Glassy black OBSIDIAN"),
            Record::new("3", "Pebble", "c").unwrap().with_notes("found near the obsidian flow"),
            Record::new("4", "Pebble", "d").unwrap().with_location("Obsidian Cliff, WY"),
            Record::new("5", "Pebble", "e").unwrap(),
        ];
        let state = FilterState::new().with_search("obsidian");
        assert_eq!(ids(&apply(&records, &state)), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_classification_keeps_order() {
        let records = vec![
            rock("1", Some("Igneous"), None, None),
            rock("2", Some("Sedimentary"), None, None),
            rock("3", Some("Igneous"), None, None),
            rock("4", None, None, None),
        ];
        let state = FilterState::new().with_classification("Igneous");
        assert_eq!(ids(&apply(&records, &state)), vec!["1", "3"]);

        let lower = FilterState::new().with_classification("igneous");
        assert!(apply(&records, &lower).is_empty());
    }

    #[test]
    fn test_luster_tokens_match_case_insensitively() {
        let records = vec![rock("1", None, None, Some("Vitreous, Pearly"))];
        assert_eq!(apply(&records, &FilterState::new().with_luster("pearly")).len(), 1);
        assert!(apply(&records, &FilterState::new().with_luster("Silky")).is_empty());

        let spaced = vec![rock("2", None, None, Some("Vitreous Pearly"))];
        assert_eq!(apply(&spaced, &FilterState::new().with_luster("PEARLY")).len(), 1);
        assert_eq!(luster_tokens("Vitreous Pearly").collect::<Vec<_>>(), vec!["vitreous", "pearly"]);
    }

    #[test]
    fn test_blank_luster_list_matches_nothing() {
        assert_eq!(luster_tokens("  ,  \t").count(), 0);

        let records = vec![rock("1", None, None, Some("   ")), rock("2", None, None, Some(" , "))];
        assert!(apply(&records, &FilterState::new().with_luster("Dull")).is_empty());
        assert_eq!(apply(&records, &FilterState::new()).len(), 2);
    }

    #[test]
    fn test_deserialized_threshold_is_clamped() {
        let state: FilterState = serde_json::from_str(r#"{"max_hardness": -5}"#).unwrap();
        assert_eq!(state.max_hardness(), MIN_HARDNESS);
        assert!(state.search.is_empty());

        let state: FilterState = serde_json::from_str(r#"{"lusters": ["Dull"], "max_hardness": 40}"#).unwrap();
        assert_eq!(state.max_hardness(), MAX_HARDNESS);
        assert_eq!(state.active_count(), 1);
    }

    #[test]
    fn test_mohs_reference() {
        assert_eq!(mohs_reference(7.0).map(|m| m.1), Some("Quartz"));
        assert_eq!(mohs_reference(5.5).map(|m| m.1), Some("Apatite"));
        assert_eq!(mohs_reference(10.0).map(|m| m.1), Some("Diamond"));
        assert!(mohs_reference(0.5).is_none());
    }

    #[test]
    fn test_missing_luster_fails_active_luster_filter() {
        let records = vec![rock("1", Some("Igneous"), Some("6"), None)];
        assert!(apply(&records, &FilterState::new().with_luster("Dull")).is_empty());
    }

    #[test]
    fn test_hardness_range_uses_lower_bound() {
        let records = vec![rock("1", None, Some("6-7"), None)];
        for (threshold, expected) in [(6.0, 1), (7.0, 1), (5.5, 0)] {
            let state = FilterState::new().with_max_hardness(threshold);
            assert_eq!(apply(&records, &state).len(), expected, "threshold {}", threshold);
        }
    }

    #[test]
    fn test_unknown_hardness_fails_restricted_query() {
        let records = vec![
            rock("1", None, None, None),
            rock("2", None, Some("Variable"), None),
            rock("3", None, Some("~3"), None),
        ];
        assert!(apply(&records, &FilterState::new().with_max_hardness(9.5)).is_empty());
        assert_eq!(apply(&records, &FilterState::new().with_max_hardness(10.0)).len(), 3);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let records = vec![
            rock("1", Some("Igneous"), Some("6"), Some("Vitreous")),
            rock("2", Some("Igneous"), Some("8"), Some("Vitreous")),
            rock("3", Some("Metamorphic"), Some("3"), Some("Vitreous")),
            rock("4", Some("Igneous"), Some("5"), Some("Dull")),
        ];
        let state = FilterState::new()
            .with_classification("Igneous")
            .with_luster("vitreous")
            .with_max_hardness(7.0);
        assert_eq!(ids(&apply(&records, &state)), vec!["1"]);
        assert_eq!(state.active_count(), 3);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let records = vec![
            rock("1", Some("Igneous"), Some("6"), None),
            rock("2", Some("Mineral"), Some("2.5"), None),
        ];
        let state = FilterState::new().with_max_hardness(4.0);
        let once = apply(&records, &state);
        assert_eq!(once, apply(&records, &state));
        assert_eq!(apply(&once, &state), once);
    }

    #[test]
    fn test_parse_hardness() {
        assert_eq!(parse_hardness("6-7"), Some(6.0));
        assert_eq!(parse_hardness("5.5-6.5"), Some(5.5));
        assert_eq!(parse_hardness(" 3 (soft)"), Some(3.0));
        assert_eq!(parse_hardness("2.5."), Some(2.5));
        assert_eq!(parse_hardness("~3"), None);
        assert_eq!(parse_hardness(""), None);
    }

    #[test]
    fn test_threshold_is_clamped() {
        assert_eq!(FilterState::new().with_max_hardness(0.2).max_hardness(), MIN_HARDNESS);
        assert_eq!(FilterState::new().with_max_hardness(42.0).max_hardness(), MAX_HARDNESS);
        assert_eq!(FilterState::new().with_max_hardness(f64::NAN).max_hardness(), MAX_HARDNESS);
    }

    #[test]
    fn test_toggle() {
        let mut state = FilterState::new();
        state.toggle_luster("Waxy");
        assert!(state.lusters.contains("Waxy"));
        state.toggle_luster("Waxy");
        assert!(state.is_empty());
    }

    #[test]
    fn test_session_apply_commits_draft() {
        let mut session = FilterSession::new();
        session.open().toggle_classification("Igneous");
        assert!(session.active().classifications.is_empty());

        session.apply();
        assert!(!session.is_open());
        assert!(session.active().classifications.contains("Igneous"));
    }

    #[test]
    fn test_session_cancel_discards_and_reopen_reseeds() {
        let mut session = FilterSession::new();
        session.open().set_max_hardness(4.0);
        session.apply();

        session.open().set_max_hardness(2.0);
        session.cancel();
        assert_eq!(session.active().max_hardness(), 4.0);

        let draft = session.open();
        assert_eq!(draft.max_hardness(), 4.0);
    }

    #[test]
    fn test_session_reset_clears_everything() {
        let mut session = FilterSession::new();
        session.set_search("quartz");
        session.open().toggle_luster("Vitreous");
        session.apply();

        session.open();
        session.reset();
        assert!(!session.is_open());
        assert!(session.active().is_empty());
    }

    #[test]
    fn test_session_clear_draft_keeps_panel_open() {
        let mut session = FilterSession::new();
        session.set_search("agate");
        session.open().toggle_classification("Mineral");
        session.clear_draft();

        assert!(session.is_open());
        let draft = session.draft_mut().unwrap();
        assert!(draft.classifications.is_empty());
        assert_eq!(draft.search, "agate");
    }
}

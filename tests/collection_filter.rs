// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Saving, reopening and filtering a collection on disk

use rockhound::collection::{Collection, RecordStore};
use rockhound::filter::{self, FilterSession, FilterState};
use rockhound::identify;
use rockhound::kv::SqliteKv;
use rockhound::record::{PhysicalProperties, Record};

fn specimen(id: &str, name: &str, classification: &str, hardness: &str, luster: &str) -> Record {
    Record::new(id, name, format!("file:///rocks/{}.jpg", id))
        .unwrap()
        .with_classification(classification)
        .with_physical_properties(PhysicalProperties {
            hardness: Some(hardness.to_string()),
            luster: Some(luster.to_string()),
            ..Default::default()
        })
}

fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn test_save_remove_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rocks.db");

    let store = Collection::open(SqliteKv::open(&path).unwrap(), "rock_collection");
    for id in ["1", "2", "3"] {
        store.save(Record::new(id, format!("Rock {}", id), "file:///r.jpg").unwrap()).unwrap();
    }
    assert_eq!(ids(&store.list()), vec!["3", "2", "1"]);

    store.remove_by_id("2").unwrap();
    store.close().unwrap();

    let reopened = Collection::open(SqliteKv::open(&path).unwrap(), "rock_collection");
    assert_eq!(ids(&reopened.list()), vec!["3", "1"]);
    assert!(reopened.get_by_id("2").is_none());
}

#[test]
fn test_identification_saved_and_found_by_facets() {
    let store = Collection::open(SqliteKv::in_memory().unwrap(), "rock_collection");

    let reply = r#"Here you go: {"commonName": "Quartz", "classification": "Mineral",
        "physicalProperties": {"hardness": 7, "luster": "Vitreous"}, "description": "Clear crystal"}"#;
    let quartz = Record::from_identification(&identify::parse(reply), "file:///q.jpg", Some("found by creek"), None);
    let quartz_id = quartz.id.clone();

    store.save(specimen("g", "Granite", "Igneous", "6-7", "Dull, Vitreous")).unwrap();
    store.save(specimen("t", "Talc", "Mineral", "1", "Pearly, Greasy")).unwrap();
    store.save(quartz).unwrap();

    let records = store.list();
    assert_eq!(store.get_by_id(&quartz_id).unwrap().hardness(), Some("7"));

    let minerals = FilterState::new().with_classification("Mineral");
    assert_eq!(ids(&filter::apply(&records, &minerals)), vec![quartz_id.as_str(), "t"]);

    let hard_vitreous = FilterState::new().with_luster("vitreous").with_max_hardness(6.0);
    assert_eq!(ids(&filter::apply(&records, &hard_vitreous)), vec!["g"]);

    let by_notes = FilterState::new().with_search("CREEK");
    assert_eq!(ids(&filter::apply(&records, &by_notes)), vec![quartz_id.as_str()]);
}

#[test]
fn test_filter_session_over_collection() {
    let store = Collection::open(SqliteKv::in_memory().unwrap(), "rock_collection");
    store.save(specimen("b", "Basalt", "Igneous", "5.5-6.5", "Dull")).unwrap();
    store.save(specimen("s", "Sandstone", "Sedimentary", "6-7", "Dull")).unwrap();
    let records = store.list();

    let mut session = FilterSession::new();
    session.open().toggle_classification("Igneous");
    assert_eq!(session.apply_to(&records).len(), 2);

    session.apply();
    assert_eq!(ids(&session.apply_to(&records)), vec!["b"]);

    session.open().toggle_classification("Sedimentary");
    session.cancel();
    assert_eq!(ids(&session.apply_to(&records)), vec!["b"]);

    session.set_search("sand");
    session.reset();
    assert!(session.active().is_empty());
    assert_eq!(session.apply_to(&records).len(), 2);
}

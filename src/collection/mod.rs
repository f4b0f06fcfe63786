// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The user's rock collection
//!
//! The whole collection lives under a single key as one JSON array, newest
//! record first. Every mutation rewrites the full array, so two writers
//! interleaving a save can lose one of the writes.

use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::kv::KeyValueStore;
use crate::record::Record;
use crate::{Result, RockhoundError};

/// Durable CRUD over saved records
pub trait RecordStore {
    /// Insert a record at the head of the collection
    ///
    /// Ids are not checked for uniqueness.
    fn save(&self, record: Record) -> Result<()>;

    /// All records, newest first; empty if nothing can be read
    fn list(&self) -> Vec<Record>;

    /// First record with the given id
    fn get_by_id(&self, id: &str) -> Option<Record> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// Remove every record with the given id; absent ids are a no-op
    fn remove_by_id(&self, id: &str) -> Result<()>;

    /// Remove all records
    fn clear(&self) -> Result<()>;
}

/// Record store over a key-value substrate
pub struct Collection<K: KeyValueStore> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> Collection<K> {
    /// Open the collection stored under `key`
    pub fn open(kv: K, key: impl Into<String>) -> Self {
        let collection = Self { kv, key: key.into() };
        debug!("Opened collection '{}' ({} records)", collection.key, collection.list().len());
        collection
    }

    /// Flush the substrate and release the collection
    pub fn close(self) -> Result<()> {
        self.kv.flush().map_err(write_error)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    /// Write the collection to a pretty-printed JSON file
    pub fn export(&self, path: &Path) -> Result<usize> {
        let records = self.list();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json)?;
        info!("Exported {} records to {:?}", records.len(), path);
        Ok(records.len())
    }

    /// Read the stored array as raw entries
    ///
    /// A substrate failure is an error; a blob that is not a JSON array is
    /// logged and treated as an empty collection.
    fn load_entries(&self) -> Result<Vec<Value>> {
        let blob = match self.kv.get(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Ok(Vec::new()),
            Err(e) => {
                return Err(RockhoundError::Persistence(format!(
                    "failed to read collection '{}': {}",
                    self.key, e
                )))
            }
        };

        match serde_json::from_str(&blob) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("Collection '{}' could not be parsed, treating as empty: {}", self.key, e);
                Ok(Vec::new())
            }
        }
    }

    /// Entries that decode as records; the rest are skipped, not dropped
    fn load(&self) -> Result<Vec<Record>> {
        Ok(self
            .load_entries()?
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Record>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping unreadable record in '{}': {}", self.key, e);
                    None
                }
            })
            .collect())
    }

    /// Malformed entries are written back untouched
    fn store(&self, entries: &[Value]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        self.kv.set(&self.key, &json).map_err(write_error)
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

impl<K: KeyValueStore> RecordStore for Collection<K> {
    fn save(&self, record: Record) -> Result<()> {
        let mut entries = self.load_entries()?;
        debug!("Saving record {} ({})", record.id, record.name);
        entries.insert(0, serde_json::to_value(&record)?);
        self.store(&entries)
    }

    fn list(&self) -> Vec<Record> {
        self.load().unwrap_or_else(|e| {
            warn!("{}", e);
            Vec::new()
        })
    }

    fn remove_by_id(&self, id: &str) -> Result<()> {
        let entries = self.load_entries()?;
        let before = entries.len();
        let kept: Vec<Value> = entries.into_iter().filter(|e| entry_id(e) != Some(id)).collect();

        if kept.len() == before {
            debug!("No record with id {} to remove", id);
            return Ok(());
        }

        debug!("Removing {} record(s) with id {}", before - kept.len(), id);
        self.store(&kept)
    }

    fn clear(&self) -> Result<()> {
        self.kv.remove(&self.key).map_err(write_error)
    }
}

fn write_error(e: RockhoundError) -> RockhoundError {
    match e {
        RockhoundError::Persistence(_) => e,
        other => RockhoundError::Persistence(format!("failed to write collection: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{MemoryKv, SqliteKv};
    use std::sync::Arc;

    fn rock(id: &str, name: &str) -> Record {
        Record::new(id, name, format!("file:///rocks/{}.jpg", id)).unwrap()
    }

    fn ids<S: RecordStore>(store: &S) -> Vec<String> {
        store.list().into_iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_uninitialized_store_is_empty() {
        let collection = Collection::open(MemoryKv::new(), "rock_collection");
        assert!(collection.list().is_empty());
        assert!(collection.get_by_id("1").is_none());
    }

    #[test]
    fn test_save_puts_record_at_head() {
        let collection = Collection::open(MemoryKv::new(), "rock_collection");
        collection.save(rock("1", "Granite")).unwrap();
        let quartz = rock("2", "Quartz").with_notes("from the quarry");
        collection.save(quartz.clone()).unwrap();

        let records = collection.list();
        assert_eq!(records[0], quartz);
        assert_eq!(records.iter().filter(|r| r.id == "2").count(), 1);
        assert_eq!(collection.get_by_id("2"), Some(quartz));
    }

    #[test]
    fn test_save_remove_scenario() {
        let collection = Collection::open(SqliteKv::in_memory().unwrap(), "rock_collection");
        for id in ["1", "2", "3"] {
            collection.save(rock(id, "Basalt")).unwrap();
        }
        assert_eq!(ids(&collection), vec!["3", "2", "1"]);

        collection.remove_by_id("2").unwrap();
        assert_eq!(ids(&collection), vec!["3", "1"]);
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let kv = Arc::new(MemoryKv::new());
        let collection = Collection::open(kv.clone(), "rock_collection");
        collection.save(rock("1", "Shale")).unwrap();
        let before = kv.get("rock_collection").unwrap();

        collection.remove_by_id("42").unwrap();
        assert_eq!(kv.get("rock_collection").unwrap(), before);
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let collection = Collection::open(MemoryKv::new(), "rock_collection");
        collection.save(rock("1", "Granite")).unwrap();
        collection.save(rock("1", "Gneiss")).unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get_by_id("1").unwrap().name, "Gneiss");

        collection.remove_by_id("1").unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_corrupt_blob_lists_empty() {
        let kv = MemoryKv::new();
        kv.set("rock_collection", "{not an array").unwrap();
        let collection = Collection::open(kv, "rock_collection");
        assert!(collection.list().is_empty());
    }

    #[test]
    fn test_malformed_entry_skipped_and_kept_on_save() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(
            "rock_collection",
            r#"[{"id":"1","name":"Granite","imageUri":"a","properties":[],"date":"2024-05-31T12:00:00.000Z"},
                {"id":"2","name":"Basalt","imageUri":"b","properties":[]}]"#,
        ).unwrap();
        let collection = Collection::open(kv.clone(), "rock_collection");
        assert_eq!(ids(&collection), vec!["1"]);

        collection.save(rock("3", "Slate")).unwrap();
        assert_eq!(ids(&collection), vec!["3", "1"]);

        let stored: Vec<Value> = serde_json::from_str(&kv.get("rock_collection").unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2]["name"], "Basalt");

        collection.remove_by_id("2").unwrap();
        let stored: Vec<Value> = serde_json::from_str(&kv.get("rock_collection").unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_write_failure_is_persistence_error() {
        let kv = Arc::new(MemoryKv::new());
        let collection = Collection::open(kv.clone(), "rock_collection");
        collection.save(rock("1", "Marble")).unwrap();

        kv.fail_writes(true);
        let err = collection.save(rock("2", "Slate")).unwrap_err();
        assert!(matches!(err, RockhoundError::Persistence(_)));
        assert_eq!(ids(&collection), vec!["1"]);
    }

    #[test]
    fn test_clear_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let collection = Collection::open(MemoryKv::new(), "rock_collection");
        assert_eq!(collection.key(), "rock_collection");
        collection.save(rock("1", "Obsidian")).unwrap();

        let out = dir.path().join("export.json");
        assert_eq!(collection.export(&out).unwrap(), 1);
        let exported: Vec<Record> = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(exported[0].name, "Obsidian");

        collection.clear().unwrap();
        assert!(collection.is_empty());
        collection.close().unwrap();
    }
}

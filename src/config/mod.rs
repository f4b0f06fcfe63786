// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Rockhound

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// AI engine configuration
    #[serde(default)]
    pub ai_engine: EngineConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Collection storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Geological reference services
    #[serde(default)]
    pub geology: GeologyConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_vision_model")]
    pub vision: String,
    #[serde(default = "default_chat_model")]
    pub chat: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_identify_prompt")]
    pub identify: String,
    #[serde(default = "default_chat_persona")]
    pub chat_persona: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Key under which the whole collection is stored as one blob
    #[serde(default = "default_collection_key")]
    pub collection_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeologyConfig {
    #[serde(default = "default_macrostrat_url")]
    pub macrostrat_url: String,
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geology_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

// Default value functions
fn default_timeout() -> u64 { 120 }
fn default_geology_timeout() -> u64 { 15 }
fn default_retries() -> u32 { 2 }
fn default_url() -> String { "http://localhost:11434".to_string() }
fn default_vision_model() -> String { "llava".to_string() }
fn default_chat_model() -> String { "llama3.2:3b".to_string() }
fn default_db_path() -> String { "rockhound.db".to_string() }
fn default_collection_key() -> String { "rock_collection".to_string() }
fn default_macrostrat_url() -> String { "https://macrostrat.org/api/v2".to_string() }
fn default_geocode_url() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_user_agent() -> String { format!("rockhound/{}", env!("CARGO_PKG_VERSION")) }

fn default_identify_prompt() -> String {
    "Analyze these images ({count} views provided) and identify the rock or mineral shown. \
     Provide the most accurate identification based on all views. \
     Format your response as a JSON object with the fields: \
     commonName, scientificName, confidenceLevel (number 0-100), \
     classification (igneous, sedimentary, metamorphic, or the mineral family), \
     physicalProperties {hardness (Mohs), luster, colorRange, streakColor, \
     cleavageFracture, crystalStructure}, formationProcess, commonLocations, \
     collectingValue, funFacts, description. \
     Only return the JSON object without any additional text.".to_string()
}

fn default_chat_persona() -> String {
    "You are Dr. Rock, a friendly, enthusiastic, and highly knowledgeable geologist. \
     Your goal is to educate and engage users about rocks, minerals, and geology in an \
     accessible and exciting way. Explain any geological terms you use. Keep responses \
     concise and conversational. If a question is outside geology, politely say so. \
     Do not refer to yourself as an AI or language model.".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_engine: EngineConfig::default(),
            prompts: PromptConfig::default(),
            storage: StorageConfig::default(),
            geology: GeologyConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            models: ModelConfig::default(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vision: default_vision_model(),
            chat: default_chat_model(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            identify: default_identify_prompt(),
            chat_persona: default_chat_persona(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            collection_key: default_collection_key(),
        }
    }
}

impl Default for GeologyConfig {
    fn default() -> Self {
        Self {
            macrostrat_url: default_macrostrat_url(),
            geocode_url: default_geocode_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geology_timeout(),
            retries: default_retries(),
        }
    }
}

impl PromptConfig {
    /// Identification prompt with the number of views filled in
    pub fn identify_for(&self, views: usize) -> String {
        self.identify.replace("{count}", &views.to_string())
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::RockhoundError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.storage.collection_key, "rock_collection");
        assert_eq!(config.ai_engine.retries, 2);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rockhound.json");
        std::fs::write(
            &path,
            r#"{"ai_engine": {"url": "http://gpu:11434", "models": {"vision": "moondream"}}}"#,
        ).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.ai_engine.models.vision, "moondream");
        assert_eq!(config.ai_engine.models.chat, "llama3.2:3b");
        assert_eq!(config.geology.timeout_secs, 15);
        assert_eq!(config.storage.path, "rockhound.db");
    }

    #[test]
    fn test_engine_url_only_fills_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rockhound.json");
        std::fs::write(&path, r#"{"ai_engine": {"url": "http://gpu:11434"}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.ai_engine.url, "http://gpu:11434");
        assert_eq!(config.ai_engine.models.vision, "llava");
        assert_eq!(config.ai_engine.models.chat, "llama3.2:3b");

        std::fs::write(&path, r#"{"ai_engine": {"models": {"chat": "mistral"}}}"#).unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.ai_engine.url, "http://localhost:11434");
        assert_eq!(config.ai_engine.models.vision, "llava");

        std::fs::write(&path, "{}").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.ai_engine.timeout_secs, 120);
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(crate::RockhoundError::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let mut config = AppConfig::default();
        config.storage.collection_key = "my_rocks".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.storage.collection_key, "my_rocks");
    }

    #[test]
    fn test_identify_prompt_counts_views() {
        let prompts = PromptConfig::default();
        assert!(prompts.identify_for(3).contains("(3 views provided)"));
    }
}

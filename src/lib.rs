// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Rockhound: Local AI Rock Identifier & Collection Manager
//!
//! Identifies rocks from photos with a local vision model, keeps a
//! searchable collection of saved finds, and suggests the rock types to
//! look for at a location from geological map data.

pub mod chat;
pub mod collection;
pub mod config;
pub mod error;
pub mod filter;
pub mod geology;
pub mod identify;
pub mod kv;
pub mod ollama;
pub mod record;
pub mod retry;

pub use config::AppConfig;
pub use error::{Result, RockhoundError};

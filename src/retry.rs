// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Bounded retry with exponential backoff for remote calls

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::{Result, RockhoundError};

/// Upper bound on retries regardless of configuration (three attempts total)
pub const MAX_RETRIES: u32 = 2;

/// Run `op`, retrying network failures after 1s, 2s, ...
///
/// Only errors for which [`RockhoundError::is_network`] holds are retried;
/// anything else is returned immediately.
pub async fn with_retry<T, F, Fut>(label: &str, retries: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let retries = retries.min(MAX_RETRIES);
    let mut last_error = None;

    for attempt in 0..=retries {
        if attempt > 0 {
            let delay = Duration::from_secs(2u64.pow(attempt - 1));
            warn!("Retrying {} in {:?} (attempt {})", label, delay, attempt + 1);
            tokio::time::sleep(delay).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_network() => last_error = Some(e),
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        RockhoundError::ServiceUnavailable(format!("{} failed", label))
    }))
}

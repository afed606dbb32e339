//! Persistence bridge
//!
//! Boundary to an external overlay backend. The core treats every call as
//! fallible: callers wrap bridge calls in bounded retry with exponential
//! backoff and keep in-memory state authoritative when the backend stays
//! unreachable.

use crate::artifacts::version::Metadata;
use async_trait::async_trait;
use derive_new::new;
use fake::rand;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default maximum number of retries for transient errors
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff (in milliseconds)
const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Maximum delay cap (in milliseconds)
const DEFAULT_MAX_DELAY_MS: u64 = 30000;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("overlay {0} not found on the backend")]
    UnknownOverlay(String),
}

impl BridgeError {
    /// Whether a retry can reasonably succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Transport(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, new)]
pub struct SaveOverlayRequest {
    pub file_path: String,
    pub original_code: String,
    pub modified_code: String,
    pub metadata: Metadata,
    pub temporary: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveOverlayResponse {
    pub customization_id: Option<String>,
    pub snapshot_id: Option<String>,
    pub overlay_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedOverlay {
    pub file_path: String,
    pub original_code: String,
    pub modified_code: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BridgeStats {
    pub overlays: u64,
    pub snapshots: u64,
    pub finalized: u64,
}

#[async_trait]
pub trait PersistenceBridge: Send + Sync {
    /// Persists a preview overlay on the backend.
    async fn save_overlay(
        &self,
        request: SaveOverlayRequest,
    ) -> Result<SaveOverlayResponse, BridgeError>;

    /// Loads a previously saved overlay for the path, if the backend has one.
    async fn load_overlay(
        &self,
        file_path: &str,
        temporary: bool,
    ) -> Result<Option<LoadedOverlay>, BridgeError>;

    /// Replaces a previously saved overlay.
    async fn update_overlay(
        &self,
        request: SaveOverlayRequest,
    ) -> Result<SaveOverlayResponse, BridgeError>;

    /// Removes an overlay from the backend, archiving it when asked.
    async fn remove_overlay(&self, overlay_id: &str, archive: bool) -> Result<(), BridgeError>;

    /// Marks an overlay as promoted into a durable version.
    async fn finalize_overlay(&self, overlay_id: &str) -> Result<(), BridgeError>;

    /// Backend-side tallies, optionally scoped to one user.
    async fn get_stats(&self, user: Option<&str>) -> Result<BridgeStats, BridgeError>;
}

/// Backend that accepts everything and stores nothing
///
/// Keeps the core fully functional when no backend is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBridge;

#[async_trait]
impl PersistenceBridge for NoopBridge {
    async fn save_overlay(
        &self,
        _request: SaveOverlayRequest,
    ) -> Result<SaveOverlayResponse, BridgeError> {
        Ok(SaveOverlayResponse::default())
    }

    async fn load_overlay(
        &self,
        _file_path: &str,
        _temporary: bool,
    ) -> Result<Option<LoadedOverlay>, BridgeError> {
        Ok(None)
    }

    async fn update_overlay(
        &self,
        _request: SaveOverlayRequest,
    ) -> Result<SaveOverlayResponse, BridgeError> {
        Ok(SaveOverlayResponse::default())
    }

    async fn remove_overlay(&self, _overlay_id: &str, _archive: bool) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn finalize_overlay(&self, _overlay_id: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn get_stats(&self, _user: Option<&str>) -> Result<BridgeStats, BridgeError> {
        Ok(BridgeStats::default())
    }
}

/// Bounded retry with exponential backoff and jitter
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_retries(&mut self, max_retries: u32) -> &mut Self {
        self.max_retries = max_retries;
        self
    }

    pub fn set_base_delay_ms(&mut self, delay_ms: u64) -> &mut Self {
        self.base_delay_ms = delay_ms;
        self
    }

    pub fn set_max_delay_ms(&mut self, delay_ms: u64) -> &mut Self {
        self.max_delay_ms = delay_ms;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Calculates the delay for a given retry attempt with jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.base_delay_ms.saturating_mul(1u64 << attempt.min(63));
        let capped_delay = delay_ms.min(self.max_delay_ms);
        let jitter = (capped_delay as f64 * 0.25 * rand_jitter()) as u64;
        Duration::from_millis(capped_delay + jitter)
    }

    /// Runs a bridge call under the policy
    ///
    /// Transient errors are retried with backoff until the attempts run
    /// out; anything else fails on the first try. The last error is
    /// returned when no attempt succeeds.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, BridgeError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let mut last_error = BridgeError::Transport("no attempts made".to_string());

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let retryable = error.is_transient();
                    last_error = error;

                    if !retryable || attempt >= self.max_retries {
                        break;
                    }

                    let delay = self.backoff_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %last_error,
                        "bridge call failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(last_error)
    }
}

/// Pseudo-random jitter factor between 0.0 and 1.0
fn rand_jitter() -> f64 {
    rand::random::<f64>()
}

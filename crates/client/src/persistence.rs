//! Background persistence of preference saves.
//!
//! [`SaveQueue`] is the [`PreferenceSink`] used by live sessions. Dispatch
//! only enqueues; a single worker task performs the saves one at a time, in
//! dispatch order, so an older document can never land after a newer one.
//! Before each save the worker folds everything already queued for the same
//! user into the latest version, and it never sends a version at or below
//! one it has already stored.
//!
//! The outcome of the newest dispatched save is published as a
//! [`SyncStatus`]. A save that still fails after its retries leaves the
//! status at [`SyncStatus::Failed`]; in-memory preferences are not rolled
//! back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use nutribase_core::{Email, PreferenceSink, SaveRequest};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;

/// Retry policy for preference saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveConfig {
    /// Attempts after the first one.
    pub retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff: Duration,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Outcome of the most recently dispatched save.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Nothing dispatched yet.
    #[default]
    Idle,
    /// Waiting to be stored.
    Pending { version: u64 },
    /// Stored by the backend.
    Synced { version: u64, at: DateTime<Utc> },
    /// Gave up after retries; the backend may hold an older document.
    Failed { version: u64, message: String },
}

impl SyncStatus {
    /// Version this status is about, if any.
    #[must_use]
    pub const fn version(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Pending { version }
            | Self::Synced { version, .. }
            | Self::Failed { version, .. } => Some(*version),
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Serialized, version-guarded writer of preference documents.
#[derive(Debug)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<SaveRequest>,
    status: Arc<watch::Sender<SyncStatus>>,
    worker: JoinHandle<()>,
}

impl SaveQueue {
    /// Start the worker task on the current tokio runtime.
    #[must_use]
    pub fn spawn(api: ApiClient, config: SaveConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(watch::Sender::new(SyncStatus::Idle));
        let worker = tokio::spawn(run_worker(api, config, rx, Arc::clone(&status)));
        Self {
            tx,
            status,
            worker,
        }
    }

    /// Current sync status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Wait until the newest dispatched save has succeeded or given up.
    pub async fn settled(&self) -> SyncStatus {
        let mut rx = self.status.subscribe();
        // the sender lives in `self`, so the channel cannot close here
        rx.wait_for(|status| !status.is_pending())
            .await
            .map_or_else(|_| self.status(), |status| status.clone())
    }

    /// Record that a failed save was resolved by reloading `version`'s
    /// stored state. Any other status is left alone.
    pub(crate) fn mark_reconciled(&self, version: u64) {
        if self.status().is_failed() {
            publish(&self.status, SyncStatus::Synced {
                version,
                at: Utc::now(),
            });
        }
    }

    /// Stop accepting saves, let the worker finish what is queued, and
    /// return the final status.
    pub async fn shutdown(self) -> SyncStatus {
        let Self { tx, status, worker } = self;
        drop(tx);
        if let Err(e) = worker.await {
            error!(error = %e, "Preference save worker panicked");
        }
        status.borrow().clone()
    }
}

impl PreferenceSink for SaveQueue {
    fn dispatch(&self, request: SaveRequest) {
        let version = request.version;
        // announce before sending so the worker's result always lands last
        publish(&self.status, SyncStatus::Pending { version });
        if self.tx.send(request).is_err() {
            error!(version, "Preference save queue is closed, dropping save");
            publish(&self.status, SyncStatus::Failed {
                version,
                message: "save queue closed".to_string(),
            });
        }
    }
}

/// Replace the status unless it already describes a newer version.
fn publish(status: &watch::Sender<SyncStatus>, next: SyncStatus) {
    status.send_if_modified(|current| {
        let newer_known = match (current.version(), next.version()) {
            (Some(have), Some(incoming)) => have > incoming,
            _ => false,
        };
        if newer_known || *current == next {
            return false;
        }
        *current = next;
        true
    });
}

async fn run_worker(
    api: ApiClient,
    config: SaveConfig,
    mut rx: mpsc::UnboundedReceiver<SaveRequest>,
    status: Arc<watch::Sender<SyncStatus>>,
) {
    let mut stored: HashMap<Email, u64> = HashMap::new();

    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        for request in coalesce(batch) {
            let last_stored = stored.get(&request.email).copied().unwrap_or(0);
            if request.version <= last_stored {
                debug!(
                    version = request.version,
                    last_stored, "Skipping stale preference save"
                );
                continue;
            }

            match save_with_retry(&api, &config, &request).await {
                Ok(()) => {
                    stored.insert(request.email.clone(), request.version);
                    info!(
                        email = %request.email,
                        version = request.version,
                        "Preferences saved"
                    );
                    publish(&status, SyncStatus::Synced {
                        version: request.version,
                        at: Utc::now(),
                    });
                }
                Err(e) => {
                    error!(
                        email = %request.email,
                        version = request.version,
                        error = %e,
                        "Failed to save preferences"
                    );
                    publish(&status, SyncStatus::Failed {
                        version: request.version,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    debug!("Preference save queue closed");
}

/// Keep the newest request per user, in order of each user's first request.
fn coalesce(batch: Vec<SaveRequest>) -> Vec<SaveRequest> {
    let mut latest: Vec<SaveRequest> = Vec::with_capacity(batch.len());
    for request in batch {
        match latest.iter_mut().find(|r| r.email == request.email) {
            Some(existing) if existing.version < request.version => *existing = request,
            Some(_) => {}
            None => latest.push(request),
        }
    }
    latest
}

async fn save_with_retry(
    api: &ApiClient,
    config: &SaveConfig,
    request: &SaveRequest,
) -> Result<(), ApiError> {
    let mut attempt: u32 = 0;
    loop {
        match api
            .save_preferences(&request.email, &request.preferences)
            .await
        {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() && attempt < config.retries => {
                let delay = retry_delay(config, attempt, &e);
                warn!(
                    version = request.version,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Preference save failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn retry_delay(config: &SaveConfig, attempt: u32, error: &ApiError) -> Duration {
    let backoff = config
        .backoff
        .saturating_mul(2_u32.saturating_pow(attempt));
    match error {
        ApiError::RateLimited(secs) => backoff.max(Duration::from_secs(*secs)),
        _ => backoff,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use nutribase_core::Preferences;

    use super::*;

    fn request(email: &str, version: u64) -> SaveRequest {
        SaveRequest {
            email: Email::parse(email).unwrap(),
            version,
            preferences: Preferences::default(),
        }
    }

    #[test]
    fn test_coalesce_keeps_latest_per_user() {
        let out = coalesce(vec![
            request("a@example.com", 1),
            request("b@example.com", 1),
            request("a@example.com", 3),
            request("a@example.com", 2),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].email.as_str(), "a@example.com");
        assert_eq!(out[0].version, 3);
        assert_eq!(out[1].email.as_str(), "b@example.com");
    }

    #[test]
    fn test_publish_ignores_older_versions() {
        let status = watch::Sender::new(SyncStatus::Idle);
        publish(&status, SyncStatus::Pending { version: 2 });
        publish(&status, SyncStatus::Failed {
            version: 1,
            message: "late".to_string(),
        });
        assert_eq!(*status.borrow(), SyncStatus::Pending { version: 2 });

        publish(&status, SyncStatus::Failed {
            version: 2,
            message: "boom".to_string(),
        });
        assert!(status.borrow().is_failed());
    }

    #[tokio::test]
    async fn test_mark_reconciled_clears_failure_only() {
        let api = ApiClient::new(&crate::config::ApiConfig::new("http://127.0.0.1:9").unwrap())
            .unwrap();
        let queue = SaveQueue::spawn(api, SaveConfig::default());

        queue.mark_reconciled(0);
        assert_eq!(queue.status(), SyncStatus::Idle);

        publish(&queue.status, SyncStatus::Failed {
            version: 3,
            message: "boom".to_string(),
        });
        queue.mark_reconciled(3);
        assert!(matches!(queue.status(), SyncStatus::Synced { version: 3, .. }));
    }

    #[test]
    fn test_retry_delay_doubles_and_honours_rate_limit() {
        let config = SaveConfig {
            retries: 5,
            backoff: Duration::from_millis(100),
        };
        let err = ApiError::Api {
            status: 503,
            message: String::new(),
        };
        assert_eq!(retry_delay(&config, 0, &err), Duration::from_millis(100));
        assert_eq!(retry_delay(&config, 2, &err), Duration::from_millis(400));
        assert_eq!(
            retry_delay(&config, 0, &ApiError::RateLimited(2)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_status_version() {
        assert_eq!(SyncStatus::Idle.version(), None);
        assert_eq!(SyncStatus::Pending { version: 4 }.version(), Some(4));
        assert!(SyncStatus::Pending { version: 4 }.is_pending());
    }
}

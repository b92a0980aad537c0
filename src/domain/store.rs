//! Strategy Store: CRUD, lifecycle transitions, metric attachment and
//! import/export over a [`StoragePort`].
//!
//! Every mutation reads the whole collection, changes it in memory and writes
//! the whole collection back. The store assumes a single writer; two
//! processes sharing one storage location race, and whichever write completes
//! last wins.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::error::KumoError;
use crate::domain::metrics::{BacktestMetrics, BacktestResult};
use crate::domain::strategy::Strategy;
use crate::domain::stored_strategy::{StoredStrategy, StrategyDraft, StrategyPatch, StrategyStatus};
use crate::ports::clock_port::{Clock, SystemClock};
use crate::ports::storage_port::StoragePort;

/// Appended to the name of a duplicated strategy.
pub const DUPLICATE_SUFFIX: &str = " (Copia)";

pub struct StrategyStore<S: StoragePort> {
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: StoragePort> StrategyStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Box::new(SystemClock))
    }

    pub fn with_clock(storage: S, clock: Box<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Strict read of the persisted collection.
    pub fn load(&self) -> Result<Vec<StoredStrategy>, KumoError> {
        match self.storage.read_all()? {
            None => Ok(Vec::new()),
            Some(blob) => serde_json::from_str(&blob).map_err(|e| KumoError::StorageRead {
                reason: e.to_string(),
            }),
        }
    }

    /// All strategies in storage order. Unreadable storage is logged and
    /// treated as empty.
    pub fn get_all(&self) -> Vec<StoredStrategy> {
        match self.load() {
            Ok(strategies) => {
                debug!(count = strategies.len(), "loaded strategies");
                strategies
            }
            Err(e) => {
                warn!(error = %e, "strategy storage unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    pub fn get_by_id(&self, id: u64) -> Option<StoredStrategy> {
        self.get_all().into_iter().find(|s| s.id == id)
    }

    pub fn find_by_status(&self, status: StrategyStatus) -> Vec<StoredStrategy> {
        self.get_all()
            .into_iter()
            .filter(|s| s.status == status)
            .collect()
    }

    pub fn save(&self, draft: StrategyDraft) -> Result<StoredStrategy, KumoError> {
        let mut strategies = self.get_all();
        let now = self.clock.now();
        let id = next_id(&strategies, now)?;

        let record = StoredStrategy::from_draft(draft, id, now);
        strategies.push(record.clone());
        self.persist(&strategies)?;

        info!(id, name = %record.name(), status = %record.status, "saved strategy");
        Ok(record)
    }

    /// Shallow-merge `patch` over the record. `id` and `createdAt` are kept;
    /// `updatedAt` moves strictly forward.
    pub fn update(&self, id: u64, patch: StrategyPatch) -> Result<StoredStrategy, KumoError> {
        let mut strategies = self.get_all();
        let record = strategies
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(KumoError::NotFound { id })?;

        let previous = record.updated_at;
        record.apply(patch);
        record.updated_at = self.advance_from(previous);
        let updated = record.clone();

        self.persist(&strategies)?;
        info!(id, updated_at = %updated.updated_at, "updated strategy");
        Ok(updated)
    }

    pub fn remove(&self, id: u64) -> Result<bool, KumoError> {
        let strategies = self.get_all();
        let before = strategies.len();
        let remaining: Vec<StoredStrategy> = strategies.into_iter().filter(|s| s.id != id).collect();

        if remaining.len() == before {
            debug!(id, "remove: no such strategy");
            return Ok(false);
        }
        self.persist(&remaining)?;
        info!(id, "removed strategy");
        Ok(true)
    }

    /// Copy a strategy under a new identity. The copy starts in `testing` with
    /// no metrics.
    pub fn duplicate(&self, id: u64) -> Result<StoredStrategy, KumoError> {
        let source = self.get_by_id(id).ok_or(KumoError::NotFound { id })?;
        let mut strategy = source.strategy;
        strategy.name.push_str(DUPLICATE_SUFFIX);

        let copy = self.save(StrategyDraft::testing(strategy))?;
        info!(source = id, id = copy.id, "duplicated strategy");
        Ok(copy)
    }

    pub fn set_status(&self, id: u64, status: StrategyStatus) -> Result<StoredStrategy, KumoError> {
        self.update(id, StrategyPatch::status(status))
    }

    pub fn attach_metrics(
        &self,
        id: u64,
        metrics: BacktestMetrics,
    ) -> Result<StoredStrategy, KumoError> {
        self.update(id, StrategyPatch::metrics(Some(metrics)))
    }

    /// Store the metric snapshot of a backtest run as-is.
    pub fn attach_result(&self, id: u64, result: &BacktestResult) -> Result<StoredStrategy, KumoError> {
        if !result.success {
            warn!(
                id,
                error = result.error.as_deref().unwrap_or("unknown"),
                "attaching metrics from an unsuccessful backtest"
            );
        }
        self.attach_metrics(id, result.metrics.snapshot())
    }

    /// Pretty-printed JSON of one record.
    pub fn export_to_text(&self, id: u64) -> Result<String, KumoError> {
        let record = self.get_by_id(id).ok_or(KumoError::NotFound { id })?;
        serde_json::to_string_pretty(&record).map_err(|e| KumoError::Export {
            reason: e.to_string(),
        })
    }

    /// Re-create a strategy from an exported document. Identity, status and
    /// metrics in the payload are discarded; the result is always `testing`.
    /// A malformed payload leaves the store untouched.
    pub fn import_from_text(&self, text: &str) -> Result<StoredStrategy, KumoError> {
        let strategy: Strategy = serde_json::from_str(text).map_err(|e| {
            warn!(error = %e, "rejected strategy import");
            KumoError::Import {
                reason: e.to_string(),
            }
        })?;
        let record = self.save(StrategyDraft::testing(strategy))?;
        info!(id = record.id, "imported strategy");
        Ok(record)
    }

    pub fn clear(&self) -> Result<(), KumoError> {
        self.storage.clear()?;
        info!("cleared strategy storage");
        Ok(())
    }

    fn persist(&self, strategies: &[StoredStrategy]) -> Result<(), KumoError> {
        let blob = serde_json::to_string(strategies).map_err(|e| KumoError::StorageWrite {
            reason: e.to_string(),
        })?;
        self.storage.write_all(&blob)
    }

    fn advance_from(&self, previous: DateTime<Utc>) -> DateTime<Utc> {
        let now = self.clock.now();
        if now > previous {
            now
        } else {
            previous + chrono::Duration::milliseconds(1)
        }
    }
}

/// Millisecond wall-clock id, bumped past every existing id so rapid saves
/// within one tick stay unique.
fn next_id(existing: &[StoredStrategy], now: DateTime<Utc>) -> Result<u64, KumoError> {
    let clock_id = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let after_max = match existing.iter().map(|s| s.id).max() {
        None => 0,
        Some(max) => max.checked_add(1).ok_or_else(|| KumoError::StorageWrite {
            reason: format!("strategy id space exhausted after {max}"),
        })?,
    };
    Ok(clock_id.max(after_max))
}

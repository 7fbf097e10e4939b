//! Record-store seam exposed to evaluated code.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read query failed.
    #[error("query failed: {reason}")]
    Query {
        /// Human-readable failure description.
        reason: String,
    },

    /// A write statement failed.
    #[error("write failed: {reason}")]
    Write {
        /// Human-readable failure description.
        reason: String,
    },
}

/// Connection seam to the relational store holding historical records.
///
/// The sandbox hands evaluated code a handle that only calls [`query`];
/// "read-only" is a convention of that handle, not a property the store
/// enforces. Tools that persist data call [`execute`] directly.
///
/// [`query`]: RecordStore::query
/// [`execute`]: RecordStore::execute
pub trait RecordStore: Send + Sync {
    /// Runs a read query, returning rows as a JSON array.
    fn query(&self, sql: &str) -> StoreResult<Value>;

    /// Runs a write statement, returning the affected-row count.
    fn execute(&self, sql: &str) -> StoreResult<usize>;
}

/// Serializes writes behind one shared lock.
///
/// The storage engine underneath allows a single concurrent writer, so every
/// [`execute`](RecordStore::execute) call takes the gate; reads pass through
/// unlocked.
pub struct SingleWriterStore<S> {
    inner: S,
    write_gate: Mutex<()>,
}

impl<S: RecordStore> SingleWriterStore<S> {
    /// Wraps a store behind the single-writer gate.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            write_gate: Mutex::new(()),
        }
    }
}

impl<S: RecordStore> RecordStore for SingleWriterStore<S> {
    fn query(&self, sql: &str) -> StoreResult<Value> {
        self.inner.query(sql)
    }

    fn execute(&self, sql: &str) -> StoreResult<usize> {
        let _gate = self.write_gate.lock().map_err(|_| StoreError::Write {
            reason: "writer gate poisoned".into(),
        })?;
        debug!("serialized write transaction");
        self.inner.execute(sql)
    }
}

/// In-memory store with canned query results, for demos and tests.
#[derive(Default)]
pub struct MemoryStore {
    canned: RwLock<HashMap<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store; unknown queries return an empty row set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rows returned for an exact query string.
    #[must_use]
    pub fn with_result(self, query: impl Into<String>, rows: Value) -> Self {
        self.canned
            .write()
            .expect("memory store poisoned")
            .insert(query.into(), rows);
        self
    }

    /// Number of write statements executed so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl RecordStore for MemoryStore {
    fn query(&self, sql: &str) -> StoreResult<Value> {
        let canned = self.canned.read().map_err(|_| StoreError::Query {
            reason: "memory store poisoned".into(),
        })?;
        Ok(canned.get(sql).cloned().unwrap_or_else(|| json!([])))
    }

    fn execute(&self, _sql: &str) -> StoreResult<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }
}

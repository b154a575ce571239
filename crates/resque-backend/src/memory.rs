//! In-process [`QueueBackend`] with Redis-like semantics.
//!
//! Holds strings, lists and sets keyed by fully-qualified name. Reads against
//! a key of the wrong kind fail with [`BackendError::WrongType`], and the
//! whole store can be taken offline (or set to fail after a number of reads)
//! to exercise error paths.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::trace;

use crate::backend::{parse_number, QueueBackend};
use crate::error::{BackendError, BackendResult};

#[derive(Debug, Clone)]
enum Value {
    String(String),
    List(Vec<String>),
    Set(BTreeSet<String>),
}

/// In-memory Resque backend.
#[derive(Debug)]
pub struct MemoryBackend {
    data: RwLock<HashMap<String, Value>>,
    offline: AtomicBool,
    /// Reads remaining before every read fails; `usize::MAX` disables.
    reads_left: AtomicUsize,
    reads: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
            reads_left: AtomicUsize::new(usize::MAX),
            reads: AtomicUsize::new(0),
        }
    }

    /// Store a string value (`SET`).
    pub fn set(&self, key: &str, value: impl Into<String>) -> &Self {
        self.write(key, Value::String(value.into()));
        self
    }

    /// Append items to a list, creating it if needed (`RPUSH`).
    pub fn push(&self, key: &str, items: &[&str]) -> &Self {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        match data.get_mut(key) {
            Some(Value::List(list)) => list.extend(items.iter().map(|s| s.to_string())),
            _ => {
                data.insert(
                    key.to_string(),
                    Value::List(items.iter().map(|s| s.to_string()).collect()),
                );
            }
        }
        self
    }

    /// Add members to a set, creating it if needed (`SADD`).
    pub fn sadd(&self, key: &str, members: &[&str]) -> &Self {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        match data.get_mut(key) {
            Some(Value::Set(set)) => set.extend(members.iter().map(|s| s.to_string())),
            _ => {
                data.insert(
                    key.to_string(),
                    Value::Set(members.iter().map(|s| s.to_string()).collect()),
                );
            }
        }
        self
    }

    /// Remove a key of any kind (`DEL`).
    pub fn del(&self, key: &str) -> &Self {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        self
    }

    /// Make every read fail as if the server were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Let `n` more reads succeed, then fail every read after that.
    pub fn fail_after(&self, n: usize) {
        self.reads_left.store(n, Ordering::SeqCst);
    }

    /// Total reads served or attempted so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn write(&self, key: &str, value: Value) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    /// Account for one read and look up `key`.
    fn read(&self, op: &str, key: &str) -> BackendResult<Option<Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        trace!(op, key, "memory backend read");

        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("connection refused".to_string()));
        }
        let budget = self
            .reads_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                usize::MAX => Some(n),
                0 => None,
                n => Some(n - 1),
            });
        if budget.is_err() {
            return Err(BackendError::Unavailable(format!("{op} {key}: read budget exhausted")));
        }

        Ok(self
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueBackend for MemoryBackend {
    async fn get_f64(&self, key: &str) -> BackendResult<f64> {
        match self.read("GET", key)? {
            Some(Value::String(s)) => parse_number(key, Some(s)),
            Some(_) => Err(BackendError::WrongType(key.to_string())),
            None => parse_number(key, None),
        }
    }

    async fn smembers(&self, key: &str) -> BackendResult<Vec<String>> {
        match self.read("SMEMBERS", key)? {
            Some(Value::Set(set)) => Ok(set.into_iter().collect()),
            Some(_) => Err(BackendError::WrongType(key.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn llen(&self, key: &str) -> BackendResult<u64> {
        match self.read("LLEN", key)? {
            Some(Value::List(list)) => Ok(list.len() as u64),
            Some(_) => Err(BackendError::WrongType(key.to_string())),
            None => Ok(0),
        }
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        Ok(self.read("EXISTS", key)?.is_some())
    }
}

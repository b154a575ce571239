//! The read surface the collector needs from a Resque backend.

use std::future::Future;

use crate::error::BackendResult;

/// Primitive, read-only queries against a Resque backend.
///
/// Keys passed in are fully qualified (already namespaced). Implementations
/// follow Redis semantics for absent keys: `smembers` yields an empty set,
/// `llen` yields 0, `exists` yields false, and `get_f64` fails with
/// [`BackendError::Nil`](crate::BackendError::Nil).
pub trait QueueBackend: Send + Sync + 'static {
    /// `GET key`, parsed as a float.
    fn get_f64(&self, key: &str) -> impl Future<Output = BackendResult<f64>> + Send;

    /// `SMEMBERS key`, in the order the backend enumerates them.
    fn smembers(&self, key: &str) -> impl Future<Output = BackendResult<Vec<String>>> + Send;

    /// `LLEN key`.
    fn llen(&self, key: &str) -> impl Future<Output = BackendResult<u64>> + Send;

    /// `EXISTS key`.
    fn exists(&self, key: &str) -> impl Future<Output = BackendResult<bool>> + Send;
}

/// Parse a GET reply the way Resque's stat counters are stored.
pub(crate) fn parse_number(key: &str, raw: Option<String>) -> BackendResult<f64> {
    let value = raw.ok_or_else(|| crate::BackendError::Nil(key.to_string()))?;
    value
        .parse::<f64>()
        .map_err(|_| crate::BackendError::NotANumber {
            key: key.to_string(),
            value,
        })
}

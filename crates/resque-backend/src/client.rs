//! Redis-backed [`QueueBackend`].
//!
//! The client is built from a [`ConnectionTarget`] without touching the
//! network. The first read opens a multiplexed connection which is then
//! shared by every scrape; a transport failure drops it so the next read
//! reconnects. Each opened connection gets a generation number, and a failure
//! only drops the connection of the generation it happened on.

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, FromRedisValue};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::backend::{parse_number, QueueBackend};
use crate::error::{BackendError, BackendResult, ConfigError};
use crate::target::ConnectionTarget;

/// Cached connection plus the generation it was opened as.
#[derive(Debug)]
struct ConnectionSlot<C> {
    current: Option<C>,
    generation: u64,
}

impl<C: Clone> ConnectionSlot<C> {
    fn new() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }

    fn get(&self) -> Option<(u64, C)> {
        self.current.as_ref().map(|c| (self.generation, c.clone()))
    }

    /// Store a freshly opened connection and return its generation.
    fn install(&mut self, conn: C) -> u64 {
        self.generation += 1;
        self.current = Some(conn);
        self.generation
    }

    /// Drop the cached connection if it is still `generation`.
    fn clear(&mut self, generation: u64) -> bool {
        if self.generation == generation && self.current.is_some() {
            self.current = None;
            true
        } else {
            false
        }
    }
}

/// Lazily-connecting Redis client.
pub struct RedisBackend {
    client: redis::Client,
    target: ConnectionTarget,
    conn: Mutex<ConnectionSlot<MultiplexedConnection>>,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("target", &self.target)
            .finish()
    }
}

impl RedisBackend {
    /// Parse `url` and build a client. Performs no I/O.
    pub fn open(url: &str) -> Result<Self, ConfigError> {
        Self::from_target(ConnectionTarget::parse(url)?)
    }

    pub fn from_target(target: ConnectionTarget) -> Result<Self, ConfigError> {
        let client = redis::Client::open(target.connection_info()?)
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        debug!(target = %target, "redis client configured");
        Ok(Self {
            client,
            target,
            conn: Mutex::new(ConnectionSlot::new()),
        })
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Return the shared connection and its generation, opening it on
    /// first use.
    async fn connection(&self) -> BackendResult<(u64, MultiplexedConnection)> {
        let mut slot = self.conn.lock().await;
        if let Some(cached) = slot.get() {
            return Ok(cached);
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        let generation = slot.install(conn.clone());
        debug!(target = %self.target, generation, "connected to redis");
        Ok((generation, conn))
    }

    /// Forget the connection a transport failure happened on.
    async fn reset(&self, generation: u64, err: &BackendError) {
        if err.is_connection_error() && self.conn.lock().await.clear(generation) {
            warn!(
                target = %self.target,
                generation,
                error = %err,
                "dropping redis connection"
            );
        }
    }

    async fn query<T, F, Fut>(&self, op: F) -> BackendResult<T>
    where
        T: FromRedisValue,
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: std::future::Future<Output = redis::RedisResult<T>>,
    {
        let (generation, conn) = self.connection().await?;
        let result = op(conn).await.map_err(BackendError::from);
        if let Err(e) = &result {
            self.reset(generation, e).await;
        }
        result
    }
}

impl QueueBackend for RedisBackend {
    async fn get_f64(&self, key: &str) -> BackendResult<f64> {
        let raw: Option<String> = self
            .query(|mut c| async move { c.get(key).await })
            .await?;
        parse_number(key, raw)
    }

    async fn smembers(&self, key: &str) -> BackendResult<Vec<String>> {
        self.query(|mut c| async move { c.smembers(key).await })
            .await
    }

    async fn llen(&self, key: &str) -> BackendResult<u64> {
        self.query(|mut c| async move { c.llen(key).await }).await
    }

    async fn exists(&self, key: &str) -> BackendResult<bool> {
        self.query(|mut c| async move { c.exists(key).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Transport;

    #[test]
    fn open_does_not_connect() {
        // Nothing listens on port 1; building the client must still succeed.
        let backend = RedisBackend::open("redis://127.0.0.1:1/2").unwrap();
        assert_eq!(
            backend.target().transport,
            Transport::Tcp {
                host: "127.0.0.1".to_string(),
                port: 1
            }
        );
        assert_eq!(backend.target().db, 2);
    }

    #[test]
    fn open_rejects_unknown_scheme() {
        let err = RedisBackend::open("memcached://localhost:11211").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScheme(_)));
    }

    #[test]
    fn slot_clear_only_drops_matching_generation() {
        let mut slot = ConnectionSlot::new();
        let first = slot.install("first");
        let second = slot.install("second");

        // A late failure on the first connection leaves the second in place.
        assert!(!slot.clear(first));
        assert_eq!(slot.get(), Some((second, "second")));

        assert!(slot.clear(second));
        assert_eq!(slot.get(), None);
        // Already cleared.
        assert!(!slot.clear(second));
    }

    #[test]
    fn slot_generations_increase() {
        let mut slot = ConnectionSlot::new();
        assert_eq!(slot.get(), None::<(u64, u32)>);
        let a = slot.install(1u32);
        slot.clear(a);
        let b = slot.install(2u32);
        assert!(b > a);
        assert_eq!(slot.get(), Some((b, 2)));
    }

    #[tokio::test]
    async fn connection_refused_is_a_backend_error() {
        let backend = RedisBackend::open("redis://127.0.0.1:1").unwrap();

        let err = backend.get_f64("resque:stat:processed").await.unwrap_err();
        assert!(err.is_connection_error(), "unexpected error: {err}");
        assert!(backend.conn.lock().await.get().is_none());

        // A second read retries the connection instead of caching the failure.
        assert!(backend.smembers("resque:queues").await.is_err());
    }
}

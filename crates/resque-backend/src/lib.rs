//! resque-backend — read-only access to the Redis instance backing Resque.
//!
//! Parses the exporter's connection string into a transport, builds a
//! lazily-connecting Redis client, and exposes the handful of primitive
//! reads the collector needs behind the [`QueueBackend`] trait.
//!
//! # Architecture
//!
//! ```text
//! "redis://:pw@host:6379/2"
//!   → ConnectionTarget::parse()      (tcp / unix, db index, password)
//!     → RedisBackend::open()         (no I/O until the first read)
//!
//! QueueBackend
//!   ├── get_f64()      GET + float parse
//!   ├── smembers()     SMEMBERS
//!   ├── llen()         LLEN
//!   └── exists()       EXISTS
//! ```
//!
//! Every key goes through a [`KeyNamespace`], which mirrors Resque's own
//! `namespace:segment:segment` naming.
//!
//! [`MemoryBackend`] implements the same trait over in-process maps and is
//! what the collector and exporter tests run against.

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;
pub mod namespace;
pub mod target;

pub use backend::QueueBackend;
pub use client::RedisBackend;
pub use error::{BackendError, BackendResult, ConfigError};
pub use memory::MemoryBackend;
pub use namespace::KeyNamespace;
pub use target::{ConnectionTarget, Transport};

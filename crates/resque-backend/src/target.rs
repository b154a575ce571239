//! Connection string parsing.
//!
//! The exporter accepts a URL whose scheme picks the transport:
//!
//! | scheme | transport | notes |
//! |---|---|---|
//! | `redis`, `tcp` | TCP `host:port` | `/N` path selects database `N` |
//! | `unix` | unix socket at the URL path | |
//!
//! A password embedded as `scheme://:secret@host` is sent with AUTH. The
//! user name part is ignored.

use std::fmt;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use url::{Host, ParseError, Url};

use crate::error::ConfigError;

/// Host used when a tcp URL does not name one.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when a tcp URL does not name one.
pub const DEFAULT_PORT: u16 = 6379;

/// Transport resolved from the URL scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
}

/// Everything needed to open a connection, parsed once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub transport: Transport,
    /// Database index selected after connecting.
    pub db: i64,
    pub password: Option<String>,
}

impl ConnectionTarget {
    /// Parse a connection string such as `redis://localhost:6379/0`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let parsed = match Url::parse(raw) {
            // `redis://:6380` names a port but no host; dial localhost.
            Err(ParseError::EmptyHost) => match with_default_host(raw) {
                Some(patched) => Url::parse(&patched),
                None => Err(ParseError::EmptyHost),
            },
            other => other,
        };
        let url = parsed.map_err(|e| ConfigError::InvalidUrl {
            url: redact(raw),
            reason: e.to_string(),
        })?;

        let (transport, db) = match url.scheme() {
            "redis" | "tcp" => {
                let host = match url.host() {
                    Some(Host::Domain(d)) => d.to_string(),
                    Some(Host::Ipv4(ip)) => ip.to_string(),
                    Some(Host::Ipv6(ip)) => ip.to_string(),
                    None => DEFAULT_HOST.to_string(),
                };
                let port = url.port().unwrap_or(DEFAULT_PORT);
                // A path that isn't a number is ignored rather than rejected.
                let db = url
                    .path()
                    .strip_prefix('/')
                    .and_then(|p| p.parse::<i64>().ok())
                    .unwrap_or(0);
                (Transport::Tcp { host, port }, db)
            }
            "unix" => (
                Transport::Unix {
                    path: PathBuf::from(decode(url.path())),
                },
                0,
            ),
            other => return Err(ConfigError::UnknownScheme(other.to_string())),
        };

        let password = url
            .password()
            .map(decode);

        Ok(Self {
            transport,
            db,
            password,
        })
    }

    /// Convert into the redis crate's connection description.
    pub fn connection_info(&self) -> Result<redis::ConnectionInfo, ConfigError> {
        let addr = match &self.transport {
            Transport::Tcp { host, port } => redis::ConnectionAddr::Tcp(host.clone(), *port),
            #[cfg(unix)]
            Transport::Unix { path } => redis::ConnectionAddr::Unix(path.clone()),
            #[cfg(not(unix))]
            Transport::Unix { .. } => return Err(ConfigError::UnixUnsupported),
        };

        Ok(redis::ConnectionInfo {
            addr,
            redis: redis::RedisConnectionInfo {
                db: self.db,
                password: self.password.clone(),
                ..Default::default()
            },
        })
    }
}

/// Renders the target without its password, for logs.
impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = if self.password.is_some() { ":***@" } else { "" };
        match &self.transport {
            Transport::Tcp { host, port } if host.contains(':') => {
                write!(f, "tcp://{auth}[{host}]:{port}/{}", self.db)
            }
            Transport::Tcp { host, port } => write!(f, "tcp://{auth}{host}:{port}/{}", self.db),
            Transport::Unix { path } => write!(f, "unix://{auth}{}", path.display()),
        }
    }
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("transport", &self.transport)
            .field("db", &self.db)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Insert `localhost` as the host of a URL whose authority has none.
fn with_default_host(raw: &str) -> Option<String> {
    let (scheme, rest) = raw.split_once("://")?;
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host_start = rest[..authority_end].rfind('@').map_or(0, |at| at + 1);
    Some(format!(
        "{scheme}://{}{DEFAULT_HOST}{}",
        &rest[..host_start],
        &rest[host_start..]
    ))
}

/// Strip credentials from a raw connection string that failed to parse.
fn redact(raw: &str) -> String {
    match (raw.find("://"), raw.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &raw[..scheme_end], &raw[at..])
        }
        _ => raw.to_string(),
    }
}

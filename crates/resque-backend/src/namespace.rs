//! Namespaced key construction.

use std::fmt;

/// Separator Resque places between key segments.
pub const KEY_SEPARATOR: &str = ":";

/// The configurable prefix under which Resque stores all of its keys.
///
/// Keys are built as `namespace:segment[:segment...]`. Segments are used
/// verbatim; queue and worker names are not escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNamespace {
    prefix: String,
}

impl KeyNamespace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Join the namespace with one or more segments.
    ///
    /// ```
    /// use resque_backend::KeyNamespace;
    ///
    /// let ns = KeyNamespace::new("resque");
    /// assert_eq!(ns.key(&["queue", "default"]), "resque:queue:default");
    /// ```
    pub fn key(&self, segments: &[&str]) -> String {
        let mut key = String::with_capacity(
            self.prefix.len() + segments.iter().map(|s| s.len() + 1).sum::<usize>(),
        );
        key.push_str(&self.prefix);
        key.push_str(KEY_SEPARATOR);
        key.push_str(&segments.join(KEY_SEPARATOR));
        key
    }
}

impl Default for KeyNamespace {
    fn default() -> Self {
        Self::new("resque")
    }
}

impl fmt::Display for KeyNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}

//! Description of a single outbound call to the upstream API.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An upstream GET request: path relative to the API base plus query
/// parameters.
///
/// Shared credentials (API key, language) are added by the transport and are
/// never part of a `RequestSpec`, so they never leak into cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Path relative to the upstream base URL, e.g. `/movie/popular`.
    pub path: String,
    /// Query parameters, kept sorted so key rendering is deterministic.
    pub params: BTreeMap<String, String>,
}

impl RequestSpec {
    /// Start a request for `path` with no parameters.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add (or replace) a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Logical cache key: path plus every parameter, sorted and encoded.
    ///
    /// Two specs produce the same key exactly when they describe the same
    /// upstream query.
    pub fn cache_key(&self) -> String {
        let mut key = String::with_capacity(self.path.len() + 16 * self.params.len());
        key.push_str(&self.path);
        for (i, (name, value)) in self.params.iter().enumerate() {
            key.push(if i == 0 { '?' } else { '&' });
            key.push_str(&urlencoded(name));
            key.push('=');
            key.push_str(&urlencoded(value));
        }
        key
    }
}

impl fmt::Display for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// Minimal percent-encoding for query components.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

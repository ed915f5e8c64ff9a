//! Cache key derivation
//!
//! A key is built from an operation name plus ordered, named arguments. The
//! canonical form stays readable for logging; the storage identifier is its
//! SHA-256 digest, which keeps file names filesystem-safe and length-bounded
//! no matter what the arguments contain.

use sha2::{Digest, Sha256};
use std::fmt;

/// A derived cache key
///
/// `canonical` is the human-readable form (`operation(name=value&...)`),
/// `digest` the lowercase hex SHA-256 used as the storage identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    canonical: String,
    digest: String,
}

impl CacheKey {
    /// The readable canonical form
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The hex SHA-256 digest used as storage identifier
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

/// Builder deriving a cache key from an operation and its named arguments
///
/// Argument order is preserved, and arguments are named so that calls with
/// the same positional values but different meanings never share a key. The
/// delimiters `=`, `&` and `\` are escaped inside names and values, so two
/// different argument lists cannot collapse to the same canonical string.
/// Operation names are expected to be plain identifiers.
pub struct CacheKeyBuilder {
    operation: String,
    args: Vec<(String, String)>,
}

impl CacheKeyBuilder {
    /// Start a key for the named operation
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
        }
    }

    /// Append a named argument
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((name.into(), value.into()));
        self
    }

    /// Derive the key
    pub fn build(self) -> CacheKey {
        let mut canonical = escape(&self.operation);
        canonical.push('(');
        let parts: Vec<String> = self
            .args
            .iter()
            .map(|(name, value)| format!("{}={}", escape(name), escape(value)))
            .collect();
        canonical.push_str(&parts.join("&"));
        canonical.push(')');

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        CacheKey { canonical, digest }
    }
}

fn escape(part: &str) -> String {
    part.replace('\\', "\\\\")
        .replace('&', "\\&")
        .replace('=', "\\=")
}

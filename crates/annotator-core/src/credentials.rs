//! API key pool and per-image key selection.
//!
//! The pool merges operator-configured keys with keys the caller sends along
//! with a request. Picking is uniformly random per image to spread load over
//! several keys' rate limits.

use crate::error::RequestError;
use rand::seq::SliceRandom;
use rand::Rng;

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Split a key list on commas, semicolons and whitespace.
pub fn split_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

/// Collect operator keys from configured sources, resolving env references.
pub fn configured_keys(sources: &[String]) -> Vec<String> {
    sources
        .iter()
        .filter_map(|source| resolve_env_var(source.trim()))
        .flat_map(|resolved| {
            split_tokens(&resolved)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Parse the caller's `apiKeys` field.
///
/// Non-string and blank entries are dropped. A value that is not a JSON array
/// contributes nothing.
pub fn supplied_keys(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(values)) => values
            .into_iter()
            .filter_map(|value| match value {
                serde_json::Value::String(key) => Some(key.trim().to_string()),
                _ => None,
            })
            .filter(|key| !key.is_empty())
            .collect(),
        Ok(_) => {
            tracing::warn!("Ignoring apiKeys field: expected a JSON array");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Ignoring apiKeys field: {e}");
            Vec::new()
        }
    }
}

/// Ordered, deduplicated, non-empty set of API keys for one request.
#[derive(Clone)]
pub struct CredentialPool {
    keys: Vec<String>,
}

impl CredentialPool {
    /// Build a pool from configured keys followed by caller keys.
    ///
    /// First occurrence wins when deduplicating.
    pub fn new<I>(keys: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut pool: Vec<String> = Vec::new();
        for key in keys {
            let key = key.trim();
            if key.is_empty() || pool.iter().any(|existing| existing == key) {
                continue;
            }
            pool.push(key.to_string());
        }

        if pool.is_empty() {
            return Err(RequestError::NoCredentials);
        }
        Ok(Self { keys: pool })
    }

    /// Pick a key uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        // Non-empty by construction.
        self.keys
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

// Keys never show up in logs.
impl std::fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.keys.len())
            .finish()
    }
}

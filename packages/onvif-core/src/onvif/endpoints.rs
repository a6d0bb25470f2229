//! Per-device service endpoint registry.
//!
//! Maps lower-cased service names (`device`, `media`, `events`, ...) to the
//! URL the service is reached at. Every URL is normalized against the
//! device's base address on insert, so lookups never hand out placeholder
//! hosts that had a parseable authority.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Serialize;

use super::address::{has_placeholder_host, normalize};

/// Classification of a registry entry for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointStatus {
    Ok,
    /// Host is empty, `localhost` or `127.0.0.1`.
    Placeholder,
    /// Value has no `scheme://authority` shape.
    Unparseable,
}

/// One registry entry with its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDiagnostic {
    pub service: String,
    pub endpoint: String,
    pub status: EndpointStatus,
}

/// Thread-safe service name to URL map.
///
/// Entries are only ever added or overwritten.
#[derive(Debug)]
pub struct EndpointRegistry {
    base_address: String,
    entries: RwLock<BTreeMap<String, String>>,
}

impl EndpointRegistry {
    /// Creates an empty registry for a device at `base_address` (`host[:port]`).
    pub fn new(base_address: impl Into<String>) -> Self {
        Self {
            base_address: base_address.into(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Stores `url` under the lower-cased `name`, replacing any previous value.
    pub fn put(&self, name: &str, url: &str) {
        let url = normalize(url, &self.base_address);
        self.entries.write().insert(name.to_lowercase(), url);
    }

    /// Stores several entries under a single write lock.
    ///
    /// Readers see either none or all of the batch.
    pub fn extend<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let normalized: Vec<(String, String)> = entries
            .into_iter()
            .map(|(k, v)| {
                (
                    k.as_ref().to_lowercase(),
                    normalize(v.as_ref(), &self.base_address),
                )
            })
            .collect();
        self.entries.write().extend(normalized);
    }

    /// Looks up the endpoint for `name`.
    ///
    /// An exact (case-insensitive) key wins. Otherwise the first key in
    /// lexicographic order that contains `name` is used, so `event` resolves
    /// to an `events` entry.
    pub fn get(&self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        let entries = self.entries.read();
        if let Some(url) = entries.get(&name) {
            return Some(url.clone());
        }
        entries
            .iter()
            .find(|(key, _)| key.contains(&name))
            .map(|(_, url)| url.clone())
    }

    /// Returns a copy of every entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    /// Classifies every entry.
    pub fn debug_entries(&self) -> Vec<EndpointDiagnostic> {
        self.entries
            .read()
            .iter()
            .map(|(service, endpoint)| EndpointDiagnostic {
                service: service.clone(),
                endpoint: endpoint.clone(),
                status: match has_placeholder_host(endpoint) {
                    Some(false) => EndpointStatus::Ok,
                    Some(true) => EndpointStatus::Placeholder,
                    None => EndpointStatus::Unparseable,
                },
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

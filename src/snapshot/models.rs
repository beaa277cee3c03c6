// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;
use crate::registry::CollectionName;

/// Document returned by the remote API.
///
/// `properties` is never interpreted here. Any other top-level fields the API
/// sends are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,

    pub created_time: String,

    pub last_edited_time: String,

    #[serde(default)]
    pub properties: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of fetching one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResult {
    pub name: CollectionName,

    pub data: Vec<RemoteRecord>,

    /// When this collection's fetch settled
    pub last_updated: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionResult {
    pub fn success(name: CollectionName, data: Vec<RemoteRecord>, at: DateTime<Utc>) -> Self {
        Self {
            name,
            data,
            last_updated: at,
            error: None,
        }
    }

    /// A failed fetch keeps no records, never a truncated page set.
    pub fn failure(name: CollectionName, error: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            name,
            data: Vec::new(),
            last_updated: at,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Point-in-time capture of every collection, keyed by name.
///
/// Immutable once built. A new sync produces a new `Snapshot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    collections: BTreeMap<CollectionName, CollectionResult>,
}

impl Snapshot {
    pub fn from_results(results: impl IntoIterator<Item = CollectionResult>) -> Self {
        let collections = results
            .into_iter()
            .map(|result| (result.name, result))
            .collect();
        Self { collections }
    }

    pub fn get(&self, name: CollectionName) -> Option<&CollectionResult> {
        self.collections.get(&name)
    }

    /// Records for a collection; absent collections read as empty
    pub fn records(&self, name: CollectionName) -> &[RemoteRecord] {
        self.collections
            .get(&name)
            .map(|result| result.data.as_slice())
            .unwrap_or(&[])
    }

    /// Most recent `lastUpdated` across all collections
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.collections.values().map(|result| result.last_updated).max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CollectionName, &CollectionResult)> + '_ {
        self.collections.iter().map(|(name, result)| (*name, result))
    }

    pub fn failed(&self) -> impl Iterator<Item = &CollectionResult> + '_ {
        self.collections.values().filter(|result| result.is_error())
    }

    pub fn record_count(&self) -> usize {
        self.collections.values().map(|result| result.data.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let raw: BTreeMap<String, Value> = BTreeMap::deserialize(deserializer)?;
        let mut collections = BTreeMap::new();

        for (key, value) in raw {
            // Documents written by newer versions may carry collections we
            // don't know yet
            let Ok(name) = key.parse::<CollectionName>() else {
                warn!(collection = %key, "Skipping unknown collection in snapshot");
                continue;
            };

            let result: CollectionResult = serde_json::from_value(value)
                .map_err(|e| D::Error::custom(format!("collection '{}': {}", key, e)))?;

            if result.name != name {
                return Err(D::Error::custom(format!(
                    "collection '{}' is labelled '{}'",
                    key, result.name
                )));
            }

            collections.insert(name, result);
        }

        Ok(Self { collections })
    }
}

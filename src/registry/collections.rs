// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use crate::error::ConfigError;
use crate::registry::models::CollectionName;

/// Opaque identifier the remote API uses for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable mapping from every `CollectionName` to its `RemoteId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRegistry {
    entries: BTreeMap<CollectionName, RemoteId>,
}

impl CollectionRegistry {
    /// Registry built from the compiled-in database ids
    pub fn with_defaults() -> Self {
        let entries = CollectionName::ALL
            .iter()
            .map(|name| (*name, RemoteId::new(name.default_remote_id())))
            .collect();
        Self { entries }
    }

    /// Apply overrides keyed by collection name on top of the defaults.
    ///
    /// Unknown names and blank ids are rejected so a typo can never silently
    /// leave a collection pointing at the wrong database.
    pub fn from_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut registry = Self::with_defaults();

        for (raw_name, id) in overrides {
            let name: CollectionName = raw_name.parse()?;
            let id = id.trim();
            if id.is_empty() {
                return Err(ConfigError::MissingCollectionId(name));
            }
            registry.entries.insert(name, RemoteId::new(id));
        }

        Ok(registry)
    }

    pub fn remote_id(&self, name: CollectionName) -> Option<&RemoteId> {
        self.entries.get(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CollectionName, &RemoteId)> + '_ {
        self.entries.iter().map(|(name, id)| (*name, id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CollectionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
impl CollectionRegistry {
    /// Registry restricted to a subset, for fan-out tests
    pub fn from_entries(entries: Vec<(CollectionName, &str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, id)| (name, RemoteId::new(id)))
                .collect(),
        }
    }
}

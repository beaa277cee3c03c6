// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical collection of dashboard records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionName {
    Values,
    ValuesCheck,
    Goals,
    Projects,
    Actions,
    DailyLog,
    Emotions,
    Health,
    Attention,
    Creation,
    Interactions,
    Finance,
    GrowthReview,
    Desires,
    Knowledge,
    MentalModels,
    Relationships,
}

impl CollectionName {
    pub const ALL: [CollectionName; 17] = [
        CollectionName::Values,
        CollectionName::ValuesCheck,
        CollectionName::Goals,
        CollectionName::Projects,
        CollectionName::Actions,
        CollectionName::DailyLog,
        CollectionName::Emotions,
        CollectionName::Health,
        CollectionName::Attention,
        CollectionName::Creation,
        CollectionName::Interactions,
        CollectionName::Finance,
        CollectionName::GrowthReview,
        CollectionName::Desires,
        CollectionName::Knowledge,
        CollectionName::MentalModels,
        CollectionName::Relationships,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Values => "values",
            CollectionName::ValuesCheck => "values-check",
            CollectionName::Goals => "goals",
            CollectionName::Projects => "projects",
            CollectionName::Actions => "actions",
            CollectionName::DailyLog => "daily-log",
            CollectionName::Emotions => "emotions",
            CollectionName::Health => "health",
            CollectionName::Attention => "attention",
            CollectionName::Creation => "creation",
            CollectionName::Interactions => "interactions",
            CollectionName::Finance => "finance",
            CollectionName::GrowthReview => "growth-review",
            CollectionName::Desires => "desires",
            CollectionName::Knowledge => "knowledge",
            CollectionName::MentalModels => "mental-models",
            CollectionName::Relationships => "relationships",
        }
    }

    /// Database id in the workspace the dashboard was built against
    pub fn default_remote_id(&self) -> &'static str {
        match self {
            CollectionName::Values => "235b6a1ba40681369b6cf6dc2ddd4aee",
            CollectionName::ValuesCheck => "235b6a1ba40681299abaffe6f8c0cf2a",
            CollectionName::Goals => "235b6a1ba40681958663f66a8f7c415e",
            CollectionName::Projects => "235b6a1ba40681c5a1fff21434479d7f",
            CollectionName::Actions => "235b6a1ba40681709066ffc71e397670",
            CollectionName::DailyLog => "235b6a1ba40681f6bb1aef4d6b297e44",
            CollectionName::Emotions => "235b6a1ba40681e49a28d1ac5c544175",
            CollectionName::Health => "235b6a1ba40681d68417e04382f4a415",
            CollectionName::Attention => "235b6a1ba4068155a4a5fb159817c0a7",
            CollectionName::Creation => "235b6a1ba4068119a758ca37fff85a61",
            CollectionName::Interactions => "235b6a1ba406811399b4d712954ed9b0",
            CollectionName::Finance => "235b6a1ba406811780d3f4befebe85c9",
            CollectionName::GrowthReview => "235b6a1ba406816682b9cd596d63eb84",
            CollectionName::Desires => "236b6a1ba40680e8bc09ef708acd9c34",
            CollectionName::Knowledge => "235b6a1ba40681b1877ffd6e3ba0e78d",
            CollectionName::MentalModels => "235b6a1ba40681e1a6c9cbbb95c13a45",
            CollectionName::Relationships => "235b6a1ba40681e49ce5debe17b5262c",
        }
    }

    /// Collections the user edits throughout the day. Realtime reads of these
    /// skip the bulk cache.
    pub fn is_high_churn(&self) -> bool {
        matches!(
            self,
            CollectionName::DailyLog | CollectionName::Emotions | CollectionName::Health
        )
    }

    /// Suffix used for `LIFEBOARD_COLLECTION_<NAME>_ID` overrides
    pub fn env_suffix(&self) -> String {
        self.as_str().replace('-', "_").to_uppercase()
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| crate::error::ConfigError::UnknownCollection(s.to_string()))
    }
}

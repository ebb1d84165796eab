//! API key tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The tier of a recognised API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyTier {
    /// Logged, never billed.
    Test,
    /// Logged and billed when the upstream answer is billable.
    Prod,
}

impl ApiKeyTier {
    /// The tier name as stored in query logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for ApiKeyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a presented credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyClass {
    /// Matches the test-tier secret.
    Test,
    /// Matches the prod-tier secret.
    Prod,
    /// Absent, empty, or unrecognised.
    Invalid,
}

impl ApiKeyClass {
    /// The tier for a valid key, `None` for an invalid one.
    #[must_use]
    pub fn tier(self) -> Option<ApiKeyTier> {
        match self {
            Self::Test => Some(ApiKeyTier::Test),
            Self::Prod => Some(ApiKeyTier::Prod),
            Self::Invalid => None,
        }
    }

    /// Whether the key was recognised.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self != Self::Invalid
    }
}

impl From<ApiKeyTier> for ApiKeyClass {
    fn from(tier: ApiKeyTier) -> Self {
        match tier {
            ApiKeyTier::Test => Self::Test,
            ApiKeyTier::Prod => Self::Prod,
        }
    }
}

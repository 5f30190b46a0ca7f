use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// How an upgrade reshapes the current period.
///
/// `Temporary` boosts the plan for a fixed window and banks the remaining
/// base-plan time for the revert. `UntilEnd` switches the plan for whatever
/// is left of the paid period. `Custom` buys a whole number of months from
/// now, extending the period when the purchased window reaches past it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeType {
    Temporary,
    UntilEnd,
    Custom,
}

impl UpgradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeType::Temporary => "temporary",
            UpgradeType::UntilEnd => "until_end",
            UpgradeType::Custom => "custom",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "temporary" => Some(UpgradeType::Temporary),
            "until_end" => Some(UpgradeType::UntilEnd),
            "custom" => Some(UpgradeType::Custom),
            _ => None,
        }
    }
}

impl Display for UpgradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

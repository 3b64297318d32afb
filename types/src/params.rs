//! Fixed protocol constants of the Symposium contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amount::Wei;
use crate::error::TypesError;

/// Stake committed when creating an opinion or voting for one (0.1 native units).
///
/// Mirrors the contract's `VOTE_COST`; the live value is read from the chain
/// and this constant is the fallback.
pub const VOTE_COST: Wei = Wei::new(100_000_000_000_000_000);

/// Label given to a freshly created opinion.
pub const JUST_NOW: &str = "just now";

/// Proposal lifetimes offered when creating a proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationOption {
    #[default]
    OneDay,
    ThreeDays,
    OneWeek,
    TwoWeeks,
    ThirtyDays,
}

impl DurationOption {
    pub const ALL: [DurationOption; 5] = [
        Self::OneDay,
        Self::ThreeDays,
        Self::OneWeek,
        Self::TwoWeeks,
        Self::ThirtyDays,
    ];

    /// Duration in seconds, as passed to `createProposal`.
    pub fn secs(&self) -> u64 {
        match self {
            Self::OneDay => 86_400,
            Self::ThreeDays => 259_200,
            Self::OneWeek => 604_800,
            Self::TwoWeeks => 1_209_600,
            Self::ThirtyDays => 2_592_000,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OneDay => "1 day",
            Self::ThreeDays => "3 days",
            Self::OneWeek => "1 week",
            Self::TwoWeeks => "2 weeks",
            Self::ThirtyDays => "30 days",
        }
    }

    /// Short form accepted on the command line.
    pub fn short(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::OneWeek => "1w",
            Self::TwoWeeks => "2w",
            Self::ThirtyDays => "30d",
        }
    }

    pub fn from_secs(secs: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.secs() == secs)
    }
}

impl fmt::Display for DurationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the short form (`1w`), the label (`1 week`) or the seconds value.
impl FromStr for DurationOption {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.short() == needle || d.label() == needle)
            .or_else(|| needle.parse().ok().and_then(Self::from_secs))
            .ok_or_else(|| TypesError::UnknownDuration(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_cost_is_one_tenth() {
        assert_eq!(VOTE_COST.to_string(), "0.1");
    }

    #[test]
    fn duration_table_matches_contract_seconds() {
        let secs: Vec<u64> = DurationOption::ALL.iter().map(|d| d.secs()).collect();
        assert_eq!(secs, vec![86_400, 259_200, 604_800, 1_209_600, 2_592_000]);
    }

    #[test]
    fn parse_duration_forms() {
        assert_eq!("1w".parse::<DurationOption>().unwrap(), DurationOption::OneWeek);
        assert_eq!("30 days".parse::<DurationOption>().unwrap(), DurationOption::ThirtyDays);
        assert_eq!("259200".parse::<DurationOption>().unwrap(), DurationOption::ThreeDays);
        assert!("5d".parse::<DurationOption>().is_err());
    }
}

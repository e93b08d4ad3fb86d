//! Process-wide lookup tables of accepted stakeholder attribute values.
//!
//! Built once on first use from the enum variant lists and never mutated.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::models::{EngagementLevel, StakeholderType};
use crate::{Error, Result};

/// Accepted `stakeholder_type` values keyed by their wire name.
pub static STAKEHOLDER_TYPES: Lazy<BTreeMap<&'static str, StakeholderType>> = Lazy::new(|| {
    StakeholderType::ALL
        .iter()
        .map(|t| (t.as_str(), *t))
        .collect()
});

/// Accepted `engagement_level` values keyed by their wire name.
pub static ENGAGEMENT_LEVELS: Lazy<BTreeMap<&'static str, EngagementLevel>> = Lazy::new(|| {
    EngagementLevel::ALL
        .iter()
        .map(|l| (l.as_str(), *l))
        .collect()
});

/// Parse a stakeholder type, listing the accepted values on failure.
pub fn parse_stakeholder_type(value: &str) -> Result<StakeholderType> {
    value.parse().map_err(|_| {
        Error::InvalidInput(format!(
            "invalid stakeholder_type '{}': must be one of {}",
            value,
            join_keys(&STAKEHOLDER_TYPES)
        ))
    })
}

/// Parse an engagement level, listing the accepted values on failure.
pub fn parse_engagement_level(value: &str) -> Result<EngagementLevel> {
    value.parse().map_err(|_| {
        Error::InvalidInput(format!(
            "invalid engagement_level '{}': must be one of {}",
            value,
            join_keys(&ENGAGEMENT_LEVELS)
        ))
    })
}

fn join_keys<V>(table: &BTreeMap<&'static str, V>) -> String {
    table.keys().copied().collect::<Vec<_>>().join(", ")
}

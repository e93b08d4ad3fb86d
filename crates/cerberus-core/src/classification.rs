//! Internal/external classification of an organization against a program's
//! internal-organization aliases.

use serde::{Deserialize, Serialize};

use crate::models::StakeholderType;

/// The set of names a program's own organization goes by.
///
/// Parsed from a comma-separated string. Entries are trimmed and lowercased;
/// blank entries are dropped so they never match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalOrgAliases {
    aliases: Vec<String>,
}

impl InternalOrgAliases {
    pub fn parse(raw: &str) -> Self {
        let aliases = raw
            .split(',')
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        Self { aliases }
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Case-insensitive match: equal, or either side contains the other.
    pub fn matches(&self, organization: &str) -> bool {
        let org = organization.trim().to_lowercase();
        if org.is_empty() {
            return false;
        }
        self.aliases
            .iter()
            .any(|alias| *alias == org || org.contains(alias.as_str()) || alias.contains(org.as_str()))
    }

    /// Classify an organization. A missing or blank organization is internal.
    pub fn classify(&self, organization: Option<&str>) -> Classification {
        match organization.map(str::trim) {
            None | Some("") => Classification::Internal,
            Some(org) if self.matches(org) => Classification::Internal,
            Some(_) => Classification::External,
        }
    }
}

/// Outcome of classifying an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Internal,
    External,
}

impl Classification {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }

    pub fn stakeholder_type(&self) -> StakeholderType {
        match self {
            Self::Internal => StakeholderType::Internal,
            Self::External => StakeholderType::External,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_blanks() {
        let aliases = InternalOrgAliases::parse(" Acme Corp , ,ACME,  ");
        assert_eq!(aliases.aliases(), &["acme corp".to_string(), "acme".to_string()]);
    }

    #[test]
    fn test_missing_org_is_internal() {
        let aliases = InternalOrgAliases::parse("Acme");
        assert_eq!(aliases.classify(None), Classification::Internal);
        assert_eq!(aliases.classify(Some("  ")), Classification::Internal);
    }

    #[test]
    fn test_exact_case_insensitive_match() {
        let aliases = InternalOrgAliases::parse("Acme Corp");
        assert!(aliases.classify(Some("ACME CORP")).is_internal());
    }

    #[test]
    fn test_substring_match_both_directions() {
        let aliases = InternalOrgAliases::parse("Acme");
        assert!(aliases.matches("Acme Corporation"));

        let aliases = InternalOrgAliases::parse("Acme Corporation");
        assert!(aliases.matches("acme"));
    }

    #[test]
    fn test_unrelated_org_is_external() {
        let aliases = InternalOrgAliases::parse("Acme, Acme Labs");
        let class = aliases.classify(Some("Globex"));
        assert_eq!(class, Classification::External);
        assert_eq!(class.stakeholder_type(), StakeholderType::External);
        assert!(!class.is_internal());
    }

    #[test]
    fn test_empty_alias_list_matches_nothing() {
        let aliases = InternalOrgAliases::parse("");
        assert!(aliases.is_empty());
        assert!(!aliases.matches("Globex"));
        assert_eq!(aliases.classify(Some("Globex")), Classification::External);
    }

    #[test]
    fn test_internal_maps_to_internal_type() {
        assert_eq!(
            Classification::Internal.stakeholder_type(),
            StakeholderType::Internal
        );
    }
}

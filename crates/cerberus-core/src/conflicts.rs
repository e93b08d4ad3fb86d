//! Conflict analysis for a cluster of person mentions.
//!
//! Produces the suggested canonical name, role/organization conflict flags,
//! and the distinct role/organization options a reviewer can choose from.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{ConflictOption, GroupMemberDetail, PersonMention};

/// The attributes of one member row that take part in conflict analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberAttributes<'a> {
    pub name: &'a str,
    pub role: Option<&'a str>,
    pub organization: Option<&'a str>,
    pub confidence: Option<f64>,
}

impl<'a> From<&'a PersonMention> for MemberAttributes<'a> {
    fn from(m: &'a PersonMention) -> Self {
        Self {
            name: &m.person_name,
            role: m.person_role.as_deref(),
            organization: m.person_organization.as_deref(),
            confidence: m.confidence_score,
        }
    }
}

impl<'a> From<&'a GroupMemberDetail> for MemberAttributes<'a> {
    fn from(m: &'a GroupMemberDetail) -> Self {
        Self {
            name: &m.person_name,
            role: m.person_role.as_deref(),
            organization: m.person_organization.as_deref(),
            confidence: m.confidence_score,
        }
    }
}

/// Result of analysing one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictAnalysis {
    pub suggested_name: String,
    pub has_role_conflicts: bool,
    pub has_org_conflicts: bool,
    pub role_options: Vec<ConflictOption>,
    pub org_options: Vec<ConflictOption>,
}

/// A distinct (name, role, organization, confidence) combination and how
/// many member rows carry it.
#[derive(Debug)]
struct Combination<'a> {
    attrs: MemberAttributes<'a>,
    count: usize,
}

/// Analyse a cluster. Returns `None` for an empty member list.
///
/// The suggested name comes from the most frequent attribute combination.
/// Ties are broken by higher confidence (missing confidence last), then by
/// name, role and organization in ascending lexicographic order, so the
/// result never depends on input order.
pub fn analyze<'a, I>(members: I) -> Option<ConflictAnalysis>
where
    I: IntoIterator<Item = MemberAttributes<'a>>,
{
    let members: Vec<MemberAttributes<'a>> = members.into_iter().collect();
    if members.is_empty() {
        return None;
    }

    let mut combinations: Vec<Combination<'a>> = Vec::new();
    for attrs in &members {
        match combinations.iter_mut().find(|c| same_combination(&c.attrs, attrs)) {
            Some(existing) => existing.count += 1,
            None => combinations.push(Combination {
                attrs: *attrs,
                count: 1,
            }),
        }
    }
    combinations.sort_by(compare_combinations);

    let suggested_name = combinations[0].attrs.name.to_string();
    let role_options = options(members.iter().map(|m| (m.role, m.confidence)));
    let org_options = options(members.iter().map(|m| (m.organization, m.confidence)));

    Some(ConflictAnalysis {
        suggested_name,
        has_role_conflicts: role_options.len() > 1,
        has_org_conflicts: org_options.len() > 1,
        role_options,
        org_options,
    })
}

fn same_combination(a: &MemberAttributes<'_>, b: &MemberAttributes<'_>) -> bool {
    a.name == b.name
        && a.role == b.role
        && a.organization == b.organization
        && a.confidence.map(f64::to_bits) == b.confidence.map(f64::to_bits)
}

fn compare_combinations(a: &Combination<'_>, b: &Combination<'_>) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| compare_confidence_desc_nulls_last(a.attrs.confidence, b.attrs.confidence))
        .then_with(|| a.attrs.name.cmp(b.attrs.name))
        .then_with(|| a.attrs.role.cmp(&b.attrs.role))
        .then_with(|| a.attrs.organization.cmp(&b.attrs.organization))
}

fn compare_confidence_desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Distinct non-empty values with occurrence count and mean confidence.
///
/// Values are compared exactly as stored, so `"Eng"` and `"Eng "` are two
/// options. Ordered by count descending, then value.
fn options<'a, I>(values: I) -> Vec<ConflictOption>
where
    I: Iterator<Item = (Option<&'a str>, Option<f64>)>,
{
    let mut acc: BTreeMap<&'a str, (i64, f64)> = BTreeMap::new();
    for (value, confidence) in values {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            continue;
        };
        let entry = acc.entry(value).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += confidence.unwrap_or(0.0);
    }

    let mut out: Vec<ConflictOption> = acc
        .into_iter()
        .map(|(value, (count, total))| ConflictOption {
            value: value.to_string(),
            count,
            confidence: total / count as f64,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}

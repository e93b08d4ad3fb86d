//! Clustering of unresolved person mentions into candidate identities.
//!
//! Every unordered pair of mentions is compared exactly once in ascending
//! `person_id` order. Accepted pairs become [`SimilarityEdge`]s, and the
//! connected components of the resulting graph, computed with [`UnionFind`],
//! become clusters. Components of a single mention are discarded.

use std::collections::{BTreeMap, HashMap};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::conflicts::{self, MemberAttributes};
use crate::defaults;
use crate::models::{MatchingMethod, MergeGroupMember, PersonMention, ProposedMergeGroup};
use crate::similarity::organization_matches;
use crate::{Error, Result};

// =============================================================================
// UNION-FIND
// =============================================================================

/// Disjoint-set forest over mention ids.
///
/// Ids are mapped to dense indices once; parent and rank live in flat vectors.
/// `find` compresses paths and `union` attaches the shallower tree under the
/// deeper one, keeping the first argument's root on equal rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    index: HashMap<Uuid, usize>,
    ids: Vec<Uuid>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// Create a forest with every id in its own set. Duplicate ids are ignored.
    pub fn new<I: IntoIterator<Item = Uuid>>(ids: I) -> Self {
        let mut uf = Self {
            index: HashMap::new(),
            ids: Vec::new(),
            parent: Vec::new(),
            rank: Vec::new(),
        };
        for id in ids {
            if uf.index.contains_key(&id) {
                continue;
            }
            let i = uf.ids.len();
            uf.index.insert(id, i);
            uf.ids.push(id);
            uf.parent.push(i);
            uf.rank.push(0);
        }
        uf
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Representative of the set containing `id`, or `None` for unknown ids.
    pub fn find(&mut self, id: Uuid) -> Option<Uuid> {
        let i = *self.index.get(&id)?;
        let root = self.find_index(i);
        Some(self.ids[root])
    }

    /// Merge the sets containing `a` and `b`.
    ///
    /// Returns `true` if two distinct sets were joined.
    pub fn union(&mut self, a: Uuid, b: Uuid) -> bool {
        let (Some(&ia), Some(&ib)) = (self.index.get(&a), self.index.get(&b)) else {
            return false;
        };
        let ra = self.find_index(ia);
        let rb = self.find_index(ib);
        if ra == rb {
            return false;
        }

        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }

    pub fn connected(&mut self, a: Uuid, b: Uuid) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// All sets, keyed by root, each listing its members in ascending order.
    pub fn components(&mut self) -> BTreeMap<Uuid, Vec<Uuid>> {
        let mut out: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
        for i in 0..self.ids.len() {
            let root = self.find_index(i);
            out.entry(self.ids[root]).or_default().push(self.ids[i]);
        }
        for members in out.values_mut() {
            members.sort();
        }
        out
    }

    fn find_index(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// Name-similarity thresholds deciding which pairs become edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringThresholds {
    /// Pairs scoring above this are always joined.
    pub strong: f64,
    /// Pairs scoring above this are joined when their organizations match.
    pub weak: f64,
}

impl Default for ClusteringThresholds {
    fn default() -> Self {
        Self {
            strong: defaults::STRONG_NAME_SIMILARITY,
            weak: defaults::WEAK_NAME_SIMILARITY,
        }
    }
}

impl ClusteringThresholds {
    pub fn accepts(&self, name_similarity: f64, organization_match: bool) -> bool {
        name_similarity > self.strong || (name_similarity > self.weak && organization_match)
    }
}

/// An accepted pairwise comparison. `left < right` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityEdge {
    pub left: Uuid,
    pub right: Uuid,
    pub name_similarity: f64,
    pub organization_match: bool,
}

/// Compare every unordered pair of mentions once and keep the accepted edges.
///
/// Mentions are visited in ascending `person_id` order regardless of input
/// order. The token is polled once per outer row; a cancelled token aborts
/// with [`Error::Cancelled`].
pub fn build_edges<F>(
    mentions: &[PersonMention],
    thresholds: ClusteringThresholds,
    name_similarity: F,
    cancel: &CancellationToken,
) -> Result<Vec<SimilarityEdge>>
where
    F: Fn(&str, &str) -> f64,
{
    let mut ordered: Vec<&PersonMention> = mentions.iter().collect();
    ordered.sort_by_key(|m| m.person_id);
    ordered.dedup_by_key(|m| m.person_id);

    let mut edges = Vec::new();
    for (i, a) in ordered.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled("similarity edge construction".to_string()));
        }
        for b in &ordered[i + 1..] {
            let score = name_similarity(&a.person_name, &b.person_name);
            let org_match = organization_matches(
                a.person_organization.as_deref(),
                b.person_organization.as_deref(),
            );
            if thresholds.accepts(score, org_match) {
                trace!(
                    left = %a.person_id,
                    right = %b.person_id,
                    score,
                    org_match,
                    "Edge accepted"
                );
                edges.push(SimilarityEdge {
                    left: a.person_id,
                    right: b.person_id,
                    name_similarity: score,
                    organization_match: org_match,
                });
            }
        }
    }

    debug!(
        subsystem = "resolution",
        component = "clustering",
        mention_count = ordered.len(),
        edge_count = edges.len(),
        "Similarity edges built"
    );
    Ok(edges)
}

// =============================================================================
// CLUSTERS
// =============================================================================

/// A connected component of two or more mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub root: Uuid,
    /// Ascending.
    pub members: Vec<Uuid>,
}

/// Union the edge endpoints and return every component with at least
/// [`defaults::MIN_GROUP_SIZE`] members, ordered by smallest member id.
pub fn cluster_mentions(mentions: &[PersonMention], edges: &[SimilarityEdge]) -> Vec<Cluster> {
    let mut ids: Vec<Uuid> = mentions.iter().map(|m| m.person_id).collect();
    ids.sort();

    let mut uf = UnionFind::new(ids);
    for edge in edges {
        uf.union(edge.left, edge.right);
    }

    let mut clusters: Vec<Cluster> = uf
        .components()
        .into_iter()
        .filter(|(_, members)| members.len() >= defaults::MIN_GROUP_SIZE)
        .map(|(root, members)| Cluster { root, members })
        .collect();
    clusters.sort_by_key(|c| c.members[0]);
    clusters
}

/// Turn clusters into merge groups ready for persistence.
///
/// The root member is recorded with [`defaults::CLUSTER_ROOT_SCORE`], the
/// others with [`defaults::CLUSTER_MEMBER_SCORE`].
pub fn propose_groups(mentions: &[PersonMention], clusters: &[Cluster]) -> Vec<ProposedMergeGroup> {
    let by_id: HashMap<Uuid, &PersonMention> = mentions.iter().map(|m| (m.person_id, m)).collect();

    clusters
        .iter()
        .filter_map(|cluster| {
            let analysis = conflicts::analyze(
                cluster
                    .members
                    .iter()
                    .filter_map(|id| by_id.get(id))
                    .map(|m| MemberAttributes::from(*m)),
            )?;

            let mut members = Vec::with_capacity(cluster.members.len());
            members.push(MergeGroupMember {
                person_id: cluster.root,
                similarity_score: defaults::CLUSTER_ROOT_SCORE,
                matching_method: MatchingMethod::FuzzyName,
            });
            members.extend(
                cluster
                    .members
                    .iter()
                    .filter(|id| **id != cluster.root)
                    .map(|id| MergeGroupMember {
                        person_id: *id,
                        similarity_score: defaults::CLUSTER_MEMBER_SCORE,
                        matching_method: MatchingMethod::FuzzyName,
                    }),
            );

            Some(ProposedMergeGroup {
                suggested_name: analysis.suggested_name,
                has_role_conflicts: analysis.has_role_conflicts,
                has_org_conflicts: analysis.has_org_conflicts,
                members,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::name_similarity;
    use chrono::Utc;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn mention(n: u128, name: &str, role: Option<&str>, org: Option<&str>, conf: Option<f64>) -> PersonMention {
        PersonMention {
            person_id: id(n),
            artifact_id: id(1000 + n),
            person_name: name.to_string(),
            person_role: role.map(str::to_string),
            person_organization: org.map(str::to_string),
            confidence_score: conf,
            mention_count: 1,
            stakeholder_id: None,
            extracted_at: Utc::now(),
        }
    }

    /// Fixed similarity table for deterministic scenarios.
    fn table(pairs: &'static [(&'static str, &'static str, f64)]) -> impl Fn(&str, &str) -> f64 {
        move |a, b| {
            pairs
                .iter()
                .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
                .map(|(_, _, s)| *s)
                .unwrap_or(0.0)
        }
    }

    #[test]
    fn test_union_find_basic() {
        let mut uf = UnionFind::new([id(1), id(2), id(3), id(4)]);
        assert_eq!(uf.len(), 4);
        assert!(uf.union(id(1), id(2)));
        assert!(uf.union(id(3), id(4)));
        assert!(!uf.union(id(2), id(1)));
        assert!(uf.connected(id(1), id(2)));
        assert!(!uf.connected(id(1), id(3)));
        assert!(uf.union(id(2), id(4)));
        assert!(uf.connected(id(1), id(3)));
        assert_eq!(uf.components().len(), 1);
    }

    #[test]
    fn test_union_find_unknown_ids() {
        let mut uf = UnionFind::new([id(1)]);
        assert_eq!(uf.find(id(9)), None);
        assert!(!uf.union(id(1), id(9)));
        assert!(!uf.connected(id(1), id(9)));
    }

    #[test]
    fn test_union_find_ignores_duplicate_ids() {
        let uf = UnionFind::new([id(1), id(1), id(2)]);
        assert_eq!(uf.len(), 2);
        assert!(!uf.is_empty());
    }

    #[test]
    fn test_union_find_long_chain_compresses() {
        let ids: Vec<Uuid> = (0..1000).map(id).collect();
        let mut uf = UnionFind::new(ids.clone());
        for pair in ids.windows(2) {
            uf.union(pair[1], pair[0]);
        }
        let root = uf.find(ids[999]).unwrap();
        for x in &ids {
            assert_eq!(uf.find(*x), Some(root));
        }
    }

    #[test]
    fn test_thresholds() {
        let t = ClusteringThresholds::default();
        assert!(t.accepts(0.71, false));
        assert!(!t.accepts(0.7, false));
        assert!(t.accepts(0.51, true));
        assert!(!t.accepts(0.51, false));
        assert!(!t.accepts(0.5, true));
    }

    #[test]
    fn test_scenario_transitive_cluster_of_three() {
        let mentions = vec![
            mention(1, "Jon Smith", Some("Eng"), Some("Acme"), Some(0.9)),
            mention(2, "Jonathan Smith", Some("Engineer"), Some("Acme"), Some(0.8)),
            mention(3, "J. Smith", Some("Eng"), Some("Acme"), Some(0.7)),
        ];
        let sim = table(&[
            ("Jon Smith", "Jonathan Smith", 0.75),
            ("Jonathan Smith", "J. Smith", 0.55),
            ("Jon Smith", "J. Smith", 0.3),
        ]);
        let edges = build_edges(
            &mentions,
            ClusteringThresholds::default(),
            sim,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].left, edges[0].right), (id(1), id(2)));
        assert_eq!((edges[1].left, edges[1].right), (id(2), id(3)));
        assert!(edges[1].organization_match);

        let clusters = cluster_mentions(&mentions, &edges);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![id(1), id(2), id(3)]);

        let groups = propose_groups(&mentions, &clusters);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].has_role_conflicts);
        assert!(!groups[0].has_org_conflicts);
        assert_eq!(groups[0].suggested_name, "Jon Smith");
        assert_eq!(groups[0].members.len(), 3);
        assert_eq!(groups[0].members[0].person_id, clusters[0].root);
        assert_eq!(groups[0].members[0].similarity_score, 1.0);
        assert!(groups[0].members[1..].iter().all(|m| m.similarity_score == 0.8));
    }

    #[test]
    fn test_weak_similarity_without_org_match_is_no_edge() {
        let mentions = vec![
            mention(1, "Jonathan Smith", None, Some("Acme"), None),
            mention(2, "J. Smith", None, Some("acme"), None),
        ];
        let sim = table(&[("Jonathan Smith", "J. Smith", 0.55)]);
        let edges = build_edges(&mentions, ClusteringThresholds::default(), sim, &CancellationToken::new())
            .unwrap();
        assert!(edges.is_empty());
        assert!(cluster_mentions(&mentions, &edges).is_empty());
    }

    #[test]
    fn test_no_singleton_clusters() {
        let mentions = vec![
            mention(1, "Ann Lee", None, None, None),
            mention(2, "Ann Lee", None, None, None),
            mention(3, "Zed Quark", None, None, None),
        ];
        let edges = build_edges(
            &mentions,
            ClusteringThresholds::default(),
            name_similarity,
            &CancellationToken::new(),
        )
        .unwrap();
        let clusters = cluster_mentions(&mentions, &edges);
        assert_eq!(clusters.len(), 1);
        assert!(clusters.iter().all(|c| c.members.len() >= 2));
        assert!(!clusters[0].members.contains(&id(3)));
    }

    #[test]
    fn test_clustering_is_deterministic_under_input_order() {
        let mentions = vec![
            mention(5, "Maria Garcia", None, Some("Acme"), None),
            mention(2, "Maria Garcia", None, None, None),
            mention(9, "Bob Stone", None, None, None),
            mention(4, "Bob Stone", None, None, None),
            mention(7, "Maria Garcia-Lopez", None, Some("Acme"), None),
        ];
        let mut reversed = mentions.clone();
        reversed.reverse();

        let run = |ms: &[PersonMention]| {
            let edges = build_edges(
                ms,
                ClusteringThresholds::default(),
                name_similarity,
                &CancellationToken::new(),
            )
            .unwrap();
            let clusters = cluster_mentions(ms, &edges);
            propose_groups(ms, &clusters)
        };

        let first = run(&mentions);
        let second = run(&reversed);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_cancelled_token_aborts_edge_building() {
        let mentions = vec![
            mention(1, "Ann Lee", None, None, None),
            mention(2, "Ann Lee", None, None, None),
        ];
        let token = CancellationToken::new();
        token.cancel();
        let err = build_edges(&mentions, ClusteringThresholds::default(), name_similarity, &token)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
    }

    #[test]
    fn test_each_pair_compared_once() {
        use std::cell::Cell;
        let mentions: Vec<PersonMention> =
            (1..=6).map(|n| mention(n, "Ann Lee", None, None, None)).collect();
        let calls = Cell::new(0usize);
        let counting = |a: &str, b: &str| {
            calls.set(calls.get() + 1);
            name_similarity(a, b)
        };
        let edges = build_edges(&mentions, ClusteringThresholds::default(), counting, &CancellationToken::new())
            .unwrap();
        assert_eq!(calls.get(), 15);
        assert_eq!(edges.len(), 15);
        assert!(edges.iter().all(|e| e.left < e.right));
    }
}

//! Retrieval-aggregation: over-fetch, group hits per contract, rank, truncate.

use std::collections::{HashMap, HashSet};

use task_store::{RetrievalHit, TaskStore, TaskStoreError};
use tracing::{debug, info};

/// Hits folded under one contract.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractGroup {
    pub contract_id: String,
    /// Smallest distance among the contract's hits.
    pub best_distance: f32,
    /// Distinct task texts in order of first sighting.
    pub tasks: Vec<String>,
}

/// Raw hits requested for `top_n` contracts.
///
/// Several hits usually collapse into one contract, so the index is asked
/// for `top_n²` fragments.
pub fn over_fetch(top_n: usize) -> usize {
    top_n.saturating_mul(top_n)
}

/// Folds hits into groups keyed by contract, in order of first sighting.
pub fn group_hits(hits: impl IntoIterator<Item = RetrievalHit>) -> Vec<ContractGroup> {
    let mut groups: Vec<ContractGroup> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    let mut seen: Vec<HashSet<String>> = Vec::new();

    for hit in hits {
        let RetrievalHit { fragment, distance } = hit;
        match slot.get(&fragment.contract_id) {
            Some(&i) => {
                let g = &mut groups[i];
                if distance < g.best_distance {
                    g.best_distance = distance;
                }
                if seen[i].insert(fragment.text.clone()) {
                    g.tasks.push(fragment.text);
                }
            }
            None => {
                slot.insert(fragment.contract_id.clone(), groups.len());
                seen.push(HashSet::from([fragment.text.clone()]));
                groups.push(ContractGroup {
                    contract_id: fragment.contract_id,
                    best_distance: distance,
                    tasks: vec![fragment.text],
                });
            }
        }
    }
    groups
}

/// Sorts ascending by best distance (ties by contract id) and keeps `top_n`.
pub fn rank_groups(mut groups: Vec<ContractGroup>, top_n: usize) -> Vec<ContractGroup> {
    groups.sort_by(|a, b| {
        a.best_distance
            .total_cmp(&b.best_distance)
            .then_with(|| a.contract_id.cmp(&b.contract_id))
    });
    groups.truncate(top_n);
    groups
}

/// Groups and ranks in one step.
pub fn aggregate(hits: impl IntoIterator<Item = RetrievalHit>, top_n: usize) -> Vec<ContractGroup> {
    rank_groups(group_hits(hits), top_n)
}

/// Queries the store and returns up to `top_n` ranked contract groups.
///
/// Zero hits yield an empty vector.
pub async fn retrieve(
    store: &TaskStore,
    query: &str,
    top_n: usize,
) -> Result<Vec<ContractGroup>, TaskStoreError> {
    let k = over_fetch(top_n);
    let hits = store.similar_tasks(query, k).await?;

    for h in &hits {
        debug!(
            contract_id = %h.fragment.contract_id,
            distance = h.distance,
            text = %preview(&h.fragment.text, 80),
            "hit"
        );
    }
    let raw = hits.len();
    let groups = group_hits(hits);
    let grouped = groups.len();
    let ranked = rank_groups(groups, top_n);

    info!(
        k,
        hits = raw,
        groups = grouped,
        selected = ranked.len(),
        "retrieval aggregated"
    );
    for g in &ranked {
        debug!(
            contract_id = %g.contract_id,
            best_distance = g.best_distance,
            tasks = g.tasks.len(),
            "selected"
        );
    }
    Ok(ranked)
}

fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use task_store::TaskFragment;

    fn hit(text: &str, cid: &str, distance: f32) -> RetrievalHit {
        RetrievalHit {
            fragment: TaskFragment::new(text, cid),
            distance,
        }
    }

    #[test]
    fn over_fetch_squares_and_saturates() {
        assert_eq!(over_fetch(1), 1);
        assert_eq!(over_fetch(5), 25);
        assert_eq!(over_fetch(usize::MAX), usize::MAX);
    }

    #[test]
    fn duplicates_collapse_and_keep_min_distance() {
        let groups = group_hits(vec![
            hit("plan tests", "A", 0.30),
            hit("plan tests", "A", 0.10),
            hit("run tests", "A", 0.20),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].best_distance, 0.10);
        assert_eq!(groups[0].tasks, vec!["plan tests", "run tests"]);
    }

    #[test]
    fn ties_break_on_contract_id() {
        let ranked = aggregate(
            vec![hit("x", "B", 0.5), hit("y", "A", 0.5), hit("z", "C", 0.1)],
            3,
        );
        let ids: Vec<_> = ranked.iter().map(|g| g.contract_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn two_contracts_are_never_padded() {
        let ranked = aggregate(vec![hit("a", "A", 0.1), hit("b", "B", 0.2)], 5);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("ééé", 2), "éé");
        assert_eq!(preview("ab", 5), "ab");
    }

    fn arb_hits() -> impl Strategy<Value = Vec<RetrievalHit>> {
        prop::collection::vec(
            (0u8..6, 0u8..4, 0u32..1000).prop_map(|(c, t, d)| RetrievalHit {
                fragment: TaskFragment::new(format!("task-{t}"), format!("C{c}")),
                distance: d as f32 / 1000.0,
            }),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn ranking_is_bounded_and_sorted(hits in arb_hits(), top_n in 1usize..8) {
            let distinct: HashSet<_> = hits.iter().map(|h| h.fragment.contract_id.clone()).collect();
            let ranked = aggregate(hits, top_n);

            prop_assert!(ranked.len() <= top_n);
            prop_assert!(ranked.len() <= distinct.len());
            for w in ranked.windows(2) {
                prop_assert!(w[0].best_distance <= w[1].best_distance);
            }
        }

        #[test]
        fn groups_hold_min_distance_and_unique_tasks(hits in arb_hits()) {
            let groups = group_hits(hits.clone());
            for g in &groups {
                prop_assert!(!g.tasks.is_empty());
                let unique: HashSet<_> = g.tasks.iter().collect();
                prop_assert_eq!(unique.len(), g.tasks.len());

                let min = hits
                    .iter()
                    .filter(|h| h.fragment.contract_id == g.contract_id)
                    .map(|h| h.distance)
                    .fold(f32::INFINITY, f32::min);
                prop_assert_eq!(g.best_distance, min);
            }
        }
    }
}

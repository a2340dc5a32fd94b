//! Shortest-path search over the undirected view of the graph's edges.
//!
//! Paths are recomputed on every call; edges may have changed since the last
//! query so nothing is cached.

use crate::config::PathMembership;
use crate::graph::Edge;
use crate::holon::HolonId;
use std::collections::{HashMap, HashSet, VecDeque};

/// Find the shortest node-id path from `source_id` to `target_id`.
///
/// Breadth-first search over the edges with direction ignored. Neighbors are
/// visited in edge insertion order, so among equally short paths the first one
/// discovered in level order wins.
///
/// # Returns
/// * `[source_id]` when source and target are the same id
/// * an empty vector when the target is unreachable
pub fn find_path(edges: &[Edge], source_id: &str, target_id: &str) -> Vec<HolonId> {
    if source_id == target_id {
        return vec![source_id.to_string()];
    }

    let adjacency = undirected_adjacency(edges);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut frontier: VecDeque<&str> = VecDeque::new();

    visited.insert(source_id);
    frontier.push_back(source_id);

    while let Some(current) = frontier.pop_front() {
        let Some(neighbors) = adjacency.get(current) else {
            continue;
        };
        for &next in neighbors {
            if !visited.insert(next) {
                continue;
            }
            parent.insert(next, current);

            if next == target_id {
                let mut path = vec![target_id.to_string()];
                let mut cursor = next;
                while let Some(&prev) = parent.get(cursor) {
                    path.push(prev.to_string());
                    cursor = prev;
                }
                path.reverse();
                return path;
            }

            frontier.push_back(next);
        }
    }

    Vec::new()
}

/// Ids of the edges considered part of `path`.
///
/// With [`PathMembership::NodeSet`] an edge qualifies when both endpoints
/// appear anywhere in the path, which can also pick up shortcut edges between
/// non-consecutive path nodes. [`PathMembership::Adjacent`] only accepts edges
/// joining consecutive path nodes (in either direction).
pub fn path_edge_ids<'a>(
    edges: &'a [Edge],
    path: &[HolonId],
    membership: PathMembership,
) -> Vec<&'a str> {
    if path.is_empty() {
        return Vec::new();
    }

    match membership {
        PathMembership::NodeSet => {
            let members: HashSet<&str> = path.iter().map(String::as_str).collect();
            edges
                .iter()
                .filter(|e| members.contains(e.source.as_str()) && members.contains(e.target.as_str()))
                .map(|e| e.id.as_str())
                .collect()
        }
        PathMembership::Adjacent => {
            let steps: HashSet<(&str, &str)> = path
                .windows(2)
                .flat_map(|w| [(w[0].as_str(), w[1].as_str()), (w[1].as_str(), w[0].as_str())])
                .collect();
            edges
                .iter()
                .filter(|e| steps.contains(&(e.source.as_str(), e.target.as_str())))
                .map(|e| e.id.as_str())
                .collect()
        }
    }
}

/// True when `edge` points the same way the path is walked.
///
/// Used to orient the arrow marker: a forward edge keeps its arrow at the
/// target end, a backward one is drawn reversed.
pub fn runs_forward(edge: &Edge, path: &[HolonId]) -> bool {
    let source_pos = path.iter().position(|id| *id == edge.source);
    let target_pos = path.iter().position(|id| *id == edge.target);
    match (source_pos, target_pos) {
        (Some(s), Some(t)) => s < t,
        _ => true,
    }
}

fn undirected_adjacency(edges: &[Edge]) -> HashMap<&str, Vec<&str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        adjacency
            .entry(edge.target.as_str())
            .or_default()
            .push(edge.source.as_str());
    }
    adjacency
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (s, t))| Edge::new(format!("e{}", i), *s, *t))
            .collect()
    }

    fn ids(path: &[&str]) -> Vec<HolonId> {
        path.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_path_through_common_parent() {
        let edges = edges(&[("1", "2"), ("1", "3")]);
        assert_eq!(find_path(&edges, "2", "3"), ids(&["2", "1", "3"]));
    }

    #[test]
    fn test_same_source_and_target() {
        assert_eq!(find_path(&[], "7", "7"), ids(&["7"]));
    }

    #[test]
    fn test_unreachable_target_is_empty() {
        let edges = edges(&[("1", "2"), ("3", "4")]);
        assert!(find_path(&edges, "1", "4").is_empty());
        assert!(find_path(&edges, "1", "missing").is_empty());
        assert!(find_path(&edges, "missing", "1").is_empty());
    }

    #[test]
    fn test_direction_is_ignored() {
        let edges = edges(&[("2", "1"), ("3", "2")]);
        assert_eq!(find_path(&edges, "1", "3"), ids(&["1", "2", "3"]));
    }

    #[test]
    fn test_prefers_shortest_path() {
        // Long way round 1-2-3-4-5 plus a shortcut 1-6-5
        let edges = edges(&[("1", "2"), ("2", "3"), ("3", "4"), ("4", "5"), ("1", "6"), ("6", "5")]);
        assert_eq!(find_path(&edges, "1", "5"), ids(&["1", "6", "5"]));
    }

    #[test]
    fn test_tie_broken_by_edge_order() {
        let edges = edges(&[("1", "2"), ("1", "3"), ("2", "4"), ("3", "4")]);
        assert_eq!(find_path(&edges, "1", "4"), ids(&["1", "2", "4"]));
    }

    #[test]
    fn test_handles_cycles() {
        let edges = edges(&[("1", "2"), ("2", "3"), ("3", "1"), ("3", "4")]);
        assert_eq!(find_path(&edges, "2", "4"), ids(&["2", "3", "4"]));
    }

    // ========================================================================
    // Path membership
    // ========================================================================

    #[test]
    fn test_node_set_membership_includes_shortcuts() {
        // Path 1-2-3 plus a shortcut edge 1-3 that is not on the path
        let edges = edges(&[("1", "2"), ("2", "3"), ("1", "3"), ("3", "4")]);
        let path = ids(&["1", "2", "3"]);

        let in_path = path_edge_ids(&edges, &path, PathMembership::NodeSet);
        assert_eq!(in_path, vec!["e0", "e1", "e2"]);
    }

    #[test]
    fn test_adjacent_membership_excludes_shortcuts() {
        let edges = edges(&[("1", "2"), ("2", "3"), ("1", "3"), ("3", "4")]);
        let path = ids(&["1", "2", "3"]);

        let in_path = path_edge_ids(&edges, &path, PathMembership::Adjacent);
        assert_eq!(in_path, vec!["e0", "e1"]);
    }

    #[test]
    fn test_empty_path_has_no_edges() {
        let edges = edges(&[("1", "2")]);
        assert!(path_edge_ids(&edges, &[], PathMembership::NodeSet).is_empty());
    }

    #[test]
    fn test_runs_forward() {
        let path = ids(&["2", "1", "3"]);
        assert!(!runs_forward(&Edge::new("a", "1", "2"), &path));
        assert!(runs_forward(&Edge::new("b", "1", "3"), &path));
    }
}

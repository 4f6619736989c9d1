use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use super::graph::CallGraph;

/// Betweenness centrality via Brandes' algorithm over unweighted
/// directed shortest paths: the fraction of all-pairs shortest paths
/// that pass through each node. Scores are normalized by
/// (n-1)(n-2) for graphs with more than two nodes, so a node sitting on
/// every shortest path scores 1.0. Results are sorted descending (ties
/// keep discovery order) and truncated to `limit`.
pub fn betweenness(graph: &CallGraph, limit: usize) -> Vec<(String, f64)> {
    let ids = graph.node_ids();
    let n = ids.len();
    if n == 0 {
        return Vec::new();
    }

    let index: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let adj: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| {
            graph
                .successors_of(id)
                .iter()
                .filter_map(|s| index.get(s.as_str()).copied())
                .collect()
        })
        .collect();

    let mut bc = vec![0.0f64; n];

    for s in 0..n {
        // Forward phase: BFS counting shortest paths from s
        let mut finish_order = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![-1i64; n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            finish_order.push(v);
            for &w in &adj[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        // Backward phase: accumulate pair dependencies
        let mut delta = vec![0.0f64; n];
        for &w in finish_order.iter().rev() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                bc[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for b in &mut bc {
            *b *= scale;
        }
    }

    let mut ranked: Vec<(String, f64)> = ids.iter().cloned().zip(bc).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_yields_empty_ranking() {
        let graph = CallGraph::new();
        assert!(graph.betweenness(10).is_empty());
    }

    #[test]
    fn test_middle_of_a_path_is_central() {
        let mut graph = CallGraph::new();
        graph.add_call("A", "B", None);
        graph.add_call("B", "C", None);

        let ranked = graph.betweenness(10);
        // Only the A->C shortest path crosses B; normalized by (n-1)(n-2)=2
        assert_eq!(ranked[0].0, "B");
        assert!((ranked[0].1 - 0.5).abs() < 1e-9);
        assert!(ranked[1].1.abs() < 1e-9);
    }

    #[test]
    fn test_hub_outranks_leaves() {
        // Star through the hub: every cross pair routes through H
        let mut graph = CallGraph::new();
        for leaf in ["A", "B"] {
            graph.add_call(leaf, "H", None);
        }
        for leaf in ["C", "D"] {
            graph.add_call("H", leaf, None);
        }

        let ranked = graph.betweenness(1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, "H");
        assert!(ranked[0].1 > 0.0);
    }

    #[test]
    fn test_limit_truncates() {
        let mut graph = CallGraph::new();
        graph.add_call("A", "B", None);
        graph.add_call("B", "C", None);
        assert_eq!(graph.betweenness(2).len(), 2);
    }
}

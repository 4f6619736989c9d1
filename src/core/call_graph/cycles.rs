use std::collections::HashMap;

use super::graph::CallGraph;

/// Enumerate all simple directed cycles.
///
/// Each cycle is reported once, written starting from its
/// lowest-discovery-index node, which also makes rotations of the same
/// cycle collapse to one report. The search is an explicit-stack DFS per
/// start node, restricted to nodes at or above the start's index (the
/// classical simple-cycle enumeration scheme). Worst-case cost is
/// exponential in graph density, so enumeration stops once `max_cycles`
/// cycles have been collected.
pub fn simple_cycles(graph: &CallGraph, max_cycles: usize) -> Vec<Vec<String>> {
    let ids = graph.node_ids();
    let n = ids.len();
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

    let mut cycles = Vec::new();

    'starts: for start in 0..n {
        // DFS over nodes with index > start; returning to start closes
        // a cycle whose minimal node is start
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        let mut on_path = vec![false; n];
        on_path[start] = true;
        let mut path = vec![start];

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            if cursor < adj[node].len() {
                frame.1 += 1;
                let next = adj[node][cursor];
                if next == start {
                    cycles.push(path.iter().map(|&i| ids[i].clone()).collect());
                    if cycles.len() >= max_cycles {
                        break 'starts;
                    }
                } else if next > start && !on_path[next] {
                    on_path[next] = true;
                    path.push(next);
                    stack.push((next, 0));
                }
            } else {
                stack.pop();
                on_path[node] = false;
                path.pop();
            }
        }
    }

    cycles
}

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FanscopeError;

use super::{centrality, cycles};

/// Node in the call graph. One node per function name; the graph's
/// namespace is flat, matching the scripting language's global function
/// space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphNode {
    /// Function name, unique within the graph
    pub id: String,
    /// Owning module; empty for placeholder nodes created from call
    /// sites whose declaration has not been parsed yet
    pub module: String,
    /// Declared parameter count
    pub param_count: usize,
    /// Approximate source size of the function body
    pub line_count: usize,
    /// Description, truncated for display
    pub description: String,
}

/// Edge in the call graph. At most one edge object exists per ordered
/// (caller, callee) pair; repeated call sites accumulate into weight and
/// the line list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphEdge {
    pub from: String,
    pub to: String,
    /// Number of observed call sites for this pair
    pub weight: usize,
    /// Source lines of those call sites, in observation order
    pub lines: Vec<usize>,
}

/// Traversal direction for neighborhood queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Follow successor edges (who this function calls)
    Forward,
    /// Follow predecessor edges (who calls this function)
    Backward,
    /// Follow both edge sets
    Both,
}

impl FromStr for Direction {
    type Err = FanscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            "both" => Ok(Direction::Both),
            other => Err(FanscopeError::Config(format!(
                "unknown direction '{}' (expected forward, backward or both)",
                other
            ))),
        }
    }
}

/// Directed, edge-weighted call graph of FANSY-SCRIPT functions.
///
/// Mutable shared state for a single-writer ingestion phase; queries are
/// read-only and may run concurrently once ingestion has quiesced, but
/// the graph provides no internal locking — interleaving ingestion with
/// queries is the caller's problem to serialize.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: HashMap<String, CallGraphNode>,
    /// Node ids in discovery order; ranking ties and exports follow it
    order: Vec<String>,
    edges: HashMap<(String, String), CallGraphEdge>,
    edge_order: Vec<(String, String)>,
    successors: HashMap<String, Vec<String>>,
    predecessors: HashMap<String, Vec<String>>,
}

/// Aggregate projection of graph state, shaped for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_functions: usize,
    pub total_calls: usize,
    pub avg_calls_per_function: f64,
    pub most_called: Vec<(String, usize)>,
    pub most_calling: Vec<(String, usize)>,
    pub most_central: Vec<(String, f64)>,
    pub circular_dependencies: usize,
    pub isolated_functions: usize,
    pub by_module: BTreeMap<String, usize>,
}

/// Plain serializable rendition of the whole graph, consumed by the
/// presentation layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub stats: GraphStats,
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<CallGraphEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExport {
    pub id: String,
    pub module: String,
    pub param_count: usize,
    pub line_count: usize,
    pub in_degree: usize,
    pub out_degree: usize,
}

/// Per-function detail: the node's metadata plus its direct neighbors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub module: String,
    pub param_count: usize,
    pub line_count: usize,
    pub description: String,
    pub calls_to: Vec<String>,
    pub called_by: Vec<String>,
    pub in_degree: usize,
    pub out_degree: usize,
}

const DESCRIPTION_LIMIT: usize = 100;

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a function node. Re-declaring an existing node overwrites
    /// its metadata (last write wins, like the signature registry);
    /// discovery order and accumulated edges are untouched.
    pub fn add_function(
        &mut self,
        name: &str,
        module: &str,
        params: &[(String, String)],
        description: &str,
        line_count: usize,
    ) {
        let node = CallGraphNode {
            id: name.to_string(),
            module: module.to_string(),
            param_count: params.len(),
            line_count,
            description: description.chars().take(DESCRIPTION_LIMIT).collect(),
        };

        match self.nodes.get_mut(name) {
            Some(existing) => *existing = node,
            None => self.insert_node(node),
        }
    }

    /// Record one call site. Both endpoints are created as bare
    /// placeholders if not yet declared — a call may reference a
    /// function whose declaration has not been parsed.
    pub fn add_call(&mut self, caller: &str, callee: &str, line: Option<usize>) {
        self.ensure_node(caller);
        self.ensure_node(callee);

        let key = (caller.to_string(), callee.to_string());
        match self.edges.get_mut(&key) {
            Some(edge) => {
                edge.weight += 1;
                if let Some(line) = line {
                    edge.lines.push(line);
                }
            }
            None => {
                self.insert_edge(CallGraphEdge {
                    from: caller.to_string(),
                    to: callee.to_string(),
                    weight: 1,
                    lines: line.into_iter().collect(),
                });
            }
        }
    }

    pub fn node(&self, id: &str) -> Option<&CallGraphNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node ids in discovery order
    pub fn node_ids(&self) -> &[String] {
        &self.order
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&CallGraphEdge> {
        self.edges.get(&(from.to_string(), to.to_string()))
    }

    pub fn successors_of(&self, id: &str) -> &[String] {
        self.successors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessors_of(&self, id: &str) -> &[String] {
        self.predecessors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.predecessors_of(id).len()
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.successors_of(id).len()
    }

    /// Per-function detail, or None for an unknown function
    pub fn function_info(&self, name: &str) -> Option<FunctionInfo> {
        let node = self.nodes.get(name)?;
        Some(FunctionInfo {
            name: node.id.clone(),
            module: node.module.clone(),
            param_count: node.param_count,
            line_count: node.line_count,
            description: node.description.clone(),
            calls_to: self.successors_of(name).to_vec(),
            called_by: self.predecessors_of(name).to_vec(),
            in_degree: self.in_degree(name),
            out_degree: self.out_degree(name),
        })
    }

    /// Induced subgraph over every node reachable from `function` within
    /// `depth` hops along the chosen direction, including the start node.
    /// An absent start node yields an empty graph, not an error.
    pub fn neighborhood(&self, function: &str, depth: usize, direction: Direction) -> CallGraph {
        let mut sub = CallGraph::new();
        if !self.nodes.contains_key(function) {
            return sub;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        visited.insert(function);
        queue.push_back((function, 0));

        while let Some((id, hops)) = queue.pop_front() {
            if hops == depth {
                continue;
            }
            let forward = matches!(direction, Direction::Forward | Direction::Both);
            let backward = matches!(direction, Direction::Backward | Direction::Both);

            if forward {
                for n in self.successors_of(id) {
                    if visited.insert(n.as_str()) {
                        queue.push_back((n.as_str(), hops + 1));
                    }
                }
            }
            if backward {
                for n in self.predecessors_of(id) {
                    if visited.insert(n.as_str()) {
                        queue.push_back((n.as_str(), hops + 1));
                    }
                }
            }
        }

        // Copy nodes and induced edges, preserving this graph's order
        for id in &self.order {
            if visited.contains(id.as_str()) {
                if let Some(node) = self.nodes.get(id) {
                    sub.insert_node(node.clone());
                }
            }
        }
        for key in &self.edge_order {
            if visited.contains(key.0.as_str()) && visited.contains(key.1.as_str()) {
                if let Some(edge) = self.edges.get(key) {
                    sub.insert_edge(edge.clone());
                }
            }
        }

        sub
    }

    /// Minimum-hop path from `from` to `to` as a node sequence; edge
    /// weights are ignored. Empty when either endpoint is absent or no
    /// path exists.
    pub fn shortest_path(&self, from: &str, to: &str) -> Vec<String> {
        if !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            return Vec::new();
        }
        if from == to {
            return vec![from.to_string()];
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(from);

        while let Some(id) = queue.pop_front() {
            for next in self.successors_of(id) {
                if next != from && !parent.contains_key(next.as_str()) {
                    parent.insert(next.as_str(), id);
                    if next == to {
                        // Walk parents back to the start
                        let mut path = vec![to.to_string()];
                        let mut cursor = id;
                        loop {
                            path.push(cursor.to_string());
                            match parent.get(cursor) {
                                Some(&prev) => cursor = prev,
                                None => break,
                            }
                        }
                        path.reverse();
                        return path;
                    }
                    queue.push_back(next.as_str());
                }
            }
        }

        Vec::new()
    }

    /// All simple directed cycles, each reported once regardless of
    /// rotation. Enumeration cost is exponential in graph density in the
    /// worst case, so it stops after `max_cycles` cycles.
    pub fn find_cycles(&self, max_cycles: usize) -> Vec<Vec<String>> {
        cycles::simple_cycles(self, max_cycles)
    }

    /// Betweenness centrality (Brandes), sorted descending and truncated
    pub fn betweenness(&self, limit: usize) -> Vec<(String, f64)> {
        centrality::betweenness(self, limit)
    }

    /// Functions sorted by caller count, descending; ties keep discovery
    /// order
    pub fn rank_by_in_degree(&self, limit: usize) -> Vec<(String, usize)> {
        self.rank_by(limit, |id| self.in_degree(id))
    }

    /// Functions sorted by callee count, descending; ties keep discovery
    /// order
    pub fn rank_by_out_degree(&self, limit: usize) -> Vec<(String, usize)> {
        self.rank_by(limit, |id| self.out_degree(id))
    }

    /// Functions that neither call nor are called
    pub fn isolated(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.in_degree(id) == 0 && self.out_degree(id) == 0)
            .cloned()
            .collect()
    }

    /// Read-only aggregate projection of graph state
    pub fn stats(&self, max_cycles: usize) -> GraphStats {
        let total_functions = self.node_count();
        let total_calls = self.edge_count();
        let avg_calls_per_function = if total_functions > 0 {
            total_calls as f64 / total_functions as f64
        } else {
            0.0
        };

        let mut by_module: BTreeMap<String, usize> = BTreeMap::new();
        for id in &self.order {
            if let Some(node) = self.nodes.get(id) {
                let module = if node.module.is_empty() {
                    "unknown"
                } else {
                    node.module.as_str()
                };
                *by_module.entry(module.to_string()).or_insert(0) += 1;
            }
        }

        GraphStats {
            total_functions,
            total_calls,
            avg_calls_per_function,
            most_called: self.rank_by_in_degree(5),
            most_calling: self.rank_by_out_degree(5),
            most_central: self.betweenness(5),
            circular_dependencies: self.find_cycles(max_cycles).len(),
            isolated_functions: self.isolated().len(),
            by_module,
        }
    }

    /// Flatten the graph into the serializable export shape
    pub fn export(&self, max_cycles: usize) -> GraphExport {
        let nodes = self
            .order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|node| NodeExport {
                id: node.id.clone(),
                module: node.module.clone(),
                param_count: node.param_count,
                line_count: node.line_count,
                in_degree: self.in_degree(&node.id),
                out_degree: self.out_degree(&node.id),
            })
            .collect();

        let edges = self
            .edge_order
            .iter()
            .filter_map(|key| self.edges.get(key))
            .cloned()
            .collect();

        GraphExport {
            stats: self.stats(max_cycles),
            nodes,
            edges,
        }
    }

    fn ensure_node(&mut self, id: &str) {
        if !self.nodes.contains_key(id) {
            self.insert_node(CallGraphNode {
                id: id.to_string(),
                module: String::new(),
                param_count: 0,
                line_count: 0,
                description: String::new(),
            });
        }
    }

    fn insert_node(&mut self, node: CallGraphNode) {
        self.order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    fn insert_edge(&mut self, edge: CallGraphEdge) {
        let key = (edge.from.clone(), edge.to.clone());
        self.successors
            .entry(edge.from.clone())
            .or_default()
            .push(edge.to.clone());
        self.predecessors
            .entry(edge.to.clone())
            .or_default()
            .push(edge.from.clone());
        self.edge_order.push(key.clone());
        self.edges.insert(key, edge);
    }

    fn rank_by<F>(&self, limit: usize, degree: F) -> Vec<(String, usize)>
    where
        F: Fn(&str) -> usize,
    {
        let mut ranked: Vec<(String, usize)> = self
            .order
            .iter()
            .map(|id| (id.clone(), degree(id)))
            .collect();
        // Stable sort keeps discovery order among ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }
}

mod centrality;
mod cycles;
mod graph;

pub use graph::{
    CallGraph, CallGraphEdge, CallGraphNode, Direction, FunctionInfo, GraphExport, GraphStats,
    NodeExport,
};

mod engine;
mod parser;
mod registry;
mod source;

// Error-log correlation
mod correlator;

// Call graph construction and queries
mod call_graph;

pub use parser::{split_arguments, FunctionCall, FunctionSignature, ParsedSource, ScriptParser};
pub use registry::{
    CompatibilityChecker, CompatibilityIssue, IssueKind, Severity, SignatureRegistry,
};
pub use source::{SourceLoader, SourceUnit};
pub use correlator::{ErrorLogEntry, LogCorrelator};

pub use call_graph::{
    CallGraph, CallGraphEdge, CallGraphNode, Direction, FunctionInfo, GraphExport, GraphStats,
    NodeExport,
};

// Export the main engine
pub use engine::{Analysis, AnalysisReport, Engine};

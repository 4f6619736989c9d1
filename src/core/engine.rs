use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;

use super::call_graph::{CallGraph, Direction, GraphExport};
use super::correlator::{ErrorLogEntry, LogCorrelator};
use super::parser::{FunctionCall, ScriptParser};
use super::registry::{CompatibilityChecker, CompatibilityIssue, SignatureRegistry};
use super::source::SourceLoader;

/// Main orchestrator: loads script sources, runs the parser over each
/// unit, feeds the registry and call graph, and cross-checks call sites.
pub struct Engine {
    config: Config,
    parser: ScriptParser,
}

/// Everything one analysis run produced. The registry and graph are
/// owned here, per run — no process-wide state survives between runs.
pub struct Analysis {
    pub graph: CallGraph,
    pub registry: SignatureRegistry,
    pub issues: Vec<CompatibilityIssue>,
    pub units_analyzed: usize,
    pub total_source_lines: usize,
}

/// Serializable report consumed by dashboards and export tooling
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub project: String,
    pub generated_at: String,
    pub units_analyzed: usize,
    pub total_source_lines: usize,
    pub graph: GraphExport,
    pub issues: Vec<CompatibilityIssue>,
}

impl Engine {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        let parser = ScriptParser::new()?;
        Ok(Self { config, parser })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full pipeline over the given source directory (or the
    /// configured ones when none is given)
    pub fn analyze(&self, source: Option<&Path>) -> Result<Analysis> {
        let dirs: Vec<PathBuf> = match source {
            Some(dir) => vec![dir.to_path_buf()],
            None => self.config.project.source_dirs.clone(),
        };

        let loader = SourceLoader::new(&self.config.parsing);
        let mut units = Vec::new();
        for dir in &dirs {
            if !dir.exists() {
                warn!("Source directory {} does not exist, skipping", dir.display());
                continue;
            }
            units.extend(loader.load_directory(dir)?);
        }
        info!("📖 Loaded {} source units", units.len());

        let mut registry = SignatureRegistry::new();
        let mut graph = CallGraph::new();
        let mut all_calls: Vec<FunctionCall> = Vec::new();
        let mut total_source_lines = 0;

        for unit in &units {
            let parsed = self.parser.parse(&unit.content);
            total_source_lines += parsed.total_lines;

            let (name, params, description) = match parsed.header {
                Some(mut signature) => {
                    // The header does not name its module; that comes
                    // from where the unit lives on disk
                    signature.module = unit.module.clone();
                    let keep = (
                        signature.name.clone(),
                        signature.params.clone(),
                        signature.description.clone(),
                    );
                    registry.register(signature);
                    keep
                }
                None => (unit.fallback_name.clone(), Vec::new(), String::new()),
            };

            debug!(
                "Unit {}: function {} with {} calls",
                unit.path.display(),
                name,
                parsed.calls.len()
            );

            graph.add_function(&name, &unit.module, &params, &description, parsed.total_lines);
            for call in &parsed.calls {
                graph.add_call(&name, &call.name, Some(call.line_number));
            }
            all_calls.extend(parsed.calls);
        }

        let checker = CompatibilityChecker::new();
        let issues = checker.check_all(&registry, &all_calls);

        info!(
            "🕸️ Built call graph: {} functions, {} call edges, {} issues",
            graph.node_count(),
            graph.edge_count(),
            issues.len()
        );

        Ok(Analysis {
            graph,
            registry,
            issues,
            units_analyzed: units.len(),
            total_source_lines,
        })
    }

    /// Flatten an analysis into the serializable report shape
    pub fn report(&self, analysis: &Analysis) -> AnalysisReport {
        AnalysisReport {
            project: self.config.project.name.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            units_analyzed: analysis.units_analyzed,
            total_source_lines: analysis.total_source_lines,
            graph: analysis.graph.export(self.config.graph.max_cycles),
            issues: analysis.issues.clone(),
        }
    }

    /// Analyze and write the full JSON report
    pub fn analyze_to_json(
        &self,
        source: Option<&Path>,
        output: Option<&Path>,
    ) -> Result<()> {
        let analysis = self.analyze(source)?;
        let report = self.report(&analysis);
        let json = serde_json::to_string_pretty(&report)?;

        match output {
            Some(path) => {
                std::fs::write(path, json)?;
                info!("✅ Report written to {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }

    /// Print compatibility findings for every call site
    pub fn check(&self, source: Option<&Path>) -> Result<()> {
        let analysis = self.analyze(source)?;

        if analysis.issues.is_empty() {
            println!("No compatibility issues found");
            return Ok(());
        }
        for issue in &analysis.issues {
            println!(
                "{:?} [{:?}] line {}: {}",
                issue.severity, issue.kind, issue.call.line_number, issue.message
            );
        }
        println!("{} issue(s)", analysis.issues.len());
        Ok(())
    }

    /// Print the shortest call path between two functions
    pub fn path(&self, source: Option<&Path>, from: &str, to: &str) -> Result<()> {
        let analysis = self.analyze(source)?;
        let path = analysis.graph.shortest_path(from, to);

        if path.is_empty() {
            println!("No call path from {} to {}", from, to);
        } else {
            println!("{}", path.join(" -> "));
        }
        Ok(())
    }

    /// Print the neighborhood subgraph around a function as JSON
    pub fn inspect(
        &self,
        source: Option<&Path>,
        function: &str,
        depth: Option<usize>,
        direction: Direction,
    ) -> Result<()> {
        let analysis = self.analyze(source)?;
        let depth = depth.unwrap_or(self.config.graph.default_depth);
        let subgraph = analysis.graph.neighborhood(function, depth, direction);

        if let Some(info) = analysis.graph.function_info(function) {
            debug!(
                "{}: in-degree {}, out-degree {}",
                info.name, info.in_degree, info.out_degree
            );
        }

        let export = subgraph.export(self.config.graph.max_cycles);
        println!("{}", serde_json::to_string_pretty(&export)?);
        Ok(())
    }

    /// Print circular call dependencies and the most central functions
    pub fn cycles(&self, source: Option<&Path>) -> Result<()> {
        let analysis = self.analyze(source)?;
        let cycles = analysis.graph.find_cycles(self.config.graph.max_cycles);

        if cycles.is_empty() {
            println!("No circular call dependencies");
        } else {
            for cycle in &cycles {
                println!("{}", cycle.join(" -> "));
            }
            println!("{} cycle(s)", cycles.len());
        }

        let central = analysis.graph.betweenness(self.config.graph.top_limit);
        if !central.is_empty() {
            println!("\nMost central functions:");
            for (name, score) in central {
                println!("  {:.4}  {}", score, name);
            }
        }
        Ok(())
    }

    /// Classify a runtime error log and print the structured entries
    pub fn correlate_file(&self, log: &Path) -> Result<()> {
        let text = std::fs::read_to_string(log)?;
        let entries = self.correlate(&text)?;

        info!("Matched {} of {} log lines", entries.len(), text.lines().count());
        println!("{}", serde_json::to_string_pretty(&entries)?);
        Ok(())
    }

    /// Classify a runtime error log blob
    pub fn correlate(&self, log_text: &str) -> Result<Vec<ErrorLogEntry>> {
        let correlator = LogCorrelator::with_extra_patterns(&self.config.correlator.patterns)?;
        Ok(correlator.correlate(log_text))
    }
}

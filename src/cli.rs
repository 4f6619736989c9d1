use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::{Direction, Engine};

#[derive(Parser)]
#[command(name = "fanscope")]
#[command(about = "Static analyzer and call-graph explorer for FANSY-SCRIPT modules")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze sources and emit the full JSON report
    Analyze {
        /// Source directory to analyze (defaults to configured dirs)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cross-check call sites against known signatures
    Check {
        /// Source directory to analyze
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Shortest call path between two functions
    Path {
        /// Calling function
        from: String,

        /// Called function
        to: String,

        /// Source directory to analyze
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Neighborhood subgraph around a function
    Inspect {
        /// Function to center on
        function: String,

        /// Hop depth (defaults to the configured depth)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Edge direction to follow
        #[arg(long, value_enum, default_value = "both")]
        direction: DirectionArg,

        /// Source directory to analyze
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Circular call dependencies and central functions
    Cycles {
        /// Source directory to analyze
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Classify a runtime error log into structured entries
    Correlate {
        /// Log file to classify
        log: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    Forward,
    Backward,
    Both,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Forward => Direction::Forward,
            DirectionArg::Backward => Direction::Backward,
            DirectionArg::Both => Direction::Both,
        }
    }
}

impl Cli {
    pub fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Analyze { source, output } => {
                engine.analyze_to_json(source.as_deref(), output.as_deref())?
            }
            Commands::Check { source } => engine.check(source.as_deref())?,
            Commands::Path { from, to, source } => {
                engine.path(source.as_deref(), &from, &to)?
            }
            Commands::Inspect {
                function,
                depth,
                direction,
                source,
            } => engine.inspect(source.as_deref(), &function, depth, direction.into())?,
            Commands::Cycles { source } => engine.cycles(source.as_deref())?,
            Commands::Correlate { log } => engine.correlate_file(&log)?,
        }
        Ok(())
    }
}

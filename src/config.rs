use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FanscopeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Source code parsing configuration
    pub parsing: ParsingConfig,

    /// Call graph query settings
    pub graph: GraphConfig,

    /// Error-log correlation settings
    pub correlator: CorrelatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Source directories to analyze
    pub source_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// File extensions treated as FANSY-SCRIPT sources
    pub file_extensions: Vec<String>,

    /// Maximum file size to parse (in bytes)
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Cap on enumerated simple cycles; enumeration is exponential in
    /// graph density in the worst case, so it must be bounded somewhere
    pub max_cycles: usize,

    /// Default hop depth for neighborhood queries
    pub default_depth: usize,

    /// Default truncation for degree/centrality rankings
    pub top_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelatorConfig {
    /// Extra log patterns appended after the built-in set
    pub patterns: Vec<LogPatternConfig>,
}

/// A user-supplied log pattern. The regex may carry named capture groups
/// `func`, `line`, `doc` and `dir`; missing groups default to empty/zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPatternConfig {
    /// Error kind reported for lines matching this pattern
    pub kind: String,

    /// Regular expression applied to each log line
    pub regex: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                name: "Unnamed Project".to_string(),
                source_dirs: vec![PathBuf::from("scripts")],
            },
            parsing: ParsingConfig {
                file_extensions: vec!["txt".to_string(), "fs".to_string(), "fansy".to_string()],
                max_file_size: 1024 * 1024, // 1MB
            },
            graph: GraphConfig {
                max_cycles: 10_000,
                default_depth: 2,
                top_limit: 10,
            },
            correlator: CorrelatorConfig { patterns: vec![] },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| FanscopeError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FanscopeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Fanscope.toml",
                    "fanscope.toml",
                    ".fanscope.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();

        assert_eq!(back.project.name, config.project.name);
        assert_eq!(back.parsing.file_extensions, config.parsing.file_extensions);
        assert_eq!(back.graph.max_cycles, config.graph.max_cycles);
    }

    #[test]
    fn test_missing_path_falls_back_to_default() {
        let config = Config::load_or_default(Some("no/such/fanscope.toml")).unwrap();
        assert_eq!(config.graph.default_depth, 2);
    }
}

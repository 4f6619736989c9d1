use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::LogPatternConfig;
use crate::error::{FanscopeError, Result};

/// Structured entry extracted from a free-text runtime failure log.
/// The kind taxonomy is open: built-in patterns use the kinds below and
/// configured patterns may introduce their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    /// Error kind, e.g. PARAM_NOT_DEFINED, DOC_ERROR, DIR_ERROR
    pub kind: String,

    /// Referenced function name; empty when the pattern carries none
    pub function_name: String,

    /// Referenced source line; zero when absent
    pub line_number: usize,

    /// The original log line
    pub message: String,

    /// Numeric document identifier, when the line carries one
    pub doc_id: Option<u64>,

    /// Numeric directory identifier, when the line carries one
    pub dir_id: Option<u64>,
}

struct LogPattern {
    kind: String,
    regex: Regex,
}

/// Best-effort classifier for runtime error logs.
///
/// Patterns are tried in order against each line; the first match wins
/// and unmatched lines are simply not emitted. Extraction is driven by
/// the named capture groups `func`, `line`, `doc` and `dir`; groups a
/// pattern does not define default to empty/zero.
pub struct LogCorrelator {
    patterns: Vec<LogPattern>,
}

impl LogCorrelator {
    /// Correlator with the built-in production pattern set. The runtime
    /// emits Russian-language diagnostics; the patterns mirror them.
    pub fn new() -> Result<Self> {
        Self::with_extra_patterns(&[])
    }

    /// Built-in patterns first, then the configured extras in order
    pub fn with_extra_patterns(extra: &[LogPatternConfig]) -> Result<Self> {
        let builtin = [
            (
                "PARAM_NOT_DEFINED",
                r"(?i)Не все входные параметры означены.*функци[ияю]\s+(?P<func>\w+).*строка\s+(?P<line>\d+)",
            ),
            ("DOC_ERROR", r"(?i)Ошибка.*doc_id[=:\s]+(?P<doc>\d+)"),
            ("DIR_ERROR", r"(?i)dir_id[=:\s]+(?P<dir>\d+)"),
        ];

        let mut patterns = Vec::with_capacity(builtin.len() + extra.len());
        for (kind, pattern) in builtin {
            patterns.push(LogPattern {
                kind: kind.to_string(),
                regex: compile(pattern)?,
            });
        }
        for config in extra {
            patterns.push(LogPattern {
                kind: config.kind.clone(),
                regex: compile(&config.regex)?,
            });
        }

        Ok(Self { patterns })
    }

    /// Classify every line of a log blob. Never fails: lines no pattern
    /// recognizes produce no entry.
    pub fn correlate(&self, log_text: &str) -> Vec<ErrorLogEntry> {
        let mut entries = Vec::new();

        for line in log_text.lines() {
            for pattern in &self.patterns {
                if let Some(caps) = pattern.regex.captures(line) {
                    let group = |name: &str| {
                        caps.name(name).map(|m| m.as_str().to_string())
                    };

                    entries.push(ErrorLogEntry {
                        kind: pattern.kind.clone(),
                        function_name: group("func").unwrap_or_default(),
                        line_number: group("line")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0),
                        message: line.to_string(),
                        doc_id: group("doc").and_then(|v| v.parse().ok()),
                        dir_id: group("dir").and_then(|v| v.parse().ok()),
                    });
                    break;
                }
            }
        }

        entries
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| FanscopeError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_not_defined_extracts_function_and_line() {
        let correlator = LogCorrelator::new().unwrap();
        let entries = correlator.correlate(
            "Не все входные параметры означены в функции Get_NDFL_Nach, строка 2192",
        );

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, "PARAM_NOT_DEFINED");
        assert_eq!(entries[0].function_name, "Get_NDFL_Nach");
        assert_eq!(entries[0].line_number, 2192);
        assert_eq!(entries[0].doc_id, None);
    }

    #[test]
    fn test_doc_and_dir_ids_land_in_their_own_fields() {
        let correlator = LogCorrelator::new().unwrap();
        let entries = correlator.correlate(
            "Ошибка обработки документа doc_id=48213\nобращение к dir_id: 77\n",
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "DOC_ERROR");
        assert_eq!(entries[0].doc_id, Some(48213));
        assert!(entries[0].function_name.is_empty());
        assert_eq!(entries[1].kind, "DIR_ERROR");
        assert_eq!(entries[1].dir_id, Some(77));
        assert_eq!(entries[1].line_number, 0);
    }

    #[test]
    fn test_unmatched_lines_are_dropped() {
        let correlator = LogCorrelator::new().unwrap();
        let entries = correlator.correlate("calculation finished ok\n\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_first_matching_pattern_wins() {
        // The line carries both ids, but the DOC pattern is earlier in
        // the list so the DIR pattern never runs
        let correlator = LogCorrelator::new().unwrap();
        let entries = correlator.correlate("Ошибка: dir_id=5 doc_id=9");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, "DOC_ERROR");
        assert_eq!(entries[0].doc_id, Some(9));
    }

    #[test]
    fn test_configured_patterns_extend_the_builtin_set() {
        let extra = vec![LogPatternConfig {
            kind: "TIMEOUT".to_string(),
            regex: r"(?i)timeout in (?P<func>\w+) after (?P<line>\d+)".to_string(),
        }];
        let correlator = LogCorrelator::with_extra_patterns(&extra).unwrap();
        let entries = correlator.correlate("timeout in Get_Rate after 30");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, "TIMEOUT");
        assert_eq!(entries[0].function_name, "Get_Rate");
    }

    #[test]
    fn test_bad_configured_pattern_is_an_error() {
        let extra = vec![LogPatternConfig {
            kind: "BROKEN".to_string(),
            regex: "(".to_string(),
        }];
        assert!(LogCorrelator::with_extra_patterns(&extra).is_err());
    }
}

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FanscopeError, Result};

/// Declared shape of a FANSY-SCRIPT function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,

    /// Owning module; empty until resolved from context
    pub module: String,

    /// Ordered (parameter name, declared type) pairs; order is significant
    pub params: Vec<(String, String)>,

    /// Free-text description from the header line
    pub description: String,

    /// 1-based line of the header in the source unit
    pub line_number: usize,
}

impl FunctionSignature {
    /// Arity used for compatibility checks
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(name, ty)| format!("{}:{}", name, ty))
            .collect();
        write!(f, "{}->{}({})", self.module, self.name, params.join(", "))
    }
}

/// A call site found in source, with its own argument list independent
/// of any signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Callee name
    pub name: String,

    /// Callee module (left of the arrow)
    pub module: String,

    /// 1-based source line of the call site
    pub line_number: usize,

    /// Trimmed text of the source line
    pub line_text: String,

    /// Raw argument text fragments, one per top-level argument
    pub args: Vec<String>,
}

impl FunctionCall {
    /// Arity of the call site, always derived from the argument list
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}: {}->{}(...{} args)",
            self.line_number,
            self.module,
            self.name,
            self.arg_count()
        )
    }
}

/// Result of parsing one source unit. Every field degrades to
/// empty/absent on malformed input; parsing never fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSource {
    /// Function header, if the unit declares one
    pub header: Option<FunctionSignature>,

    /// Modules named by the `uses` clause
    pub modules: Vec<String>,

    /// All call sites, in source order
    pub calls: Vec<FunctionCall>,

    /// Total line count of the unit
    pub total_lines: usize,
}

/// Split the text between a call's outer parentheses into top-level
/// arguments. A comma separates arguments only at parenthesis depth
/// zero; nested parens are counted into the current argument's text.
///
/// Unbalanced input is not guarded: a surplus `)` drives the depth
/// negative and later commas no longer split. String literals are not
/// tokenized, so a comma inside quotes is misread as a separator. Both
/// are documented limitations of the micro-grammar; callers must
/// pre-validate if they need stronger guarantees.
pub fn split_arguments(args_str: &str) -> Vec<String> {
    if args_str.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;

    for ch in args_str.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        args.push(current.trim().to_string());
    }

    args
}

/// Parser for the FANSY-SCRIPT micro-grammar.
///
/// Three independent extraction passes run over the same text: the
/// function header (`// Name(%a:int, %b) //== description`), the module
/// dependency clause (`uses A, B;`) and cross-module call sites
/// (`MODULE->Function(args)`).
pub struct ScriptParser {
    header_re: Regex,
    uses_re: Regex,
    call_head_re: Regex,
}

impl ScriptParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            header_re: compile(r"(?m)//\s*(\w+)\((.*?)\)\s*//==\s*(.*?)$")?,
            uses_re: compile(r"(?i)uses\s+([\w,\s]+);")?,
            call_head_re: compile(r"(\w+)->(\w+)\s*\(")?,
        })
    }

    /// Run all three extraction passes over one source unit
    pub fn parse(&self, code: &str) -> ParsedSource {
        ParsedSource {
            header: self.parse_header(code),
            modules: self.parse_uses(code),
            calls: self.parse_calls(code),
            total_lines: code.split('\n').count(),
        }
    }

    /// Extract the first function header. Absence is a normal outcome,
    /// not an error: many source fragments carry no header.
    pub fn parse_header(&self, code: &str) -> Option<FunctionSignature> {
        let caps = self.header_re.captures(code)?;
        let (whole, name, params_str, description) =
            match (caps.get(0), caps.get(1), caps.get(2), caps.get(3)) {
                (Some(w), Some(n), Some(p), Some(d)) => (w, n, p, d),
                _ => return None,
            };

        let line_number = code[..whole.start()]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            + 1;

        Some(FunctionSignature {
            name: name.as_str().to_string(),
            // Resolved from context by the caller (directory layout, config)
            module: String::new(),
            params: parse_params(params_str.as_str()),
            description: description.as_str().trim_end().to_string(),
            line_number,
        })
    }

    /// Extract the module list from the `uses` clause; empty when absent
    pub fn parse_uses(&self, code: &str) -> Vec<String> {
        let Some(caps) = self.uses_re.captures(code) else {
            return Vec::new();
        };
        let Some(modules) = caps.get(1) else {
            return Vec::new();
        };

        modules
            .as_str()
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// Find all cross-module call sites, line by line. Comment lines are
    /// never scanned. The argument text is captured by walking to the
    /// matching close paren, so nested call expressions stay intact
    /// inside a single argument.
    pub fn parse_calls(&self, code: &str) -> Vec<FunctionCall> {
        let mut calls = Vec::new();

        for (i, line) in code.split('\n').enumerate() {
            if line.trim_start().starts_with("//") {
                continue;
            }

            let mut pos = 0;
            while let Some(caps) = self.call_head_re.captures_at(line, pos) {
                let (Some(whole), Some(module), Some(name)) =
                    (caps.get(0), caps.get(1), caps.get(2))
                else {
                    break;
                };

                // The match ends just past the opening paren
                match find_closing_paren(line, whole.end()) {
                    Some(close) => {
                        let args = split_arguments(&line[whole.end()..close]);
                        calls.push(FunctionCall {
                            name: name.as_str().to_string(),
                            module: module.as_str().to_string(),
                            line_number: i + 1,
                            line_text: line.trim().to_string(),
                            args,
                        });
                        pos = close + 1;
                    }
                    // Unterminated argument list: record nothing and keep
                    // scanning for later heads on the same line
                    None => pos = whole.end(),
                }
            }
        }

        calls
    }
}

/// Parse a header parameter list. Parameters are `%name:type` or bare
/// `%name` (type "unknown"); splitting reuses the depth logic of
/// [`split_arguments`].
fn parse_params(params_str: &str) -> Vec<(String, String)> {
    split_arguments(params_str)
        .into_iter()
        .map(|param| match param.split_once(':') {
            Some((name, ty)) => (
                name.trim().trim_start_matches('%').to_string(),
                ty.trim().to_string(),
            ),
            None => (param.trim_start_matches('%').to_string(), "unknown".to_string()),
        })
        .collect()
}

/// Byte index of the `)` that closes the paren opened just before
/// `start`, or None if the list never closes on this line
fn find_closing_paren(line: &str, start: usize) -> Option<usize> {
    let mut depth = 1;
    for (offset, ch) in line[start..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
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

    fn parser() -> ScriptParser {
        ScriptParser::new().unwrap()
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split_arguments("").is_empty());
        assert!(split_arguments("   ").is_empty());
    }

    #[test]
    fn test_split_top_level_commas() {
        assert_eq!(split_arguments("1, 2, 3"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_split_keeps_nested_group_as_one_argument() {
        assert_eq!(split_arguments("1,(2,3)"), vec!["1", "(2,3)"]);
        assert_eq!(
            split_arguments("a, F(b, G(c, d)), e"),
            vec!["a", "F(b, G(c, d))", "e"]
        );
    }

    #[test]
    fn test_split_reconstructs_balanced_input() {
        let input = "x, (y, z), w(1)";
        let args = split_arguments(input);
        assert_eq!(args.join(", "), input);
    }

    #[test]
    fn test_split_unbalanced_depth_goes_negative() {
        // Known limitation: a surplus close paren suppresses later splits
        assert_eq!(split_arguments("a), b"), vec!["a), b"]);
    }

    #[test]
    fn test_header_with_typed_params() {
        let sig = parser()
            .parse_header("// Get_Rate(%date:DATE, %currency:STRING) //== currency rate")
            .unwrap();
        assert_eq!(sig.name, "Get_Rate");
        assert_eq!(
            sig.params,
            vec![
                ("date".to_string(), "DATE".to_string()),
                ("currency".to_string(), "STRING".to_string())
            ]
        );
        assert_eq!(sig.description, "currency rate");
        assert_eq!(sig.line_number, 1);
        assert!(sig.module.is_empty());
    }

    #[test]
    fn test_header_bare_param_gets_unknown_type() {
        let sig = parser().parse_header("// Foo(%a) //== x").unwrap();
        assert_eq!(sig.params, vec![("a".to_string(), "unknown".to_string())]);
    }

    #[test]
    fn test_header_absent_is_none_not_error() {
        assert!(parser().parse_header("var x := 1;").is_none());
        assert!(parser().parse_header("").is_none());
    }

    #[test]
    fn test_header_line_number_is_one_based() {
        let code = "var a := 1;\nvar b := 2;\n// Foo(%a) //== late header\n";
        let sig = parser().parse_header(code).unwrap();
        assert_eq!(sig.line_number, 3);
    }

    #[test]
    fn test_uses_clause() {
        assert_eq!(
            parser().parse_uses("uses _F_BUX, _F_DOC;"),
            vec!["_F_BUX", "_F_DOC"]
        );
        // Keyword is case-insensitive
        assert_eq!(parser().parse_uses("USES _F_ECO;"), vec!["_F_ECO"]);
        assert!(parser().parse_uses("var x := 1;").is_empty());
    }

    #[test]
    fn test_calls_skip_comment_lines() {
        let code = "// MOD->Ghost(1)\nMOD->Real(1)\n";
        let calls = parser().parse_calls(code);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "Real");
        assert_eq!(calls[0].line_number, 2);
    }

    #[test]
    fn test_multiple_calls_on_one_line() {
        let calls = parser().parse_calls("x := A->F(1) + B->G(2, 3);");
        assert_eq!(calls.len(), 2);
        assert_eq!((calls[0].module.as_str(), calls[0].arg_count()), ("A", 1));
        assert_eq!((calls[1].module.as_str(), calls[1].arg_count()), ("B", 2));
    }

    #[test]
    fn test_nested_call_argument_stays_whole() {
        let calls = parser().parse_calls("MOD->Foo(1,(2,3))");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["1", "(2,3)"]);
        assert_eq!(calls[0].arg_count(), 2);
    }

    #[test]
    fn test_unterminated_call_is_skipped() {
        let calls = parser().parse_calls("A->F(1, 2\nB->G(3)");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "G");
    }

    #[test]
    fn test_parse_is_total_and_idempotent() {
        let code = "// Foo(%a:int,%b:string) //== test\nuses X, Y;\nMOD->Foo(1,(2,3))\n";
        let first = parser().parse(code);
        let second = parser().parse(code);

        assert_eq!(first.header, second.header);
        assert_eq!(first.modules, second.modules);
        assert_eq!(first.calls, second.calls);
        assert_eq!(first.total_lines, 4);
    }

    #[test]
    fn test_end_to_end_example() {
        let code = "// Foo(%a:int,%b:string) //== test\nuses X, Y;\nMOD->Foo(1,(2,3))\n";
        let parsed = parser().parse(code);

        let header = parsed.header.unwrap();
        assert_eq!(header.name, "Foo");
        assert_eq!(
            header.params,
            vec![
                ("a".to_string(), "int".to_string()),
                ("b".to_string(), "string".to_string())
            ]
        );
        assert_eq!(parsed.modules, vec!["X", "Y"]);
        assert_eq!(parsed.calls.len(), 1);
        let call = &parsed.calls[0];
        assert_eq!((call.module.as_str(), call.name.as_str()), ("MOD", "Foo"));
        assert_eq!(call.line_number, 3);
        assert_eq!(call.args, vec!["1", "(2,3)"]);
    }

    #[test]
    fn test_display_forms() {
        let sig = FunctionSignature {
            name: "Foo".into(),
            module: "MOD".into(),
            params: vec![("a".into(), "int".into())],
            description: String::new(),
            line_number: 1,
        };
        assert_eq!(sig.to_string(), "MOD->Foo(a:int)");

        let call = FunctionCall {
            name: "Foo".into(),
            module: "MOD".into(),
            line_number: 7,
            line_text: "MOD->Foo(1)".into(),
            args: vec!["1".into()],
        };
        assert_eq!(call.to_string(), "Line 7: MOD->Foo(...1 args)");
    }
}

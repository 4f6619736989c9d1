use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::parser::{FunctionCall, FunctionSignature};

/// Known function signatures, keyed by (module, name).
///
/// Registering the same key twice overwrites: last write wins. That is a
/// deliberate choice — signature dumps for the same module are loaded
/// newest-last, so the freshest declaration is the one that should be
/// checked against.
#[derive(Debug, Default)]
pub struct SignatureRegistry {
    signatures: HashMap<(String, String), FunctionSignature>,
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, signature: FunctionSignature) {
        let key = (signature.module.clone(), signature.name.clone());
        self.signatures.insert(key, signature);
    }

    pub fn lookup(&self, module: &str, name: &str) -> Option<&FunctionSignature> {
        self.signatures.get(&(module.to_string(), name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    UnknownFunction,
    ParamCountMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warning,
    Error,
}

/// A compatibility finding for a single call site. Issues are data, not
/// failures: analysis always continues past them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub call: FunctionCall,
    /// The matched signature, when one exists
    pub signature: Option<FunctionSignature>,
    pub message: String,
}

/// Cross-checks call sites against the registry's signatures
#[derive(Debug, Default)]
pub struct CompatibilityChecker;

impl CompatibilityChecker {
    pub fn new() -> Self {
        Self
    }

    /// Classify one call site. A call to an unregistered function is a
    /// warning only — it may be legitimate but undocumented in the
    /// loaded signature set, and must not block analysis. A matched
    /// signature with matching arity produces no issue at all.
    pub fn check(
        &self,
        registry: &SignatureRegistry,
        call: &FunctionCall,
    ) -> Option<CompatibilityIssue> {
        let Some(signature) = registry.lookup(&call.module, &call.name) else {
            return Some(CompatibilityIssue {
                kind: IssueKind::UnknownFunction,
                severity: Severity::Warning,
                call: call.clone(),
                signature: None,
                message: format!(
                    "Function {}->{} not found in the signature registry",
                    call.module, call.name
                ),
            });
        };

        if call.arg_count() != signature.param_count() {
            return Some(CompatibilityIssue {
                kind: IssueKind::ParamCountMismatch,
                severity: Severity::Error,
                call: call.clone(),
                signature: Some(signature.clone()),
                message: format!(
                    "{}->{} expects {} parameters, call passes {}",
                    call.module,
                    call.name,
                    signature.param_count(),
                    call.arg_count()
                ),
            });
        }

        None
    }

    /// Check every call in input order; only non-empty findings are
    /// returned, without deduplication
    pub fn check_all(
        &self,
        registry: &SignatureRegistry,
        calls: &[FunctionCall],
    ) -> Vec<CompatibilityIssue> {
        calls
            .iter()
            .filter_map(|call| self.check(registry, call))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(module: &str, name: &str, arity: usize) -> FunctionSignature {
        FunctionSignature {
            name: name.to_string(),
            module: module.to_string(),
            params: (0..arity)
                .map(|i| (format!("p{}", i), "unknown".to_string()))
                .collect(),
            description: String::new(),
            line_number: 1,
        }
    }

    fn call(module: &str, name: &str, args: &[&str]) -> FunctionCall {
        FunctionCall {
            name: name.to_string(),
            module: module.to_string(),
            line_number: 1,
            line_text: String::new(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_matching_arity_yields_no_issue() {
        let mut registry = SignatureRegistry::new();
        registry.register(signature("MOD", "Foo", 2));

        let checker = CompatibilityChecker::new();
        assert!(checker
            .check(&registry, &call("MOD", "Foo", &["1", "2"]))
            .is_none());
    }

    #[test]
    fn test_arity_mismatch_is_an_error() {
        let mut registry = SignatureRegistry::new();
        registry.register(signature("MOD", "Foo", 2));

        let checker = CompatibilityChecker::new();
        let issue = checker
            .check(&registry, &call("MOD", "Foo", &["1"]))
            .unwrap();

        assert_eq!(issue.kind, IssueKind::ParamCountMismatch);
        assert_eq!(issue.severity, Severity::Error);
        assert!(issue.message.contains('2') && issue.message.contains('1'));
        assert!(issue.signature.is_some());
    }

    #[test]
    fn test_unknown_function_is_a_warning() {
        let registry = SignatureRegistry::new();
        let checker = CompatibilityChecker::new();
        let issue = checker
            .check(&registry, &call("MOD", "Bar", &["1"]))
            .unwrap();

        assert_eq!(issue.kind, IssueKind::UnknownFunction);
        assert_eq!(issue.severity, Severity::Warning);
        assert!(issue.signature.is_none());
    }

    #[test]
    fn test_register_overwrites_last_write_wins() {
        let mut registry = SignatureRegistry::new();
        registry.register(signature("MOD", "Foo", 2));
        registry.register(signature("MOD", "Foo", 3));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("MOD", "Foo").unwrap().param_count(), 3);
    }

    #[test]
    fn test_check_all_preserves_input_order() {
        let mut registry = SignatureRegistry::new();
        registry.register(signature("MOD", "Foo", 1));

        let checker = CompatibilityChecker::new();
        let calls = vec![
            call("MOD", "Bar", &[]),
            call("MOD", "Foo", &["1"]),
            call("MOD", "Foo", &["1", "2"]),
            call("MOD", "Bar", &[]),
        ];
        let issues = checker.check_all(&registry, &calls);

        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].kind, IssueKind::UnknownFunction);
        assert_eq!(issues[1].kind, IssueKind::ParamCountMismatch);
        assert_eq!(issues[2].kind, IssueKind::UnknownFunction);
    }
}

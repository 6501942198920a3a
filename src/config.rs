//! Compile options supplied by the host editor.

use serde::{Deserialize, Serialize};

/// How the validator reports findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// Run every check and report everything found.
    #[default]
    CollectAll,
    /// Stop after the first check that reports a problem.
    FailFast,
}

/// Textual layout of the generated DSL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layout {
    /// Single line, `", "` between arguments.
    #[default]
    Compact,
    /// One construct per line, 2-space indentation.
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub validation: ValidationMode,
    pub layout: Layout,
}

impl CompileOptions {
    pub fn pretty() -> Self {
        Self {
            layout: Layout::Pretty,
            ..Self::default()
        }
    }

    pub fn fail_fast() -> Self {
        Self {
            validation: ValidationMode::FailFast,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let opts: CompileOptions = serde_json::from_str(r#"{"layout": "pretty"}"#).unwrap();
        assert_eq!(opts.layout, Layout::Pretty);
        assert_eq!(opts.validation, ValidationMode::CollectAll);
    }

    #[test]
    fn fail_fast_parses() {
        let opts: CompileOptions = serde_json::from_str(r#"{"validation": "failFast"}"#).unwrap();
        assert_eq!(opts, CompileOptions::fail_fast());
    }
}

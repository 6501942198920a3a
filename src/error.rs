//! Unified compiler error type used across all phases.
//!
//! Validator findings and compiler contract violations share this type so a
//! caller can surface both the same way.

use serde::{Deserialize, Serialize};

use crate::ir::validate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Parse,
    Validate,
    Lower,
    IrValidate,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Validate => write!(f, "Validate"),
            Phase::Lower => write!(f, "Lower"),
            Phase::IrValidate => write!(f, "IR Validate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{phase}:{code}] {message}{}", location_suffix(.node_id, .edge_id))]
pub struct CompilerError {
    pub code: String,
    pub phase: Phase,
    pub message: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

fn location_suffix(node_id: &Option<String>, edge_id: &Option<String>) -> String {
    match (node_id, edge_id) {
        (Some(node), Some(edge)) => format!(" (node '{}', edge '{}')", node, edge),
        (Some(node), None) => format!(" (node '{}')", node),
        (None, Some(edge)) => format!(" (edge '{}')", edge),
        (None, None) => String::new(),
    }
}

impl From<ValidationError> for CompilerError {
    fn from(e: ValidationError) -> Self {
        CompilerError::ir(e.code, e.message, e.location)
    }
}

impl CompilerError {
    fn new(phase: Phase, code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase,
            message: message.into(),
            node_id,
            edge_id: None,
        }
    }

    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        Self::new(Phase::Parse, code, message, None)
    }

    pub fn validate(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::new(Phase::Validate, code, message, node_id)
    }

    pub fn lower(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::new(Phase::Lower, code, message, node_id)
    }

    pub fn ir(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::new(Phase::IrValidate, code, message, node_id)
    }

    /// Attach the offending edge id.
    pub fn with_edge(mut self, edge_id: Option<&str>) -> Self {
        self.edge_id = edge_id.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_node_and_edge() {
        let err = CompilerError::validate("V003", "missing 'false' branch", Some("b1".into()))
            .with_edge(Some("e4"));
        assert_eq!(
            err.to_string(),
            "[Validate:V003] missing 'false' branch (node 'b1', edge 'e4')"
        );
    }

    #[test]
    fn display_without_location() {
        let err = CompilerError::parse("P001", "bad json");
        assert_eq!(err.to_string(), "[Parse:P001] bad json");
    }
}

//! Expression tree invariant validation.
//!
//! Checks that a lowered `Expr` can be serialized into well-formed DSL text
//! before codegen runs.

use std::collections::HashSet;

use crate::ir::types::*;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
    /// Business id of the construct where the error was found, if applicable.
    pub location: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(id) => write!(f, "[{}] {} (at '{}')", self.code, self.message, id),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Validate an expression tree against all invariants. Returns all errors found.
pub fn validate_ir(expr: &Expr) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    walk(expr, &mut errors);
    errors
}

fn walk(expr: &Expr, errors: &mut Vec<ValidationError>) {
    match expr {
        Expr::Field(field) => {
            check_business_id(&field.business_id, errors);
            if let Some(data) = &field.data {
                for (key, _) in data {
                    if !is_data_key(key) {
                        errors.push(ValidationError {
                            code: "E005",
                            message: format!("Invalid data key '{}'", key),
                            location: Some(field.business_id.clone()),
                        });
                    }
                }
            }
        }
        Expr::Then { items } => {
            if items.is_empty() {
                errors.push(ValidationError {
                    code: "E001",
                    message: "THEN must contain at least one expression".into(),
                    location: None,
                });
            }
            items.iter().for_each(|e| walk(e, errors));
        }
        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => {
            check_business_id(condition, errors);
            walk(then_branch, errors);
            walk(else_branch, errors);
        }
        Expr::Switch {
            selector,
            cases,
            default,
        } => {
            check_business_id(selector, errors);
            if cases.is_empty() {
                errors.push(ValidationError {
                    code: "E003",
                    message: "SWITCH must have at least one tagged case".into(),
                    location: Some(selector.clone()),
                });
            }
            let mut seen = HashSet::new();
            for case in cases {
                if !is_case_tag(&case.tag) {
                    errors.push(ValidationError {
                        code: "E004",
                        message: format!("Invalid case tag '{}'", case.tag),
                        location: Some(selector.clone()),
                    });
                } else if !seen.insert(case.tag.as_str()) {
                    errors.push(ValidationError {
                        code: "E004",
                        message: format!("Duplicate case tag '{}'", case.tag),
                        location: Some(selector.clone()),
                    });
                }
                walk(&case.body, errors);
            }
            if let Some(d) = default {
                walk(d, errors);
            }
        }
        Expr::For { counter, body } => {
            check_business_id(counter, errors);
            walk(body, errors);
        }
        Expr::When { branches } => {
            if branches.len() < 2 {
                errors.push(ValidationError {
                    code: "E002",
                    message: format!(
                        "WHEN must have at least 2 branches, found {}",
                        branches.len()
                    ),
                    location: None,
                });
            }
            branches.iter().for_each(|e| walk(e, errors));
        }
    }
}

/// Business ids are written unquoted, so they must not contain DSL punctuation.
pub fn is_dsl_identifier(id: &str) -> bool {
    !id.is_empty()
        && !id
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ',' | '\'' | '\\'))
}

/// Keys sit unescaped inside `.data('...')`.
pub fn is_data_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['=', ',', '\'', '\\'])
}

/// Tags sit unescaped inside `.tag('...')`.
pub fn is_case_tag(tag: &str) -> bool {
    !tag.is_empty() && !tag.contains(['\'', '\\'])
}

fn check_business_id(id: &str, errors: &mut Vec<ValidationError>) {
    if !is_dsl_identifier(id) {
        errors.push(ValidationError {
            code: "E005",
            message: format!("Business id '{}' cannot be written as a DSL identifier", id),
            location: Some(id.to_string()),
        });
    }
}

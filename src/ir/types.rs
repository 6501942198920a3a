//! Expression tree for the flow DSL.
//!
//! Lowering builds this tree from the graph; codegen serializes it. Keeping
//! the two apart lets the lowering logic be tested against tree shape and
//! keeps quoting and separators in one place.

use serde::{Deserialize, Serialize};

/// A lowered flow expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expr {
    /// A single unit of work: `businessId` or `businessId.data('...')`.
    Field(FieldExpr),
    /// `THEN(a, b, ...)`
    Then { items: Vec<Expr> },
    /// `IF(cond, then, else)`
    If {
        condition: String,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `SWITCH(sel).to(a.tag('x'), ...).DEFAULT(d)`
    Switch {
        selector: String,
        cases: Vec<TaggedExpr>,
        default: Option<Box<Expr>>,
    },
    /// `FOR(counter).DO(body)`
    For { counter: String, body: Box<Expr> },
    /// `WHEN(a, b, ...)`
    When { branches: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedExpr {
    pub tag: String,
    pub body: Expr,
}

/// Canonical encoding of one task node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldExpr {
    pub business_id: String,
    /// `key=value` pairs, already escaped. `None` renders the bare business id.
    pub data: Option<Vec<(String, String)>>,
}

impl Expr {
    /// Wrap a run of expressions: one element stays bare, more become `THEN`.
    pub fn sequence(mut items: Vec<Expr>) -> Expr {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Then { items }
        }
    }

    pub fn then(items: Vec<Expr>) -> Expr {
        Expr::Then { items }
    }

    pub fn field(business_id: impl Into<String>) -> Expr {
        Expr::Field(FieldExpr {
            business_id: business_id.into(),
            data: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_of_one_is_unwrapped() {
        let e = Expr::sequence(vec![Expr::field("a")]);
        assert_eq!(e, Expr::field("a"));
    }

    #[test]
    fn sequence_of_many_is_then() {
        let e = Expr::sequence(vec![Expr::field("a"), Expr::field("b")]);
        assert!(matches!(e, Expr::Then { ref items } if items.len() == 2));
    }
}

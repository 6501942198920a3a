//! Codegen pass: Expr → DSL text.
//!
//! Public API: `render(expr, layout) -> String`
//!
//! The token spelling here is what execution engines parse, so `THEN(`,
//! `IF(`, `SWITCH(`…`).to(`…`.DEFAULT(`, `FOR(`…`).DO(`, `WHEN(`, `.tag('`
//! and `.data('` must not change.

mod pretty;
mod writer;

use std::fmt::{self, Write as _};

use crate::config::Layout;
use crate::ir::types::{Expr, FieldExpr};

/// Serialize an expression tree in the requested layout.
pub fn render(expr: &Expr, layout: Layout) -> String {
    let text = match layout {
        Layout::Compact => expr.to_string(),
        Layout::Pretty => pretty::render_pretty(expr),
    };
    tracing::debug!(?layout, len = text.len(), "Rendered flow expression");
    text
}

/// `businessId` or `businessId.data('k=v,...')`.
pub(crate) fn field_text(field: &FieldExpr) -> String {
    match &field.data {
        None => field.business_id.clone(),
        Some(pairs) => {
            let kv: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{}.data('{}')", field.business_id, kv.join(","))
        }
    }
}

/// Compact single-line layout.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Field(field) => f.write_str(&field_text(field)),
            Expr::Then { items } => write_call(f, "THEN", items),
            Expr::When { branches } => write_call(f, "WHEN", branches),
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "IF({}, {}, {})", condition, then_branch, else_branch),
            Expr::Switch {
                selector,
                cases,
                default,
            } => {
                write!(f, "SWITCH({}).to(", selector)?;
                for (i, case) in cases.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}.tag('{}')", case.body, case.tag)?;
                }
                f.write_char(')')?;
                if let Some(default) = default {
                    write!(f, ".DEFAULT({})", default)?;
                }
                Ok(())
            }
            Expr::For { counter, body } => write!(f, "FOR({}).DO({})", counter, body),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expr]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    f.write_char(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::TaggedExpr;

    fn data_field(id: &str, pairs: &[(&str, &str)]) -> Expr {
        Expr::Field(FieldExpr {
            business_id: id.into(),
            data: Some(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        })
    }

    fn sample() -> Expr {
        Expr::then(vec![
            data_field("a", &[("id", "n1"), ("nodeId", "a"), ("type", "common")]),
            Expr::Switch {
                selector: "route".into(),
                cases: vec![
                    TaggedExpr {
                        tag: "x".into(),
                        body: Expr::field("b"),
                    },
                    TaggedExpr {
                        tag: "y".into(),
                        body: Expr::then(vec![Expr::field("c"), Expr::field("d")]),
                    },
                ],
                default: Some(Box::new(Expr::field("e"))),
            },
            Expr::For {
                counter: "loop".into(),
                body: Box::new(Expr::When {
                    branches: vec![Expr::field("f"), Expr::field("g")],
                }),
            },
        ])
    }

    #[test]
    fn compact_spelling() {
        assert_eq!(
            render(&sample(), Layout::Compact),
            "THEN(a.data('id=n1,nodeId=a,type=common'), \
             SWITCH(route).to(b.tag('x'), THEN(c, d).tag('y')).DEFAULT(e), \
             FOR(loop).DO(WHEN(f, g)))"
        );
    }

    #[test]
    fn if_spelling() {
        let e = Expr::If {
            condition: "cond".into(),
            then_branch: Box::new(Expr::field("a")),
            else_branch: Box::new(Expr::field("b")),
        };
        assert_eq!(e.to_string(), "IF(cond, a, b)");
    }

    #[test]
    fn switch_without_default() {
        let e = Expr::Switch {
            selector: "s".into(),
            cases: vec![TaggedExpr {
                tag: "A".into(),
                body: Expr::field("a"),
            }],
            default: None,
        };
        assert_eq!(e.to_string(), "SWITCH(s).to(a.tag('A'))");
    }

    #[test]
    fn pretty_layout() {
        let expected = "\
THEN(
  a.data('id=n1,nodeId=a,type=common'),
  SWITCH(route).to(
    b.tag('x'),
    THEN(
      c,
      d
    ).tag('y')
  ).DEFAULT(
    e
  ),
  FOR(loop).DO(
    WHEN(
      f,
      g
    )
  )
)";
        assert_eq!(render(&sample(), Layout::Pretty), expected);
    }

    #[test]
    fn pretty_and_compact_share_tokens() {
        let strip = |s: String| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(
            strip(render(&sample(), Layout::Pretty)),
            strip(render(&sample(), Layout::Compact))
        );
    }
}

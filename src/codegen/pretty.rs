//! Multi-line layout: each construct opens on its own line and its
//! arguments are indented one level. Tokens match the compact layout.

use crate::ir::types::Expr;

use super::field_text;
use super::writer::CodeWriter;

pub fn render_pretty(expr: &Expr) -> String {
    let mut w = CodeWriter::new();
    write_expr(&mut w, expr, "");
    w.finish()
}

/// Write `expr`, appending `suffix` to its last line.
fn write_expr(w: &mut CodeWriter, expr: &Expr, suffix: &str) {
    let close = format!("){}", suffix);
    match expr {
        Expr::Field(field) => w.line(&format!("{}{}", field_text(field), suffix)),
        Expr::Then { items } => w.nested("THEN(", &close, |w| write_list(w, items)),
        Expr::When { branches } => w.nested("WHEN(", &close, |w| write_list(w, branches)),
        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => w.nested(&format!("IF({},", condition), &close, |w| {
            write_expr(w, then_branch, ",");
            write_expr(w, else_branch, "");
        }),
        Expr::Switch {
            selector,
            cases,
            default,
        } => {
            let head = format!("SWITCH({}).to(", selector);
            let write_cases = |w: &mut CodeWriter| {
                for (i, case) in cases.iter().enumerate() {
                    let sep = if i + 1 < cases.len() { "," } else { "" };
                    write_expr(w, &case.body, &format!(".tag('{}'){}", case.tag, sep));
                }
            };
            match default {
                Some(default) => {
                    w.nested(&head, ").DEFAULT(", write_cases);
                    w.indent();
                    write_expr(w, default, "");
                    w.dedent();
                    w.line(&close);
                }
                None => w.nested(&head, &close, write_cases),
            }
        }
        Expr::For { counter, body } => w.nested(&format!("FOR({}).DO(", counter), &close, |w| {
            write_expr(w, body, "");
        }),
    }
}

fn write_list(w: &mut CodeWriter, items: &[Expr]) {
    for (i, item) in items.iter().enumerate() {
        let sep = if i + 1 < items.len() { "," } else { "" };
        write_expr(w, item, sep);
    }
}

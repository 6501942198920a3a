//! Task node emission: node → field expression.

use crate::error::CompilerError;
use crate::ir::types::{Expr, FieldExpr};
use crate::parse::types::{FlowNode, ParamValue};

/// Build the field for a task node.
///
/// The data list starts with `id`, `nodeId` and `type`, followed by every
/// set parameter in declared order. A node that declares no parameters at
/// all renders as its bare business id.
///
/// String values escape `\` first and then `'`, so a value can never close
/// the `.data('...')` quote early.
pub fn lower_field(node: &FlowNode) -> Result<Expr, CompilerError> {
    let business_id = node.business_id().ok_or_else(|| {
        CompilerError::lower(
            "L002",
            format!("Node '{}' is missing data.nodeId", node.id),
            Some(node.id.clone()),
        )
    })?;

    if node.data.params.is_empty() {
        return Ok(Expr::field(business_id));
    }

    let mut data = vec![
        ("id".to_string(), node.id.clone()),
        ("nodeId".to_string(), business_id.to_string()),
        ("type".to_string(), node.node_type.clone()),
    ];
    data.extend(
        node.set_params()
            .map(|(name, value)| (name.to_string(), render_value(value))),
    );

    Ok(Expr::Field(FieldExpr {
        business_id: business_id.to_string(),
        data: Some(data),
    }))
}

/// Control nodes appear in the DSL by bare business id.
pub fn control_id(node: &FlowNode) -> Result<String, CompilerError> {
    node.business_id().map(str::to_string).ok_or_else(|| {
        CompilerError::lower(
            "L002",
            format!("{} node '{}' is missing data.nodeId", node.node_type, node.id),
            Some(node.id.clone()),
        )
    })
}

fn render_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Text(s) => s.replace('\\', "\\\\").replace('\'', "\\'"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{NodeData, NodeParam};

    fn task(params: Vec<(&str, Option<ParamValue>)>) -> FlowNode {
        FlowNode {
            id: "n1".into(),
            node_type: "common".into(),
            data: NodeData {
                node_id: Some("fetch".into()),
                params: params
                    .into_iter()
                    .map(|(name, value)| NodeParam {
                        name: Some(name.into()),
                        value,
                    })
                    .collect(),
                label: None,
            },
            position: None,
        }
    }

    fn data_of(expr: Expr) -> Vec<(String, String)> {
        match expr {
            Expr::Field(FieldExpr { data: Some(d), .. }) => d,
            other => panic!("Expected field with data, got {:?}", other),
        }
    }

    #[test]
    fn base_fields_come_first() {
        let data = data_of(lower_field(&task(vec![("a", Some("1".into()))])).unwrap());
        let keys: Vec<&str> = data.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["id", "nodeId", "type", "a"]);
        assert_eq!(data[2].1, "common");
    }

    #[test]
    fn quotes_are_escaped() {
        let data = data_of(lower_field(&task(vec![("msg", Some("it's".into()))])).unwrap());
        assert_eq!(data[3], ("msg".to_string(), "it\\'s".to_string()));
    }

    #[test]
    fn trailing_backslash_cannot_swallow_the_quote() {
        let data = data_of(lower_field(&task(vec![("p", Some(r"C:\dir\".into()))])).unwrap());
        assert_eq!(data[3].1, r"C:\\dir\\");
    }

    #[test]
    fn backslash_before_quote_stays_escaped() {
        let data = data_of(lower_field(&task(vec![("p", Some(r"a\'b".into()))])).unwrap());
        assert_eq!(data[3].1, r"a\\\'b");
    }

    #[test]
    fn no_params_renders_bare_id() {
        assert_eq!(lower_field(&task(vec![])).unwrap(), Expr::field("fetch"));
    }

    #[test]
    fn all_params_unset_still_emits_base_fields() {
        let data = data_of(lower_field(&task(vec![("b", Some("".into())), ("c", None)])).unwrap());
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn missing_business_id_is_a_contract_error() {
        let mut node = task(vec![]);
        node.data.node_id = None;
        let err = lower_field(&node).unwrap_err();
        assert_eq!(err.code, "L002");
        assert_eq!(err.node_id.as_deref(), Some("n1"));
    }
}

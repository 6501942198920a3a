//! Rust types mirroring the flow editor's graph snapshot.
//!
//! These types are the serde target for the editor's JSON. The editor is a
//! VueFlow canvas, so nodes carry their kind in `type` and business data
//! under `data`, and edges carry their branch label in `sourceHandle`.

use serde::{Deserialize, Serialize};

/// Branch label marking a fork's parallel outputs.
pub const PARALLEL_HANDLE: &str = "parallel";
pub const TRUE_HANDLE: &str = "true";
pub const FALSE_HANDLE: &str = "false";
pub const DEFAULT_HANDLE: &str = "default";
pub const BODY_HANDLE: &str = "body";
pub const NEXT_HANDLE: &str = "next";

// =============================================================================
// SNAPSHOT
// =============================================================================

/// An immutable snapshot of the editor graph, taken per compile request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowSnapshot {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl FlowSnapshot {
    pub fn new(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Self {
        Self { nodes, edges }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl FlowEdge {
    pub fn handle(&self) -> Option<&str> {
        self.source_handle.as_deref()
    }

    /// Editor edge id, or a synthesized `source->target` when the editor omitted it.
    pub fn display_id(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}->{}", self.source, self.target),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    /// Raw editor type tag. Kept verbatim so it can be echoed into the field
    /// string and reported when unknown.
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Business id: the component this node invokes in the execution engine.
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub params: Vec<NodeParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeParam {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<ParamValue>,
}

/// A scalar parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl ParamValue {
    /// Whether the value counts as "not set". Only blank strings qualify;
    /// `0` and `false` are real values.
    pub fn is_blank(&self) -> bool {
        matches!(self, ParamValue::Text(s) if s.trim().is_empty())
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Number(n.into())
    }
}

/// The closed set of node kinds the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Entry,
    Task,
    Boolean,
    Switch,
    Loop,
    Fork,
}

impl NodeKind {
    /// Map an editor type tag onto a kind. Returns `None` for unknown tags.
    pub fn from_type(node_type: &str) -> Option<NodeKind> {
        match node_type {
            "start" | "input" | "entry" => Some(NodeKind::Entry),
            "common" | "task" | "default" | "output" => Some(NodeKind::Task),
            "boolean" | "if" => Some(NodeKind::Boolean),
            "switch" => Some(NodeKind::Switch),
            "for" | "loop" => Some(NodeKind::Loop),
            "when" | "fork" => Some(NodeKind::Fork),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeKind::Entry => "entry",
            NodeKind::Task => "task",
            NodeKind::Boolean => "boolean",
            NodeKind::Switch => "switch",
            NodeKind::Loop => "loop",
            NodeKind::Fork => "fork",
        };
        write!(f, "{}", s)
    }
}

impl FlowNode {
    pub fn kind(&self) -> Option<NodeKind> {
        NodeKind::from_type(&self.node_type)
    }

    pub fn is_entry(&self) -> bool {
        self.kind() == Some(NodeKind::Entry)
    }

    pub fn is_loop(&self) -> bool {
        self.kind() == Some(NodeKind::Loop)
    }

    /// Non-blank business id, if any.
    pub fn business_id(&self) -> Option<&str> {
        self.data
            .node_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// Parameters that are set, in declared order.
    pub fn set_params(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.data.params.iter().filter_map(|p| {
            let name = p.name.as_deref().filter(|n| !n.is_empty())?;
            let value = p.value.as_ref().filter(|v| !v.is_blank())?;
            Some((name, value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_aliases() {
        assert_eq!(NodeKind::from_type("input"), Some(NodeKind::Entry));
        assert_eq!(NodeKind::from_type("start"), Some(NodeKind::Entry));
        assert_eq!(NodeKind::from_type("common"), Some(NodeKind::Task));
        assert_eq!(NodeKind::from_type("if"), Some(NodeKind::Boolean));
        assert_eq!(NodeKind::from_type("for"), Some(NodeKind::Loop));
        assert_eq!(NodeKind::from_type("when"), Some(NodeKind::Fork));
        assert_eq!(NodeKind::from_type("script"), None);
    }

    #[test]
    fn set_params_keeps_zero_and_false() {
        let node: FlowNode = serde_json::from_str(
            r#"{
                "id": "n1",
                "type": "common",
                "data": {
                    "nodeId": "a",
                    "params": [
                        {"name": "a", "value": "1"},
                        {"name": "b", "value": ""},
                        {"name": "c", "value": 0},
                        {"name": "d", "value": false},
                        {"name": "e", "value": null},
                        {"name": "f"},
                        {"name": "", "value": "x"},
                        {"name": "g", "value": "   "}
                    ]
                }
            }"#,
        )
        .unwrap();

        let params: Vec<(String, String)> = node
            .set_params()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("a".to_string(), "1".to_string()),
                ("c".to_string(), "0".to_string()),
                ("d".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn blank_business_id_is_none() {
        let node: FlowNode =
            serde_json::from_str(r#"{"id": "n1", "type": "common", "data": {"nodeId": " "}}"#)
                .unwrap();
        assert_eq!(node.business_id(), None);
    }
}

//! WASM entry points for the browser editor.

use wasm_bindgen::prelude::*;

use crate::config::{CompileOptions, Layout};
use crate::error::CompilerError;

/// Validate a flow JSON: parse + graph validation.
/// Returns a JSON array of error objects (empty when the graph is valid).
#[wasm_bindgen]
pub fn validate_flow(json: &str) -> JsValue {
    let result = validate_flow_inner(json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_flow_inner(json: &str) -> Vec<ErrorDto> {
    let snapshot = match crate::parse::parse(json) {
        Ok(s) => s,
        Err(errors) => return errors.into_iter().map(ErrorDto::from).collect(),
    };

    crate::validate_flow(&snapshot, &CompileOptions::default())
        .diagnostics()
        .iter()
        .cloned()
        .map(ErrorDto::from)
        .collect()
}

/// Full pipeline: parse → validate → lower → tree check → render.
/// Returns a JSON object with either `el` (success) or `errors` (failure).
#[wasm_bindgen]
pub fn compile_flow(json: &str, pretty: bool) -> JsValue {
    let result = compile_flow_inner(json, pretty);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn compile_flow_inner(json: &str, pretty: bool) -> CompileResult {
    let options = CompileOptions {
        layout: if pretty { Layout::Pretty } else { Layout::Compact },
        ..CompileOptions::default()
    };

    match crate::compile_json(json, &options) {
        Ok(el) => CompileResult::Success { el },
        Err(errors) => CompileResult::Errors {
            errors: errors.into_iter().map(ErrorDto::from).collect(),
        },
    }
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: String,
    phase: String,
    message: String,
    node_id: Option<String>,
    edge_id: Option<String>,
}

impl From<CompilerError> for ErrorDto {
    fn from(e: CompilerError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
            node_id: e.node_id,
            edge_id: e.edge_id,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status")]
enum CompileResult {
    #[serde(rename = "success")]
    Success { el: String },
    #[serde(rename = "errors")]
    Errors { errors: Vec<ErrorDto> },
}

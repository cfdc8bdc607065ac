//! Canonical form of markdown bodies.
//!
//! Bodies arrive either as a verbose root tree
//! (`{"type":"root","children":[{"type":"element","tag":"p",...}]}`) or in
//! the compact minimark form (`{"type":"minimark","value":[["p",{},"text"]]}`).
//! Both are reduced to the minimark node list before comparison.

use serde_json::{json, Map, Value};

/// Reduce a markdown body to its minimark node list.
pub fn to_minimark(body: &Value) -> Vec<Value> {
    let Some(obj) = body.as_object() else {
        return Vec::new();
    };

    match obj.get("type").and_then(Value::as_str) {
        Some("minimark") => obj
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        Some("root") => obj
            .get("children")
            .and_then(Value::as_array)
            .map(|children| children.iter().filter_map(compress_node).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn compress_node(node: &Value) -> Option<Value> {
    let obj = node.as_object()?;
    match obj.get("type").and_then(Value::as_str) {
        Some("text") => Some(obj.get("value").cloned().unwrap_or(json!(""))),
        Some("element") => {
            let tag = obj.get("tag").cloned().unwrap_or(json!("div"));
            let props = obj
                .get("props")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));

            let mut compressed = vec![tag, props];
            if let Some(children) = obj.get("children").and_then(Value::as_array) {
                compressed.extend(children.iter().filter_map(compress_node));
            }
            Some(Value::Array(compressed))
        }
        // comments and unknown nodes carry no content
        _ => None,
    }
}

/// Drop a trailing `style` node.
pub fn strip_trailing_style(mut nodes: Vec<Value>) -> Vec<Value> {
    let is_style = nodes
        .last()
        .and_then(|node| node.as_array())
        .and_then(|node| node.first())
        .and_then(Value::as_str)
        == Some("style");

    if is_style {
        nodes.pop();
    }
    nodes
}

/// Canonical string used to compare two markdown bodies.
pub fn canonical_body(body: &Value) -> String {
    let nodes = strip_trailing_style(to_minimark(body));
    Value::Array(nodes).to_string()
}

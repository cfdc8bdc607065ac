//! A basic content converter.
//!
//! Supports markdown with YAML front matter, YAML and JSON files. Markdown
//! bodies are kept at block level: headings, fenced code and paragraphs
//! become minimark nodes with their inline text untouched.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::ContentConverter;
use crate::compare::markdown::{strip_trailing_style, to_minimark};
use crate::error::{Result, StudioError};
use crate::models::{route_from_stem, DocumentItem};

/// Keys owned by the document structure itself.
const RESERVED_KEYS: &[&str] = &["id", "fsPath", "extension", "stem", "body", "meta"];

/// Keys never written back to files.
const SKIPPED_KEYS: &[&str] = &["__hash__"];

#[derive(Debug, Default, Clone, Copy)]
pub struct BasicConverter;

impl BasicConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContentConverter for BasicConverter {
    async fn document_from_content(&self, id: &str, content: &str) -> Result<Option<DocumentItem>> {
        let mut doc = DocumentItem::new(id);

        match doc.extension.as_str() {
            "md" => {
                let (front_matter, body) = split_front_matter(content);
                if let Some(front_matter) = front_matter {
                    let data = parse_yaml(front_matter)?;
                    assign_data(&mut doc, data);
                }
                if doc.path.is_none() {
                    doc.path = Some(route_from_stem(&doc.stem));
                }
                doc.body = json!({
                    "type": "minimark",
                    "value": parse_markdown_blocks(body),
                });
            }
            "yml" | "yaml" => {
                let data = parse_yaml(content)?;
                assign_data(&mut doc, data);
            }
            "json" => {
                let data: Value = if content.trim().is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(content)?
                };
                assign_data(&mut doc, data);
            }
            other => {
                tracing::debug!("[draft] No converter for extension '{}' ({})", other, id);
                return Ok(None);
            }
        }

        Ok(Some(doc))
    }

    async fn content_from_document(&self, document: &DocumentItem) -> Result<Option<String>> {
        let data = writable_fields(document);

        let content = match document.extension.as_str() {
            "md" => {
                let mut out = String::new();
                if !data.is_empty() {
                    let yaml = serde_yaml::to_string(&data)
                        .map_err(|e| StudioError::Content(e.to_string()))?;
                    out.push_str("---\n");
                    out.push_str(&yaml);
                    out.push_str("---\n\n");
                }

                let blocks: Vec<String> = strip_trailing_style(to_minimark(&document.body))
                    .iter()
                    .map(render_block)
                    .collect();
                if !blocks.is_empty() {
                    out.push_str(&blocks.join("\n\n"));
                    out.push('\n');
                }
                out
            }
            "yml" | "yaml" => {
                let value = data_or_body(document, data);
                if value.is_null() {
                    String::new()
                } else {
                    serde_yaml::to_string(&value).map_err(|e| StudioError::Content(e.to_string()))?
                }
            }
            "json" => {
                let value = data_or_body(document, data);
                format!("{}\n", serde_json::to_string_pretty(&value)?)
            }
            _ => return Ok(None),
        };

        Ok(Some(content))
    }
}

fn parse_yaml(content: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(content).map_err(|e| StudioError::Content(e.to_string()))
}

/// Object data becomes flat fields; anything else is the body.
fn assign_data(doc: &mut DocumentItem, data: Value) {
    match data {
        Value::Object(map) => {
            for (key, value) in map {
                if key == "path" {
                    if let Value::String(path) = &value {
                        doc.path = Some(path.clone());
                        continue;
                    }
                }
                if RESERVED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                doc.fields.insert(key, value);
            }
        }
        Value::Null => {}
        other => doc.body = other,
    }
}

fn writable_fields(doc: &DocumentItem) -> Map<String, Value> {
    doc.fields
        .iter()
        .filter(|(k, _)| !SKIPPED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn data_or_body(doc: &DocumentItem, data: Map<String, Value>) -> Value {
    if data.is_empty() {
        doc.body.clone()
    } else {
        Value::Object(data)
    }
}

/// Split `---` delimited front matter from the markdown body.
fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, content)
}

fn parse_markdown_blocks(body: &str) -> Vec<Value> {
    let mut nodes = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut lines = body.lines();

    while let Some(line) = lines.next() {
        let line = line.trim_end();

        if let Some(language) = line.strip_prefix("```") {
            flush_paragraph(&mut paragraph, &mut nodes);

            let mut code = Vec::new();
            for inner in lines.by_ref() {
                if inner.trim_end() == "```" {
                    break;
                }
                code.push(inner);
            }

            let mut props = Map::new();
            let language = language.trim();
            if !language.is_empty() {
                props.insert("language".to_string(), json!(language));
            }
            nodes.push(json!(["pre", props, ["code", {}, code.join("\n")]]));
            continue;
        }

        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut nodes);
            continue;
        }

        if let Some((level, text)) = heading(line) {
            flush_paragraph(&mut paragraph, &mut nodes);
            nodes.push(json!([format!("h{}", level), {}, text]));
            continue;
        }

        paragraph.push(line);
    }

    flush_paragraph(&mut paragraph, &mut nodes);
    nodes
}

fn flush_paragraph(paragraph: &mut Vec<&str>, nodes: &mut Vec<Value>) {
    if paragraph.is_empty() {
        return;
    }
    nodes.push(json!(["p", {}, paragraph.join("\n")]));
    paragraph.clear();
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let text = line[level..].strip_prefix(' ')?;
    Some((level, text.trim()))
}

fn render_block(node: &Value) -> String {
    let Some(parts) = node.as_array() else {
        return node.as_str().unwrap_or_default().to_string();
    };

    let tag = parts.first().and_then(Value::as_str).unwrap_or_default();
    let children = parts.get(2..).unwrap_or_default();

    match tag {
        "pre" => {
            let language = parts
                .get(1)
                .and_then(|props| props.get("language"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            format!("```{}\n{}\n```", language, inline_text(children))
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            format!("{} {}", "#".repeat(level), inline_text(children))
        }
        _ => inline_text(children),
    }
}

fn inline_text(nodes: &[Value]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            Value::String(s) => s.clone(),
            Value::Array(parts) => inline_text(parts.get(2..).unwrap_or_default()),
            _ => String::new(),
        })
        .collect()
}

//! Semantic document equality.
//!
//! Two documents are equal when they would render to the same file:
//! markdown bodies are compared in canonical minimark form and flat data is
//! normalized (see [`normalize::refine`]) before a deep comparison.

pub mod markdown;
pub mod normalize;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::host::ContentConverter;
use crate::models::DocumentItem;

pub use markdown::canonical_body;

/// Keys that are never part of the comparable flat data.
const NON_DATA_KEYS: &[&str] = &["fsPath"];

/// Semantic equality of two documents.
pub fn documents_equal(a: &DocumentItem, b: &DocumentItem) -> bool {
    compare(a, b, false)
}

/// Whether `raw` content parses to a document equal to `document`.
///
/// Newlines inside markdown bodies are not significant here.
pub async fn matches_raw_content(
    converter: &dyn ContentConverter,
    raw: &str,
    document: &DocumentItem,
) -> Result<bool> {
    let Some(generated) = converter.document_from_content(&document.id, raw).await? else {
        return Ok(false);
    };

    Ok(compare(&generated, document, true))
}

fn compare(a: &DocumentItem, b: &DocumentItem, ignore_newlines: bool) -> bool {
    let bodies_equal = if a.is_markdown() {
        let mut body_a = canonical_body(&a.body);
        let mut body_b = canonical_body(&b.body);
        if ignore_newlines {
            body_a = strip_newlines(&body_a);
            body_b = strip_newlines(&body_b);
        }
        body_a == body_b
    } else {
        a.body == b.body
    };

    bodies_equal && comparable_data(a) == comparable_data(b)
}

/// Flat fields merged with `meta`, then normalized.
fn comparable_data(doc: &DocumentItem) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("id".to_string(), Value::String(doc.id.clone()));
    data.insert(
        "extension".to_string(),
        Value::String(doc.extension.clone()),
    );
    data.insert("stem".to_string(), Value::String(doc.stem.clone()));

    for (key, value) in doc.fields.iter().chain(doc.meta.iter()) {
        if NON_DATA_KEYS.contains(&key.as_str()) {
            continue;
        }
        data.insert(key.clone(), value.clone());
    }

    normalize::refine(data)
}

// Escaped newlines inside serialized strings are removed along with raw ones
fn strip_newlines(canonical: &str) -> String {
    canonical.replace("\\n", "").replace('\n', "")
}

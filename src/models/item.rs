//! Content items tracked by the draft engine.
//!
//! Two kinds of items exist: structured documents (stored under `content/`)
//! and binary media (stored under `public/`). Both are identified by an `id`
//! of the form `<collection>/<fsPath>`.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection name used for media item ids.
pub const MEDIA_COLLECTION: &str = "public-assets";

/// The two families of items handled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Document,
    Media,
}

impl ItemKind {
    /// Directory in the remote repository holding items of this kind.
    pub fn remote_dir(&self) -> &'static str {
        match self {
            ItemKind::Document => "content",
            ItemKind::Media => "public",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Document => "document",
            ItemKind::Media => "media",
        }
    }
}

/// Common behaviour of every item a draft can wrap.
pub trait StudioItem:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ItemKind;

    fn id(&self) -> &str;

    /// Path relative to the kind's root directory.
    ///
    /// Falls back to the id minus its collection segment when the item was
    /// built without an explicit path.
    fn fs_path(&self) -> String;

    fn extension(&self) -> &str;

    /// Public route of the item, if it has one.
    fn route_path(&self) -> Option<&str>;

    /// Semantic equality used for status derivation.
    fn is_equivalent(&self, other: &Self) -> bool;

    fn as_document(&self) -> Option<&DocumentItem> {
        None
    }
}

/// A structured document (markdown, yaml or json).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentItem {
    pub id: String,

    #[serde(rename = "fsPath", default, skip_serializing_if = "Option::is_none")]
    pub fs_path: Option<String>,

    pub extension: String,

    #[serde(default)]
    pub stem: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Parsed body. Markdown bodies are minimark trees.
    #[serde(default)]
    pub body: Value,

    #[serde(default)]
    pub meta: Map<String, Value>,

    /// Front matter and any other top-level field.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DocumentItem {
    /// Create an empty document for `id`, deriving stem and extension from it.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let fs_path = fs_path_from_id(&id);
        Self {
            extension: file_extension(&fs_path).to_string(),
            stem: stem_from_fs_path(&fs_path),
            fs_path: Some(fs_path),
            id,
            path: None,
            body: Value::Null,
            meta: Map::new(),
            fields: Map::new(),
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.extension == "md"
    }
}

impl StudioItem for DocumentItem {
    const KIND: ItemKind = ItemKind::Document;

    fn id(&self) -> &str {
        &self.id
    }

    fn fs_path(&self) -> String {
        match &self.fs_path {
            Some(p) if !p.is_empty() => p.clone(),
            _ => fs_path_from_id(&self.id),
        }
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn route_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    fn is_equivalent(&self, other: &Self) -> bool {
        crate::compare::documents_equal(self, other)
    }

    fn as_document(&self) -> Option<&DocumentItem> {
        Some(self)
    }
}

/// A binary media file carried as a data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,

    #[serde(rename = "fsPath", default, skip_serializing_if = "Option::is_none")]
    pub fs_path: Option<String>,

    pub extension: String,

    #[serde(default)]
    pub stem: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// `data:<mime>;base64,<payload>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MediaItem {
    /// Build a media item at `fs_path` from raw bytes.
    pub fn from_bytes(fs_path: &str, bytes: &[u8], mime: &str) -> Self {
        use base64::Engine;

        let fs_path = fs_path.trim_start_matches('/').to_string();
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            id: format!("{}/{}", MEDIA_COLLECTION, fs_path),
            extension: file_extension(&fs_path).to_string(),
            stem: stem_from_fs_path(&fs_path),
            path: Some(format!("/{}", fs_path)),
            raw: Some(format!("data:{};base64,{}", mime, encoded)),
            fs_path: Some(fs_path),
            fields: Map::new(),
        }
    }

    /// The base64 payload of `raw` without its data-URL header.
    pub fn base64_payload(&self) -> Option<&str> {
        let raw = self.raw.as_deref()?;
        Some(strip_data_url_header(raw))
    }
}

impl StudioItem for MediaItem {
    const KIND: ItemKind = ItemKind::Media;

    fn id(&self) -> &str {
        &self.id
    }

    fn fs_path(&self) -> String {
        match &self.fs_path {
            Some(p) if !p.is_empty() => p.clone(),
            _ => fs_path_from_id(&self.id),
        }
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn route_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    fn is_equivalent(&self, other: &Self) -> bool {
        self == other
    }
}

/// Strip the collection segment from an id.
pub fn fs_path_from_id(id: &str) -> String {
    match id.split_once('/') {
        Some((_, rest)) => rest.to_string(),
        None => id.to_string(),
    }
}

/// Extension of the last path segment, without the dot.
pub fn file_extension(fs_path: &str) -> &str {
    let name = fs_path.rsplit('/').next().unwrap_or(fs_path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        Some(0) => &name[1..],
        _ => "",
    }
}

/// Path without its final extension.
pub fn stem_from_fs_path(fs_path: &str) -> String {
    let trimmed = fs_path.trim_start_matches('/');
    let name_start = trimmed.rfind('/').map(|i| i + 1).unwrap_or(0);
    match trimmed[name_start..].rfind('.') {
        Some(idx) if idx > 0 => trimmed[..name_start + idx].to_string(),
        _ => trimmed.to_string(),
    }
}

/// Split a numeric ordering prefix off a path segment: `2.intro` → (`2`, `intro`).
pub fn split_numeric_prefix(segment: &str) -> (Option<&str>, &str) {
    let digits = segment.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && segment.as_bytes().get(digits) == Some(&b'.') {
        (Some(&segment[..digits]), &segment[digits + 1..])
    } else {
        (None, segment)
    }
}

/// Public route for a document stem: ordering prefixes and a trailing
/// `index` are dropped.
pub fn route_from_stem(stem: &str) -> String {
    let mut segments: Vec<&str> = stem
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| split_numeric_prefix(s).1)
        .collect();

    if segments.last() == Some(&"index") {
        segments.pop();
    }

    format!("/{}", segments.join("/"))
}

/// Remove a leading `data:<mime>;base64,` header if present.
pub fn strip_data_url_header(raw: &str) -> &str {
    if !raw.starts_with("data:") {
        return raw;
    }
    match raw.find(";base64,") {
        Some(idx) => &raw[idx + ";base64,".len()..],
        None => raw,
    }
}

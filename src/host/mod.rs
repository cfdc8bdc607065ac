//! Collaborators supplied by the host application.
//!
//! The engine never parses content, stores drafts or queries content on its
//! own. It talks to these traits, which are injected once per session:
//!
//! - [`Database`]: the queryable projection of current content
//! - [`DraftStorage`]: key-value persistence for drafts
//! - [`ContentConverter`]: raw file content ⇄ structured document
//!
//! In-memory and filesystem implementations are provided for the CLI and
//! for tests.

pub mod content;
pub mod fs_storage;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{DocumentItem, StudioItem};

pub use content::BasicConverter;
pub use fs_storage::FsStorage;
pub use memory::{MemoryDatabase, MemoryStorage};

/// Queryable projection of current content for one item kind.
#[async_trait]
pub trait Database<T: StudioItem>: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<T>>;

    /// All items, in a stable order.
    async fn list(&self) -> Result<Vec<T>>;

    async fn upsert(&self, id: &str, item: T) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Filesystem path (relative to the kind's root) for an id.
    fn fs_path(&self, id: &str) -> String;

    /// Inverse of [`Database::fs_path`].
    fn id_from_fs_path(&self, fs_path: &str) -> String;
}

/// Key-value persistence for serialized drafts.
#[async_trait]
pub trait DraftStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<Value>>;

    async fn set_item(&self, key: &str, value: Value) -> Result<()>;

    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Keys in insertion order.
    async fn get_keys(&self) -> Result<Vec<String>>;

    async fn clear(&self) -> Result<()>;
}

/// Conversion between raw file content and structured documents.
#[async_trait]
pub trait ContentConverter: Send + Sync {
    /// Parse `content` into a document with the given id.
    ///
    /// Returns `Ok(None)` when the format is not supported.
    async fn document_from_content(&self, id: &str, content: &str)
        -> Result<Option<DocumentItem>>;

    /// Render a document back to file content.
    async fn content_from_document(&self, document: &DocumentItem) -> Result<Option<String>>;
}

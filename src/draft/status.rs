//! Draft status derivation.

use crate::models::{DraftItem, DraftStatus, StudioItem};

/// Status of `modified` relative to the item it was opened from.
///
/// No original, or an original with another id (a rename), means the item
/// is new at this id.
pub fn derive_status<T: StudioItem>(modified: &T, original: Option<&T>) -> DraftStatus {
    match original {
        None => DraftStatus::Created,
        Some(original) if original.id() != modified.id() => DraftStatus::Created,
        Some(original) if modified.is_equivalent(original) => DraftStatus::Pristine,
        Some(_) => DraftStatus::Updated,
    }
}

/// Whether `candidate` is `id` itself or lives below it.
pub fn is_same_or_descendant(candidate: &str, id: &str) -> bool {
    candidate == id
        || candidate
            .strip_prefix(id)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Ids of the drafts at or below `id`, in list order.
pub fn find_descendant_ids<T>(drafts: &[DraftItem<T>], id: &str) -> Vec<String> {
    drafts
        .iter()
        .filter(|d| is_same_or_descendant(&d.id, id))
        .map(|d| d.id.clone())
        .collect()
}

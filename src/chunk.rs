//! Batch chunking for bulk-lookup endpoints
//!
//! Bulk endpoints accept a comma-joined `ids` query parameter with a hard
//! per-request cardinality limit that varies by resource kind. The chunker is
//! pure and order-preserving; it never deduplicates. Callers that need unique
//! ids build an ordered unique set before chunking.

/// Maximum ids per request for the bulk albums endpoint.
pub const ALBUMS_BATCH_LIMIT: usize = 20;

/// Maximum ids per request for the bulk artists endpoint.
pub const ARTISTS_BATCH_LIMIT: usize = 50;

/// Maximum ids per request for the bulk audio-features endpoint.
pub const AUDIO_FEATURES_BATCH_LIMIT: usize = 100;

/// Split `ids` into groups of at most `size` elements, preserving input order.
///
/// Concatenating the returned groups always reproduces the input exactly.
/// The final group carries the remainder and may be shorter.
pub fn chunk<T: Clone>(ids: &[T], size: usize) -> Vec<Vec<T>> {
    debug_assert!(size > 0, "chunk size must be at least 1");
    ids.chunks(size.max(1)).map(|group| group.to_vec()).collect()
}

/// Join one chunk of ids into the comma-separated form the `ids` query
/// parameter expects.
pub fn join_ids(ids: &[String]) -> String {
    ids.join(",")
}

/// Deduplicate while preserving first-seen order.
///
/// Several extraction tasks collect ids from overlapping records (an album id
/// repeats for every saved track on that album) and must request each id once.
pub fn unique_in_order(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

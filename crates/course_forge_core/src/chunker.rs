//! crates/course_forge_core/src/chunker.rs
//!
//! Fixed-width splitting of oversized documents, plus the token estimate that
//! decides whether a document needs splitting at all.

use crate::domain::Chunk;

/// Rough characters-per-token ratio used for size estimation.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimates the token count of `text` as `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Splits `document` into windows of `max_chunk_size` characters.
///
/// Windows start at offset 0 and advance by exactly `max_chunk_size`, with no
/// regard for sentence or paragraph boundaries. Only the last chunk may be
/// shorter. A size of zero is treated as one.
pub fn chunk_document(document: &str, max_chunk_size: usize) -> Vec<Chunk> {
    let size = max_chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start_byte = 0usize;
    let mut start_offset = 0usize;
    let mut count = 0usize;

    for (byte_idx, _) in document.char_indices() {
        if count == size {
            chunks.push(Chunk {
                index: chunks.len(),
                start_offset,
                text: document[start_byte..byte_idx].to_string(),
            });
            start_byte = byte_idx;
            start_offset += count;
            count = 0;
        }
        count += 1;
    }

    if count > 0 {
        chunks.push(Chunk {
            index: chunks.len(),
            start_offset,
            text: document[start_byte..].to_string(),
        });
    }

    chunks
}

/// Joins the first `count` chunks into a single planning sample.
pub fn sample_chunks(chunks: &[Chunk], count: usize, separator: &str) -> String {
    chunks
        .iter()
        .take(count)
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Returns at most the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

//! crates/course_forge_core/src/relevance.rs
//!
//! Picks the chunk of a document that best matches a short label, such as a
//! lesson title, by counting keyword occurrences.

use crate::domain::Chunk;
use regex::{Regex, RegexBuilder};
use tracing::debug;

/// Lowercase, whitespace-delimited keywords of `label`, compiled as literal
/// case-insensitive patterns.
fn keyword_patterns(label: &str) -> Vec<Regex> {
    label
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .filter_map(|word| {
            RegexBuilder::new(&regex::escape(&word))
                .case_insensitive(true)
                .build()
                .ok()
        })
        .collect()
}

fn score_with(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().map(|p| p.find_iter(text).count()).sum()
}

/// Total number of keyword matches of `label` inside `chunk`.
pub fn score_chunk(chunk: &Chunk, label: &str) -> usize {
    score_with(&keyword_patterns(label), &chunk.text)
}

/// Returns the chunk with the strictly highest score for `label`.
///
/// Ties go to the earliest chunk. When nothing matches, the first chunk is
/// returned. `None` only for an empty slice.
pub fn select_best_chunk<'a>(chunks: &'a [Chunk], label: &str) -> Option<&'a Chunk> {
    let first = chunks.first()?;
    let patterns = keyword_patterns(label);

    let mut best = first;
    let mut best_score = 0usize;
    for chunk in chunks {
        let score = score_with(&patterns, &chunk.text);
        if score > best_score {
            best = chunk;
            best_score = score;
        }
    }

    debug!(
        label,
        chunk_index = best.index,
        score = best_score,
        "Selected source chunk"
    );
    Some(best)
}

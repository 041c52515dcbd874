//! Similarity-based connection discovery over the recent-thoughts window.

use std::collections::HashSet;

use tracing::debug;

use crate::heuristics::{jaccard_index, word_set};
use crate::storage::{EntityStore, ThoughtId};

/// Connect every pair among the last `window` thoughts whose Jaccard
/// similarity strictly exceeds `threshold`. Returns the number of new links.
pub(crate) fn discover_connections(store: &mut EntityStore, window: usize, threshold: f64) -> usize {
    let tokenized: Vec<(ThoughtId, HashSet<String>)> = store
        .recent_thoughts(window)
        .into_iter()
        .filter_map(|id| {
            let words = word_set(&store.thought(&id)?.content);
            Some((id, words))
        })
        .collect();

    let mut similar = Vec::new();
    for (i, (a, a_words)) in tokenized.iter().enumerate() {
        for (b, b_words) in &tokenized[i + 1..] {
            if jaccard_index(a_words, b_words) > threshold {
                similar.push((a, b));
            }
        }
    }

    let added = similar
        .into_iter()
        .filter(|(a, b)| store.connect(a, b))
        .count();
    if added > 0 {
        debug!(added = added, window = tokenized.len(), "Discovered connections");
    }
    added
}

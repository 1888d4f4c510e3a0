//! Trailing-window selection for live transcript display

use rand::Rng;

/// Returns the last N words of `text`, with N drawn uniformly from
/// `min_words..=max_words`.
///
/// Varying the window length keeps a scrolling live transcript from
/// flickering in lockstep with every recognizer update. Shorter inputs
/// are returned whole; an empty input yields an empty string.
#[must_use]
pub fn random_tail(text: &str, min_words: usize, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }

    let (lo, hi) = if min_words <= max_words {
        (min_words, max_words)
    } else {
        (max_words, min_words)
    };
    let take = rand::thread_rng().gen_range(lo..=hi);
    let start = words.len().saturating_sub(take);
    words[start..].join(" ")
}

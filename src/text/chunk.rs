//! Word chunk buffering for incremental translation
//!
//! Partial hypotheses from the recognizer grow one word at a time.
//! The buffer tracks the newest word of each distinct hypothesis and
//! flushes a chunk once enough words accumulate, so translation can
//! start while the speaker is still mid-sentence.

/// Number of buffered words that triggers a chunk flush.
pub const WORD_CHUNK_SIZE: usize = 3;

/// Accumulates words from partial hypotheses and emits fixed-size chunks.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    words: Vec<String>,
    last_hypothesis: String,
}

impl ChunkBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a full partial hypothesis, extracting its newest word.
    ///
    /// A hypothesis identical to the previous one (case-insensitive) is
    /// ignored; the recognizer repeats itself while audio is silent.
    /// Returns a flushed chunk when the buffer reaches capacity.
    pub fn offer_hypothesis(&mut self, hypothesis: &str) -> Option<String> {
        let hypothesis = hypothesis.trim();
        if hypothesis.is_empty() || same_word(hypothesis, &self.last_hypothesis) {
            return None;
        }
        self.last_hypothesis = hypothesis.to_string();

        let newest = hypothesis.split_whitespace().last()?.to_string();
        self.push(&newest)
    }

    /// Appends a single word, dropping consecutive duplicates.
    ///
    /// Returns the joined chunk when the buffer fills, leaving it empty.
    pub fn push(&mut self, word: &str) -> Option<String> {
        let duplicate = self
            .words
            .last()
            .is_some_and(|last| same_word(last, word));
        if !duplicate {
            self.words.push(word.to_string());
        }

        if self.words.len() >= WORD_CHUNK_SIZE {
            let chunk = self.words.join(" ");
            self.words.clear();
            Some(chunk)
        } else {
            None
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Drops buffered words and hypothesis state, e.g. between sessions.
    pub fn clear(&mut self) {
        self.words.clear();
        self.last_hypothesis.clear();
    }
}

/// Case-insensitive word comparison. Recognizers are inconsistent about
/// capitalization between successive hypotheses.
fn same_word(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

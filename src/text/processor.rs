//! Transcript display processing
//!
//! Turns raw recognizer hypotheses into lines suitable for a scrolling
//! live display: trailing-window selection, per-kind enable flags, and
//! suppression of back-to-back duplicates.

use crate::settings::Settings;
use crate::text::window::random_tail;

/// Shapes partial and final transcripts for display.
#[derive(Debug)]
pub struct TranscriptProcessor {
    min_words: usize,
    max_words: usize,
    partial_enabled: bool,
    final_enabled: bool,
    clip_enabled: bool,
    last_emitted: String,
    last_printed: String,
}

impl TranscriptProcessor {
    #[must_use]
    pub fn new(min_words: usize, max_words: usize) -> Self {
        Self {
            min_words,
            max_words,
            partial_enabled: true,
            final_enabled: true,
            clip_enabled: true,
            last_emitted: String::new(),
            last_printed: String::new(),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let (min_words, max_words) = settings.word_range();
        let mut processor = Self::new(min_words, max_words);
        processor.partial_enabled = settings.partial_results;
        processor.final_enabled = settings.final_results;
        processor.clip_enabled = settings.clip_enabled;
        processor
    }

    pub fn set_word_range(&mut self, min_words: usize, max_words: usize) {
        self.min_words = min_words;
        self.max_words = max_words;
    }

    pub fn set_partial_enabled(&mut self, enabled: bool) {
        self.partial_enabled = enabled;
    }

    pub fn set_final_enabled(&mut self, enabled: bool) {
        self.final_enabled = enabled;
    }

    pub fn set_clip_enabled(&mut self, enabled: bool) {
        self.clip_enabled = enabled;
    }

    /// Processes an interim hypothesis. Returns the windowed text to
    /// display, or `None` when disabled, empty, or a repeat.
    pub fn handle_partial(&mut self, text: &str) -> Option<String> {
        if !self.partial_enabled {
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let windowed = random_tail(text, self.min_words, self.max_words);
        self.emit(windowed)
    }

    /// Processes a final transcript. Clipping is optional here so the
    /// display can show the complete utterance when configured to.
    pub fn handle_final(&mut self, text: &str) -> Option<String> {
        if !self.final_enabled {
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let windowed = if self.clip_enabled {
            random_tail(text, self.min_words, self.max_words)
        } else {
            text.to_string()
        };
        self.emit(windowed)
    }

    /// Last text actually handed to the display.
    #[must_use]
    pub fn last_printed(&self) -> &str {
        &self.last_printed
    }

    /// Clears duplicate-tracking state for a fresh session.
    pub fn reset(&mut self) {
        self.last_emitted.clear();
        self.last_printed.clear();
    }

    fn emit(&mut self, text: String) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let normalized = text.to_lowercase();
        if normalized == self.last_emitted {
            return None;
        }
        self.last_emitted = normalized;
        self.last_printed = text.clone();
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_disabled_yields_nothing() {
        let mut processor = TranscriptProcessor::new(3, 4);
        processor.set_partial_enabled(false);
        assert_eq!(processor.handle_partial("hallo welt wie geht"), None);
    }

    #[test]
    fn test_final_without_clip_returns_full_text() {
        let mut processor = TranscriptProcessor::new(1, 1);
        processor.set_clip_enabled(false);
        let text = "der hund läuft sehr schnell durch den park";
        assert_eq!(processor.handle_final(text), Some(text.to_string()));
    }

    #[test]
    fn test_duplicate_suppressed_case_insensitively() {
        let mut processor = TranscriptProcessor::new(3, 3);
        assert!(processor.handle_partial("Hallo Schöne Welt").is_some());
        assert_eq!(processor.handle_partial("hallo schöne welt"), None);
    }

    #[test]
    fn test_empty_input_ignored() {
        let mut processor = TranscriptProcessor::new(3, 4);
        assert_eq!(processor.handle_partial("   "), None);
        assert_eq!(processor.handle_final(""), None);
        assert_eq!(processor.last_printed(), "");
    }

    #[test]
    fn test_reset_allows_re_emission() {
        let mut processor = TranscriptProcessor::new(3, 3);
        processor.handle_partial("eins zwei drei");
        processor.reset();
        assert!(processor.handle_partial("eins zwei drei").is_some());
        assert_eq!(processor.last_printed(), "eins zwei drei");
    }
}

//! Text buffering and display heuristics
//!
//! Sits between the recognizer and the translation/synthesis stages:
//! word chunking for translation, trailing-window selection for display,
//! and glyph normalization for Perso-Arabic output.

mod chunk;
mod normalize;
mod processor;
mod window;

pub use chunk::{ChunkBuffer, WORD_CHUNK_SIZE};
pub use normalize::normalize_farsi;
pub use processor::TranscriptProcessor;
pub use window::random_tail;

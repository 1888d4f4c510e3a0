//! Babel Gateway - Live speech translation gateway
//!
//! This library provides the core functionality for the Babel gateway:
//! - Microphone capture and speaker playback
//! - Streaming (vosk-server) and cloud (Whisper-style) speech recognition
//! - Word-chunked translation via a LibreTranslate-compatible server
//! - Speech synthesis via espeak-ng
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Microphone                        │
//! └────────────────────┬────────────────────────────────┘
//!                      │ 16 kHz mono PCM
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Babel Gateway                        │
//! │   Recognizer  │  Chunker  │  Translator  │  Synth   │
//! └────────────────────┬────────────────────────────────┘
//!                      │ 22.05 kHz WAV
//! ┌────────────────────▼────────────────────────────────┐
//! │                    Speakers                          │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod config;
pub mod daemon;
pub mod error;
pub mod recognize;
pub mod settings;
pub mod setup;
pub mod synth;
pub mod text;
pub mod translate;

pub use config::Config;
pub use daemon::{Daemon, SpeakGate};
pub use error::{Error, Result};
pub use recognize::{Recognizer, RecognizerEvent};
pub use settings::Settings;
pub use synth::{SpeechSink, Synthesizer};
pub use text::{ChunkBuffer, TranscriptProcessor};
pub use translate::{TranslationService, Translator};

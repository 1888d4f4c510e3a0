//! Speech recognition engines
//!
//! Two engines produce the same event stream: a streaming websocket
//! engine (vosk-server) that yields partial hypotheses while the
//! speaker is talking, and a batch cloud engine that transcribes whole
//! utterances through an OpenAI-compatible API.

mod cloud;
mod segment;
mod vosk;

pub use cloud::CloudRecognizer;
pub use segment::{SegmenterState, UtteranceSegmenter};
pub use vosk::VoskRecognizer;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;
use crate::config::Config;

/// Events emitted during a recognition session
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    /// Session is connected and consuming microphone audio
    Ready,
    /// Interim hypothesis, may still be revised
    Partial(String),
    /// Committed transcript for a finished utterance
    Final(String),
    /// Input level (linear RMS) for metering
    Volume(f32),
    /// Recoverable in-session failure
    Error(String),
}

/// A speech recognition engine
///
/// One call to `listen` runs one session: open the microphone, stream
/// audio, publish events, and return once a final transcript or a
/// session-ending failure arrives. Capture streams are not `Send`, so
/// the session future must stay on the task that owns the recognizer.
#[async_trait(?Send)]
pub trait Recognizer {
    /// Engine name for logs and status output
    fn name(&self) -> &'static str;

    /// Run a single recognition session
    ///
    /// # Errors
    ///
    /// Returns error when the session ends abnormally (connection lost,
    /// transcription request failed). The caller decides whether to
    /// start another session.
    async fn listen(&mut self) -> Result<()>;
}

/// Construct the engine selected by configuration, along with the
/// receiving end of its event channel
///
/// Unknown engine names fall back to the streaming engine.
///
/// # Errors
///
/// Returns error if the engine cannot be initialized (no microphone,
/// missing API key)
pub fn create_recognizer(
    config: &Config,
) -> Result<(Box<dyn Recognizer>, mpsc::Receiver<RecognizerEvent>)> {
    match config.settings.engine.as_str() {
        "cloud" => {
            let (recognizer, events) = CloudRecognizer::with_receiver(config)?;
            Ok((Box::new(recognizer), events))
        }
        "vosk" => {
            let (recognizer, events) = VoskRecognizer::with_receiver(config)?;
            Ok((Box::new(recognizer), events))
        }
        other => {
            tracing::warn!(engine = other, "unknown engine, using vosk");
            let (recognizer, events) = VoskRecognizer::with_receiver(config)?;
            Ok((Box::new(recognizer), events))
        }
    }
}

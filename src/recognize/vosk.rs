//! Streaming recognition against a vosk websocket server
//!
//! Protocol: one JSON config message announcing the sample rate, then
//! raw 16-bit PCM frames. The server answers with JSON carrying either
//! a `partial` hypothesis or a final `text`.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::audio::{AudioCapture, SAMPLE_RATE, rms, samples_to_pcm16};
use crate::config::Config;
use crate::recognize::{Recognizer, RecognizerEvent};
use crate::{Error, Result};

/// How often buffered capture audio is flushed to the server
const FLUSH_INTERVAL_MS: u64 = 100;

/// Server reply; exactly one field is populated per message
#[derive(serde::Deserialize)]
struct ServerMessage {
    #[serde(default)]
    partial: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Streams microphone audio to a vosk-server instance
pub struct VoskRecognizer {
    url: String,
    capture: AudioCapture,
    events: mpsc::Sender<RecognizerEvent>,
}

impl VoskRecognizer {
    /// Create the recognizer and the receiving end of its event channel
    ///
    /// # Errors
    ///
    /// Returns error if the microphone cannot be opened
    pub fn with_receiver(config: &Config) -> Result<(Self, mpsc::Receiver<RecognizerEvent>)> {
        let (tx, rx) = mpsc::channel(100);

        let recognizer = Self {
            url: config.vosk_url.clone(),
            capture: AudioCapture::new()?,
            events: tx,
        };

        tracing::debug!(url = %recognizer.url, "vosk recognizer initialized");
        Ok((recognizer, rx))
    }
}

#[async_trait(?Send)]
impl Recognizer for VoskRecognizer {
    fn name(&self) -> &'static str {
        "vosk"
    }

    async fn listen(&mut self) -> Result<()> {
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        let (mut sink, mut stream) = ws_stream.split();

        // Announce the capture format before any audio
        let config_msg = serde_json::json!({ "config": { "sample_rate": SAMPLE_RATE } });
        sink.send(Message::Text(config_msg.to_string())).await?;

        self.capture.clear_buffer();
        self.capture.start()?;
        let _ = self.events.send(RecognizerEvent::Ready).await;

        let mut flush = tokio::time::interval(Duration::from_millis(FLUSH_INTERVAL_MS));
        let result = loop {
            tokio::select! {
                _ = flush.tick() => {
                    let samples = self.capture.take_buffer();
                    if samples.is_empty() {
                        continue;
                    }
                    let _ = self.events.send(RecognizerEvent::Volume(rms(&samples))).await;
                    if let Err(e) = sink.send(Message::Binary(samples_to_pcm16(&samples))).await {
                        break Err(Error::from(e));
                    }
                }
                message = stream.next() => match message {
                    Some(Ok(Message::Text(payload))) => {
                        match serde_json::from_str::<ServerMessage>(&payload) {
                            Ok(reply) => {
                                if let Some(text) = reply.text {
                                    let _ = self.events.send(RecognizerEvent::Final(text)).await;
                                    break Ok(());
                                }
                                if let Some(partial) = reply.partial {
                                    if !partial.trim().is_empty() {
                                        let _ = self
                                            .events
                                            .send(RecognizerEvent::Partial(partial))
                                            .await;
                                    }
                                }
                            }
                            Err(e) => {
                                let _ = self
                                    .events
                                    .send(RecognizerEvent::Error(format!(
                                        "unrecognized server message: {e}"
                                    )))
                                    .await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break Err(Error::Recognizer("server closed connection".to_string()));
                    }
                    // Control frames and unexpected binary are ignored
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(Error::from(e)),
                },
            }
        };

        self.capture.stop();
        result
    }
}

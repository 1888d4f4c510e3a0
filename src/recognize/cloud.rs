//! Batch recognition through an OpenAI-compatible transcription API

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::audio::{AudioCapture, rms, samples_to_wav};
use crate::config::Config;
use crate::recognize::segment::UtteranceSegmenter;
use crate::recognize::{Recognizer, RecognizerEvent};
use crate::{Error, Result};

/// How often the capture buffer is drained into the segmenter
const POLL_INTERVAL_MS: u64 = 100;

/// Response from the transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Records whole utterances and transcribes them in one request
///
/// No partial hypotheses are produced; each session yields a single
/// final transcript.
pub struct CloudRecognizer {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    capture: AudioCapture,
    segmenter: UtteranceSegmenter,
    events: mpsc::Sender<RecognizerEvent>,
}

impl CloudRecognizer {
    /// Create the recognizer and the receiving end of its event channel
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the microphone
    /// cannot be opened
    pub fn with_receiver(config: &Config) -> Result<(Self, mpsc::Receiver<RecognizerEvent>)> {
        let api_key = config.stt_api_key.clone().ok_or_else(|| {
            Error::Config("OPENAI_API_KEY required for the cloud engine".to_string())
        })?;

        let (tx, rx) = mpsc::channel(100);

        let recognizer = Self {
            client: reqwest::Client::new(),
            url: config.stt_url.clone(),
            api_key,
            model: config.stt_model.clone(),
            capture: AudioCapture::new()?,
            segmenter: UtteranceSegmenter::new(),
            events: tx,
        };

        tracing::debug!(url = %recognizer.url, model = %recognizer.model, "cloud recognizer initialized");
        Ok((recognizer, rx))
    }

    /// Transcribe WAV audio through the API
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Recognizer(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Recognizer(format!(
                "transcription API error {status}: {body}"
            )));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

#[async_trait(?Send)]
impl Recognizer for CloudRecognizer {
    fn name(&self) -> &'static str {
        "cloud"
    }

    async fn listen(&mut self) -> Result<()> {
        self.segmenter.reset();
        self.capture.clear_buffer();
        self.capture.start()?;
        let _ = self.events.send(RecognizerEvent::Ready).await;

        let mut poll = tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS));
        let samples = loop {
            poll.tick().await;
            let block = self.capture.take_buffer();
            if block.is_empty() {
                continue;
            }
            let _ = self.events.send(RecognizerEvent::Volume(rms(&block))).await;
            if self.segmenter.process(&block) {
                break self.segmenter.take_utterance();
            }
        };
        self.capture.stop();

        let wav = samples_to_wav(&samples, self.capture.sample_rate())?;
        let text = self.transcribe(&wav).await?;
        let _ = self.events.send(RecognizerEvent::Final(text)).await;
        Ok(())
    }
}

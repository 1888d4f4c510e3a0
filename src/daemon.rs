//! Daemon - the main translation gateway service
//!
//! Orchestrates microphone capture, speech recognition, incremental
//! translation, and speech synthesis.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::Result;
use crate::config::Config;
use crate::recognize::{self, Recognizer, RecognizerEvent};
use crate::synth::{self, SpeechSink, Synthesizer};
use crate::text::{ChunkBuffer, TranscriptProcessor, normalize_farsi};
use crate::translate::{TranslationService, Translator};

/// Pause between recognition sessions in continuous mode
const RESTART_DELAY_MS: u64 = 1000;

/// Guards against overlapping translation and playback
///
/// At most one chunk is in the translate stage and one utterance on
/// the speaker at any time; excess work is dropped, not queued.
#[derive(Clone, Default)]
pub struct SpeakGate {
    translating: Arc<AtomicBool>,
    speaking: Arc<AtomicBool>,
}

impl SpeakGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to enter the translation stage
    #[must_use]
    pub fn begin_translation(&self) -> bool {
        self.translating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn end_translation(&self) {
        self.translating.store(false, Ordering::SeqCst);
    }

    /// Try to claim the speaker
    #[must_use]
    pub fn begin_speaking(&self) -> bool {
        self.speaking
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn end_speaking(&self) {
        self.speaking.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_translating(&self) -> bool {
        self.translating.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// Translate one piece of text and speak the result
///
/// Busy stages shed load instead of queueing: if a translation is
/// already running the text is dropped, and if the speaker is busy the
/// translation is shown but not spoken. Returns the translated text
/// when translation ran.
pub async fn translate_and_speak(
    translator: Arc<dyn TranslationService>,
    sink: Arc<dyn SpeechSink>,
    gate: SpeakGate,
    text: String,
) -> Option<String> {
    if !gate.begin_translation() {
        tracing::debug!(dropped = %text, "translation busy, dropping chunk");
        return None;
    }

    let translated = translator.translate(&text).await;
    gate.end_translation();

    let translated = match translated {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "chunk translation failed");
            return None;
        }
    };

    let translated = if translator.target() == "fa" {
        normalize_farsi(&translated)
    } else {
        translated
    };

    if translated.trim().is_empty() {
        return None;
    }

    println!("[{}] {translated}", translator.target());

    if gate.begin_speaking() {
        if let Err(e) = sink.speak(&translated).await {
            tracing::warn!(error = %e, "speech synthesis failed");
        }
        gate.end_speaking();
    } else {
        tracing::debug!("speaker busy, skipping playback");
    }

    Some(translated)
}

/// The babel daemon - runs the listen/translate/speak pipeline
pub struct Daemon {
    config: Config,
    recognizer: Box<dyn Recognizer>,
    events: mpsc::Receiver<RecognizerEvent>,
    translator: Arc<dyn TranslationService>,
    sink: Arc<dyn SpeechSink>,
    gate: SpeakGate,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if any pipeline component fails to initialize, or
    /// the target language has no installed voice
    #[allow(clippy::future_not_send)]
    pub async fn new(config: Config) -> Result<Self> {
        let data_path = synth::data_path(&config.data_dir);
        if !synth::has_base_resources(&data_path) {
            if let Some(archive) = &config.voice_archive {
                synth::install_from_archive(&config.data_dir, archive)?;
            } else {
                tracing::debug!(
                    path = %data_path.display(),
                    "no local voice data, relying on system install"
                );
            }
        }

        let data_root =
            synth::has_base_resources(&data_path).then(|| synth::voices_root(&config.data_dir));
        let mut synthesizer = Synthesizer::new(data_root)?;
        synthesizer.select_voice(&config.settings.lang)?;
        synthesizer.set_rate(config.settings.speed);
        synthesizer.set_pitch(config.settings.pitch);

        match synthesizer.voices().await {
            Ok(voices) => {
                tracing::info!(
                    voice = synthesizer.voice(),
                    available = voices.len(),
                    "synthesizer ready"
                );
            }
            Err(e) => tracing::debug!(error = %e, "voice inventory unavailable"),
        }

        let translator = Translator::new(
            &config.translate_url,
            config.source_lang.clone(),
            config.settings.lang.clone(),
        );

        let (recognizer, events) = recognize::create_recognizer(&config)?;
        tracing::info!(engine = recognizer.name(), "recognizer ready");

        Ok(Self::with_components(
            config,
            recognizer,
            events,
            Arc::new(translator),
            Arc::new(synthesizer),
        ))
    }

    /// Assemble a daemon from pre-built pipeline components
    ///
    /// `new` wires up the real microphone, synthesizer, and servers;
    /// this accepts any implementations of the pipeline traits.
    #[must_use]
    pub fn with_components(
        config: Config,
        recognizer: Box<dyn Recognizer>,
        events: mpsc::Receiver<RecognizerEvent>,
        translator: Arc<dyn TranslationService>,
        sink: Arc<dyn SpeechSink>,
    ) -> Self {
        Self {
            config,
            recognizer,
            events,
            translator,
            sink,
            gate: SpeakGate::new(),
        }
    }

    /// Run the daemon until interrupted
    ///
    /// Each recognition session covers one utterance; continuous mode
    /// starts the next session after a short pause.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; failed sessions are logged and
    /// retried in continuous mode
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<()> {
        // Ctrl-C is the shutdown source in normal operation
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.run_until(shutdown_rx).await
    }

    /// Run the daemon until the given channel delivers a shutdown
    /// request
    ///
    /// Each recognition session covers one utterance; continuous mode
    /// starts the next session after a short pause. When the loop ends
    /// without a shutdown request, in-flight translation and playback
    /// finish before this returns.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; failed sessions are logged and
    /// retried in continuous mode
    #[allow(clippy::future_not_send)]
    pub async fn run_until(mut self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        tracing::info!(
            source = %self.config.source_lang,
            target = %self.config.settings.lang,
            engine = self.recognizer.name(),
            continuous = self.config.continuous,
            "daemon running"
        );

        if let Err(e) = self.translator.ensure_ready().await {
            tracing::warn!(error = %e, "translation service not ready, continuing anyway");
        }

        let mut processor = TranscriptProcessor::from_settings(&self.config.settings);
        let mut chunker = ChunkBuffer::new();

        let mut stopped = false;
        loop {
            // Fresh display state per session
            processor.reset();
            chunker.clear();
            tracing::info!("listening");

            if self
                .run_session(&mut processor, &mut chunker, &mut shutdown_rx)
                .await
            {
                stopped = true;
                break;
            }

            if !self.config.continuous {
                break;
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    stopped = true;
                    break;
                }
                () = tokio::time::sleep(Duration::from_millis(RESTART_DELAY_MS)) => {}
            }
        }

        if !stopped {
            // Give a just-spawned speak task time to take the gate,
            // then let in-flight work drain
            tokio::time::sleep(Duration::from_millis(100)).await;
            while self.gate.is_translating() || self.gate.is_speaking() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }

        tracing::info!("daemon stopped");
        Ok(())
    }

    /// Run one recognition session; returns true if shutdown was
    /// requested
    #[allow(clippy::future_not_send)]
    async fn run_session(
        &mut self,
        processor: &mut TranscriptProcessor,
        chunker: &mut ChunkBuffer,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) -> bool {
        let translator = Arc::clone(&self.translator);
        let sink = Arc::clone(&self.sink);
        let gate = self.gate.clone();
        let source = self.config.source_lang.clone();

        let listen = self.recognizer.listen();
        tokio::pin!(listen);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    return true;
                }
                result = &mut listen => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "recognition session failed");
                    }
                    // The final event may still sit in the channel
                    while let Ok(event) = self.events.try_recv() {
                        handle_event(
                            processor, chunker, &translator, &sink, &gate, &source, event,
                        );
                    }
                    return false;
                }
                event = self.events.recv() => match event {
                    Some(event) => handle_event(
                        processor, chunker, &translator, &sink, &gate, &source, event,
                    ),
                    None => return false,
                },
            }
        }
    }
}

/// Apply one recognizer event to the pipeline
fn handle_event(
    processor: &mut TranscriptProcessor,
    chunker: &mut ChunkBuffer,
    translator: &Arc<dyn TranslationService>,
    sink: &Arc<dyn SpeechSink>,
    gate: &SpeakGate,
    source: &str,
    event: RecognizerEvent,
) {
    match event {
        RecognizerEvent::Ready => tracing::debug!("session ready"),
        RecognizerEvent::Partial(text) => {
            if let Some(window) = processor.handle_partial(&text) {
                println!("[{source}] {window}");
            }
            if let Some(chunk) = chunker.offer_hypothesis(&text) {
                spawn_translate(translator, sink, gate, chunk);
            }
        }
        RecognizerEvent::Final(text) => {
            if let Some(display) = processor.handle_final(&text) {
                println!("[{source}] {display}");
            }
            // The full utterance goes through translation, not just
            // the buffered chunk words
            if !text.trim().is_empty() {
                spawn_translate(translator, sink, gate, text);
            }
        }
        RecognizerEvent::Volume(value) => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let level = ((value * 100.0) as u32).min(12);
            tracing::trace!(level, "input level");
        }
        RecognizerEvent::Error(message) => {
            tracing::warn!(message, "recognizer error");
        }
    }
}

/// Run translation and playback off the session task
fn spawn_translate(
    translator: &Arc<dyn TranslationService>,
    sink: &Arc<dyn SpeechSink>,
    gate: &SpeakGate,
    text: String,
) {
    let translator = Arc::clone(translator);
    let sink = Arc::clone(sink);
    let gate = gate.clone();
    tokio::spawn(async move {
        let _ = translate_and_speak(translator, sink, gate, text).await;
    });
}

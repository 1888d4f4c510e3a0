//! Translation pipeline integration tests
//!
//! Tests the translate-then-speak flow and the daemon session loop with
//! mock services, so no recognition or translation server and no audio
//! hardware is required

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use babel_gateway::Error;
use babel_gateway::config::Config;
use babel_gateway::daemon::{Daemon, SpeakGate, translate_and_speak};
use babel_gateway::recognize::{Recognizer, RecognizerEvent};
use babel_gateway::settings::Settings;
use babel_gateway::synth::SpeechSink;
use babel_gateway::translate::TranslationService;
use tokio::sync::{Mutex, mpsc};

/// Mock translation service that brackets the input text
struct MockTranslator {
    target: &'static str,
    reply: Option<&'static str>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockTranslator {
    fn new(target: &'static str) -> Self {
        Self {
            target,
            reply: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn fixed(target: &'static str, reply: &'static str) -> Self {
        Self {
            reply: Some(reply),
            ..Self::new(target)
        }
    }

    fn failing(target: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(target)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationService for MockTranslator {
    async fn ensure_ready(&self) -> babel_gateway::Result<()> {
        Ok(())
    }

    async fn translate(&self, text: &str) -> babel_gateway::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Translate("server unavailable".to_string()));
        }
        Ok(self
            .reply
            .map_or_else(|| format!("<{text}>"), str::to_string))
    }

    fn target(&self) -> &str {
        self.target
    }
}

/// Mock speech sink that records spoken phrases
#[derive(Default)]
struct MockSink {
    spoken: Mutex<Vec<String>>,
}

impl MockSink {
    async fn spoken(&self) -> Vec<String> {
        self.spoken.lock().await.clone()
    }
}

#[async_trait]
impl SpeechSink for MockSink {
    async fn speak(&self, text: &str) -> babel_gateway::Result<()> {
        self.spoken.lock().await.push(text.to_string());
        Ok(())
    }
}

/// Mock recognizer that replays scripted sessions, one per `listen`
/// call, and requests shutdown once the script is exhausted
struct ScriptedRecognizer {
    sessions: Vec<Vec<RecognizerEvent>>,
    call: usize,
    events: mpsc::Sender<RecognizerEvent>,
    stop: mpsc::Sender<()>,
}

fn scripted(
    sessions: Vec<Vec<RecognizerEvent>>,
) -> (
    ScriptedRecognizer,
    mpsc::Receiver<RecognizerEvent>,
    mpsc::Receiver<()>,
) {
    let (events_tx, events_rx) = mpsc::channel(100);
    let (stop_tx, stop_rx) = mpsc::channel(1);
    let recognizer = ScriptedRecognizer {
        sessions,
        call: 0,
        events: events_tx,
        stop: stop_tx,
    };
    (recognizer, events_rx, stop_rx)
}

#[async_trait(?Send)]
impl Recognizer for ScriptedRecognizer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn listen(&mut self) -> babel_gateway::Result<()> {
        let Some(session) = self.sessions.get(self.call).cloned() else {
            let _ = self.stop.send(()).await;
            return std::future::pending().await;
        };
        self.call += 1;
        for event in session {
            let _ = self.events.send(event).await;
        }
        Ok(())
    }
}

/// Daemon configuration for injected components; none of the server
/// URLs are ever dialed
fn pipeline_config(continuous: bool) -> Config {
    Config {
        settings: Settings::default(),
        data_dir: PathBuf::from("."),
        source_lang: "de".to_string(),
        translate_url: "http://localhost:5000".to_string(),
        vosk_url: "ws://localhost:2700".to_string(),
        stt_url: "http://localhost:9000/v1/audio/transcriptions".to_string(),
        stt_api_key: None,
        stt_model: "whisper-1".to_string(),
        voice_archive: None,
        continuous,
    }
}

#[tokio::test]
async fn test_translate_and_speak_happy_path() {
    let translator = Arc::new(MockTranslator::new("es"));
    let sink = Arc::new(MockSink::default());
    let gate = SpeakGate::new();

    let result = translate_and_speak(
        translator.clone(),
        sink.clone(),
        gate.clone(),
        "hallo welt".to_string(),
    )
    .await;

    assert_eq!(result, Some("<hallo welt>".to_string()));
    assert_eq!(sink.spoken().await, vec!["<hallo welt>"]);
    assert!(!gate.is_translating());
    assert!(!gate.is_speaking());
}

#[tokio::test]
async fn test_overlapping_translation_dropped() {
    let translator = Arc::new(MockTranslator::new("es"));
    let sink = Arc::new(MockSink::default());
    let gate = SpeakGate::new();

    // Another chunk is mid-translation
    assert!(gate.begin_translation());

    let result = translate_and_speak(
        translator.clone(),
        sink.clone(),
        gate.clone(),
        "hallo welt".to_string(),
    )
    .await;

    assert_eq!(result, None);
    assert_eq!(translator.calls(), 0);
    assert!(sink.spoken().await.is_empty());
}

#[tokio::test]
async fn test_translation_failure_releases_gate() {
    let translator = Arc::new(MockTranslator::failing("es"));
    let sink = Arc::new(MockSink::default());
    let gate = SpeakGate::new();

    let result = translate_and_speak(
        translator.clone(),
        sink.clone(),
        gate.clone(),
        "hallo welt".to_string(),
    )
    .await;

    assert_eq!(result, None);
    assert!(sink.spoken().await.is_empty());

    // The failed attempt must not leave the stage claimed
    assert!(!gate.is_translating());
    assert!(gate.begin_translation());
}

#[tokio::test]
async fn test_busy_speaker_skips_playback() {
    let translator = Arc::new(MockTranslator::new("es"));
    let sink = Arc::new(MockSink::default());
    let gate = SpeakGate::new();

    // Playback of an earlier chunk is still running
    assert!(gate.begin_speaking());

    let result = translate_and_speak(
        translator.clone(),
        sink.clone(),
        gate.clone(),
        "guten morgen".to_string(),
    )
    .await;

    // Translation still happens and is shown, only playback is skipped
    assert_eq!(result, Some("<guten morgen>".to_string()));
    assert!(sink.spoken().await.is_empty());
    assert!(gate.is_speaking());
}

#[tokio::test]
async fn test_farsi_output_normalized() {
    // Arabic yeh and kaf in the reply, as LibreTranslate sometimes produces
    let translator = Arc::new(MockTranslator::fixed("fa", "كيف هالو"));
    let sink = Arc::new(MockSink::default());
    let gate = SpeakGate::new();

    let result = translate_and_speak(
        translator,
        sink.clone(),
        gate,
        "hallo".to_string(),
    )
    .await;

    assert_eq!(result, Some("کیف هالو".to_string()));
    assert_eq!(sink.spoken().await, vec!["کیف هالو"]);
}

#[test]
fn test_blank_translation_not_spoken() {
    let translator = Arc::new(MockTranslator::fixed("es", "   "));
    let sink = Arc::new(MockSink::default());
    let gate = SpeakGate::new();

    let result = tokio_test::block_on(translate_and_speak(
        translator,
        sink.clone(),
        gate.clone(),
        "hallo".to_string(),
    ));

    assert_eq!(result, None);
    assert!(tokio_test::block_on(sink.spoken()).is_empty());
    assert!(!gate.is_speaking());
}

#[tokio::test]
async fn test_sequential_chunks_all_translate() {
    let translator = Arc::new(MockTranslator::new("es"));
    let sink = Arc::new(MockSink::default());
    let gate = SpeakGate::new();

    for chunk in ["erster teil", "zweiter teil", "dritter teil"] {
        let result = translate_and_speak(
            translator.clone(),
            sink.clone(),
            gate.clone(),
            chunk.to_string(),
        )
        .await;
        assert!(result.is_some());
    }

    assert_eq!(translator.calls(), 3);
    assert_eq!(sink.spoken().await.len(), 3);
}

#[tokio::test]
async fn test_trailing_final_translated_before_restart() {
    // The recognizer ends its session right after publishing the final
    // transcript, which may still sit in the event channel at that point
    let (recognizer, events, stop) = scripted(vec![vec![
        RecognizerEvent::Ready,
        RecognizerEvent::Final("guten morgen zusammen".to_string()),
    ]]);
    let translator = Arc::new(MockTranslator::new("es"));
    let sink = Arc::new(MockSink::default());

    let daemon = Daemon::with_components(
        pipeline_config(false),
        Box::new(recognizer),
        events,
        translator.clone(),
        sink.clone(),
    );
    tokio::time::timeout(Duration::from_secs(5), daemon.run_until(stop))
        .await
        .expect("single-shot daemon should stop on its own")
        .unwrap();

    assert_eq!(translator.calls(), 1);
    assert_eq!(sink.spoken().await, vec!["<guten morgen zusammen>"]);
}

#[tokio::test]
async fn test_single_shot_run_exits_after_one_session() {
    let (recognizer, events, stop) = scripted(vec![vec![RecognizerEvent::Ready]]);
    let translator = Arc::new(MockTranslator::new("es"));
    let sink = Arc::new(MockSink::default());

    let daemon = Daemon::with_components(
        pipeline_config(false),
        Box::new(recognizer),
        events,
        translator.clone(),
        sink.clone(),
    );
    tokio::time::timeout(Duration::from_secs(5), daemon.run_until(stop))
        .await
        .expect("single-shot daemon should stop without a shutdown signal")
        .unwrap();

    assert_eq!(translator.calls(), 0);
    assert!(sink.spoken().await.is_empty());
}

#[tokio::test]
async fn test_repeated_speech_translates_after_restart() {
    // A restarted recognizer re-sends its last hypothesis; the
    // per-session reset must keep session one from suppressing it
    let (recognizer, events, stop) = scripted(vec![
        vec![
            RecognizerEvent::Partial("eins".to_string()),
            RecognizerEvent::Partial("eins zwei".to_string()),
            RecognizerEvent::Partial("eins zwei drei".to_string()),
            RecognizerEvent::Final("eins zwei drei".to_string()),
        ],
        vec![
            RecognizerEvent::Partial("eins zwei drei".to_string()),
            RecognizerEvent::Partial("eins zwei drei vier".to_string()),
            RecognizerEvent::Partial("eins zwei drei vier fünf".to_string()),
            RecognizerEvent::Final("eins zwei drei vier fünf".to_string()),
        ],
    ]);
    let translator = Arc::new(MockTranslator::new("es"));
    let sink = Arc::new(MockSink::default());

    let daemon = Daemon::with_components(
        pipeline_config(true),
        Box::new(recognizer),
        events,
        translator.clone(),
        sink.clone(),
    );
    tokio::time::timeout(Duration::from_secs(10), daemon.run_until(stop))
        .await
        .expect("daemon should stop when the script runs out")
        .unwrap();

    // One chunk and one full utterance per session; session two's chunk
    // picks up from the word after its repeated hypothesis
    assert_eq!(translator.calls(), 4);
    assert_eq!(
        sink.spoken().await,
        vec![
            "<eins zwei drei>",
            "<eins zwei drei>",
            "<drei vier fünf>",
            "<eins zwei drei vier fünf>",
        ]
    );
}

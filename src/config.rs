//! Configuration management for the Babel gateway

use std::path::PathBuf;

use crate::Result;
use crate::settings::Settings;

/// Default translation server URL (LibreTranslate-compatible API)
const DEFAULT_TRANSLATE_URL: &str = "http://localhost:5000";

/// Default streaming recognition server URL
const DEFAULT_VOSK_URL: &str = "ws://localhost:2700";

/// Default cloud transcription endpoint
const DEFAULT_STT_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Babel gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Persisted user settings
    pub settings: Settings,

    /// Path to data directory (voice data, cache)
    pub data_dir: PathBuf,

    /// Recognition/source language (BCP-47-ish code, e.g. "de")
    pub source_lang: String,

    /// Translation server base URL
    pub translate_url: String,

    /// Streaming recognition server URL
    pub vosk_url: String,

    /// Cloud transcription endpoint URL
    pub stt_url: String,

    /// Cloud transcription API key
    pub stt_api_key: Option<String>,

    /// Cloud transcription model identifier
    pub stt_model: String,

    /// Bundled voice-data archive to install when resources are missing
    pub voice_archive: Option<PathBuf>,

    /// Re-arm listening after each utterance
    pub continuous: bool,
}

impl Config {
    /// Load configuration from settings file and environment
    ///
    /// # Errors
    ///
    /// Returns error if the settings file exists but cannot be parsed
    pub fn load() -> Result<Self> {
        Self::load_with_options(None, None, None, true)
    }

    /// Load configuration with explicit overrides for languages and engine
    ///
    /// # Errors
    ///
    /// Returns error if the settings file exists but cannot be parsed
    pub fn load_with_options(
        lang: Option<&str>,
        source: Option<&str>,
        engine: Option<&str>,
        continuous: bool,
    ) -> Result<Self> {
        let mut settings = Settings::load()?;

        if let Some(lang) = lang {
            settings.lang = lang.to_string();
        }
        if let Some(engine) = engine {
            settings.engine = engine.to_string();
        }

        // Determine data directory (~/.local/share/babel on Linux)
        let data_dir = directories::ProjectDirs::from("dev", "babel", "babel")
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().to_path_buf());
        std::fs::create_dir_all(&data_dir).ok();

        let source_lang = source.map_or_else(
            || std::env::var("BABEL_SOURCE_LANG").unwrap_or_else(|_| "de".to_string()),
            ToString::to_string,
        );

        let translate_url = std::env::var("BABEL_TRANSLATE_URL")
            .unwrap_or_else(|_| DEFAULT_TRANSLATE_URL.to_string());
        let vosk_url =
            std::env::var("BABEL_VOSK_URL").unwrap_or_else(|_| DEFAULT_VOSK_URL.to_string());

        let stt_url =
            std::env::var("BABEL_STT_URL").unwrap_or_else(|_| DEFAULT_STT_URL.to_string());
        let stt_api_key = std::env::var("OPENAI_API_KEY").ok();
        let stt_model =
            std::env::var("BABEL_STT_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        let voice_archive = std::env::var("BABEL_VOICE_ARCHIVE").ok().map(PathBuf::from);

        Ok(Self {
            settings,
            data_dir,
            source_lang,
            translate_url,
            vosk_url,
            stt_url,
            stt_api_key,
            stt_model,
            voice_archive,
            continuous,
        })
    }
}

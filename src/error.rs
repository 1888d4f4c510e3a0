//! Error types for the Babel gateway

use thiserror::Error;

/// Result type alias for Babel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Babel gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Settings persistence error
    #[error("settings error: {0}")]
    Settings(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech recognition error
    #[error("recognizer error: {0}")]
    Recognizer(String),

    /// Translation error
    #[error("translation error: {0}")]
    Translate(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synth(String),

    /// Voice data installation error
    #[error("voice data error: {0}")]
    VoiceData(String),

    /// No installed voice serves the requested language
    #[error("language unavailable: {0}")]
    UnavailableLanguage(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Websocket error
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

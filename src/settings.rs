//! Persisted user settings
//!
//! Flat key-value scalars stored as TOML in the XDG config directory and read
//! at engine-initialization time. `wordCount1` and friends keep their
//! camelCase spelling on disk.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// All recognized settings keys, in display order
pub const KEYS: &[&str] = &[
    "speed",
    "pitch",
    "wordCount1",
    "wordCount2",
    "lang",
    "engine",
    "clipEnabled",
    "partial",
    "final",
];

fn default_speed() -> u32 {
    320
}

fn default_pitch() -> u32 {
    55
}

fn default_word_count1() -> usize {
    3
}

fn default_word_count2() -> usize {
    7
}

fn default_lang() -> String {
    "fa".to_string()
}

fn default_engine() -> String {
    "vosk".to_string()
}

fn default_true() -> bool {
    true
}

/// User preferences for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Synthesizer speaking rate in words per minute
    #[serde(default = "default_speed")]
    pub speed: u32,

    /// Synthesizer pitch (0-99)
    #[serde(default = "default_pitch")]
    pub pitch: u32,

    /// Minimum display-window length in words
    #[serde(default = "default_word_count1")]
    pub word_count1: usize,

    /// Maximum display-window length in words
    #[serde(default = "default_word_count2")]
    pub word_count2: usize,

    /// Target language for translation and voice selection
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Recognition engine ("vosk" or "cloud")
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Clip final results to the display window
    #[serde(default = "default_true")]
    pub clip_enabled: bool,

    /// Handle partial transcript events
    #[serde(rename = "partial", default = "default_true")]
    pub partial_results: bool,

    /// Handle final transcript events
    #[serde(rename = "final", default = "default_true")]
    pub final_results: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            pitch: default_pitch(),
            word_count1: default_word_count1(),
            word_count2: default_word_count2(),
            lang: default_lang(),
            engine: default_engine(),
            clip_enabled: true,
            partial_results: true,
            final_results: true,
        }
    }
}

impl Settings {
    /// Path of the settings file (`settings.toml` in the XDG config dir)
    #[must_use]
    pub fn path() -> PathBuf {
        directories::ProjectDirs::from("dev", "babel", "babel").map_or_else(
            || PathBuf::from(".config/babel/settings.toml"),
            |d| d.config_dir().join("settings.toml"),
        )
    }

    /// Load settings from disk, falling back to defaults if absent
    ///
    /// Unknown keys in the file are ignored; missing keys take their
    /// documented defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// Load settings from an explicit path
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load settings, logging and defaulting on failure
    #[must_use]
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            Self::default()
        })
    }

    /// Write settings to disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be serialized or written
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Write settings to an explicit path
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be serialized or written
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Settings(e.to_string()))?;
        std::fs::write(path, content)?;
        tracing::debug!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// Read one setting as its display string
    ///
    /// # Errors
    ///
    /// Returns error if the key is not recognized
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "speed" => self.speed.to_string(),
            "pitch" => self.pitch.to_string(),
            "wordCount1" => self.word_count1.to_string(),
            "wordCount2" => self.word_count2.to_string(),
            "lang" => self.lang.clone(),
            "engine" => self.engine.clone(),
            "clipEnabled" => self.clip_enabled.to_string(),
            "partial" => self.partial_results.to_string(),
            "final" => self.final_results.to_string(),
            _ => return Err(Error::Settings(format!("unknown key: {key}"))),
        };
        Ok(value)
    }

    /// Update one setting from its string form
    ///
    /// # Errors
    ///
    /// Returns error if the key is not recognized or the value does not parse
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "speed" => self.speed = parse_value(key, value)?,
            "pitch" => self.pitch = parse_value(key, value)?,
            "wordCount1" => self.word_count1 = parse_value(key, value)?,
            "wordCount2" => self.word_count2 = parse_value(key, value)?,
            "lang" => self.lang = value.to_string(),
            "engine" => self.engine = value.to_string(),
            "clipEnabled" => self.clip_enabled = parse_bool(key, value)?,
            "partial" => self.partial_results = parse_bool(key, value)?,
            "final" => self.final_results = parse_bool(key, value)?,
            _ => return Err(Error::Settings(format!("unknown key: {key}"))),
        }
        Ok(())
    }

    /// The display-window bounds as an ordered (min, max) pair
    #[must_use]
    pub const fn word_range(&self) -> (usize, usize) {
        if self.word_count1 <= self.word_count2 {
            (self.word_count1, self.word_count2)
        } else {
            (self.word_count2, self.word_count1)
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Settings(format!("invalid value for {key}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(Error::Settings(format!(
            "invalid value for {key}: expected true or false"
        ))),
    }
}

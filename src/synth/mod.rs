//! Speech synthesis through espeak-ng
//!
//! Synthesis runs the espeak-ng binary as a subprocess and captures
//! WAV output from stdout. Voice resources can come from the system
//! install or from an archive unpacked into the app data directory
//! (see [`voice_data`]).

mod voice_data;

pub use voice_data::{
    data_path, has_base_resources, install_from_archive, install_if_missing, voices_root,
};

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::audio::{AudioPlayback, decode_wav};
use crate::{Error, Result};

/// One voice from the synthesizer's inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Language code the voice speaks
    pub language: String,
    /// Gender marker if the voice declares one
    pub gender: Option<char>,
    /// Human-readable voice name
    pub name: String,
    /// Identifier to pass back when selecting the voice
    pub identifier: String,
}

/// Renders text to audible speech
#[async_trait]
pub trait SpeechSink: Send + Sync {
    /// Synthesize and play text, returning once playback has drained
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str) -> Result<()>;
}

/// espeak-ng subprocess wrapper
pub struct Synthesizer {
    binary: PathBuf,
    data_root: Option<PathBuf>,
    voice: String,
    rate: u32,
    pitch: u32,
}

impl Synthesizer {
    /// Create a synthesizer, optionally rooted at a directory that
    /// contains `espeak-ng-data`
    ///
    /// Without a data root, espeak-ng uses the data shipped with the
    /// system install.
    ///
    /// # Errors
    ///
    /// Returns error if the espeak-ng binary is not on PATH
    pub fn new(data_root: Option<PathBuf>) -> Result<Self> {
        let binary = which::which("espeak-ng")
            .map_err(|_| Error::Synth("espeak-ng not found on PATH".to_string()))?;

        tracing::debug!(
            binary = %binary.display(),
            data_root = ?data_root,
            "synthesizer initialized"
        );

        Ok(Self {
            binary,
            data_root,
            voice: "en".to_string(),
            // espeak-ng's own defaults; callers override from settings
            rate: 175,
            pitch: 50,
        })
    }

    /// Select the voice for a language, preferring its first variant
    ///
    /// Tries `<lang>+<lang>1` (e.g. `fa+fa1`) and falls back to the
    /// bare language voice.
    ///
    /// # Errors
    ///
    /// Returns error if the language has no installed voice
    pub fn select_voice(&mut self, lang: &str) -> Result<&str> {
        let variant = format!("{lang}+{lang}1");
        if self.probe(&variant) {
            self.voice = variant;
        } else if self.probe(lang) {
            tracing::debug!(lang, "variant voice unavailable, using base voice");
            self.voice = lang.to_string();
        } else {
            return Err(Error::UnavailableLanguage(lang.to_string()));
        }

        tracing::info!(voice = %self.voice, "voice selected");
        Ok(&self.voice)
    }

    pub fn set_voice(&mut self, voice: String) {
        self.voice = voice;
    }

    pub const fn set_rate(&mut self, rate: u32) {
        self.rate = rate;
    }

    pub const fn set_pitch(&mut self, pitch: u32) {
        self.pitch = pitch;
    }

    /// Currently selected voice identifier
    #[must_use]
    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// Synthesize text to WAV bytes
    ///
    /// Text goes in over stdin, so arbitrary content is safe to speak.
    ///
    /// # Errors
    ///
    /// Returns error if the subprocess cannot be spawned or exits
    /// unsuccessfully
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let mut child = self
            .command()
            .arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(self.rate.to_string())
            .arg("-p")
            .arg(self.pitch.to_string())
            .arg("--stdout")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Synth(format!("failed to start espeak-ng: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Synth(format!("espeak-ng failed: {}", stderr.trim())));
        }

        tracing::debug!(
            chars = text.chars().count(),
            audio_bytes = output.stdout.len(),
            "synthesis complete"
        );
        Ok(output.stdout)
    }

    /// List the voices the synthesizer knows about
    ///
    /// # Errors
    ///
    /// Returns error if the subprocess fails
    pub async fn voices(&self) -> Result<Vec<VoiceInfo>> {
        let output = self.command().arg("--voices").output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Synth(format!(
                "espeak-ng --voices failed: {}",
                stderr.trim()
            )));
        }

        Ok(parse_voices(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Report the installed espeak-ng version string
    ///
    /// # Errors
    ///
    /// Returns error if the subprocess fails
    pub async fn version(&self) -> Result<String> {
        let output = tokio::process::Command::new(&self.binary)
            .arg("--version")
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::Synth("espeak-ng --version failed".to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Base command with the binary and data root applied
    fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.binary);
        if let Some(root) = &self.data_root {
            command.arg(format!("--path={}", root.display()));
        }
        command
    }

    /// Check whether a voice identifier is usable by synthesizing
    /// nothing with it
    fn probe(&self, voice: &str) -> bool {
        let mut command = std::process::Command::new(&self.binary);
        if let Some(root) = &self.data_root {
            command.arg(format!("--path={}", root.display()));
        }
        command
            .arg("-q")
            .arg("-v")
            .arg(voice)
            .arg("")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }
}

#[async_trait]
impl SpeechSink for Synthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        let wav = self.synthesize(text).await?;

        // cpal streams are built inside the blocking task; they must
        // not cross await points
        tokio::task::spawn_blocking(move || {
            let (samples, sample_rate) = decode_wav(&wav)?;
            AudioPlayback::with_sample_rate(sample_rate)?.play_blocking(samples)
        })
        .await
        .map_err(|e| Error::Synth(format!("playback task failed: {e}")))?
    }
}

/// Parse the table printed by `espeak-ng --voices`
///
/// Columns: priority, language, age/gender, name, file, aliases.
fn parse_voices(table: &str) -> Vec<VoiceInfo> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            let gender = fields[2]
                .split('/')
                .nth(1)
                .and_then(|g| g.chars().next())
                .filter(|g| *g != '-');
            Some(VoiceInfo {
                language: fields[1].to_string(),
                gender,
                name: fields[3].to_string(),
                identifier: fields[4].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOICE_TABLE: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  fa              --/M      Persian            fa
 2  de              --/F      German_(female)    gmw/de+f1";

    #[test]
    fn test_parses_voice_table() {
        let voices = parse_voices(VOICE_TABLE);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[1].language, "fa");
        assert_eq!(voices[1].name, "Persian");
        assert_eq!(voices[1].identifier, "fa");
        assert_eq!(voices[1].gender, Some('M'));
    }

    #[test]
    fn test_gender_marker_optional() {
        let voices = parse_voices(
            "header\n 5  xx              --/-      Test               other/xx",
        );
        assert_eq!(voices[0].gender, None);
    }

    #[test]
    fn test_short_lines_skipped() {
        let voices = parse_voices("header\n\nmalformed line\n");
        assert!(voices.is_empty());
    }
}

//! Utterance segmentation by audio energy
//!
//! The batch engine has no streaming endpoint, so utterances are cut
//! out of the capture stream locally: speech energy opens a segment,
//! sustained silence closes it.

use crate::audio::rms;

/// Minimum audio energy to consider a block speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum utterance length worth transcribing (samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence run that ends an utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,
    /// Accumulating an utterance
    Speech,
}

/// Cuts utterances from a stream of audio blocks
pub struct UtteranceSegmenter {
    state: SegmenterState,
    buffer: Vec<f32>,
    speech_counter: usize,
    silence_counter: usize,
}

impl Default for UtteranceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceSegmenter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SegmenterState::Idle,
            buffer: Vec::new(),
            speech_counter: 0,
            silence_counter: 0,
        }
    }

    /// Process a block of samples
    ///
    /// Returns true once a complete utterance is buffered; collect it
    /// with [`Self::take_utterance`].
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = rms(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Speech;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_counter = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected, segmenting");
                }
            }
            SegmenterState::Speech => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_counter += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                tracing::trace!(
                    buffer_len = self.buffer.len(),
                    silence = self.silence_counter,
                    is_speech,
                    energy,
                    "segmenting"
                );

                // Enough speech followed by enough silence
                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_counter > MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.buffer.len(), "utterance complete");
                    return true;
                }

                // Noise blip: long silence without enough speech
                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("segment too short, resetting");
                    self.reset();
                }
            }
        }

        false
    }

    /// Take the buffered utterance, returning the segmenter to idle
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let utterance = std::mem::take(&mut self.buffer);
        self.state = SegmenterState::Idle;
        self.speech_counter = 0;
        self.silence_counter = 0;
        utterance
    }

    /// Reset to idle, discarding any buffered audio
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.buffer.clear();
        self.speech_counter = 0;
        self.silence_counter = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn speech(samples: usize) -> Vec<f32> {
        (0..samples).map(|i| (i as f32 * 0.3).sin() * 0.5).collect()
    }

    fn silence(samples: usize) -> Vec<f32> {
        vec![0.0; samples]
    }

    #[test]
    fn test_silence_stays_idle() {
        let mut segmenter = UtteranceSegmenter::new();
        assert!(!segmenter.process(&silence(16000)));
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_speech_opens_segment() {
        let mut segmenter = UtteranceSegmenter::new();
        segmenter.process(&speech(1600));
        assert_eq!(segmenter.state(), SegmenterState::Speech);
    }

    #[test]
    fn test_speech_then_silence_completes() {
        let mut segmenter = UtteranceSegmenter::new();
        assert!(!segmenter.process(&speech(8000)));
        assert!(segmenter.process(&silence(SILENCE_SAMPLES + 1600)));

        let utterance = segmenter.take_utterance();
        assert!(utterance.len() > MIN_SPEECH_SAMPLES);
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_short_blip_is_discarded() {
        let mut segmenter = UtteranceSegmenter::new();
        segmenter.process(&speech(800));
        assert!(!segmenter.process(&silence(SILENCE_SAMPLES * 2 + 1600)));
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }
}

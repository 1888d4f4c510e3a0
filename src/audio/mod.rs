//! Audio capture and playback
//!
//! Microphone capture feeds the recognizers; playback renders
//! synthesized speech. Both sides go through cpal default devices.

mod capture;
mod playback;

pub use capture::{AudioCapture, SAMPLE_RATE, rms, samples_to_pcm16, samples_to_wav};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_wav};

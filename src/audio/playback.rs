//! Audio playback to speakers

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Default playback sample rate (matches espeak-ng WAV output)
pub const PLAYBACK_SAMPLE_RATE: u32 = 22050;

/// Plays audio to the default output device
pub struct AudioPlayback {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    sample_rate: u32,
}

impl AudioPlayback {
    /// Create a playback instance at the default synthesis rate
    ///
    /// # Errors
    ///
    /// Returns error if audio device cannot be opened
    pub fn new() -> Result<Self> {
        Self::with_sample_rate(PLAYBACK_SAMPLE_RATE)
    }

    /// Create a playback instance for a specific sample rate
    ///
    /// # Errors
    ///
    /// Returns error if no output config supports the rate
    pub fn with_sample_rate(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(sample_rate)
                        && c.max_sample_rate() >= SampleRate(sample_rate)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(sample_rate))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self {
            device,
            config,
            sample_rate,
        })
    }

    /// Play audio samples (f32 format)
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    #[allow(clippy::unused_async)]
    pub async fn play(&mut self, samples: Vec<f32>) -> Result<()> {
        self.play_blocking(samples)
    }

    /// Play samples, returning once the device has drained them
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built or started
    pub fn play_blocking(&self, samples: Vec<f32>) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device".to_string()))?;

        let config = self.config.clone();
        let channels = config.channels as usize;

        let samples = Arc::new(Mutex::new(samples));
        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(Mutex::new(false));
        let finished_clone = Arc::clone(&finished);

        let samples_clone = Arc::clone(&samples);
        let position_clone = Arc::clone(&position);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let samples = samples_clone.lock().unwrap();
                    let mut pos = position_clone.lock().unwrap();

                    for frame in data.chunks_mut(channels) {
                        let sample = if *pos < samples.len() {
                            samples[*pos]
                        } else {
                            *finished_clone.lock().unwrap() = true;
                            0.0
                        };

                        for out in frame.iter_mut() {
                            *out = sample;
                        }

                        if *pos < samples.len() {
                            *pos += 1;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Wait for playback to finish
        let sample_count = samples.lock().unwrap().len();
        let duration_ms = (sample_count as u64 * 1000) / u64::from(self.sample_rate);

        // Poll for completion with timeout
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(duration_ms + 500);

        while !*finished.lock().unwrap() {
            if start.elapsed() > timeout {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        // Small delay to ensure audio finishes
        std::thread::sleep(std::time::Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = sample_count, "playback complete");

        Ok(())
    }
}

/// Decode WAV bytes to mono f32 samples and the source sample rate
///
/// Stereo input is averaged down to mono. Synthesizer output is 16-bit
/// mono, but float WAVs are accepted too.
///
/// # Errors
///
/// Returns error if the data is not a WAV stream or uses an
/// unsupported encoding
pub fn decode_wav(wav_data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::new(Cursor::new(wav_data)).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();

    let mut raw = Vec::new();
    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => {
            for sample in reader.samples::<i16>() {
                let value = sample.map_err(|e| Error::Audio(e.to_string()))?;
                raw.push(f32::from(value) / 32768.0);
            }
        }
        (hound::SampleFormat::Float, 32) => {
            for sample in reader.samples::<f32>() {
                raw.push(sample.map_err(|e| Error::Audio(e.to_string()))?);
            }
        }
        (format, bits) => {
            return Err(Error::Audio(format!(
                "unsupported WAV encoding: {bits}-bit {format:?}"
            )));
        }
    }

    let samples = if spec.channels == 2 {
        // Stereo: average channels
        raw.chunks(2)
            .map(|chunk| f32::midpoint(chunk[0], chunk.get(1).copied().unwrap_or(chunk[0])))
            .collect()
    } else {
        raw
    };

    Ok((samples, spec.sample_rate))
}

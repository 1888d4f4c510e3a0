use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use babel_gateway::audio::{AudioCapture, AudioPlayback, PLAYBACK_SAMPLE_RATE, rms};
use babel_gateway::settings::{self, Settings};
use babel_gateway::synth::{
    SpeechSink, Synthesizer, data_path, has_base_resources, install_from_archive, voices_root,
};
use babel_gateway::text::normalize_farsi;
use babel_gateway::translate::{TranslationService, Translator};
use babel_gateway::{Config, Daemon};

/// Babel - Live speech translation gateway
#[derive(Parser)]
#[command(name = "babel", version, about)]
struct Cli {
    /// Target language code (e.g., "fa")
    #[arg(short, long, env = "BABEL_LANG")]
    lang: Option<String>,

    /// Source language code (e.g., "de")
    #[arg(short, long, env = "BABEL_SOURCE_LANG")]
    source: Option<String>,

    /// Recognition engine ("vosk" or "cloud")
    #[arg(short, long, env = "BABEL_ENGINE")]
    engine: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Stop after one utterance instead of listening continuously
    #[arg(long)]
    once: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Translate a phrase and speak it
    Speak {
        /// Text to translate and speak
        text: String,
    },
    /// Translate a phrase and print it
    Translate {
        /// Text to translate
        text: String,
    },
    /// List the voices the speech synthesizer knows about
    Voices,
    /// Install espeak-ng voice data from a tar.gz archive
    InstallData {
        /// Path to the archive
        archive: PathBuf,
    },
    /// Read or change persisted settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show configuration paths and backend status
    Status,
    /// Interactive first-run setup
    Setup,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one setting
    Get {
        /// Setting name (see `babel config list`)
        key: String,
    },
    /// Change one setting
    Set {
        /// Setting name (see `babel config list`)
        key: String,
        /// New value
        value: String,
    },
    /// Print all settings
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,babel_gateway=info",
        1 => "info,babel_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let lang = cli.lang.as_deref();
    let source = cli.source.as_deref();
    let engine = cli.engine.as_deref();

    // Handle subcommands
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::Speak { text } => cmd_speak(lang, source, &text).await,
            Command::Translate { text } => cmd_translate(lang, source, &text).await,
            Command::Voices => cmd_voices().await,
            Command::InstallData { archive } => cmd_install_data(&archive),
            Command::Config { action } => cmd_config(action),
            Command::Status => cmd_status().await,
            Command::Setup => babel_gateway::setup::run_setup(),
        };
    }

    tracing::info!(
        lang = ?cli.lang,
        source = ?cli.source,
        engine = ?cli.engine,
        once = cli.once,
        "starting babel gateway"
    );

    // Load configuration
    let config = Config::load_with_options(lang, source, engine, !cli.once)?;
    tracing::debug!(?config, "loaded configuration");

    // Create and run daemon
    let daemon = Daemon::new(config).await?;

    tracing::info!("babel gateway ready - speak into your microphone");

    // Run until interrupted
    daemon.run().await?;

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let sample_rate = capture.sample_rate();
    println!("Sample rate: {sample_rate} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");
    println!("  4. Try: pavucontrol (to check levels)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let mut playback = AudioPlayback::new()?;

    // Generate 2 seconds of 440Hz sine wave at the synthesizer sample rate
    let sample_rate = PLAYBACK_SAMPLE_RATE;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    playback.play(samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Translate a phrase and speak it, the way the live pipeline does
#[allow(clippy::future_not_send)]
async fn cmd_speak(lang: Option<&str>, source: Option<&str>, text: &str) -> anyhow::Result<()> {
    let config = Config::load_with_options(lang, source, None, false)?;

    let translator = Translator::new(
        &config.translate_url,
        config.source_lang.clone(),
        config.settings.lang.clone(),
    );
    translator.ensure_ready().await?;

    let mut translated = translator.translate(text).await?;
    if translator.target() == "fa" {
        translated = normalize_farsi(&translated);
    }
    println!("[{}] {translated}", translator.target());

    let mut synth = local_synthesizer(&config)?;
    let voice = synth.select_voice(&config.settings.lang)?;
    tracing::debug!(voice, "speaking");
    synth.set_rate(config.settings.speed);
    synth.set_pitch(config.settings.pitch);

    synth.speak(&translated).await?;

    Ok(())
}

/// Translate a phrase and print it
#[allow(clippy::future_not_send)]
async fn cmd_translate(
    lang: Option<&str>,
    source: Option<&str>,
    text: &str,
) -> anyhow::Result<()> {
    let config = Config::load_with_options(lang, source, None, false)?;

    let translator = Translator::new(
        &config.translate_url,
        config.source_lang.clone(),
        config.settings.lang.clone(),
    );
    translator.ensure_ready().await?;

    let mut translated = translator.translate(text).await?;
    if translator.target() == "fa" {
        translated = normalize_farsi(&translated);
    }

    println!("[{}] {text}", config.source_lang);
    println!("[{}] {translated}", translator.target());

    Ok(())
}

/// List the voices the speech synthesizer knows about
async fn cmd_voices() -> anyhow::Result<()> {
    let config = Config::load()?;

    let synth = local_synthesizer(&config)?;
    let voices = synth.voices().await?;

    if voices.is_empty() {
        println!("No voices reported by espeak-ng");
        return Ok(());
    }

    println!(
        "{:<12} {:<8} {:<24} IDENTIFIER",
        "LANGUAGE", "GENDER", "NAME"
    );
    for voice in voices {
        println!(
            "{:<12} {:<8} {:<24} {}",
            voice.language,
            voice.gender.unwrap_or('-'),
            voice.name,
            voice.identifier
        );
    }

    Ok(())
}

/// Install espeak-ng voice data from a tar.gz archive
fn cmd_install_data(archive: &Path) -> anyhow::Result<()> {
    let config = Config::load()?;

    install_from_archive(&config.data_dir, archive)?;
    println!(
        "Voice data installed to {}",
        data_path(&config.data_dir).display()
    );

    Ok(())
}

/// Read or change persisted settings
fn cmd_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load()?;
            println!("{}", settings.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load()?;
            settings.set(&key, &value)?;
            settings.save()?;
            println!("{key} = {value}");
        }
        ConfigAction::List => {
            let settings = Settings::load()?;
            for key in settings::KEYS {
                println!("{key} = {}", settings.get(key)?);
            }
        }
    }

    Ok(())
}

/// Show configuration paths and backend status
async fn cmd_status() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Settings file: {}", Settings::path().display());
    println!("Data directory: {}", config.data_dir.display());

    let voice_data = data_path(&config.data_dir);
    if has_base_resources(&voice_data) {
        println!("Voice data: installed ({})", voice_data.display());
    } else {
        println!("Voice data: not installed (using system espeak-ng data)");
    }

    match local_synthesizer(&config) {
        Ok(synth) => {
            match synth.version().await {
                Ok(version) => println!("Synthesizer: {version}"),
                Err(e) => println!("Synthesizer: error ({e})"),
            }
            match synth.voices().await {
                Ok(voices) => println!("Voices: {}", voices.len()),
                Err(e) => println!("Voices: unavailable ({e})"),
            }
        }
        Err(e) => println!("Synthesizer: not available ({e})"),
    }

    println!("Engine: {}", config.settings.engine);
    println!("Recognition server: {}", config.vosk_url);
    println!("Translation server: {}", config.translate_url);
    println!(
        "Languages: {} -> {}",
        config.source_lang, config.settings.lang
    );

    Ok(())
}

/// Build a synthesizer that prefers locally installed voice data
fn local_synthesizer(config: &Config) -> babel_gateway::Result<Synthesizer> {
    let voice_data = data_path(&config.data_dir);
    let data_root = has_base_resources(&voice_data).then(|| voices_root(&config.data_dir));
    Synthesizer::new(data_root)
}

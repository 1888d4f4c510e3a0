//! Interactive first-run setup wizard (`babel setup`)

use dialoguer::{Confirm, Input, Select};

use crate::settings::Settings;

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or settings cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Babel Setup\n");

    let path = Settings::path();
    let mut settings = Settings::load_or_default();

    if path.exists() {
        println!("Existing settings found at {}\n", path.display());
    }

    // 1. Recognition engine
    let engines = ["vosk (local streaming server)", "cloud (Whisper-style API)"];
    let default_engine = usize::from(settings.engine == "cloud");

    let engine_idx = Select::new()
        .with_prompt("Select a recognition engine")
        .items(&engines)
        .default(default_engine)
        .interact()?;
    settings.engine = if engine_idx == 1 { "cloud" } else { "vosk" }.to_string();

    // 2. Target language
    let lang: String = Input::new()
        .with_prompt("Target language code (e.g., \"fa\")")
        .default(settings.lang.clone())
        .interact_text()?;
    settings.lang = lang;

    // 3. Synthesizer voice
    let speed: u32 = Input::new()
        .with_prompt("Speech rate (words per minute)")
        .default(settings.speed)
        .interact_text()?;
    settings.speed = speed;

    let pitch: u32 = Input::new()
        .with_prompt("Speech pitch (0-99)")
        .default(settings.pitch)
        .interact_text()?;
    settings.pitch = pitch;

    // 4. Trailing display window
    let word_count1: usize = Input::new()
        .with_prompt("Trailing window, minimum words")
        .default(settings.word_count1)
        .interact_text()?;
    let word_count2: usize = Input::new()
        .with_prompt("Trailing window, maximum words")
        .default(settings.word_count2)
        .interact_text()?;
    settings.word_count1 = word_count1;
    settings.word_count2 = word_count2;

    // 5. Output toggles
    settings.partial_results = Confirm::new()
        .with_prompt("Show partial hypotheses while you speak?")
        .default(settings.partial_results)
        .interact()?;
    settings.final_results = Confirm::new()
        .with_prompt("Show finalized utterances?")
        .default(settings.final_results)
        .interact()?;
    settings.clip_enabled = Confirm::new()
        .with_prompt("Clip finalized utterances to the trailing window?")
        .default(settings.clip_enabled)
        .interact()?;

    settings.save()?;
    println!("\nSettings written to {}", path.display());

    println!("\nSetup complete! Run `babel -v` to start.");

    Ok(())
}

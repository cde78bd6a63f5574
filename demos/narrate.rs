//! Narrate a text file through a remote speech API.
//!
//! ```text
//! TTS_API_URL=http://localhost:8880 cargo run --example narrate --features http -- story.txt story.wav
//! ```

use std::path::PathBuf;

use tts_narrator::engines::http::{HttpEngine, HttpEngineConfig};
use tts_narrator::{process_document, DocumentOptionsBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        eprintln!("usage: narrate <input.txt> [output.wav]");
        std::process::exit(2);
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| input.with_extension("wav"));

    let mut config = HttpEngineConfig::default();
    if let Ok(url) = std::env::var("TTS_API_URL") {
        config.base_url = url;
    }
    let engine = HttpEngine::new(config)?;

    let mut builder = DocumentOptionsBuilder::default();
    if let Ok(voice) = std::env::var("TTS_VOICE") {
        builder.voice(voice);
    }
    if let Ok(mix) = std::env::var("TTS_MIX") {
        builder.mix(mix);
    }
    let options = builder.build()?;

    let text = std::fs::read_to_string(&input)?;
    let narration = process_document(&text, &options, &engine)?;

    for skipped in &narration.skipped {
        log::warn!(
            "Segment {} left out ({}): {}",
            skipped.index,
            skipped.segment.voice,
            skipped.error
        );
    }
    narration.audio.write_wav(&output)?;
    println!(
        "{}: {} segments, {:.1}s, voice {} -> {}",
        input.display(),
        narration.segments,
        narration.duration_secs(),
        options.display_voice(),
        output.display()
    );
    Ok(())
}

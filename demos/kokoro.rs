use std::path::{Path, PathBuf};
use std::time::Instant;

use tts_narrator::engines::kokoro::{KokoroEngine, KokoroModelParams};
use tts_narrator::{process_document, DocumentOptionsBuilder};

const SCRIPT: &str = "\
Hello! This is Kokoro, narrating a document line by line.
[voice:bf_emma] A British voice takes over here, at the default speed.
[speed:1.3] Now a little faster, with the same voice.
[voice:af_bella+af_sky][speed:1.0] And finally, two voices blended into one.";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let model_path = PathBuf::from("models/kokoro");

    let load_start = Instant::now();
    let engine = KokoroEngine::load(&model_path, KokoroModelParams::default())?;
    println!("Model loaded in {:.2?}", load_start.elapsed());
    println!("Available voices: {:?}", engine.list_voices());

    let options = DocumentOptionsBuilder::default()
        .voice("af_heart")
        .mix("af_nicole")
        .build()?;

    let synth_start = Instant::now();
    let narration = process_document(SCRIPT, &options, &engine)?;
    let synth_dur = synth_start.elapsed();

    let speedup = narration.duration_secs() / synth_dur.as_secs_f64();
    println!(
        "Narrated {} segments, {:.2}s audio in {:.2?} ({:.1}x real-time)",
        narration.segments,
        narration.duration_secs(),
        synth_dur,
        speedup
    );
    for skipped in &narration.skipped {
        println!("Skipped segment {}: {}", skipped.index, skipped.error);
    }

    narration.audio.write_wav(Path::new("output.wav"))?;
    println!("Saved to output.wav");
    Ok(())
}

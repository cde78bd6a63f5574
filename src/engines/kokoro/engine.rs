use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::SynthesisError;
use crate::planner::Segment;
use crate::{AudioBuffer, SpeechSynthesizer};

use super::model::{KokoroError, KokoroModel, SAMPLE_RATE};
use super::phonemizer::EspeakConfig;

/// Parameters for configuring Kokoro model loading.
#[derive(Debug, Clone, Default)]
pub struct KokoroModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// Path for caching the Level3-optimized ONNX graph.
    ///
    /// The first load optimizes the graph and writes it here; later loads
    /// read it back and skip the 5–10 s optimization step. Must be writable.
    pub optimized_model_cache_path: Option<PathBuf>,
    /// espeak-ng binary and data location, for bundled installs.
    pub espeak: EspeakConfig,
}

/// Kokoro text-to-speech engine.
///
/// The model is loaded once by [`KokoroEngine::load`] and kept for the life
/// of the engine. Calls from concurrent runs are serialized on an internal
/// lock, so one engine can be shared by reference across threads.
///
/// ```rust,no_run
/// use tts_narrator::engines::kokoro::{KokoroEngine, KokoroModelParams};
/// use tts_narrator::{process_document, DocumentOptions};
/// use std::path::Path;
///
/// let engine = KokoroEngine::load(Path::new("models/kokoro"), KokoroModelParams::default())?;
/// let narration = process_document("Hello, world!", &DocumentOptions::default(), &engine)?;
/// narration.audio.write_wav(Path::new("hello.wav"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct KokoroEngine {
    model: Mutex<KokoroModel>,
    model_path: PathBuf,
    espeak: EspeakConfig,
}

impl KokoroEngine {
    /// Load the model from `model_path`.
    pub fn load(model_path: &Path, params: KokoroModelParams) -> Result<Self, KokoroError> {
        let model = KokoroModel::load(
            model_path,
            params.num_threads,
            params.optimized_model_cache_path.as_deref(),
        )?;
        Ok(Self {
            model: Mutex::new(model),
            model_path: model_path.to_path_buf(),
            espeak: params.espeak,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// All voice names in the loaded archive.
    pub fn list_voices(&self) -> Vec<String> {
        let model = self.model.lock().unwrap_or_else(|p| p.into_inner());
        model
            .list_voices()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl SpeechSynthesizer for KokoroEngine {
    fn synthesize(&self, segment: &Segment) -> Result<AudioBuffer, SynthesisError> {
        // A panic in an earlier call leaves the session itself intact.
        let mut model = self
            .model
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let samples = model
            .synthesize_text(&segment.text, &segment.voice, segment.speed, &self.espeak)
            .map_err(|e| SynthesisError::Engine(Box::new(e)))?;

        Ok(AudioBuffer::new(samples, SAMPLE_RATE))
    }

    fn supports_blending(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "kokoro"
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::{arr1, Array2, ArrayView2};
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::phonemizer::{phonemize, voice_lang, EspeakConfig};
use super::vocab::{load_vocab, punctuation_ids};
use super::voices::VoiceStore;

/// Maximum number of phoneme tokens per chunk (before padding).
pub const MAX_PHONEME_LEN: usize = 510;

/// Style vector dimension for Kokoro.
pub const STYLE_DIM: usize = 256;

/// Output sample rate from the Kokoro model.
pub const SAMPLE_RATE: u32 = 24000;

/// Crossfade used when joining chunk audio.
const CHUNK_CROSSFADE_SAMPLES: usize = 240; // 10ms @ 24kHz

const VOICES_FILE: &str = "voices-v1.0.bin";
const CONFIG_FILE: &str = "config.json";
const PREFERRED_ONNX_FILE: &str = "kokoro-quant-convinteger.onnx";

#[derive(thiserror::Error, Debug)]
pub enum KokoroError {
    #[error("onnxruntime: {0}")]
    Ort(#[from] ort::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("tensor shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error(
        "espeak-ng is not installed (apt-get install espeak-ng, brew install espeak-ng, \
         or https://espeak-ng.org/download on Windows)"
    )]
    EspeakNotFound,
    #[error("espeak-ng failed: {0}")]
    PhonemizerFailed(String),
    #[error("Voice '{0}' not found in the loaded voice archive")]
    VoiceNotFound(String),
    #[error("Missing model file: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("config.json: {0}")]
    Config(String),
    #[error("voice archive: {0}")]
    VoiceParse(String),
}

/// Element type the exported graph expects for its `speed` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeedInput {
    Int32,
    Float32,
}

/// Loaded Kokoro ONNX session plus voices and vocabulary.
pub struct KokoroModel {
    session: Session,
    voice_store: VoiceStore,
    vocab: HashMap<char, i64>,
    /// Token ids of punctuation, preferred as chunk boundaries.
    split_ids: Vec<i64>,
    /// `input_ids` or `tokens`, depending on the export.
    token_input: String,
    speed_input: SpeedInput,
}

impl KokoroModel {
    /// Load the model from a directory containing an `.onnx` file,
    /// `voices-v1.0.bin` and `config.json`.
    pub fn load(
        model_dir: &Path,
        num_threads: Option<usize>,
        optimized_cache_path: Option<&Path>,
    ) -> Result<Self, KokoroError> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!("Loading Kokoro model from {}", onnx_path.display());
        let session = init_session(&onnx_path, num_threads, optimized_cache_path)?;

        let token_input = token_input_name(&session);
        let speed_input = speed_input_type(&session);
        log::debug!("Graph inputs: tokens={token_input}, speed={speed_input:?}");

        let voice_store = VoiceStore::load(&require(model_dir.join(VOICES_FILE))?)?;
        let vocab = load_vocab(&require(model_dir.join(CONFIG_FILE))?)?;
        let split_ids = punctuation_ids(&vocab);

        Ok(Self {
            session,
            voice_store,
            vocab,
            split_ids,
            token_input,
            speed_input,
        })
    }

    /// Synthesize `text` with a (possibly blended) voice at `speed`.
    pub fn synthesize_text(
        &mut self,
        text: &str,
        voice: &str,
        speed: f32,
        espeak: &EspeakConfig,
    ) -> Result<Vec<f32>, KokoroError> {
        if !self.voice_store.contains(voice) {
            return Err(KokoroError::VoiceNotFound(voice.to_string()));
        }

        let ids = phonemize(text, voice_lang(voice), &self.vocab, espeak)?;
        if ids.is_empty() {
            log::warn!("No phoneme tokens produced for text: {text:?}");
            return Ok(vec![]);
        }

        // One style for every chunk so prosody stays stable across chunk joins.
        let style = self.voice_store.style(voice, ids.len())?;
        let chunks = if ids.len() > MAX_PHONEME_LEN {
            log::debug!(
                "Phoneme sequence exceeds limit ({} > {MAX_PHONEME_LEN}), chunking",
                ids.len()
            );
            split_chunks(&ids, &self.split_ids)
        } else {
            vec![ids.as_slice()]
        };

        let mut combined = Vec::with_capacity(ids.len() * 300);
        for chunk in chunks {
            let audio = self.run_chunk(chunk, &style, speed)?;
            append_with_crossfade(&mut combined, &audio, CHUNK_CROSSFADE_SAMPLES);
        }
        Ok(combined)
    }

    /// One inference pass over at most `MAX_PHONEME_LEN` tokens.
    fn run_chunk(
        &mut self,
        tokens: &[i64],
        style: &[f32; STYLE_DIM],
        speed: f32,
    ) -> Result<Vec<f32>, KokoroError> {
        let ids = Array2::from_shape_vec((1, tokens.len() + 2), padded(tokens))?;
        let style = ArrayView2::from_shape((1, STYLE_DIM), style.as_slice())?;
        let ids = TensorRef::from_array_view(ids.view())?;
        let style = TensorRef::from_array_view(style)?;

        // Speed dtype differs between exports.
        let outputs = match self.speed_input {
            SpeedInput::Int32 => {
                let speed = arr1(&[int_speed(speed)]);
                self.session.run(inputs![
                    self.token_input.as_str() => ids,
                    "style" => style,
                    "speed" => TensorRef::from_array_view(speed.view())?,
                ])?
            }
            SpeedInput::Float32 => {
                let speed = arr1(&[speed]);
                self.session.run(inputs![
                    self.token_input.as_str() => ids,
                    "style" => style,
                    "speed" => TensorRef::from_array_view(speed.view())?,
                ])?
            }
        };

        let (_, waveform) = outputs
            .iter()
            .next()
            .ok_or_else(|| KokoroError::Ort(ort::Error::new("graph produced no waveform")))?;
        let samples = waveform.try_extract_array::<f32>()?;
        Ok(samples.iter().copied().collect())
    }

    pub fn list_voices(&self) -> Vec<&str> {
        self.voice_store.list_voices()
    }
}

fn require(path: PathBuf) -> Result<PathBuf, KokoroError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(KokoroError::MissingFile(path))
    }
}

/// Prefer the quantized model, else the first `.onnx` file in `model_dir`.
fn find_onnx_file(model_dir: &Path) -> Result<PathBuf, KokoroError> {
    let preferred = model_dir.join(PREFERRED_ONNX_FILE);
    if preferred.exists() {
        return Ok(preferred);
    }

    for entry in std::fs::read_dir(model_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("onnx") {
            return Ok(path);
        }
    }

    Err(KokoroError::MissingFile(preferred))
}

/// Build the ONNX session, reusing a serialized Level3-optimized graph when
/// `optimized_cache_path` already exists and writing one when it does not.
fn init_session(
    onnx_path: &Path,
    num_threads: Option<usize>,
    optimized_cache_path: Option<&Path>,
) -> Result<Session, KokoroError> {
    let mut builder = Session::builder()?
        .with_execution_providers(vec![CPUExecutionProvider::default().build()])?
        .with_parallel_execution(true)?;

    let load_path = match optimized_cache_path {
        Some(cache) if cache.exists() => {
            log::info!("Loading pre-optimized Kokoro graph from {}", cache.display());
            builder = builder.with_optimization_level(GraphOptimizationLevel::Disable)?;
            cache
        }
        Some(cache) => {
            log::info!(
                "Optimizing Kokoro graph, saving result to {}",
                cache.display()
            );
            builder = builder
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_optimized_model_path(cache)?;
            onnx_path
        }
        None => {
            builder = builder.with_optimization_level(GraphOptimizationLevel::Level3)?;
            onnx_path
        }
    };

    if let Some(threads) = num_threads {
        builder = builder
            .with_intra_threads(threads)?
            .with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(load_path)?)
}

/// `[0, t1, .., tN, 0]`: the graph expects a pad token on both ends.
fn padded(tokens: &[i64]) -> Vec<i64> {
    let mut ids = Vec::with_capacity(tokens.len() + 2);
    ids.push(0);
    ids.extend_from_slice(tokens);
    ids.push(0);
    ids
}

/// Whole-number speed for int32 exports, never below 1.
fn int_speed(speed: f32) -> i32 {
    let rounded = (speed.round() as i32).max(1);
    if rounded as f32 != speed {
        log::warn!("Model only supports whole-number speeds, using {rounded} instead of {speed}");
    }
    rounded
}

fn token_input_name(session: &Session) -> String {
    session
        .inputs()
        .iter()
        .map(|input| input.name())
        .find(|name| matches!(*name, "input_ids" | "tokens"))
        .unwrap_or("input_ids")
        .to_string()
}

/// Newer exports take an int32 speed; assume that when the input is absent.
fn speed_input_type(session: &Session) -> SpeedInput {
    let speed = session.inputs().iter().find(|input| input.name() == "speed");
    match speed {
        Some(input) if !format!("{:?}", input.dtype()).to_ascii_lowercase().contains("int32") => {
            SpeedInput::Float32
        }
        _ => SpeedInput::Int32,
    }
}

/// Split token ids into chunks of at most `MAX_PHONEME_LEN`, cutting after
/// the last punctuation token in each window when there is one.
fn split_chunks<'a>(ids: &'a [i64], split_ids: &[i64]) -> Vec<&'a [i64]> {
    let mut chunks = Vec::new();
    let mut rest = ids;

    while rest.len() > MAX_PHONEME_LEN {
        let window = &rest[..MAX_PHONEME_LEN];
        let cut = window
            .iter()
            .rposition(|id| split_ids.contains(id))
            .map(|i| i + 1)
            .unwrap_or(MAX_PHONEME_LEN);
        let (chunk, tail) = rest.split_at(cut);
        chunks.push(chunk);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }

    chunks
}

/// Append `src` to `dst`, blending the first `crossfade_samples` of `src`
/// over the tail of `dst`.
fn append_with_crossfade(dst: &mut Vec<f32>, src: &[f32], crossfade_samples: usize) {
    let overlap = crossfade_samples.min(dst.len()).min(src.len());
    let start = dst.len() - overlap;

    for (i, (left, &right)) in dst[start..].iter_mut().zip(src).enumerate() {
        let t = (i + 1) as f32 / (overlap as f32 + 1.0);
        *left = *left * (1.0 - t) + right * t;
    }

    dst.extend_from_slice(&src[overlap..]);
}

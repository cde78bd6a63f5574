//! # tts-narrator
//!
//! Turns annotated text into one continuous narration.
//!
//! Each line of a document may start with inline directives that switch the
//! speaking voice or rate for that line and every line after it:
//!
//! ```text
//! [voice:af_bella] Hello there.
//! [speed:1.5] Goodbye now
//! [voice:bm_george][speed:0.9] A different narrator takes over.
//! ```
//!
//! The document is planned into segments, each segment is synthesized by a
//! [`SpeechSynthesizer`], and the results are joined with short pauses into a
//! single [`AudioBuffer`].
//!
//! ## Features
//!
//! - **Markup directives**: `[voice:<id>]` and `[speed:<factor>]` at the start of a line
//! - **Voice mixing**: a document-wide secondary voice blended into every line
//!   until the first manual voice switch
//! - **Engines**: local Kokoro ONNX (`kokoro` feature) or any OpenAI-compatible
//!   speech endpoint (`http` feature)
//!
//! ## Quick Start
//!
//! ```ignore
//! use tts_narrator::{engines::http::{HttpEngine, HttpEngineConfig}, process_document, DocumentOptionsBuilder};
//!
//! let engine = HttpEngine::new(HttpEngineConfig::default())?;
//! let options = DocumentOptionsBuilder::default()
//!     .voice("af_sarah")
//!     .speed(1.0)
//!     .build()?;
//!
//! let narration = process_document("[voice:af_bella] Hello there.", &options, &engine)?;
//! narration.audio.write_wav(std::path::Path::new("narration.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assembler;
pub mod document;
pub mod engines;
pub mod error;
pub mod markup;
pub mod planner;
pub mod registry;

use std::io::Cursor;
use std::path::Path;

pub use assembler::{Assembler, PausePolicy};
pub use document::{
    process_document, CompositeAudio, DocumentOptions, DocumentOptionsBuilder, FailurePolicy,
    SkippedSegment,
};
pub use error::{AssemblyError, DocumentError, SegmentError, SynthesisError};
pub use markup::{parse_line, Directive, ParsedLine};
pub use planner::{RenderState, Segment, SegmentPlanner};
pub use registry::{list_voices, Gender, VoiceDescriptor, VoiceRegistry};

/// Mono PCM audio produced by a synthesizer.
///
/// Contains raw f32 audio samples and the sample rate of the output audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Raw audio samples as f32 values in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for Kokoro)
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A buffer of `duration_ms` milliseconds of silence.
    pub fn silence(duration_ms: u32, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; silence_len(duration_ms, sample_rate)],
            sample_rate,
        }
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        }
    }

    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let mut writer = hound::WavWriter::create(path, self.wav_spec())?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }

    /// Encode the audio as an in-memory 32-bit float WAV file.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, hound::Error> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, self.wav_spec())?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    /// Decode a WAV payload into mono f32 samples.
    ///
    /// Integer PCM is scaled to `[-1.0, 1.0]`; multi-channel audio is
    /// downmixed by averaging the channels of each frame.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, SynthesisError> {
        let reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| SynthesisError::InvalidAudio(e.to_string()))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| SynthesisError::InvalidAudio(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| SynthesisError::InvalidAudio(e.to_string()))?
            }
        };

        let channels = usize::from(spec.channels.max(1));
        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect()
        };

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Number of samples covering `duration_ms` at `sample_rate`, rounded to nearest.
pub(crate) fn silence_len(duration_ms: u32, sample_rate: u32) -> usize {
    ((u64::from(duration_ms) * u64::from(sample_rate) + 500) / 1000) as usize
}

/// Common interface for text-to-speech backends.
///
/// Implementations are constructed once, before the first document is
/// processed, and shared by reference between runs. Each call must be
/// independent of earlier calls apart from the loaded model itself, and
/// implementations holding a single model instance must serialize concurrent
/// calls internally.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one planned segment into mono audio.
    fn synthesize(&self, segment: &Segment) -> Result<AudioBuffer, SynthesisError>;

    /// Whether blended voice ids of the form `"a+b"` are understood.
    fn supports_blending(&self) -> bool {
        false
    }

    /// Short identifier used in log output.
    fn name(&self) -> &str;
}

//! Document processing: plan, synthesize and assemble one narration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::assembler::{Assembler, PausePolicy};
use crate::error::{DocumentError, SegmentError};
use crate::planner::{normalize_mix, Segment, SegmentPlanner};
use crate::registry::VoiceRegistry;
use crate::{AudioBuffer, SpeechSynthesizer};

/// What to do when a single segment cannot be synthesized or appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure, leave the segment out and carry on.
    #[default]
    Skip,
    /// Fail the whole run on the first failed segment.
    Abort,
}

/// Caller defaults for one run.
///
/// ```
/// use tts_narrator::{DocumentOptionsBuilder, FailurePolicy};
///
/// let options = DocumentOptionsBuilder::default()
///     .voice("af_sarah")
///     .speed(1.2)
///     .mix("af_bella")
///     .on_failure(FailurePolicy::Abort)
///     .build()
///     .unwrap();
/// assert_eq!(options.display_voice(), "af_sarah + af_bella");
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct DocumentOptions {
    /// Voice id or friendly name used until the first `[voice:...]` directive.
    #[builder(setter(into))]
    pub voice: String,
    /// Speaking rate multiplier used until the first `[speed:...]` directive.
    pub speed: f32,
    /// Secondary voice blended into every line until a voice directive.
    #[builder(setter(into, strip_option))]
    pub mix: Option<String>,
    pub pauses: PausePolicy,
    pub on_failure: FailurePolicy,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            voice: "af_heart".to_string(),
            speed: 1.0,
            mix: None,
            pauses: PausePolicy::default(),
            on_failure: FailurePolicy::default(),
        }
    }
}

impl DocumentOptions {
    pub fn validate(&self) -> Result<(), String> {
        validate_speed(self.speed)?;
        if self.voice.trim().is_empty() {
            return Err("default voice must not be empty".to_string());
        }
        self.pauses.validate()
    }

    /// Voice label for listings, e.g. `af_bella + af_sarah` when mixed.
    pub fn display_voice(&self) -> String {
        match normalize_mix(self.mix.as_deref()) {
            Some(mix) => format!("{} + {}", self.voice, mix),
            None => self.voice.clone(),
        }
    }
}

impl DocumentOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(speed) = self.speed {
            validate_speed(speed)?;
        }
        if let Some(voice) = &self.voice {
            if voice.trim().is_empty() {
                return Err("default voice must not be empty".to_string());
            }
        }
        if let Some(pauses) = &self.pauses {
            pauses.validate()?;
        }
        Ok(())
    }
}

fn validate_speed(speed: f32) -> Result<(), String> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(format!("speed must be a positive number, got {speed}"))
    }
}

/// A segment that was left out of the narration.
#[derive(Debug)]
pub struct SkippedSegment {
    /// Position among the planned segments, starting at 0.
    pub index: usize,
    pub segment: Segment,
    pub error: SegmentError,
}

/// The narration produced by one run.
#[derive(Debug)]
pub struct CompositeAudio {
    pub audio: AudioBuffer,
    /// Number of segments that made it into `audio`.
    pub segments: usize,
    /// Segments dropped under [`FailurePolicy::Skip`].
    pub skipped: Vec<SkippedSegment>,
}

impl CompositeAudio {
    pub fn duration_secs(&self) -> f64 {
        self.audio.duration_secs()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Turn an annotated document into one narration.
///
/// Lines are planned, synthesized and appended strictly in order. Segment
/// failures are handled according to `options.on_failure`. A mix voice is
/// ignored when `synth` cannot blend voices.
///
/// # Errors
///
/// - [`DocumentError::EmptyInput`] for empty or whitespace-only text
/// - [`DocumentError::NoSegments`] when every line holds only directives
/// - [`DocumentError::NoAudio`] when every segment failed
/// - [`DocumentError::SegmentFailed`] on the first failure under [`FailurePolicy::Abort`]
/// - [`DocumentError::InvalidOptions`] for a bad default voice, speed or pause policy
pub fn process_document(
    raw_text: &str,
    options: &DocumentOptions,
    synth: &dyn SpeechSynthesizer,
) -> Result<CompositeAudio, DocumentError> {
    if raw_text.trim().is_empty() {
        return Err(DocumentError::EmptyInput);
    }
    options.validate().map_err(DocumentError::InvalidOptions)?;

    let mix = match normalize_mix(options.mix.as_deref()) {
        Some(mix) if !synth.supports_blending() => {
            log::warn!(
                "{} cannot blend voices, ignoring mix voice '{mix}'",
                synth.name()
            );
            None
        }
        mix => mix,
    };

    let registry = VoiceRegistry::builtin();
    let mut planner = SegmentPlanner::new(registry, &options.voice, options.speed, mix);
    let mut assembler = Assembler::new(options.pauses);
    let mut skipped = Vec::new();
    let mut planned = 0usize;

    for line in raw_text.lines() {
        let Some(segment) = planner.plan_line(line) else {
            continue;
        };
        let index = planned;
        planned += 1;

        log::debug!(
            "Segment {index} [{} @ {:.2}x] via {}: {}",
            segment.voice,
            segment.speed,
            synth.name(),
            snippet(&segment.text, 30)
        );

        let result = synth
            .synthesize(&segment)
            .map_err(SegmentError::from)
            .and_then(|audio| {
                assembler
                    .push(&audio, &segment.text)
                    .map_err(SegmentError::from)
            });

        if let Err(error) = result {
            match options.on_failure {
                FailurePolicy::Abort => {
                    return Err(DocumentError::SegmentFailed {
                        index,
                        source: error,
                    })
                }
                FailurePolicy::Skip => {
                    log::warn!("Skipping segment {index}: {error}");
                    skipped.push(SkippedSegment {
                        index,
                        segment,
                        error,
                    });
                }
            }
        }
    }

    if planned == 0 {
        return Err(DocumentError::NoSegments);
    }

    let segments = assembler.segments();
    let audio = assembler
        .finish()
        .ok_or(DocumentError::NoAudio { attempted: planned })?;

    log::info!(
        "Assembled {segments}/{planned} segments into {:.2}s of audio",
        audio.duration_secs()
    );

    Ok(CompositeAudio {
        audio,
        segments,
        skipped,
    })
}

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

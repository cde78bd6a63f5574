//! Joins per-segment audio into one narration.

use serde::{Deserialize, Serialize};

use crate::error::AssemblyError;
use crate::{silence_len, AudioBuffer};

/// Length of the silence that follows each segment.
///
/// Text ending in a period gets the sentence pause, anything else the clause
/// pause. The sentence pause must be the longer of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PausePolicy {
    pub sentence_pause_ms: u32,
    pub clause_pause_ms: u32,
}

impl Default for PausePolicy {
    fn default() -> Self {
        Self {
            sentence_pause_ms: 350,
            clause_pause_ms: 200,
        }
    }
}

impl PausePolicy {
    /// Pause in milliseconds after a segment spoken from `source_text`.
    pub fn pause_ms(&self, source_text: &str) -> u32 {
        if source_text.trim_end().ends_with('.') {
            self.sentence_pause_ms
        } else {
            self.clause_pause_ms
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.clause_pause_ms == 0 {
            return Err("clause pause must be longer than 0 ms".to_string());
        }
        if self.sentence_pause_ms <= self.clause_pause_ms {
            return Err(format!(
                "sentence pause ({} ms) must be longer than clause pause ({} ms)",
                self.sentence_pause_ms, self.clause_pause_ms
            ));
        }
        Ok(())
    }
}

/// Accumulates segment audio in order, appending a pause after each one.
///
/// The first buffer fixes the sample rate of the narration; later buffers
/// with a different rate are rejected rather than resampled.
#[derive(Debug)]
pub struct Assembler {
    policy: PausePolicy,
    sample_rate: Option<u32>,
    samples: Vec<f32>,
    segments: usize,
}

impl Assembler {
    pub fn new(policy: PausePolicy) -> Self {
        Self {
            policy,
            sample_rate: None,
            samples: Vec::new(),
            segments: 0,
        }
    }

    /// Append `buffer` followed by the pause chosen for `source_text`.
    ///
    /// On error nothing is appended.
    pub fn push(&mut self, buffer: &AudioBuffer, source_text: &str) -> Result<(), AssemblyError> {
        if buffer.is_empty() {
            return Err(AssemblyError::EmptyBuffer);
        }
        if buffer.sample_rate == 0 {
            return Err(AssemblyError::InvalidSampleRate(0));
        }
        let rate = *self.sample_rate.get_or_insert(buffer.sample_rate);
        if buffer.sample_rate != rate {
            return Err(AssemblyError::SampleRateMismatch {
                expected: rate,
                actual: buffer.sample_rate,
            });
        }

        let pause = silence_len(self.policy.pause_ms(source_text), rate);
        self.samples.reserve(buffer.samples.len() + pause);
        self.samples.extend_from_slice(&buffer.samples);
        self.samples.resize(self.samples.len() + pause, 0.0);
        self.segments += 1;
        Ok(())
    }

    /// Number of segments appended so far.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// The joined audio, or `None` if nothing was appended.
    pub fn finish(self) -> Option<AudioBuffer> {
        let rate = self.sample_rate?;
        if self.segments == 0 {
            return None;
        }
        Some(AudioBuffer::new(self.samples, rate))
    }
}

/// Join `(audio, source_text)` pairs in order.
pub fn assemble<'a, I>(
    parts: I,
    policy: PausePolicy,
) -> Result<Option<AudioBuffer>, AssemblyError>
where
    I: IntoIterator<Item = (&'a AudioBuffer, &'a str)>,
{
    let mut assembler = Assembler::new(policy);
    for (buffer, text) in parts {
        assembler.push(buffer, text)?;
    }
    Ok(assembler.finish())
}

//! Line-by-line planning of a document into synthesis segments.

use serde::{Deserialize, Serialize};

use crate::markup::{parse_line, Directive};
use crate::registry::VoiceRegistry;

/// Sentinel accepted in place of a mix voice to mean "no mix".
pub const NO_MIX: &str = "none";

/// One resolved unit of speech, ready for synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Voice id, or a blended id `"<voice>+<mix>"`.
    pub voice: String,
    pub speed: f32,
}

/// Voice and speed in effect at the current line of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    voice: String,
    speed: f32,
    mix: Option<String>,
}

impl RenderState {
    /// Start from the caller's defaults. A mix of `None`, `""` or `"none"`
    /// disables blending.
    pub fn new(voice: impl Into<String>, speed: f32, mix: Option<&str>) -> Self {
        Self {
            voice: voice.into(),
            speed,
            mix: normalize_mix(mix).map(str::to_string),
        }
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn mix(&self) -> Option<&str> {
        self.mix.as_deref()
    }

    /// Apply one directive. A voice switch drops the mix for good.
    pub fn apply(&mut self, directive: &Directive) {
        match directive {
            Directive::Voice(voice) => {
                self.voice = voice.clone();
                self.mix = None;
            }
            Directive::Speed(speed) => self.speed = *speed,
        }
    }

    /// The voice a segment should be spoken with under the current state.
    pub fn resolved_voice(&self) -> String {
        match &self.mix {
            Some(mix) => format!("{}+{}", self.voice, mix),
            None => self.voice.clone(),
        }
    }
}

/// Returns the mix voice, or `None` for absent, blank or `"none"`.
pub fn normalize_mix(mix: Option<&str>) -> Option<&str> {
    mix.map(str::trim)
        .filter(|m| !m.is_empty() && !m.eq_ignore_ascii_case(NO_MIX))
}

/// Turns lines into segments while tracking the run's [`RenderState`].
///
/// One planner belongs to one run; it is fed lines top to bottom and never
/// revisits earlier ones.
pub struct SegmentPlanner<'r> {
    state: RenderState,
    registry: &'r VoiceRegistry,
}

impl<'r> SegmentPlanner<'r> {
    /// Create a planner. Voice names (default, mix and directive values) are
    /// resolved through `registry`; unknown names pass through unchanged.
    pub fn new(registry: &'r VoiceRegistry, voice: &str, speed: f32, mix: Option<&str>) -> Self {
        let mix = normalize_mix(mix).map(|m| registry.resolve(m));
        Self {
            state: RenderState::new(registry.resolve(voice), speed, mix.as_deref()),
            registry,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Apply the line's directives and return its segment, if it has text.
    ///
    /// Blank lines leave the state untouched.
    pub fn plan_line(&mut self, line: &str) -> Option<Segment> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let parsed = parse_line(line);
        for directive in &parsed.directives {
            let directive = match directive {
                Directive::Voice(name) => Directive::Voice(self.registry.resolve(name)),
                other => other.clone(),
            };
            self.state.apply(&directive);
        }

        if parsed.text.is_empty() {
            return None;
        }

        Some(Segment {
            text: parsed.text.to_string(),
            voice: self.state.resolved_voice(),
            speed: self.state.speed(),
        })
    }

    /// Plan every line of `document`.
    pub fn plan_document(&mut self, document: &str) -> Vec<Segment> {
        document
            .lines()
            .filter_map(|line| self.plan_line(line))
            .collect()
    }
}

//! Catalog of known Kokoro voices.
//!
//! Voice ids follow the Kokoro convention `{language}{gender}_{name}`, e.g.
//! `af_bella` is an American English female voice. The catalog is only used
//! for presentation and friendly-name lookup: ids that are not listed here are
//! still accepted and handed to the synthesizer untouched.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        })
    }
}

/// Display metadata for one voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub id: String,
    pub display_name: String,
    pub language: String,
    pub region: String,
    pub gender: Gender,
}

impl VoiceDescriptor {
    pub fn new(id: &str, display_name: &str, language: &str, region: &str, gender: Gender) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            language: language.to_string(),
            region: region.to_string(),
            gender,
        }
    }

    /// Picker label, e.g. `[English - American - Female] Bella`.
    pub fn label(&self) -> String {
        format!(
            "[{} - {} - {}] {}",
            self.language, self.region, self.gender, self.display_name
        )
    }

    /// Short friendly name, e.g. `Bella (American)`.
    pub fn friendly_name(&self) -> String {
        format!("{} ({})", self.display_name, self.region)
    }

    pub fn is_english(&self) -> bool {
        self.language == "English"
    }

    fn sort_cmp(&self, other: &Self) -> Ordering {
        // English first, then language, region, gender, name.
        other
            .is_english()
            .cmp(&self.is_english())
            .then_with(|| self.language.cmp(&other.language))
            .then_with(|| self.region.cmp(&other.region))
            .then_with(|| self.gender.cmp(&other.gender))
            .then_with(|| self.display_name.cmp(&other.display_name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Voice with empty id (display name {0:?})")]
    EmptyId(String),
    #[error("Duplicate voice id '{0}'")]
    DuplicateId(String),
}

/// Sorted, validated voice catalog.
#[derive(Debug, Clone)]
pub struct VoiceRegistry {
    voices: Vec<VoiceDescriptor>,
}

impl VoiceRegistry {
    /// Build a registry, rejecting empty or duplicate ids.
    pub fn new(mut voices: Vec<VoiceDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(voices.len());
        for voice in &voices {
            if voice.id.trim().is_empty() {
                return Err(RegistryError::EmptyId(voice.display_name.clone()));
            }
            if !seen.insert(voice.id.as_str()) {
                return Err(RegistryError::DuplicateId(voice.id.clone()));
            }
        }
        voices.sort_by(VoiceDescriptor::sort_cmp);
        Ok(Self { voices })
    }

    /// The process-wide Kokoro v1.0 catalog, built on first use.
    pub fn builtin() -> &'static VoiceRegistry {
        static BUILTIN: OnceLock<VoiceRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let voices = KOKORO_VOICES
                .iter()
                .map(|&(id, name, lang, region, gender)| {
                    VoiceDescriptor::new(id, name, lang, region, gender)
                })
                .collect();
            Self::new(voices).unwrap_or_else(|e| {
                log::error!("Built-in voice table is invalid, catalog disabled: {e}");
                Self { voices: Vec::new() }
            })
        })
    }

    /// All voices, English first, then by language, region, gender and name.
    pub fn list(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn get(&self, id: &str) -> Option<&VoiceDescriptor> {
        self.voices.iter().find(|v| v.id == id)
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Map an id, a picker label or a friendly name to a canonical voice id.
    ///
    /// Anything unrecognised is returned unchanged (trimmed) so newer engine
    /// voices keep working without a catalog update.
    pub fn resolve(&self, name_or_id: &str) -> String {
        let wanted = name_or_id.trim();
        if self.is_known(wanted) {
            return wanted.to_string();
        }

        self.voices
            .iter()
            .find(|v| {
                v.label().eq_ignore_ascii_case(wanted)
                    || v.friendly_name().eq_ignore_ascii_case(wanted)
            })
            .map(|v| v.id.clone())
            .unwrap_or_else(|| wanted.to_string())
    }
}

/// Sorted list of the built-in voices.
pub fn list_voices() -> Vec<VoiceDescriptor> {
    VoiceRegistry::builtin().list().to_vec()
}

use Gender::{Female, Male};

#[rustfmt::skip]
const KOKORO_VOICES: &[(&str, &str, &str, &str, Gender)] = &[
    // American English
    ("af_alloy",    "Alloy",    "English", "American", Female),
    ("af_aoede",    "Aoede",    "English", "American", Female),
    ("af_bella",    "Bella",    "English", "American", Female),
    ("af_heart",    "Heart",    "English", "American", Female),
    ("af_jessica",  "Jessica",  "English", "American", Female),
    ("af_kore",     "Kore",     "English", "American", Female),
    ("af_nicole",   "Nicole",   "English", "American", Female),
    ("af_river",    "River",    "English", "American", Female),
    ("af_sarah",    "Sarah",    "English", "American", Female),
    ("af_sky",      "Sky",      "English", "American", Female),
    ("am_adam",     "Adam",     "English", "American", Male),
    ("am_echo",     "Echo",     "English", "American", Male),
    ("am_eric",     "Eric",     "English", "American", Male),
    ("am_fenrir",   "Fenrir",   "English", "American", Male),
    ("am_liam",     "Liam",     "English", "American", Male),
    ("am_michael",  "Michael",  "English", "American", Male),
    ("am_onyx",     "Onyx",     "English", "American", Male),
    ("am_puck",     "Puck",     "English", "American", Male),
    ("am_santa",    "Santa",    "English", "American", Male),
    // British English
    ("bf_alice",    "Alice",    "English", "British", Female),
    ("bf_emma",     "Emma",     "English", "British", Female),
    ("bf_isabella", "Isabella", "English", "British", Female),
    ("bf_lily",     "Lily",     "English", "British", Female),
    ("bm_daniel",   "Daniel",   "English", "British", Male),
    ("bm_fable",    "Fable",    "English", "British", Male),
    ("bm_george",   "George",   "English", "British", Male),
    ("bm_lewis",    "Lewis",    "English", "British", Male),
    // Japanese
    ("jf_alpha",      "Alpha",      "Japanese", "Japan", Female),
    ("jf_gongitsune", "Gongitsune", "Japanese", "Japan", Female),
    ("jf_nezumi",     "Nezumi",     "Japanese", "Japan", Female),
    ("jf_tebukuro",   "Tebukuro",   "Japanese", "Japan", Female),
    ("jm_kumo",       "Kumo",       "Japanese", "Japan", Male),
    // Mandarin Chinese
    ("zf_xiaobei",  "Xiaobei",  "Chinese", "China", Female),
    ("zf_xiaoni",   "Xiaoni",   "Chinese", "China", Female),
    ("zf_xiaoxiao", "Xiaoxiao", "Chinese", "China", Female),
    ("zf_xiaoyi",   "Xiaoyi",   "Chinese", "China", Female),
    // Spanish
    ("ef_dora",     "Dora",     "Spanish", "Spain", Female),
    ("em_alex",     "Alex",     "Spanish", "Spain", Male),
    ("em_santa",    "Santa",    "Spanish", "Spain", Male),
    // French
    ("ff_siwis",    "Siwis",    "French", "France", Female),
    // Hindi
    ("hf_alpha",    "Alpha",    "Hindi", "India", Female),
    ("hf_beta",     "Beta",     "Hindi", "India", Female),
    ("hm_omega",    "Omega",    "Hindi", "India", Male),
    ("hm_psi",      "Psi",      "Hindi", "India", Male),
    // Italian
    ("if_sara",     "Sara",     "Italian", "Italy", Female),
    ("im_nicola",   "Nicola",   "Italian", "Italy", Male),
    // Brazilian Portuguese
    ("pf_dora",     "Dora",     "Portuguese", "Brazil", Female),
    ("pm_alex",     "Alex",     "Portuguese", "Brazil", Male),
    ("pm_santa",    "Santa",    "Portuguese", "Brazil", Male),
];

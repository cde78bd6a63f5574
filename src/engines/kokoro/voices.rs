use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::{KokoroError, STYLE_DIM};

/// Separator between component voices of a blended voice id.
pub const BLEND_SEPARATOR: char = '+';

type Style = [f32; STYLE_DIM];

/// Style vectors for every voice in the archive.
///
/// Each voice holds one style vector per phoneme-sequence length, so the
/// vector used for synthesis is picked by token count.
pub struct VoiceStore {
    voices: HashMap<String, Vec<Style>>,
}

impl VoiceStore {
    /// Load all voices from a `.npz` archive (`voices-v1.0.bin`).
    ///
    /// Each entry is a `.npy` array named after the voice, e.g. `af_heart.npy`.
    pub fn load(path: &Path) -> Result<Self, KokoroError> {
        let file = File::open(path)?;
        let mut zip = zip::ZipArchive::new(file)
            .map_err(|e| KokoroError::VoiceParse(format!("Failed to open zip archive: {e}")))?;

        let mut voices = HashMap::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(|e| {
                KokoroError::VoiceParse(format!("Failed to read zip entry {i}: {e}"))
            })?;
            if entry.is_dir() {
                continue;
            }

            let entry_name = entry.name().to_string();
            let Some(voice) = entry_name.strip_suffix(".npy").filter(|v| !v.is_empty()) else {
                log::debug!("Skipping non-voice archive entry {entry_name}");
                continue;
            };

            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| KokoroError::VoiceParse(format!("Failed to read {entry_name}: {e}")))?;
            voices.insert(voice.to_string(), parse_npy(&data, &entry_name)?);
        }

        log::info!("Loaded {} voices", voices.len());
        Ok(Self { voices })
    }

    /// Build a store from already decoded style tables.
    pub fn from_styles(voices: HashMap<String, Vec<Style>>) -> Self {
        Self { voices }
    }

    fn styles(&self, voice: &str) -> Result<&[Style], KokoroError> {
        self.voices
            .get(voice)
            .map(Vec::as_slice)
            .filter(|styles| !styles.is_empty())
            .ok_or_else(|| KokoroError::VoiceNotFound(voice.to_string()))
    }

    /// Style vector for `voice` at `idx`, clamped to the available range.
    ///
    /// A blended id such as `af_bella+af_sky` yields the element-wise mean of
    /// its components.
    pub fn style(&self, voice: &str, idx: usize) -> Result<Style, KokoroError> {
        let mut blended = [0f32; STYLE_DIM];
        let mut count = 0usize;

        for component in voice.split(BLEND_SEPARATOR).map(str::trim) {
            if component.is_empty() {
                return Err(KokoroError::VoiceNotFound(voice.to_string()));
            }
            let styles = self.styles(component)?;
            let style = &styles[idx.min(styles.len() - 1)];
            for (acc, value) in blended.iter_mut().zip(style.iter()) {
                *acc += value;
            }
            count += 1;
        }

        let scale = 1.0 / count as f32;
        blended.iter_mut().for_each(|v| *v *= scale);
        Ok(blended)
    }

    pub fn contains(&self, voice: &str) -> bool {
        voice
            .split(BLEND_SEPARATOR)
            .all(|component| self.voices.contains_key(component.trim()))
    }

    /// Voice names in sorted order.
    pub fn list_voices(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.voices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Decode a little-endian float32 `.npy` array of shape `[N, 256]`.
fn parse_npy(data: &[u8], name: &str) -> Result<Vec<Style>, KokoroError> {
    const MAGIC: &[u8] = b"\x93NUMPY";

    if data.len() < 10 || !data.starts_with(MAGIC) {
        return Err(KokoroError::VoiceParse(format!("{name}: not a numpy file")));
    }

    // v1 header: magic(6) major(1) minor(1) header_len(u16 le)
    let header_len = usize::from(u16::from_le_bytes([data[8], data[9]]));
    let payload = data.get(10 + header_len..).ok_or_else(|| {
        KokoroError::VoiceParse(format!("{name}: header truncated ({} bytes)", data.len()))
    })?;

    let row_bytes = STYLE_DIM * 4;
    if payload.len() % row_bytes != 0 {
        return Err(KokoroError::VoiceParse(format!(
            "{name}: payload of {} bytes is not a whole number of {STYLE_DIM}-float rows",
            payload.len()
        )));
    }

    Ok(payload
        .chunks_exact(row_bytes)
        .map(|row| {
            let mut style = [0f32; STYLE_DIM];
            for (value, bytes) in style.iter_mut().zip(row.chunks_exact(4)) {
                *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            style
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VoiceStore {
        let mut voices = HashMap::new();
        voices.insert("af_bella".to_string(), vec![[1.0; STYLE_DIM], [3.0; STYLE_DIM]]);
        voices.insert("af_sky".to_string(), vec![[5.0; STYLE_DIM]]);
        VoiceStore::from_styles(voices)
    }

    fn npy(rows: &[Style]) -> Vec<u8> {
        let header = b"{'descr': '<f4', 'fortran_order': False, 'shape': (1, 256), }\n";
        let mut data = b"\x93NUMPY\x01\x00".to_vec();
        data.extend_from_slice(&(header.len() as u16).to_le_bytes());
        data.extend_from_slice(header);
        for row in rows {
            for value in row {
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
        data
    }

    #[test]
    fn style_index_is_clamped() {
        let store = store();
        assert_eq!(store.style("af_bella", 0).unwrap()[0], 1.0);
        assert_eq!(store.style("af_bella", 1).unwrap()[0], 3.0);
        assert_eq!(store.style("af_bella", 99).unwrap()[0], 3.0);
    }

    #[test]
    fn blended_voice_averages_components() {
        let store = store();
        let style = store.style("af_bella+af_sky", 0).unwrap();
        assert!(style.iter().all(|&v| v == 3.0));
        assert!(store.contains("af_bella+af_sky"));
    }

    #[test]
    fn unknown_component_is_reported() {
        let store = store();
        let err = store.style("af_bella+zz_nobody", 0).unwrap_err();
        assert!(matches!(err, KokoroError::VoiceNotFound(v) if v == "zz_nobody"));
        assert!(store.style("af_bella+", 0).is_err());
        assert!(!store.contains("af_bella+zz_nobody"));
    }

    #[test]
    fn lists_voices_sorted() {
        assert_eq!(store().list_voices(), ["af_bella", "af_sky"]);
    }

    #[test]
    fn parses_npy_rows() {
        let mut row = [0.0; STYLE_DIM];
        row[0] = 0.5;
        row[STYLE_DIM - 1] = -2.0;
        let styles = parse_npy(&npy(&[row, [1.0; STYLE_DIM]]), "x.npy").unwrap();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles[0][0], 0.5);
        assert_eq!(styles[0][STYLE_DIM - 1], -2.0);
        assert_eq!(styles[1][7], 1.0);
    }

    #[test]
    fn rejects_bad_npy() {
        assert!(parse_npy(b"PK\x03\x04", "x.npy").is_err());
        let mut truncated = npy(&[[1.0; STYLE_DIM]]);
        truncated.pop();
        assert!(parse_npy(&truncated, "x.npy").is_err());
    }
}

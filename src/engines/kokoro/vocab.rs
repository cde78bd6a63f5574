use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::model::KokoroError;

/// Characters that end a clause; preferred cut points for long inputs.
const SPLIT_PUNCTUATION: &[char] = &[';', ':', ',', '.', '!', '?'];

#[derive(Deserialize)]
struct ModelConfig {
    vocab: HashMap<String, i64>,
}

/// Load the phoneme vocabulary from the model's `config.json`.
///
/// The `"vocab"` field maps single-character strings to token ids.
pub fn load_vocab(config_path: &Path) -> Result<HashMap<char, i64>, KokoroError> {
    let content = std::fs::read_to_string(config_path)?;
    parse_vocab(&content)
}

fn parse_vocab(json: &str) -> Result<HashMap<char, i64>, KokoroError> {
    let config: ModelConfig =
        serde_json::from_str(json).map_err(|e| KokoroError::Config(e.to_string()))?;

    config
        .vocab
        .into_iter()
        .map(|(key, id)| {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok((ch, id)),
                _ => Err(KokoroError::Config(format!(
                    "vocab key {key:?} is not a single character"
                ))),
            }
        })
        .collect()
}

/// Token ids of the clause punctuation present in `vocab`.
pub fn punctuation_ids(vocab: &HashMap<char, i64>) -> Vec<i64> {
    SPLIT_PUNCTUATION
        .iter()
        .filter_map(|ch| vocab.get(ch).copied())
        .collect()
}

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::model::KokoroError;
use super::voices::BLEND_SEPARATOR;

/// Location of the espeak-ng binary and its data directory.
///
/// `None` falls back to `espeak-ng` on PATH and its compiled-in data path.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

impl EspeakConfig {
    fn command(&self) -> Command {
        let mut cmd = match &self.bin_path {
            Some(bin) => Command::new(bin),
            None => Command::new("espeak-ng"),
        };
        if let Some(data) = &self.data_path {
            cmd.env("ESPEAK_DATA_PATH", data);
        }
        cmd
    }
}

/// espeak-ng language for a voice id, taken from its two-letter prefix.
///
/// Blended ids use the language of their first component.
pub fn voice_lang(voice: &str) -> &'static str {
    let primary = voice.split(BLEND_SEPARATOR).next().unwrap_or(voice).trim();
    match primary.get(..2).unwrap_or(primary) {
        "af" | "am" => "en-us",
        "bf" | "bm" => "en-gb",
        "ef" | "em" => "es",
        "ff" => "fr",
        "hf" | "hm" => "hi",
        "if" | "im" => "it",
        "jf" | "jm" => "ja",
        "pf" | "pm" => "pt-br",
        "zf" | "zm" => "cmn",
        _ => "en-us",
    }
}

/// Convert text into Kokoro token ids.
///
/// Words go through espeak-ng for IPA; punctuation is mapped directly so
/// pauses inside a segment survive phonemization. Characters missing from
/// `vocab` are dropped.
pub fn phonemize(
    text: &str,
    lang: &str,
    vocab: &HashMap<char, i64>,
    espeak: &EspeakConfig,
) -> Result<Vec<i64>, KokoroError> {
    let parts = split_text_parts(text);
    if parts.is_empty() {
        return Ok(Vec::new());
    }

    let words: Vec<&str> = parts
        .iter()
        .filter_map(|part| match part {
            TextPart::Words(w) => Some(w.as_str()),
            TextPart::Punct(_) => None,
        })
        .collect();
    let ipa = if words.is_empty() {
        Vec::new()
    } else {
        ipa_lines(&words, lang, espeak)?
    };
    let mut ipa = ipa.into_iter();

    let mut ids = Vec::new();
    for part in &parts {
        match part {
            TextPart::Words(_) => {
                if let Some(line) = ipa.next() {
                    ids.extend(ipa_to_ids(&line, vocab));
                }
            }
            TextPart::Punct(ch) => ids.extend(vocab.get(ch).copied()),
        }
    }
    Ok(ids)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TextPart {
    Words(String),
    Punct(char),
}

fn is_boundary(ch: char) -> bool {
    matches!(
        ch,
        '.' | '!' | '?' | ',' | ';' | ':' | '—' | '…' | '"' | '(' | ')' | '\u{201c}' | '\u{201d}'
    )
}

/// Split text into runs of words and single punctuation marks.
///
/// `.` and `,` between two digits stay inside the number (`2.0`, `1,000`).
fn split_text_parts(text: &str) -> Vec<TextPart> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut words = String::new();

    let flush = |words: &mut String, parts: &mut Vec<TextPart>| {
        let trimmed = words.trim();
        if !trimmed.is_empty() {
            parts.push(TextPart::Words(trimmed.to_string()));
        }
        words.clear();
    };

    for (i, &ch) in chars.iter().enumerate() {
        let in_number = matches!(ch, '.' | ',')
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit());

        if is_boundary(ch) && !in_number {
            flush(&mut words, &mut parts);
            parts.push(TextPart::Punct(ch));
        } else if ch.is_whitespace() {
            if !words.is_empty() && !words.ends_with(' ') {
                words.push(' ');
            }
        } else {
            words.push(ch);
        }
    }
    flush(&mut words, &mut parts);

    parts
}

/// Phonemize each word run, one IPA line per input.
fn ipa_lines(
    words: &[&str],
    lang: &str,
    espeak: &EspeakConfig,
) -> Result<Vec<String>, KokoroError> {
    let output = run_espeak(&words.join("\n"), lang, espeak)?;
    let lines: Vec<String> = output.lines().map(str::to_string).collect();
    if lines.len() == words.len() {
        return Ok(lines);
    }

    // espeak-ng occasionally merges or splits lines; fall back to one call per run.
    log::debug!(
        "espeak-ng returned {} lines for {} inputs, phonemizing separately",
        lines.len(),
        words.len()
    );
    words
        .iter()
        .map(|w| {
            let ipa = run_espeak(w, lang, espeak)?;
            Ok(ipa.lines().collect::<Vec<_>>().join(" "))
        })
        .collect()
}

fn run_espeak(input: &str, lang: &str, espeak: &EspeakConfig) -> Result<String, KokoroError> {
    let mut child = espeak
        .command()
        .args(["--ipa", "--stdin", "-q", "-v", lang])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KokoroError::EspeakNotFound,
            _ => KokoroError::Io(e),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // The last line is under-processed without a trailing newline.
        stdin.write_all(input.as_bytes())?;
        if !input.ends_with('\n') {
            stdin.write_all(b"\n")?;
        }
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(KokoroError::PhonemizerFailed(format!(
            "espeak-ng exited with code {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn ipa_to_ids<'v>(
    ipa: &'v str,
    vocab: &'v HashMap<char, i64>,
) -> impl Iterator<Item = i64> + 'v {
    ipa.trim()
        .chars()
        .filter(|&ch| ch != '_')
        .filter_map(|ch| vocab.get(&ch).copied())
}

//! Inline directive parsing.
//!
//! A line may open with any number of bracketed directives, optionally
//! separated by whitespace:
//!
//! ```text
//! [voice:af_bella][speed:1.2] Spoken text starts here.
//! ```
//!
//! Only the leading run is parsed. The first character that does not start a
//! directive ends the run, so `Hello [voice:x]` is spoken literally.
//!
//! Brackets inside a value must balance, which lets a picker label stand in
//! for an id: `[voice:[English - British - Female] Emma]`.

/// A state change requested by markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Switch to a voice id or friendly name (resolved later).
    Voice(String),
    /// Change the speaking rate multiplier.
    Speed(f32),
}

/// A line split into its leading directives and the text left to speak.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedLine<'a> {
    pub directives: Vec<Directive>,
    /// Remaining text, trimmed. Empty when the line held only directives.
    pub text: &'a str,
}

impl ParsedLine<'_> {
    pub fn has_voice_directive(&self) -> bool {
        self.directives
            .iter()
            .any(|d| matches!(d, Directive::Voice(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tag<'a> {
    Voice(&'a str),
    Speed(&'a str),
}

/// Split one line into its leading directives and remaining text.
///
/// Malformed values never fail the line: a speed that is not a positive
/// number, or an empty voice, is logged and dropped, and parsing continues
/// with the next tag.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    let mut directives = Vec::new();
    let mut rest = line.trim_start();

    while let Some((tag, after)) = next_tag(rest) {
        match tag {
            Tag::Voice("") => log::warn!("Ignoring empty voice directive"),
            Tag::Voice(voice) => directives.push(Directive::Voice(voice.to_string())),
            Tag::Speed(raw) => match parse_speed(raw) {
                Some(speed) => directives.push(Directive::Speed(speed)),
                None => log::warn!("Ignoring malformed speed directive {raw:?}"),
            },
        }
        rest = after.trim_start();
    }

    ParsedLine {
        directives,
        text: rest.trim(),
    }
}

/// Match a single `[key:value]` tag at the start of `input`.
///
/// Returns the tag and the input following the closing bracket, or `None`
/// when `input` does not start with a recognised directive.
fn next_tag(input: &str) -> Option<(Tag<'_>, &str)> {
    let body_and_rest = input.strip_prefix('[')?;
    let close = closing_bracket(body_and_rest)?;
    let body = &body_and_rest[..close];
    let rest = &body_and_rest[close + 1..];

    let (key, value) = body.split_once(':')?;
    let key = key.trim();
    let value = value.trim();

    let tag = if key.eq_ignore_ascii_case("voice") {
        Tag::Voice(value)
    } else if key.eq_ignore_ascii_case("speed") {
        Tag::Speed(value)
    } else {
        return None;
    };

    Some((tag, rest))
}

/// Byte offset of the `]` that closes an already opened tag.
fn closing_bracket(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in input.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn parse_speed(raw: &str) -> Option<f32> {
    raw.parse::<f32>()
        .ok()
        .filter(|speed| speed.is_finite() && *speed > 0.0)
}

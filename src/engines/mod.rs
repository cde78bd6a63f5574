//! Speech synthesis engines.
//!
//! This module contains [`SpeechSynthesizer`](crate::SpeechSynthesizer)
//! implementations.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `kokoro` - Kokoro TTS (ONNX format, espeak-ng required)
//! - `http` - any OpenAI-compatible `/v1/audio/speech` endpoint, e.g. Kokoro-FastAPI

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "kokoro")]
pub mod kokoro;

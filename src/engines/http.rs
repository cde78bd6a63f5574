//! Remote synthesis over an OpenAI-compatible speech API.
//!
//! Each segment becomes one `POST {base_url}/v1/audio/speech` request asking
//! for a WAV response:
//!
//! ```json
//! {"model": "kokoro", "input": "Hello there.", "voice": "af_bella", "response_format": "wav", "speed": 1.0}
//! ```
//!
//! Servers such as Kokoro-FastAPI accept blended voices (`af_bella+af_sky`);
//! set [`HttpEngineConfig::supports_blending`] to `false` for servers that
//! do not.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;
use crate::planner::Segment;
use crate::{AudioBuffer, SpeechSynthesizer};

const MIN_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 60;
const SPEECH_PATH: &str = "/v1/audio/speech";

/// Connection settings for a remote speech API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpEngineConfig {
    /// Server root, e.g. `http://localhost:8880`.
    pub base_url: String,
    /// Value of the `model` request field.
    pub model: String,
    /// Per-request timeout, clamped to 30..=60 seconds.
    pub timeout_secs: u64,
    pub supports_blending: bool,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8880".to_string(),
            model: "kokoro".to_string(),
            timeout_secs: MIN_TIMEOUT_SECS,
            supports_blending: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
    speed: f32,
}

/// Synthesizer backed by a remote HTTP endpoint.
pub struct HttpEngine {
    client: Client,
    endpoint: String,
    config: HttpEngineConfig,
    timeout: Duration,
}

impl HttpEngine {
    pub fn new(config: HttpEngineConfig) -> Result<Self, SynthesisError> {
        let timeout_secs = config.timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        if timeout_secs != config.timeout_secs {
            log::warn!(
                "Speech API timeout {}s out of range, using {timeout_secs}s",
                config.timeout_secs
            );
        }
        let timeout = Duration::from_secs(timeout_secs);

        let client = Client::builder()
            .user_agent(concat!("tts-narrator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| SynthesisError::Transport(Box::new(e)))?;

        let endpoint = format!("{}{}", config.base_url.trim_end_matches('/'), SPEECH_PATH);
        log::info!("Using speech API at {endpoint}");

        Ok(Self {
            client,
            endpoint,
            config,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transport_error(&self, e: reqwest::Error) -> SynthesisError {
        if e.is_timeout() {
            SynthesisError::Timeout(self.timeout)
        } else {
            SynthesisError::Transport(Box::new(e))
        }
    }
}

impl SpeechSynthesizer for HttpEngine {
    fn synthesize(&self, segment: &Segment) -> Result<AudioBuffer, SynthesisError> {
        let request = SpeechRequest {
            model: &self.config.model,
            input: &segment.text,
            voice: &segment.voice,
            response_format: "wav",
            speed: segment.speed,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            log::warn!("Speech API error ({status}): {body}");
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().map_err(|e| self.transport_error(e))?;
        AudioBuffer::from_wav_bytes(&bytes)
    }

    fn supports_blending(&self) -> bool {
        self.config.supports_blending
    }

    fn name(&self) -> &str {
        "http"
    }
}

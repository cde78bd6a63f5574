#![cfg(feature = "http")]

use mockito::Matcher;
use serde_json::json;

use tts_narrator::engines::http::{HttpEngine, HttpEngineConfig};
use tts_narrator::{
    process_document, AudioBuffer, DocumentError, DocumentOptionsBuilder, FailurePolicy, Segment,
    SegmentError, SpeechSynthesizer, SynthesisError,
};

fn engine_for(server: &mockito::Server) -> HttpEngine {
    HttpEngine::new(HttpEngineConfig {
        base_url: server.url(),
        ..Default::default()
    })
    .unwrap()
}

fn wav(len: usize) -> Vec<u8> {
    AudioBuffer::new(vec![0.25; len], 24_000)
        .to_wav_bytes()
        .unwrap()
}

fn segment(text: &str, voice: &str, speed: f32) -> Segment {
    Segment {
        text: text.to_string(),
        voice: voice.to_string(),
        speed,
    }
}

#[test]
fn posts_segment_and_decodes_wav() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/audio/speech")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "model": "kokoro",
            "input": "Hello there.",
            "voice": "af_bella",
            "response_format": "wav",
            "speed": 1.5,
        })))
        .with_status(200)
        .with_header("content-type", "audio/wav")
        .with_body(wav(480))
        .create();

    let audio = engine_for(&server)
        .synthesize(&segment("Hello there.", "af_bella", 1.5))
        .unwrap();

    mock.assert();
    assert_eq!(audio.sample_rate, 24_000);
    assert_eq!(audio.samples.len(), 480);
    assert!(audio.samples.iter().all(|&s| (s - 0.25).abs() < 1e-6));
}

#[test]
fn error_status_carries_body() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/audio/speech")
        .with_status(500)
        .with_body("voice not found")
        .create();

    let err = engine_for(&server)
        .synthesize(&segment("Hi", "xx_nobody", 1.0))
        .unwrap_err();

    mock.assert();
    match err {
        SynthesisError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "voice not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_wav_body_is_invalid_audio() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/v1/audio/speech")
        .with_status(200)
        .with_body("<html>not audio</html>")
        .create();

    let err = engine_for(&server)
        .synthesize(&segment("Hi", "af_bella", 1.0))
        .unwrap_err();
    assert!(matches!(err, SynthesisError::InvalidAudio(_)));
}

#[test]
fn unreachable_server_is_transport_error() {
    let engine = HttpEngine::new(HttpEngineConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    })
    .unwrap();

    let err = engine.synthesize(&segment("Hi", "af_bella", 1.0)).unwrap_err();
    assert!(matches!(err, SynthesisError::Transport(_)));
}

#[test]
fn narrates_document_through_server() {
    let mut server = mockito::Server::new();
    let mixed = server
        .mock("POST", "/v1/audio/speech")
        .match_body(Matcher::PartialJson(json!({"voice": "af_sarah+af_bella"})))
        .with_status(200)
        .with_body(wav(2_400))
        .expect(1)
        .create();
    let switched = server
        .mock("POST", "/v1/audio/speech")
        .match_body(Matcher::PartialJson(json!({"voice": "bm_george", "speed": 1.25})))
        .with_status(200)
        .with_body(wav(2_400))
        .expect(1)
        .create();

    let options = DocumentOptionsBuilder::default()
        .voice("af_sarah")
        .mix("af_bella")
        .build()
        .unwrap();
    let narration = process_document(
        "Opening line.\n[voice:bm_george][speed:1.25] Closing line",
        &options,
        &engine_for(&server),
    )
    .unwrap();

    mixed.assert();
    switched.assert();
    assert_eq!(narration.segments, 2);
    assert!(narration.is_complete());
    assert!((narration.duration_secs() - (0.1 + 0.35 + 0.1 + 0.2)).abs() < 1e-6);
}

#[test]
fn blending_can_be_disabled_per_server() {
    let mut server = mockito::Server::new();
    let plain = server
        .mock("POST", "/v1/audio/speech")
        .match_body(Matcher::PartialJson(json!({"voice": "af_sarah"})))
        .with_status(200)
        .with_body(wav(240))
        .expect(1)
        .create();

    let engine = HttpEngine::new(HttpEngineConfig {
        base_url: server.url(),
        supports_blending: false,
        ..Default::default()
    })
    .unwrap();
    let options = DocumentOptionsBuilder::default()
        .voice("af_sarah")
        .mix("af_bella")
        .build()
        .unwrap();

    process_document("Just one line", &options, &engine).unwrap();
    plain.assert();
}

#[test]
fn server_failure_aborts_when_requested() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/v1/audio/speech")
        .with_status(503)
        .with_body("busy")
        .create();

    let options = DocumentOptionsBuilder::default()
        .on_failure(FailurePolicy::Abort)
        .build()
        .unwrap();
    let err = process_document("First\nSecond", &options, &engine_for(&server)).unwrap_err();

    assert!(matches!(
        err,
        DocumentError::SegmentFailed {
            index: 0,
            source: SegmentError::Synthesis(SynthesisError::Status { status: 503, .. }),
        }
    ));
}

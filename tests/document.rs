use std::collections::HashSet;
use std::sync::Mutex;

use tts_narrator::{
    list_voices, process_document, AssemblyError, AudioBuffer, DocumentError, DocumentOptions,
    DocumentOptionsBuilder, FailurePolicy, PausePolicy, Segment, SegmentError,
    SpeechSynthesizer, SynthesisError,
};

const RATE: u32 = 24_000;
/// Each fake segment is 100 ms of audio.
const SEGMENT_SAMPLES: usize = 2_400;

/// Returns a fixed-length buffer per call and records what it was asked for.
struct FakeSynth {
    calls: Mutex<Vec<Segment>>,
    blending: bool,
    fail_on: Option<&'static str>,
    rate_for: Option<(&'static str, u32)>,
}

impl FakeSynth {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            blending: true,
            fail_on: None,
            rate_for: None,
        }
    }

    fn calls(&self) -> Vec<Segment> {
        self.calls.lock().unwrap().clone()
    }
}

impl SpeechSynthesizer for FakeSynth {
    fn synthesize(&self, segment: &Segment) -> Result<AudioBuffer, SynthesisError> {
        self.calls.lock().unwrap().push(segment.clone());
        if self.fail_on.is_some_and(|needle| segment.text.contains(needle)) {
            return Err(SynthesisError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        let rate = match self.rate_for {
            Some((needle, rate)) if segment.text.contains(needle) => rate,
            _ => RATE,
        };
        Ok(AudioBuffer::new(vec![0.1; SEGMENT_SAMPLES], rate))
    }

    fn supports_blending(&self) -> bool {
        self.blending
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn options(voice: &str, speed: f32) -> DocumentOptions {
    DocumentOptionsBuilder::default()
        .voice(voice)
        .speed(speed)
        .build()
        .unwrap()
}

fn seg(text: &str, voice: &str, speed: f32) -> Segment {
    Segment {
        text: text.to_string(),
        voice: voice.to_string(),
        speed,
    }
}

#[test]
fn reference_scenario() {
    let synth = FakeSynth::new();
    let narration = process_document(
        "[voice:af_bella] Hello there.\n[speed:1.5] Goodbye now",
        &options("af_sarah", 1.0),
        &synth,
    )
    .unwrap();

    assert_eq!(
        synth.calls(),
        vec![
            seg("Hello there.", "af_bella", 1.0),
            seg("Goodbye now", "af_bella", 1.5),
        ]
    );
    assert_eq!(narration.segments, 2);
    assert!(narration.is_complete());

    // 2 x 100 ms audio, 350 ms after the period, 200 ms after the last line.
    assert!((narration.duration_secs() - 0.75).abs() < 1e-6);
}

#[test]
fn plain_lines_share_defaults() {
    let synth = FakeSynth::new();
    let text = "First line\nSecond line.\n\n   \nThird line";
    let narration = process_document(text, &options("bm_george", 0.9), &synth).unwrap();

    let calls = synth.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|s| s.voice == "bm_george" && s.speed == 0.9));
    assert_eq!(narration.segments, 3);
}

#[test]
fn empty_input_is_rejected() {
    let synth = FakeSynth::new();
    for text in ["", "   \n\n", "\t\r\n"] {
        let err = process_document(text, &DocumentOptions::default(), &synth).unwrap_err();
        assert!(matches!(err, DocumentError::EmptyInput), "{text:?}");
    }
    assert!(synth.calls().is_empty());
}

#[test]
fn directive_only_document_has_no_segments() {
    let synth = FakeSynth::new();
    let err = process_document(
        "[voice:af_bella]\n[speed:2]",
        &DocumentOptions::default(),
        &synth,
    )
    .unwrap_err();
    assert!(matches!(err, DocumentError::NoSegments));
}

#[test]
fn malformed_speed_keeps_text() {
    let synth = FakeSynth::new();
    process_document("[speed:fast] Hi", &options("af_sarah", 1.0), &synth).unwrap();
    assert_eq!(synth.calls(), vec![seg("Hi", "af_sarah", 1.0)]);
}

#[test]
fn mix_applies_until_first_voice_directive() {
    let synth = FakeSynth::new();
    let opts = DocumentOptionsBuilder::default()
        .voice("af_sarah")
        .mix("af_bella")
        .build()
        .unwrap();
    process_document(
        "One\nTwo\n[voice:am_adam] Three\n[voice:af_sarah] Four",
        &opts,
        &synth,
    )
    .unwrap();

    let voices: Vec<String> = synth.calls().into_iter().map(|s| s.voice).collect();
    assert_eq!(
        voices,
        ["af_sarah+af_bella", "af_sarah+af_bella", "am_adam", "af_sarah"]
    );
}

#[test]
fn mix_is_dropped_for_engines_without_blending() {
    let synth = FakeSynth {
        blending: false,
        ..FakeSynth::new()
    };
    let opts = DocumentOptionsBuilder::default()
        .voice("af_sarah")
        .mix("af_bella")
        .build()
        .unwrap();
    process_document("One\nTwo", &opts, &synth).unwrap();
    assert!(synth.calls().iter().all(|s| s.voice == "af_sarah"));
}

#[test]
fn failed_segments_are_skipped_by_default() {
    let synth = FakeSynth {
        fail_on: Some("broken"),
        ..FakeSynth::new()
    };
    let narration = process_document(
        "Fine.\nThis one is broken\nAlso fine",
        &options("af_sarah", 1.0),
        &synth,
    )
    .unwrap();

    assert_eq!(synth.calls().len(), 3);
    assert_eq!(narration.segments, 2);
    assert_eq!(narration.skipped.len(), 1);
    let skipped = &narration.skipped[0];
    assert_eq!(skipped.index, 1);
    assert_eq!(skipped.segment.text, "This one is broken");
    assert!(matches!(
        skipped.error,
        SegmentError::Synthesis(SynthesisError::Status { status: 500, .. })
    ));

    // Skipped segments contribute neither audio nor a pause.
    assert!((narration.duration_secs() - (0.1 + 0.35 + 0.1 + 0.2)).abs() < 1e-6);
}

#[test]
fn abort_policy_stops_at_first_failure() {
    let synth = FakeSynth {
        fail_on: Some("broken"),
        ..FakeSynth::new()
    };
    let opts = DocumentOptionsBuilder::default()
        .on_failure(FailurePolicy::Abort)
        .build()
        .unwrap();
    let err = process_document("ok\nbroken\nnever reached", &opts, &synth).unwrap_err();

    assert!(matches!(err, DocumentError::SegmentFailed { index: 1, .. }));
    assert_eq!(synth.calls().len(), 2);
}

#[test]
fn all_segments_failing_is_fatal() {
    let synth = FakeSynth {
        fail_on: Some(""),
        ..FakeSynth::new()
    };
    let err = process_document("a\nb\nc", &DocumentOptions::default(), &synth).unwrap_err();
    assert!(matches!(err, DocumentError::NoAudio { attempted: 3 }));
}

#[test]
fn mismatched_sample_rate_is_a_segment_failure() {
    let synth = FakeSynth {
        rate_for: Some(("odd", 16_000)),
        ..FakeSynth::new()
    };
    let narration =
        process_document("first\nodd one\nlast", &DocumentOptions::default(), &synth).unwrap();

    assert_eq!(narration.segments, 2);
    assert_eq!(narration.audio.sample_rate, RATE);
    assert!(matches!(
        narration.skipped[0].error,
        SegmentError::Assembly(AssemblyError::SampleRateMismatch {
            expected: RATE,
            actual: 16_000
        })
    ));
}

#[test]
fn zero_sample_rate_segment_is_skipped() {
    let synth = FakeSynth {
        rate_for: Some(("broken", 0)),
        ..FakeSynth::new()
    };
    let narration =
        process_document("broken rate
fine", &DocumentOptions::default(), &synth).unwrap();

    assert_eq!(narration.segments, 1);
    assert_eq!(narration.audio.sample_rate, RATE);
    assert!(matches!(
        narration.skipped[0].error,
        SegmentError::Assembly(AssemblyError::InvalidSampleRate(0))
    ));
    assert!((narration.duration_secs() - (0.1 + 0.2)).abs() < 1e-6);
}

#[test]
fn period_pause_is_longer_than_clause_pause() {
    let synth = FakeSynth::new();
    let sentence = process_document("Ends here.", &DocumentOptions::default(), &synth).unwrap();
    let clause = process_document("Ends here", &DocumentOptions::default(), &synth).unwrap();
    assert!(sentence.audio.samples.len() > clause.audio.samples.len());
    assert!(clause.audio.samples.len() > SEGMENT_SAMPLES);
}

#[test]
fn custom_pause_policy_is_used() {
    let synth = FakeSynth::new();
    let opts = DocumentOptionsBuilder::default()
        .pauses(PausePolicy {
            sentence_pause_ms: 400,
            clause_pause_ms: 150,
        })
        .build()
        .unwrap();
    let narration = process_document("A.\nB", &opts, &synth).unwrap();
    assert!((narration.duration_secs() - (0.1 + 0.4 + 0.1 + 0.15)).abs() < 1e-6);
}

#[test]
fn invalid_deserialized_options_are_rejected() {
    let synth = FakeSynth::new();
    let opts: DocumentOptions = serde_json::from_str(r#"{"speed": -1.0}"#).unwrap();
    let err = process_document("Hi", &opts, &synth).unwrap_err();
    assert!(matches!(err, DocumentError::InvalidOptions(_)));
}

#[test]
fn runs_are_independent_across_threads() {
    let synth = FakeSynth::new();
    std::thread::scope(|scope| {
        let a = scope.spawn(|| {
            process_document("[voice:am_adam] A\nB", &options("af_sarah", 1.0), &synth).unwrap()
        });
        let b = scope.spawn(|| process_document("C\nD", &options("bf_emma", 1.2), &synth).unwrap());
        assert_eq!(a.join().unwrap().segments, 2);
        assert_eq!(b.join().unwrap().segments, 2);
    });

    let calls = synth.calls();
    let text_voice = |text: &str| {
        calls
            .iter()
            .find(|s| s.text == text)
            .map(|s| s.voice.clone())
            .unwrap()
    };
    assert_eq!(text_voice("B"), "am_adam");
    assert_eq!(text_voice("C"), "bf_emma");
    assert_eq!(text_voice("D"), "bf_emma");
}

#[test]
fn voice_listing_is_unique_and_english_first() {
    let voices = list_voices();
    let ids: HashSet<&str> = voices.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids.len(), voices.len());

    let last_english = voices.iter().rposition(|v| v.is_english()).unwrap();
    let first_other = voices.iter().position(|v| !v.is_english()).unwrap();
    assert!(last_english < first_other);
}

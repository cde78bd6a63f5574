use std::time::Duration;

/// Boxed source error carried by engine and transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single synthesis call.
#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("Synthesis request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Transport failure: {0}")]
    Transport(#[source] BoxError),
    #[error("Speech service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid audio payload: {0}")]
    InvalidAudio(String),
    #[error("Engine failure: {0}")]
    Engine(#[source] BoxError),
}

/// A buffer that cannot be appended to the narration being assembled.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Sample rate mismatch: narration is {expected} Hz, segment is {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
    #[error("Segment produced no audio")]
    EmptyBuffer,
    #[error("Segment has an invalid sample rate of {0} Hz")]
    InvalidSampleRate(u32),
}

/// Why one segment did not make it into the narration.
#[derive(thiserror::Error, Debug)]
pub enum SegmentError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Terminal failure of a document-processing run.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("No text provided")]
    EmptyInput,
    #[error("Document contains only directives, nothing to speak")]
    NoSegments,
    #[error("No audio generated: all {attempted} segments failed")]
    NoAudio { attempted: usize },
    #[error("Segment {index} failed: {source}")]
    SegmentFailed {
        index: usize,
        #[source]
        source: SegmentError,
    },
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

use thiserror::Error;

/// Failures of stream assembly and container encoding
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("No audio received from the stream")]
    NoAudio,

    #[error("PCM payload too large for a WAV container: {0} bytes")]
    TooLarge(usize),
}

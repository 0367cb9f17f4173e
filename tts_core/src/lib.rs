//! Core of the streaming synthesis pipeline: the request model, assembly of
//! streamed PCM fragments, and the WAV container.

mod assembler;
mod audio;
mod error;
mod request;
mod wav;

pub use assembler::{assemble, try_assemble, Assembler, Flow, StreamEvent};
pub use audio::{AudioContainer, PcmBuffer};
pub use error::AssembleError;
pub use request::{
    Language, SampleRate, SynthesisRequest, Voice, DEFAULT_SPEED, DEFAULT_VOICE_ID,
    DEFAULT_VOLUME, MAX_TEXT_LENGTH, MODEL, SPEED_RANGE, VOLUME_RANGE,
};
pub use wav::encode_wav;

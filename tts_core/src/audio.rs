use base64::{engine::general_purpose, Engine as _};

use crate::{wav, AssembleError, SampleRate};

/// Decoded PCM fragments, concatenated in arrival order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    bytes: Vec<u8>,
    fragments: usize,
}

impl PcmBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_fragment(&mut self, fragment: &[u8]) {
        self.bytes.extend_from_slice(fragment);
        self.fragments += 1;
    }

    /// Number of fragments appended so far.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Freeze the buffer and wrap it in a WAV container.
    pub fn into_container(self, sample_rate: SampleRate) -> Result<AudioContainer, AssembleError> {
        let bytes = wav::encode_wav(&self.bytes, sample_rate.as_u32())?;
        Ok(AudioContainer {
            bytes,
            sample_rate,
            pcm_len: self.bytes.len(),
        })
    }
}

/// A complete mono 16-bit WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioContainer {
    bytes: Vec<u8>,
    sample_rate: SampleRate,
    pcm_len: usize,
}

impl AudioContainer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// PCM payload, without the header.
    pub fn pcm(&self) -> &[u8] {
        &self.bytes[self.bytes.len() - self.pcm_len..]
    }

    pub fn duration_ms(&self) -> u64 {
        let samples = (self.pcm_len / 2) as u64;
        samples * 1000 / self.sample_rate.as_u32() as u64
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

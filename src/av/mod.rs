/// Kind of media carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Video,
    Audio,
    Text,
    /// Opaque file bytes, what the writer produces
    File,
}

/// Codec identity of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    Avc,
    Hevc,
    Vvc,
    Av1,
    Mpeg4Part2,
    Mpeg2Video,
    Mpeg1Video,
    Jpeg,
    Png,
    J2k,
    Aac,
    Mp3,
    Ac3,
    Eac3,
    Opus,
    Flac,
    Amr,
    AmrWb,
    Smv,
    Evrc,
    /// Uncompressed video frames
    RawVideo,
    /// Uncompressed PCM
    RawAudio,
    SimpleText,
    Tx3g,
    WebVtt,
    /// TTML / XML subtitles
    SubsXml,
}

impl CodecId {
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            CodecId::SimpleText | CodecId::Tx3g | CodecId::WebVtt | CodecId::SubsXml
        )
    }
}

mod fraction;
mod memory;
mod packet;
mod port;
mod props;
mod sample;

pub use fraction::Fraction;
pub use memory::{MemoryInput, MemoryOutput};
pub use packet::*;
pub use port::*;
pub use props::*;
pub use sample::{AudioFormat, Interlacing, PixelFormat};

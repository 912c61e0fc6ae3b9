use super::{AudioFormat, CodecId, Fraction, Interlacing, Packet, PixelFormat, Properties, StreamType};
use crate::Result;
use bytes::Bytes;

/// Declared properties of an input port.
#[derive(Debug, Clone, Default)]
pub struct PortProps {
    pub stream_type: Option<StreamType>,
    pub codec_id: Option<CodecId>,
    /// Out-of-band decoder configuration
    pub decoder_config: Option<Bytes>,
    pub timescale: u32,
    /// Total stream duration, used for progress reporting
    pub duration: Option<Fraction>,
    pub width: u32,
    pub height: u32,
    /// Bytes per source row, 0 when tightly packed
    pub stride: u32,
    pub fps: Option<Fraction>,
    pub sar: Option<Fraction>,
    pub interlacing: Interlacing,
    pub pixel_format: Option<PixelFormat>,
    pub sample_rate: u32,
    pub channels: u32,
    pub audio_format: Option<AudioFormat>,
    /// Input is delivered as DASH segments
    pub dash_mode: bool,
    pub extra: Properties,
}

/// Properties the writer declares on its output port.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputProps {
    pub stream_type: StreamType,
    pub codec_id: CodecId,
    pub file_ext: String,
    pub mime: String,
    /// Output is a sequence of numbered files, one per unit
    pub numbered_files: bool,
}

/// Format change requested on the input side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChange {
    Pixel(PixelFormat),
    Audio(AudioFormat),
}

/// Packet source driven by the pipeline scheduler.
pub trait InputPort {
    fn props(&self) -> &PortProps;

    /// Pops the next packet, `None` if nothing is queued right now.
    fn next_packet(&mut self) -> Option<Packet>;

    /// True once the upstream has signaled end of stream and the queue is drained.
    fn is_eos(&self) -> bool;

    /// Asks the upstream to stop producing.
    fn request_stop(&mut self);

    /// Asks the upstream to deliver a different raw format.
    fn negotiate(&mut self, change: FormatChange);
}

/// Destination of output units, typically a file writer.
pub trait OutputPort {
    /// Extension the downstream consumer already committed to, if any.
    fn requested_extension(&self) -> Option<String>;

    fn configure(&mut self, props: OutputProps) -> Result<()>;

    fn send(&mut self, packet: Packet) -> Result<()>;

    fn set_eos(&mut self) {}

    fn on_progress(&mut self, _done: u64, _total: u64) {}
}

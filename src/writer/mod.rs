//! # Stream Writer
//!
//! Converts the packets of one input port into the byte stream of a file.
//! The output packaging is resolved once per connection from the codec and
//! the extension the downstream consumer asked for; each packet then goes
//! through admission (range or duration window), decoder config insertion
//! and the codec-specific emission.
//!
//! ## Example
//!
//! ```rust
//! use vdkdump::av::{CodecId, MemoryInput, MemoryOutput, Packet, PortProps, StreamType};
//! use vdkdump::config::WriterConfig;
//! use vdkdump::writer::{Tick, Writer};
//!
//! # fn main() -> vdkdump::Result<()> {
//! let mut input = MemoryInput::new(PortProps {
//!     stream_type: Some(StreamType::Text),
//!     codec_id: Some(CodecId::SimpleText),
//!     timescale: 1000,
//!     ..Default::default()
//! });
//! input.push(Packet::new(&b"Hello"[..]).with_cts(1000).with_duration(2000));
//! input.set_eos();
//!
//! let mut output = MemoryOutput::with_extension("srt");
//! let mut writer = Writer::new(WriterConfig::default());
//! while writer.process(&mut input, &mut output)? != Tick::EndOfStream {}
//!
//! assert_eq!(
//!     String::from_utf8(output.contents()).unwrap(),
//!     "1\n00:00:01,000 --> 00:00:03,000\nHello\n\n"
//! );
//! # Ok(())
//! # }
//! ```

mod emission;
mod engine;
mod resolver;

pub use emission::Emission;
pub use engine::{Tick, Writer};
pub use resolver::{resolve, Resolution, Resolved, PROP_Y4M_META};

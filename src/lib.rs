#![doc(html_root_url = "https://docs.rs/vdkdump/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # vdkdump - Stream to File Writer
//!
//! `vdkdump` is the last stage of a media pipeline: it takes the packets of
//! one elementary stream and turns them into the bytes of a file, picking
//! the packaging from the codec of the stream and from the extension the
//! destination asked for.
//!
//! ## Features
//!
//! ### Packaging
//! - Raw elementary stream dumps with inline decoder config (FLAC, AMR family, MPEG-4 Visual)
//! - Raw video as YUV/RGB planes, Y4M streams or numbered BMP images
//! - Raw audio as PCM or WAV with a header completed at end of stream
//! - JPEG 2000 codestreams wrapped as JP2 files
//!
//! ### Subtitles
//! - TTML documents merged across packets into a single document, with
//!   binary subsamples embedded as base64
//! - WebVTT, SubRip and TTXT cue files
//!
//! ### Stream control
//! - Start/end unit ranges and exact rational duration windows
//! - One file per unit (`split`/`frame`)
//!
//! ## Quick Start
//!
//! ```rust
//! use vdkdump::av::{CodecId, MemoryInput, MemoryOutput, Packet, PortProps, StreamType};
//! use vdkdump::config::WriterConfig;
//! use vdkdump::writer::{Tick, Writer};
//!
//! # fn main() -> vdkdump::Result<()> {
//! let mut input = MemoryInput::new(PortProps {
//!     stream_type: Some(StreamType::Audio),
//!     codec_id: Some(CodecId::Amr),
//!     timescale: 8000,
//!     ..Default::default()
//! });
//! input.push(Packet::new(vec![0x3C, 0x00]).with_cts(0).with_sap(true));
//! input.set_eos();
//!
//! let mut output = MemoryOutput::new();
//! let mut writer = Writer::new(WriterConfig::default());
//! while writer.process(&mut input, &mut output)? != Tick::EndOfStream {}
//!
//! assert_eq!(output.contents(), b"#!AMR\n\x3C\x00");
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - `av`: packets, properties, codec identities and the port traits
//! - `codec`: default extension and MIME per codec
//! - `config`: writer options, loadable from TOML and the environment
//! - `format`: header synthesizers, cue formatting and TTML aggregation
//! - `writer`: format resolution and the per-packet engine
//! - `sink`: async file output fed through a channel
//! - `error`: error taxonomy and `Result` alias
//! - `utils`: checked byte reader and scratch buffer

/// Audio/Video base types and port traits
pub mod av;

/// Codec naming table
pub mod codec;

/// Error types and utilities
pub mod error;

/// File layouts the writer can produce
pub mod format;

/// Async output sinks
pub mod sink;

/// Common utilities and helper functions
pub mod utils;

/// Configuration module
pub mod config;

/// Stream writer
pub mod writer;

pub use error::{Result, VdkError};

//! # Output Formats
//!
//! Pure builders for the file layouts the writer can synthesize:
//!
//! - `wav`: canonical 44-byte RIFF/WAVE header
//! - `bmp`: 24 bpp bottom-up bitmap
//! - `jp2`: JPEG 2000 signature and `ftyp` boxes
//! - `y4m`: YUV4MPEG2 stream header and frame marker
//! - `text`: WebVTT, SubRip and TTXT cue blocks
//! - `ttml`: TTML document aggregation

pub mod bmp;
pub mod jp2;
pub mod text;
pub mod ttml;
pub mod wav;
pub mod y4m;

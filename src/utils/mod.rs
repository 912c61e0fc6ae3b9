//! # Utility Functions and Types
//!
//! This module provides the small building blocks shared by the writer:
//!
//! - Bounds-checked reading of binary side channels
//! - A reusable scratch buffer for synthesized output units
//!
//! ## Checked reads
//!
//! ```rust
//! use vdkdump::utils::ByteReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let record = [0u8, 0, 0, 1, 0, 0, 0, 42];
//! let mut reader = ByteReader::new(&record);
//! assert_eq!(reader.read_u32()?, 1);
//! assert_eq!(reader.read_u32()?, 42);
//! # Ok(())
//! # }
//! ```

/// Scratch write buffer reused across packets
pub mod buffer;

/// Checked big-endian byte reader
pub mod reader;

pub use buffer::ScratchBuffer;
pub use reader::ByteReader;

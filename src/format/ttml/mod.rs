//! # TTML Aggregation
//!
//! Per-packet TTML documents are merged into a single running document
//! that is serialized once, at end of stream or at a DASH fragment
//! boundary. Binary payloads carried in the packet's subsample side
//! channel and referenced as `src="urn:...:N"` are embedded in the tree
//! as base64 `<data>` elements.
//!
//! ## Example
//!
//! ```rust
//! use vdkdump::av::Packet;
//! use vdkdump::format::ttml::TtmlAggregator;
//!
//! # fn main() -> vdkdump::Result<()> {
//! let cue = |begin: &str| format!(
//!     r#"<tt><body><div region="r1"><p begin="{}">hi</p></div></body></tt>"#, begin);
//!
//! let mut agg = TtmlAggregator::new(true);
//! agg.ingest(&Packet::new(cue("0s").into_bytes()).with_cts(0).with_duration(1000))?;
//! agg.ingest(&Packet::new(cue("1s").into_bytes()).with_cts(1000).with_duration(1000))?;
//!
//! let doc = agg.flush()?.expect("one document");
//! let text = String::from_utf8(doc.data.to_vec()).unwrap();
//! assert_eq!(text.matches("<div").count(), 1);
//! assert_eq!(text.matches("<p ").count(), 2);
//! # Ok(())
//! # }
//! ```

mod aggregator;
mod dom;
mod subsample;

pub use aggregator::{parse_packet, render_packet, TtmlAggregator};
pub use dom::{XmlAttribute, XmlDocument, XmlElement, XmlNode};
pub use subsample::{Subsample, SubsampleTable, SUBSAMPLE_RECORD_SIZE};

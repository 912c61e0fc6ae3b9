//! # Output Sinks
//!
//! The writer itself is synchronous and never blocks. Its output units are
//! handed to an async [`PacketSink`] through [`ChannelOutput`], an
//! [`OutputPort`] backed by an unbounded tokio channel, and drained by
//! [`pump`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use vdkdump::av::{CodecId, MemoryInput, Packet, PortProps};
//! use vdkdump::config::WriterConfig;
//! use vdkdump::sink::{pump, ChannelOutput, FileSink};
//! use vdkdump::writer::{Tick, Writer};
//!
//! #[tokio::main]
//! async fn main() -> vdkdump::Result<()> {
//!     let (mut output, mut rx) = ChannelOutput::channel();
//!     let mut sink = FileSink::new("dump_$num$.$ext$");
//!     let drain = tokio::spawn(async move { pump(&mut rx, &mut sink).await });
//!
//!     let mut input = MemoryInput::new(PortProps {
//!         codec_id: Some(CodecId::Aac),
//!         ..Default::default()
//!     });
//!     input.push(Packet::new(vec![0xFFu8, 0xF1]));
//!     input.set_eos();
//!
//!     let mut writer = Writer::new(WriterConfig::default());
//!     while writer.process(&mut input, &mut output)? != Tick::EndOfStream {}
//!     drop(output);
//!
//!     drain.await.expect("sink task")?;
//!     Ok(())
//! }
//! ```

mod file;

pub use file::FileSink;

use crate::av::{OutputPort, OutputProps, Packet};
use crate::{Result, VdkError};
use async_trait::async_trait;
use log::debug;
use std::io;
use tokio::sync::mpsc;

/// Async consumer of output units.
#[async_trait]
pub trait PacketSink: Send {
    /// Called with the resolved output descriptor before any unit.
    async fn configure(&mut self, _props: &OutputProps) -> Result<()> {
        Ok(())
    }

    async fn write_unit(&mut self, unit: &Packet) -> Result<()>;

    /// Flushes and closes whatever is still open.
    async fn finish(&mut self) -> Result<()>;
}

/// What the writer pushes on its output port.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Configure(OutputProps),
    Unit(Packet),
    Progress { done: u64, total: u64 },
    Eos,
}

/// [`OutputPort`] forwarding every call to an unbounded channel.
#[derive(Debug)]
pub struct ChannelOutput {
    tx: mpsc::UnboundedSender<SinkEvent>,
    requested_ext: Option<String>,
}

impl ChannelOutput {
    pub fn new(tx: mpsc::UnboundedSender<SinkEvent>) -> Self {
        Self {
            tx,
            requested_ext: None,
        }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Declares the extension the destination already committed to.
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.requested_ext = Some(ext.to_string());
        self
    }

    fn push(&self, event: SinkEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| {
            VdkError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "packet sink is gone"))
        })
    }
}

impl OutputPort for ChannelOutput {
    fn requested_extension(&self) -> Option<String> {
        self.requested_ext.clone()
    }

    fn configure(&mut self, props: OutputProps) -> Result<()> {
        self.push(SinkEvent::Configure(props))
    }

    fn send(&mut self, packet: Packet) -> Result<()> {
        self.push(SinkEvent::Unit(packet))
    }

    fn set_eos(&mut self) {
        // Receiver already gone means nothing is left to close
        let _ = self.push(SinkEvent::Eos);
    }

    fn on_progress(&mut self, done: u64, total: u64) {
        let _ = self.push(SinkEvent::Progress { done, total });
    }
}

/// Drains `rx` into `sink` until end of stream or until every sender is
/// dropped. Returns the number of units written.
pub async fn pump<S>(rx: &mut mpsc::UnboundedReceiver<SinkEvent>, sink: &mut S) -> Result<u64>
where
    S: PacketSink + ?Sized,
{
    let mut units = 0;
    while let Some(event) = rx.recv().await {
        match event {
            SinkEvent::Configure(props) => sink.configure(&props).await?,
            SinkEvent::Unit(unit) => {
                sink.write_unit(&unit).await?;
                units += 1;
            }
            SinkEvent::Progress { done, total } => debug!("Sink progress {}/{}", done, total),
            SinkEvent::Eos => break,
        }
    }
    sink.finish().await?;
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::av::{CodecId, StreamType};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Collect {
        props: Option<OutputProps>,
        units: Vec<Packet>,
        finished: bool,
    }

    #[async_trait]
    impl PacketSink for Collect {
        async fn configure(&mut self, props: &OutputProps) -> Result<()> {
            self.props = Some(props.clone());
            Ok(())
        }

        async fn write_unit(&mut self, unit: &Packet) -> Result<()> {
            self.units.push(unit.clone());
            Ok(())
        }

        async fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_pump_until_eos() {
        let (mut output, mut rx) = ChannelOutput::channel();
        output
            .configure(OutputProps {
                stream_type: StreamType::File,
                codec_id: CodecId::Aac,
                file_ext: "aac".into(),
                mime: "audio/aac".into(),
                numbered_files: false,
            })
            .unwrap();
        output.send(Packet::new(vec![1u8])).unwrap();
        output.on_progress(1, 2);
        output.send(Packet::new(vec![2u8])).unwrap();
        output.set_eos();

        let mut sink = Collect::default();
        assert_eq!(pump(&mut rx, &mut sink).await.unwrap(), 2);
        assert!(sink.finished);
        assert_eq!(sink.props.unwrap().file_ext, "aac");
        assert_eq!(&sink.units[1].data[..], &[2u8]);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (mut output, rx) = ChannelOutput::channel();
        drop(rx);
        assert!(matches!(output.send(Packet::new(vec![0u8])), Err(VdkError::Io(_))));
        // no panic on close
        output.set_eos();
    }
}

use super::port::{FormatChange, InputPort, OutputPort, OutputProps, PortProps};
use super::Packet;
use crate::Result;
use std::collections::VecDeque;

/// In-memory input port fed by the caller.
#[derive(Debug, Default)]
pub struct MemoryInput {
    props: PortProps,
    queue: VecDeque<Packet>,
    eos: bool,
    pub stop_requested: bool,
    pub negotiations: Vec<FormatChange>,
}

impl MemoryInput {
    pub fn new(props: PortProps) -> Self {
        Self {
            props,
            ..Default::default()
        }
    }

    pub fn push(&mut self, packet: Packet) {
        self.queue.push_back(packet);
    }

    pub fn set_eos(&mut self) {
        self.eos = true;
    }

    pub fn props_mut(&mut self) -> &mut PortProps {
        &mut self.props
    }
}

impl InputPort for MemoryInput {
    fn props(&self) -> &PortProps {
        &self.props
    }

    fn next_packet(&mut self) -> Option<Packet> {
        self.queue.pop_front()
    }

    fn is_eos(&self) -> bool {
        self.eos && self.queue.is_empty()
    }

    fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    // Applied immediately, as if a converter had been inserted upstream
    fn negotiate(&mut self, change: FormatChange) {
        match change {
            FormatChange::Pixel(f) => self.props.pixel_format = Some(f),
            FormatChange::Audio(f) => self.props.audio_format = Some(f),
        }
        self.negotiations.push(change);
    }
}

/// In-memory output port collecting every unit sent to it.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    pub requested_ext: Option<String>,
    pub props: Option<OutputProps>,
    pub packets: Vec<Packet>,
    pub eos: bool,
    pub progress: Vec<(u64, u64)>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(ext: &str) -> Self {
        Self {
            requested_ext: Some(ext.to_string()),
            ..Default::default()
        }
    }

    /// Concatenation of all unit payloads, with seek units applied in place.
    pub fn contents(&self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        for pck in &self.packets {
            match (pck.seek, pck.byte_offset) {
                (true, Some(offset)) => {
                    let offset = offset as usize;
                    let end = offset + pck.data.len();
                    if out.len() < end {
                        out.resize(end, 0);
                    }
                    out[offset..end].copy_from_slice(&pck.data);
                }
                _ => out.extend_from_slice(&pck.data),
            }
        }
        out
    }
}

impl OutputPort for MemoryOutput {
    fn requested_extension(&self) -> Option<String> {
        self.requested_ext.clone()
    }

    fn configure(&mut self, props: OutputProps) -> Result<()> {
        self.props = Some(props);
        Ok(())
    }

    fn send(&mut self, packet: Packet) -> Result<()> {
        self.packets.push(packet);
        Ok(())
    }

    fn set_eos(&mut self) {
        self.eos = true;
    }

    fn on_progress(&mut self, done: u64, total: u64) {
        self.progress.push((done, total));
    }
}

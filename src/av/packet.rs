use super::props::{Properties, PropertyValue};
use bytes::Bytes;

/// File framing of an output unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Framing {
    /// Unit opens a new file
    pub start: bool,
    /// Unit closes the current file
    pub end: bool,
}

/// One timestamped unit of media data.
///
/// Used both for packets pulled from an input port and for units pushed to
/// an output port. `data` is reference counted, so forwarding a packet
/// never copies its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub data: Bytes,
    pub dts: Option<u64>,
    pub cts: Option<u64>,
    pub duration: u64,
    pub timescale: u32,
    /// Stream access point (sync sample)
    pub sap: bool,
    pub dependency_flags: u8,
    pub byte_offset: Option<u64>,
    pub framing: Framing,
    pub corrupted: bool,
    /// Unit must be written at `byte_offset`, replacing existing bytes
    pub seek: bool,
    pub props: Properties,
}

impl Packet {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            dts: None,
            cts: None,
            duration: 0,
            timescale: 1000,
            sap: false,
            dependency_flags: 0,
            byte_offset: None,
            framing: Framing::default(),
            corrupted: false,
            seek: false,
            props: Properties::new(),
        }
    }

    pub fn with_cts(mut self, cts: u64) -> Self {
        self.cts = Some(cts);
        self
    }

    pub fn with_dts(mut self, dts: u64) -> Self {
        self.dts = Some(dts);
        self
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_timescale(mut self, timescale: u32) -> Self {
        self.timescale = timescale;
        self
    }

    pub fn with_sap(mut self, sap: bool) -> Self {
        self.sap = sap;
        self
    }

    pub fn with_byte_offset(mut self, offset: u64) -> Self {
        self.byte_offset = Some(offset);
        self
    }

    pub fn with_dependency_flags(mut self, flags: u8) -> Self {
        self.dependency_flags = flags;
        self
    }

    pub fn with_property(mut self, name: &str, value: PropertyValue) -> Self {
        self.props.set(name, value);
        self
    }

    /// Decode time, falling back to composition time.
    pub fn timestamp(&self) -> Option<u64> {
        self.dts.or(self.cts)
    }

    /// New unit carrying `data` with the timing and properties of `self`.
    ///
    /// Framing, byte offset and the corrupted/seek flags are not inherited.
    pub fn derive(&self, data: Bytes) -> Packet {
        Packet {
            data,
            dts: self.dts,
            cts: self.cts,
            duration: self.duration,
            timescale: self.timescale,
            sap: self.sap,
            dependency_flags: self.dependency_flags,
            byte_offset: None,
            framing: Framing::default(),
            corrupted: false,
            seek: false,
            props: self.props.clone(),
        }
    }
}

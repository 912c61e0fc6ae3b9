use super::emission::{self, Emission};
use super::resolver::{self, Resolution, Resolved};
use crate::av::{
    CodecId, FormatChange, Fraction, Framing, InputPort, OutputPort, OutputProps, Packet,
    PropertyValue, PROP_FILE_NUMBER,
};
use crate::config::{DecInfoMode, WriterConfig};
use crate::error::{Result, VdkError};
use crate::format::text::TTXT_TRAILER;
use crate::format::ttml::{render_packet, TtmlAggregator};
use crate::format::wav::{WavHeader, WAV_HEADER_SIZE};
use crate::utils::ScratchBuffer;
use bytes::Bytes;
use log::{debug, info, warn};

/// Outcome of one scheduling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to do until the input delivers more
    Pending,
    /// One input packet was consumed
    Processed,
    /// Trailers are written and the output is closed
    EndOfStream,
}

/// Conversion context of one input port.
///
/// Owns every piece of state that lives across packets. Driven one packet
/// per call to [`Writer::process`].
#[derive(Debug)]
pub struct Writer {
    config: WriterConfig,
    resolution: Option<Resolution>,
    /// Format change requested on the input, not yet observed
    pending_change: Option<FormatChange>,
    /// Inline config of the current epoch
    epoch_config: Option<Bytes>,
    config_inserted: bool,
    /// The next unit opens a new file
    first: bool,
    file_number: u64,
    nb_bytes: u64,
    nb_units: u64,
    window_origin: Option<u64>,
    stopped: bool,
    cue_index: u64,
    wav_started: bool,
    total_duration: Option<Fraction>,
    aggregator: TtmlAggregator,
    scratch: ScratchBuffer,
    finished: bool,
}

impl Writer {
    pub fn new(config: WriterConfig) -> Self {
        let aggregator = TtmlAggregator::new(config.merge_region);
        Self {
            config,
            resolution: None,
            pending_change: None,
            epoch_config: None,
            config_inserted: false,
            first: true,
            file_number: 0,
            nb_bytes: 0,
            nb_units: 0,
            window_origin: None,
            stopped: false,
            cue_index: 0,
            wav_started: false,
            total_duration: None,
            aggregator,
            scratch: ScratchBuffer::new(),
            finished: false,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Descriptor declared on the output, once resolved.
    pub fn output_props(&self) -> Option<&OutputProps> {
        self.resolution.as_ref().map(|r| &r.output)
    }

    pub fn emission(&self) -> Option<&Emission> {
        self.resolution.as_ref().map(|r| &r.emission)
    }

    /// Payload bytes sent so far, deferred headers excluded.
    pub fn bytes_written(&self) -> u64 {
        self.nb_bytes
    }

    pub fn scratch_capacity(&self) -> usize {
        self.scratch.capacity()
    }

    /// (Re)connects the input: resolves the output format and declares it
    /// on `output`.
    ///
    /// Returns `false` when a format change was requested on the input;
    /// resolution is retried on the next tick. Calling this again after the
    /// input properties changed starts a new config epoch if the decoder
    /// config differs.
    pub fn configure(&mut self, input: &mut dyn InputPort, output: &mut dyn OutputPort) -> Result<bool> {
        let requested = output.requested_extension();
        let resolution = match resolver::resolve(&self.config, input.props(), requested.as_deref())? {
            Resolved::Ready(resolution) => *resolution,
            Resolved::Renegotiate(change) => {
                self.resolution = None;
                if self.pending_change == Some(change) {
                    self.pending_change = None;
                    return Err(VdkError::UnsupportedInput(format!(
                        "input did not apply requested format {:?}",
                        change
                    )));
                }
                debug!("Requesting {:?} from input before resolving", change);
                input.negotiate(change);
                self.pending_change = Some(change);
                return Ok(false);
            }
        };
        self.pending_change = None;

        if resolution.inline_config != self.epoch_config {
            debug!("New decoder config epoch");
            self.epoch_config = resolution.inline_config.clone();
            self.config_inserted = false;
        }
        self.total_duration = input.props().duration;

        info!(
            "Writing {:?} as .{} ({}), mode {}{}",
            resolution.codec_id,
            resolution.output.file_ext,
            resolution.output.mime,
            resolution.emission.name(),
            if resolution.split { ", one file per unit" } else { "" }
        );
        output.configure(resolution.output.clone())?;
        self.resolution = Some(resolution);
        Ok(true)
    }

    /// Runs one tick of the packet engine.
    ///
    /// A recoverable error means the offending packet was consumed and
    /// dropped; the caller may keep ticking.
    pub fn process(&mut self, input: &mut dyn InputPort, output: &mut dyn OutputPort) -> Result<Tick> {
        if self.finished {
            return Ok(Tick::EndOfStream);
        }
        if self.resolution.is_none() && !self.configure(input, output)? {
            return Ok(Tick::Pending);
        }

        let Some(pck) = input.next_packet() else {
            if input.is_eos() {
                self.finish(output)?;
                return Ok(Tick::EndOfStream);
            }
            return Ok(Tick::Pending);
        };

        let Some(resolution) = self.resolution.take() else {
            return Ok(Tick::Pending);
        };
        let result = self.handle_packet(&resolution, pck, input, output);
        self.resolution = Some(resolution);

        match result {
            Ok(()) => Ok(Tick::Processed),
            Err(e) => {
                if e.is_recoverable() {
                    warn!("Dropping packet: {}", e);
                }
                Err(e)
            }
        }
    }

    fn stop(&mut self, input: &mut dyn InputPort, reason: &str) {
        if !self.stopped {
            warn!("End of {} window reached, stopping input", reason);
            input.request_stop();
            self.stopped = true;
        }
    }

    fn handle_packet(
        &mut self,
        res: &Resolution,
        pck: Packet,
        input: &mut dyn InputPort,
        output: &mut dyn OutputPort,
    ) -> Result<()> {
        if res.dash && res.emission == Emission::TtmlAggregate && pck.props.contains(PROP_FILE_NUMBER) {
            if let Some(doc) = self.aggregator.flush()? {
                debug!("DASH segment boundary, flushing TTML document");
                self.deliver(output, doc)?;
            }
            self.aggregator.hold(pck.clone());
        }

        if self.stopped {
            return Ok(());
        }

        let mut truncate_to = None;
        if self.config.sstart > 0 || self.config.send > 0 {
            self.nb_units += 1;
            if self.nb_units < self.config.sstart {
                return Ok(());
            }
            if self.config.send > 0 && self.nb_units > self.config.send {
                self.stop(input, "range");
                return Ok(());
            }
        } else if let Some(window) = self.config.dur.filter(|d| !d.is_zero()) {
            let ts = pck.timestamp().unwrap_or(0);
            let origin = *self.window_origin.get_or_insert(ts);
            let elapsed = ts.saturating_sub(origin);
            if window.exceeded_by(elapsed, pck.timescale) {
                self.stop(input, "duration");
                return Ok(());
            }
            if let Some((frame_size, sample_rate)) = res.emission.audio_layout() {
                if window.exceeded_by(elapsed + pck.duration, pck.timescale) {
                    let size = emission::truncated_audio_size(&pck, window, elapsed, frame_size, sample_rate);
                    if size == 0 {
                        debug!("Audio packet starts at the window end, dropped");
                        return Ok(());
                    }
                    if size < pck.data.len() {
                        debug!("Truncating last audio packet to {} bytes", size);
                        let duration = window.to_ticks(pck.timescale).saturating_sub(elapsed);
                        truncate_to = Some((size, duration));
                    }
                }
            }
        }

        if let Some(config) = res.inline_config.as_ref() {
            let gated = res.decinfo == DecInfoMode::Sap && !pck.sap;
            if res.decinfo != DecInfoMode::No && !self.config_inserted && !gated {
                let data = emission::config_payload(&mut self.scratch, config, res.codec_id == CodecId::Flac)?;
                debug!("Inserting decoder config ({} bytes)", data.len());
                let mut unit = pck.derive(data);
                unit.duration = 0;
                self.send_unit(output, unit, res.split, false)?;
                if res.decinfo == DecInfoMode::First && !res.split {
                    self.config_inserted = true;
                }
            }
        }

        let opens_file = self.first;
        let unit = match &res.emission {
            Emission::Forward => Some(pck),
            Emission::Jp2 { jp2h } => match emission::jp2_unit(&mut self.scratch, &pck, jp2h.as_ref())? {
                Some(data) => Some(pck.derive(data)),
                None => Some(pck),
            },
            Emission::Bmp {
                width,
                height,
                stride,
            } => {
                let data = emission::bmp_unit(&mut self.scratch, &pck, *width, *height, *stride)?;
                Some(pck.derive(data))
            }
            Emission::Y4m { header } => {
                let header = opens_file.then_some(header.as_str());
                let data = emission::y4m_unit(&mut self.scratch, &pck, header)?;
                Some(pck.derive(data))
            }
            Emission::Wav { .. } => {
                if !self.wav_started {
                    self.wav_started = true;
                    let mut placeholder = pck.derive(WavHeader::placeholder());
                    placeholder.duration = 0;
                    placeholder.corrupted = true;
                    self.send_unit(output, placeholder, false, false)?;
                }
                Some(truncate(pck, truncate_to))
            }
            Emission::RawAudio {
                planar: true,
                channels,
                ..
            } => match truncate_to {
                Some((size, duration)) => {
                    let plane_keep = size / (*channels).max(1) as usize;
                    let data = emission::planar_audio_prefix(&mut self.scratch, &pck, *channels, plane_keep)?;
                    let mut unit = pck.derive(data);
                    unit.duration = duration;
                    Some(unit)
                }
                None => Some(pck),
            },
            Emission::RawAudio { .. } => Some(truncate(pck, truncate_to)),
            Emission::TtmlAggregate => {
                self.aggregator.ingest(&pck)?;
                None
            }
            Emission::TtmlPerUnit => match render_packet(&pck)? {
                Some(data) => Some(pck.derive(data)),
                None => Some(pck),
            },
            Emission::Cues { style, preamble } => {
                self.cue_index += 1;
                let preamble = preamble.as_deref().filter(|_| opens_file);
                let data = emission::cue_unit(&mut self.scratch, &pck, *style, preamble, self.cue_index)?;
                Some(pck.derive(data))
            }
            Emission::Ttxt => {
                let data = emission::ttxt_unit(&mut self.scratch, &pck)?;
                Some(pck.derive(data))
            }
        };

        match unit {
            Some(unit) => self.send_unit(output, unit, res.split, res.split),
            None => Ok(()),
        }
    }

    /// Applies file framing, then delivers.
    fn send_unit(&mut self, output: &mut dyn OutputPort, mut unit: Packet, split: bool, closes: bool) -> Result<()> {
        unit.byte_offset = None;
        unit.framing = Framing {
            start: self.first,
            end: closes,
        };
        if self.first && split {
            self.file_number += 1;
            unit.props
                .set(PROP_FILE_NUMBER, PropertyValue::Uint(self.file_number));
        }
        self.first = closes;
        self.deliver(output, unit)
    }

    fn deliver(&mut self, output: &mut dyn OutputPort, unit: Packet) -> Result<()> {
        self.nb_bytes += unit.data.len() as u64;
        if self.config.exporter {
            self.report_progress(output, &unit);
        }
        output.send(unit)
    }

    fn report_progress(&self, output: &mut dyn OutputPort, unit: &Packet) {
        let Some(total) = self.total_duration.filter(|d| !d.is_zero() && d.den > 0) else {
            return;
        };
        let Some(ts) = unit.cts.or(unit.dts) else {
            return;
        };
        let end = (ts + unit.duration) as u128;
        let done = (end * total.den as u128 / unit.timescale.max(1) as u128).min(total.num as u128) as u64;
        debug!("Progress {}/{}", done, total.num);
        output.on_progress(done, total.num);
    }

    /// End of stream: flushes the aggregated document and writes trailers
    /// or deferred headers.
    fn finish(&mut self, output: &mut dyn OutputPort) -> Result<()> {
        if let Some(res) = self.resolution.take() {
            let result = self.write_trailers(&res, output);
            self.resolution = Some(res);
            result?;
        }
        output.set_eos();
        self.finished = true;
        info!("Stream done, {} bytes written", self.nb_bytes);
        Ok(())
    }

    fn write_trailers(&mut self, res: &Resolution, output: &mut dyn OutputPort) -> Result<()> {
        match &res.emission {
            Emission::TtmlAggregate => {
                if let Some(doc) = self.aggregator.flush()? {
                    self.deliver(output, doc)?;
                }
            }
            Emission::Ttxt if self.nb_bytes > 0 => {
                let trailer = Packet::new(Bytes::from_static(TTXT_TRAILER.as_bytes()));
                self.send_unit(output, trailer, false, true)?;
            }
            Emission::Wav { header, .. } if self.wav_started => {
                let data_size = self.nb_bytes.saturating_sub(WAV_HEADER_SIZE as u64);
                let header = WavHeader {
                    data_size: u32::try_from(data_size).unwrap_or(u32::MAX),
                    ..*header
                };
                debug!("Rewriting WAV header, {} data bytes", data_size);
                let mut unit = Packet::new(header.to_bytes());
                unit.seek = true;
                unit.byte_offset = Some(0);
                unit.framing = Framing {
                    start: false,
                    end: true,
                };
                output.send(unit)?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn truncate(mut pck: Packet, to: Option<(usize, u64)>) -> Packet {
    if let Some((size, duration)) = to {
        pck.data.truncate(size);
        pck.duration = duration;
    }
    pck
}

impl Drop for Writer {
    fn drop(&mut self) {
        if self.aggregator.has_document() {
            warn!("Writer dropped with an unflushed TTML document");
        }
    }
}

use crate::av::{Fraction, Packet, PROP_CUE_ID, PROP_CUE_SETTINGS};
use crate::error::{Result, VdkError};
use crate::format::text::{self, Cue, CueStyle};
use crate::format::{bmp, jp2, wav::WavHeader, y4m};
use crate::utils::ScratchBuffer;
use bytes::{BufMut, Bytes};

/// How each admitted packet becomes an output unit.
///
/// Chosen once per connection by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// Zero-copy reference to the input packet
    Forward,
    /// JPEG 2000 codestream wrapped in JP2 boxes unless already a JP2 file
    Jp2 { jp2h: Option<Bytes> },
    Bmp {
        width: u32,
        height: u32,
        stride: usize,
    },
    /// `header` is the stream header line, written once per file
    Y4m { header: String },
    /// PCM behind a deferred RIFF header; `data_size` is filled at end of stream
    Wav { header: WavHeader, frame_size: u32 },
    /// Headerless PCM; planar payloads hold one plane per channel
    RawAudio {
        sample_rate: u32,
        frame_size: u32,
        channels: u32,
        planar: bool,
    },
    TtmlAggregate,
    TtmlPerUnit,
    /// WebVTT or SubRip cues; the preamble starts every file
    Cues {
        style: CueStyle,
        preamble: Option<String>,
    },
    Ttxt,
}

impl Emission {
    pub fn name(&self) -> &'static str {
        match self {
            Emission::Forward => "forward",
            Emission::Jp2 { .. } => "jp2",
            Emission::Bmp { .. } => "bmp",
            Emission::Y4m { .. } => "y4m",
            Emission::Wav { .. } => "wav",
            Emission::RawAudio { .. } => "pcm",
            Emission::TtmlAggregate => "ttml",
            Emission::TtmlPerUnit => "ttml-split",
            Emission::Cues {
                style: CueStyle::Srt,
                ..
            } => "srt",
            Emission::Cues { .. } => "vtt",
            Emission::Ttxt => "ttxt",
        }
    }

    /// Bytes per interleaved sample frame and the sample rate, for PCM modes.
    pub fn audio_layout(&self) -> Option<(u32, u32)> {
        match self {
            Emission::Wav { header, frame_size } => Some((*frame_size, header.sample_rate)),
            Emission::RawAudio {
                sample_rate,
                frame_size,
                ..
            } => Some((*frame_size, *sample_rate)),
            _ => None,
        }
    }
}

/// Config unit payload: FLAC streams need the `fLaC` marker before their
/// metadata blocks, everything else is the config itself.
pub(crate) fn config_payload(
    scratch: &mut ScratchBuffer,
    config: &Bytes,
    flac: bool,
) -> Result<Bytes> {
    if !flac {
        return Ok(config.clone());
    }
    let (data, _) = scratch.write(4 + config.len(), |out| {
        out.put_slice(b"fLaC");
        out.put_slice(config);
        Ok(())
    })?;
    Ok(data)
}

pub(crate) fn jp2_unit(
    scratch: &mut ScratchBuffer,
    pck: &Packet,
    jp2h: Option<&Bytes>,
) -> Result<Option<Bytes>> {
    if jp2::has_signature(&pck.data) {
        return Ok(None);
    }
    let jp2h = jp2h.map(|h| &h[..]);
    let size = jp2::prefix_size(jp2h) + pck.data.len();
    let (data, _) = scratch.write(size, |out| {
        jp2::write_jp2_prefix(out, jp2h);
        out.put_slice(&pck.data);
        Ok(())
    })?;
    Ok(Some(data))
}

pub(crate) fn bmp_unit(
    scratch: &mut ScratchBuffer,
    pck: &Packet,
    width: u32,
    height: u32,
    stride: usize,
) -> Result<Bytes> {
    let (data, _) = scratch.write(bmp::file_size(width, height), |out| {
        bmp::write_bmp(out, width, height, stride, &pck.data)
    })?;
    Ok(data)
}

pub(crate) fn y4m_unit(
    scratch: &mut ScratchBuffer,
    pck: &Packet,
    header: Option<&str>,
) -> Result<Bytes> {
    let header = header.unwrap_or_default();
    let size = header.len() + y4m::Y4M_FRAME_MARKER.len() + pck.data.len();
    let (data, _) = scratch.write(size, |out| {
        out.put_slice(header.as_bytes());
        out.put_slice(y4m::Y4M_FRAME_MARKER);
        out.put_slice(&pck.data);
        Ok(())
    })?;
    Ok(data)
}

fn cue_text(pck: &Packet) -> Result<&str> {
    let text = std::str::from_utf8(&pck.data)
        .map_err(|e| VdkError::InvalidData(format!("cue text is not UTF-8: {}", e)))?;
    Ok(text.trim_end_matches('\0'))
}

fn cue_span(pck: &Packet) -> (u64, u64) {
    let start = pck.cts.or(pck.dts).unwrap_or(0);
    (
        text::ticks_to_ms(start, pck.timescale),
        text::ticks_to_ms(start + pck.duration, pck.timescale),
    )
}

/// One cue block, preceded by `preamble` when the unit opens a file.
///
/// SubRip cues are numbered with `index`; WebVTT cues take their id and
/// settings from the packet properties.
pub(crate) fn cue_unit(
    scratch: &mut ScratchBuffer,
    pck: &Packet,
    style: CueStyle,
    preamble: Option<&str>,
    index: u64,
) -> Result<Bytes> {
    let body = cue_text(pck)?;
    let (start_ms, end_ms) = cue_span(pck);
    let number = index.to_string();
    let cue = match style {
        CueStyle::Srt => Cue {
            id: Some(number.as_str()),
            start_ms,
            end_ms,
            settings: None,
            text: body,
        },
        CueStyle::WebVtt { .. } => Cue {
            id: pck.props.get_str(PROP_CUE_ID),
            start_ms,
            end_ms,
            settings: pck.props.get_str(PROP_CUE_SETTINGS),
            text: body,
        },
    };

    let preamble = preamble.unwrap_or_default();
    let (data, _) = scratch.write(preamble.len() + body.len() + 64, |out| {
        out.put_slice(preamble.as_bytes());
        text::write_cue(out, style, &cue);
        Ok(())
    })?;
    Ok(data)
}

pub(crate) fn ttxt_unit(scratch: &mut ScratchBuffer, pck: &Packet) -> Result<Bytes> {
    let body = cue_text(pck)?;
    let (start_ms, _) = cue_span(pck);
    let (data, _) = scratch.write(body.len() + 64, |out| {
        text::write_ttxt_sample(out, start_ms, body);
        Ok(())
    })?;
    Ok(data)
}

/// Number of payload bytes of a PCM packet that fit in the duration window.
///
/// `elapsed` is the packet start relative to the window origin, in the
/// packet timescale. Partial sample frames are dropped.
pub(crate) fn truncated_audio_size(
    pck: &Packet,
    window: Fraction,
    elapsed: u64,
    frame_size: u32,
    sample_rate: u32,
) -> usize {
    let timescale = pck.timescale.max(1) as u128;
    let remaining = window.to_ticks(pck.timescale).saturating_sub(elapsed) as u128;
    let samples = if sample_rate as u128 == timescale || sample_rate == 0 {
        remaining
    } else {
        remaining * sample_rate as u128 / timescale
    };
    let bytes = samples.saturating_mul(frame_size as u128);
    bytes.min(pck.data.len() as u128) as usize
}

/// Keeps the first `plane_keep` bytes of every channel plane of a planar
/// PCM packet.
pub(crate) fn planar_audio_prefix(
    scratch: &mut ScratchBuffer,
    pck: &Packet,
    channels: u32,
    plane_keep: usize,
) -> Result<Bytes> {
    let channels = channels.max(1) as usize;
    let plane_len = pck.data.len() / channels;
    let keep = plane_keep.min(plane_len);
    let (data, _) = scratch.write(keep * channels, |out| {
        for plane in 0..channels {
            let start = plane * plane_len;
            out.extend_from_slice(&pck.data[start..start + keep]);
        }
        Ok(())
    })?;
    Ok(data)
}

//! Text cue serialization for WebVTT, SubRip and TTXT dumps.

use bytes::BufMut;
use quick_xml::escape::escape;

pub const WEBVTT_PREAMBLE: &str = "WEBVTT";

pub const TTXT_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n\
<TextStream version=\"1.1\">\n\
<TextStreamHeader>\n\
<TextSampleDescription>\n\
</TextSampleDescription>\n\
</TextStreamHeader>\n";

pub const TTXT_TRAILER: &str = "</TextStream>\n";

/// Timestamp flavor of the cue timing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueStyle {
    /// `MM:SS.mmm`, with an `HH:` prefix when non-zero or forced
    WebVtt { force_hours: bool },
    /// `HH:MM:SS,mmm`
    Srt,
}

/// Rescales `ticks` in `timescale` to milliseconds, rounding down.
pub fn ticks_to_ms(ticks: u64, timescale: u32) -> u64 {
    if timescale == 0 {
        return 0;
    }
    ((ticks as u128) * 1000 / (timescale as u128)) as u64
}

pub fn format_timestamp(ms: u64, style: CueStyle) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    match style {
        CueStyle::Srt => format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis),
        CueStyle::WebVtt { force_hours } if force_hours || hours > 0 => {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
        }
        CueStyle::WebVtt { .. } => format!("{:02}:{:02}.{:03}", minutes, seconds, millis),
    }
}

/// Trims trailing line breaks and ends the text with exactly one blank line.
pub fn normalize_preamble(text: &str) -> String {
    let mut out = text.trim_end_matches(['\r', '\n']).to_string();
    out.push_str("\n\n");
    out
}

/// One cue block.
#[derive(Debug, Clone, Copy)]
pub struct Cue<'a> {
    /// Identifier line: the sequence number for SRT, the cue id for WebVTT
    pub id: Option<&'a str>,
    pub start_ms: u64,
    pub end_ms: u64,
    pub settings: Option<&'a str>,
    pub text: &'a str,
}

/// Appends the cue block followed by a blank separator line.
pub fn write_cue(out: &mut Vec<u8>, style: CueStyle, cue: &Cue<'_>) {
    if let Some(id) = cue.id.filter(|id| !id.is_empty()) {
        out.put_slice(id.as_bytes());
        out.put_u8(b'\n');
    }
    out.put_slice(format_timestamp(cue.start_ms, style).as_bytes());
    out.put_slice(b" --> ");
    out.put_slice(format_timestamp(cue.end_ms, style).as_bytes());
    if let Some(settings) = cue.settings.filter(|s| !s.is_empty()) {
        out.put_u8(b' ');
        out.put_slice(settings.as_bytes());
    }
    out.put_u8(b'\n');
    out.put_slice(cue.text.as_bytes());
    if !cue.text.ends_with('\n') {
        out.put_u8(b'\n');
    }
    out.put_u8(b'\n');
}

pub fn write_ttxt_sample(out: &mut Vec<u8>, start_ms: u64, text: &str) {
    let time = format_timestamp(start_ms, CueStyle::WebVtt { force_hours: true });
    out.put_slice(b"<TextSample sampleTime=\"");
    out.put_slice(time.as_bytes());
    out.put_slice(b"\" xml:space=\"preserve\">");
    out.put_slice(escape(text.trim_end_matches('\n')).as_bytes());
    out.put_slice(b"</TextSample>\n");
}

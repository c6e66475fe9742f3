use std::fmt;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// @module: Subtitle format detection, parsing and serialization

/// Default frame rate used when a frame-based format must be parsed without one
pub const DEFAULT_FRAME_RATE: f64 = 24.0;

// @const: SRT timestamp regex
static SRT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

// @const: WebVTT timestamp regex, hours are optional
static VTT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(\d{2,}):)?(\d{2}):(\d{2})\.(\d{3})\s-->\s(?:(\d{2,}):)?(\d{2}):(\d{2})\.(\d{3})")
        .unwrap()
});

// @const: MicroDVD cue regex, times are frame numbers
static MICRODVD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{(\d+)\}\{(\d+)\}(.*)$").unwrap());

// @const: MPL2 cue regex, times are tenths of a second
static MPL2_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\d+)\]\[(\d+)\](.*)$").unwrap());

// @const: TMP cue regex, no end time
static TMP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})[:=](.*)$").unwrap());

// @const: ASS/SSA override tag stripper
static ASS_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());

/// Known subtitle formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleFormat {
    /// SubRip
    Srt,
    /// WebVTT
    Vtt,
    /// Advanced SubStation Alpha
    Ass,
    /// SubStation Alpha
    Ssa,
    /// MicroDVD, frame-based
    MicroDvd,
    /// MPL2, decisecond-based
    Mpl2,
    /// TMP, start times only
    Tmp,
}

impl SubtitleFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => ".srt",
            SubtitleFormat::Vtt => ".vtt",
            SubtitleFormat::Ass => ".ass",
            SubtitleFormat::Ssa => ".ssa",
            SubtitleFormat::MicroDvd => ".sub",
            SubtitleFormat::Mpl2 => ".mpl",
            SubtitleFormat::Tmp => ".txt",
        }
    }

    /// Map a file extension to a format
    pub fn from_extension(extension: &str) -> Option<SubtitleFormat> {
        match extension.to_lowercase().as_str() {
            ".srt" | "srt" => Some(SubtitleFormat::Srt),
            ".vtt" | "vtt" => Some(SubtitleFormat::Vtt),
            ".ass" | "ass" => Some(SubtitleFormat::Ass),
            ".ssa" | "ssa" => Some(SubtitleFormat::Ssa),
            ".sub" | "sub" => Some(SubtitleFormat::MicroDvd),
            ".mpl" | "mpl" => Some(SubtitleFormat::Mpl2),
            _ => None,
        }
    }

    /// Whether cue times are stored as frame numbers
    pub fn is_frame_based(&self) -> bool {
        matches!(self, SubtitleFormat::MicroDvd)
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Ass => "ass",
            SubtitleFormat::Ssa => "ssa",
            SubtitleFormat::MicroDvd => "microdvd",
            SubtitleFormat::Mpl2 => "mpl2",
            SubtitleFormat::Tmp => "tmp",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for SubtitleFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, FormatError> {
        match s.to_lowercase().as_str() {
            "srt" | "subrip" => Ok(SubtitleFormat::Srt),
            "vtt" | "webvtt" => Ok(SubtitleFormat::Vtt),
            "ass" => Ok(SubtitleFormat::Ass),
            "ssa" => Ok(SubtitleFormat::Ssa),
            "microdvd" => Ok(SubtitleFormat::MicroDvd),
            "mpl2" => Ok(SubtitleFormat::Mpl2),
            "tmp" => Ok(SubtitleFormat::Tmp),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// Errors raised while parsing or serializing subtitle text
#[derive(Error, Debug)]
pub enum FormatError {
    /// A frame-based format needs a frame rate
    #[error("A frame rate is required to parse this subtitle")]
    MissingFrameRate,

    /// Nothing parsable was found
    #[error("No valid subtitle cues found")]
    Empty,

    /// The text does not follow the expected format
    #[error("Not a valid {0} subtitle")]
    Malformed(SubtitleFormat),

    /// The format name is not recognized
    #[error("Unknown subtitle format: {0}")]
    UnknownFormat(String),

    /// This format cannot be produced, only read
    #[error("Cannot serialize to format {0}")]
    UnsupportedTarget(SubtitleFormat),
}

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    // @field: Sequence number
    pub index: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Cue text
    pub text: String,
}

impl SubtitleCue {
    /// Creates a validated cue: the time range must be forward and the text non-empty
    pub fn new_validated(
        index: usize,
        start_time_ms: u64,
        end_time_ms: u64,
        text: String,
    ) -> Result<Self, FormatError> {
        if end_time_ms <= start_time_ms {
            return Err(FormatError::Malformed(SubtitleFormat::Srt));
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FormatError::Empty);
        }

        Ok(SubtitleCue {
            index,
            start_time_ms,
            end_time_ms,
            text: trimmed.to_string(),
        })
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_srt_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Format a timestamp in milliseconds to WebVTT format (HH:MM:SS.mmm)
    pub fn format_vtt_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

/// A parsed subtitle: its format plus ordered, renumbered cues
#[derive(Debug, Clone)]
pub struct SubtitleDocument {
    /// Format the text was parsed under
    pub format: SubtitleFormat,

    /// Parsed cues, sorted by start time
    pub cues: Vec<SubtitleCue>,
}

/// Parse `text` under a specific format
///
/// `fps` is only consulted for frame-based formats.
pub fn parse(text: &str, format: SubtitleFormat, fps: Option<f64>) -> Result<SubtitleDocument, FormatError> {
    let cues = match format {
        SubtitleFormat::Srt => parse_srt(text)?,
        SubtitleFormat::Vtt => parse_vtt(text)?,
        SubtitleFormat::Ass | SubtitleFormat::Ssa => parse_ass(text)?,
        SubtitleFormat::MicroDvd => {
            let fps = fps.filter(|f| *f > 0.0).ok_or(FormatError::MissingFrameRate)?;
            parse_microdvd(text, fps)?
        }
        SubtitleFormat::Mpl2 => parse_mpl2(text)?,
        SubtitleFormat::Tmp => parse_tmp(text)?,
    };

    Ok(SubtitleDocument { format, cues: finalize_cues(cues)? })
}

/// Detect the format of `text`, trying the declared format first
///
/// When detection reaches a frame-based format and no frame rate is available,
/// the detection is retried once with [`DEFAULT_FRAME_RATE`].
pub fn detect_and_parse(
    text: &str,
    declared: Option<SubtitleFormat>,
    fps: Option<f64>,
) -> Result<SubtitleDocument, FormatError> {
    if let Some(format) = declared {
        return match parse(text, format, fps) {
            Err(FormatError::MissingFrameRate) => parse(text, format, Some(DEFAULT_FRAME_RATE)),
            other => other,
        };
    }

    // unambiguous headers first, then the line-timed and frame-based formats
    let candidates = [
        SubtitleFormat::Vtt,
        SubtitleFormat::Ass,
        SubtitleFormat::Srt,
        SubtitleFormat::MicroDvd,
        SubtitleFormat::Mpl2,
        SubtitleFormat::Tmp,
    ];

    for format in candidates {
        match parse(text, format, fps) {
            Ok(mut doc) => {
                // split the shared ASS/SSA parser result by header
                if doc.format == SubtitleFormat::Ass && text.contains("[V4 Styles]") {
                    doc.format = SubtitleFormat::Ssa;
                }
                debug!("Detected subtitle format {}", doc.format);
                return Ok(doc);
            }
            Err(FormatError::MissingFrameRate) => {
                // retry once with the default frame rate
                if let Ok(doc) = parse(text, format, Some(DEFAULT_FRAME_RATE)) {
                    debug!("Detected subtitle format {} at {} fps", doc.format, DEFAULT_FRAME_RATE);
                    return Ok(doc);
                }
            }
            Err(_) => {}
        }
    }

    Err(FormatError::Empty)
}

/// Serialize a document to `format`
///
/// ASS/SSA are read-only sources and cannot be produced.
pub fn compose(doc: &SubtitleDocument, format: SubtitleFormat, fps: Option<f64>) -> Result<String, FormatError> {
    match format {
        SubtitleFormat::Srt => Ok(compose_srt(&doc.cues)),
        SubtitleFormat::Vtt => Ok(compose_vtt(&doc.cues)),
        SubtitleFormat::MicroDvd => {
            let fps = fps.filter(|f| *f > 0.0).ok_or(FormatError::MissingFrameRate)?;
            Ok(compose_microdvd(&doc.cues, fps))
        }
        SubtitleFormat::Mpl2 => Ok(compose_mpl2(&doc.cues)),
        SubtitleFormat::Tmp => Ok(compose_tmp(&doc.cues)),
        SubtitleFormat::Ass | SubtitleFormat::Ssa => Err(FormatError::UnsupportedTarget(format)),
    }
}

/// Sort by start time, warn on overlaps and renumber sequentially
fn finalize_cues(mut cues: Vec<SubtitleCue>) -> Result<Vec<SubtitleCue>, FormatError> {
    if cues.is_empty() {
        return Err(FormatError::Empty);
    }

    cues.sort_by_key(|cue| cue.start_time_ms);

    let mut overlap_count = 0;
    for i in 0..cues.len().saturating_sub(1) {
        if cues[i].end_time_ms > cues[i + 1].start_time_ms {
            overlap_count += 1;
        }
    }
    if overlap_count > 0 {
        warn!("Found {} overlapping subtitle cues", overlap_count);
    }

    for (i, cue) in cues.iter_mut().enumerate() {
        cue.index = i + 1;
    }

    Ok(cues)
}

/// Parse SRT format text into cues
fn parse_srt(content: &str) -> Result<Vec<SubtitleCue>, FormatError> {
    let mut cues = Vec::new();

    // State variables for parsing
    let mut current_index: Option<usize> = None;
    let mut current_start_ms: Option<u64> = None;
    let mut current_end_ms: Option<u64> = None;
    let mut current_text = String::new();
    let mut line_count = 0;

    let mut push_current =
        |index: usize, start_ms: u64, end_ms: u64, text: &str| match SubtitleCue::new_validated(
            index,
            start_ms,
            end_ms,
            text.to_string(),
        ) {
            Ok(cue) => cues.push(cue),
            Err(_) => warn!("Skipping invalid subtitle cue {}", index),
        };

    for line in content.lines() {
        line_count += 1;
        let trimmed = line.trim().trim_start_matches('\u{feff}');

        // Empty line finalizes the current cue
        if trimmed.is_empty() {
            if let (Some(index), Some(start_ms), Some(end_ms)) =
                (current_index, current_start_ms, current_end_ms)
            {
                if !current_text.is_empty() {
                    push_current(index, start_ms, end_ms, &current_text);
                    current_index = None;
                    current_start_ms = None;
                    current_end_ms = None;
                    current_text.clear();
                }
            }
            continue;
        }

        // Sequence number starts a new cue
        if current_index.is_none() && current_text.is_empty() {
            if let Ok(num) = trimmed.parse::<usize>() {
                current_index = Some(num);
                continue;
            }
        }

        // Timestamp line
        if current_index.is_some() && current_start_ms.is_none() && current_end_ms.is_none() {
            if let Some(caps) = SRT_TIMESTAMP_REGEX.captures(trimmed) {
                current_start_ms = Some(captured_timestamp_ms(&caps, 1));
                current_end_ms = Some(captured_timestamp_ms(&caps, 5));
                continue;
            }
        }

        // With index and timestamps in hand, this must be cue text
        if current_index.is_some() && current_start_ms.is_some() && current_end_ms.is_some() {
            if !current_text.is_empty() {
                current_text.push('\n');
            }
            current_text.push_str(trimmed);
        } else {
            debug!("Unexpected text at line {} before sequence number or timestamp", line_count);
        }
    }

    // Final cue without a trailing blank line
    if let (Some(index), Some(start_ms), Some(end_ms)) = (current_index, current_start_ms, current_end_ms) {
        if !current_text.is_empty() {
            push_current(index, start_ms, end_ms, &current_text);
        }
    }

    Ok(cues)
}

/// Milliseconds from four consecutive capture groups starting at `start_idx`
fn captured_timestamp_ms(caps: &regex::Captures<'_>, start_idx: usize) -> u64 {
    let hours: u64 = caps.get(start_idx).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let minutes: u64 = caps.get(start_idx + 1).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let seconds: u64 = caps.get(start_idx + 2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let millis: u64 = caps.get(start_idx + 3).map_or(0, |m| m.as_str().parse().unwrap_or(0));

    (hours * 3600 + minutes * 60 + seconds) * 1000 + millis
}

/// Serialize cues as SRT
fn compose_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            SubtitleCue::format_srt_timestamp(cue.start_time_ms),
            SubtitleCue::format_srt_timestamp(cue.end_time_ms),
            cue.text
        ));
    }
    out
}

/// Parse WebVTT format text into cues
fn parse_vtt(content: &str) -> Result<Vec<SubtitleCue>, FormatError> {
    let mut lines = content.lines().map(|l| l.trim_start_matches('\u{feff}'));

    // WEBVTT header is mandatory
    let header = lines.find(|l| !l.trim().is_empty()).unwrap_or("");
    if !header.trim_start().starts_with("WEBVTT") {
        return Err(FormatError::Malformed(SubtitleFormat::Vtt));
    }

    let mut cues = Vec::new();
    let mut current: Option<(u64, u64, String)> = None;

    for line in lines {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if let Some((start_ms, end_ms, text)) = current.take() {
                if let Ok(cue) = SubtitleCue::new_validated(cues.len() + 1, start_ms, end_ms, text) {
                    cues.push(cue);
                }
            }
            continue;
        }

        // NOTE and STYLE blocks carry no cues
        if trimmed.starts_with("NOTE") || trimmed.starts_with("STYLE") {
            continue;
        }

        if let Some(caps) = VTT_TIMESTAMP_REGEX.captures(trimmed) {
            let start_ms = vtt_captured_ms(&caps, 1);
            let end_ms = vtt_captured_ms(&caps, 5);
            current = Some((start_ms, end_ms, String::new()));
            continue;
        }

        if let Some((_, _, text)) = current.as_mut() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(trimmed);
        }
        // anything else is a cue identifier, ignored
    }

    if let Some((start_ms, end_ms, text)) = current {
        if let Ok(cue) = SubtitleCue::new_validated(cues.len() + 1, start_ms, end_ms, text) {
            cues.push(cue);
        }
    }

    Ok(cues)
}

/// Milliseconds from a WebVTT capture where the hours group is optional
fn vtt_captured_ms(caps: &regex::Captures<'_>, start_idx: usize) -> u64 {
    let hours: u64 = caps
        .get(start_idx)
        .map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let minutes: u64 = caps.get(start_idx + 1).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let seconds: u64 = caps.get(start_idx + 2).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    let millis: u64 = caps.get(start_idx + 3).map_or(0, |m| m.as_str().parse().unwrap_or(0));

    (hours * 3600 + minutes * 60 + seconds) * 1000 + millis
}

/// Serialize cues as WebVTT
fn compose_vtt(cues: &[SubtitleCue]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for cue in cues {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            SubtitleCue::format_vtt_timestamp(cue.start_time_ms),
            SubtitleCue::format_vtt_timestamp(cue.end_time_ms),
            cue.text
        ));
    }
    out
}

/// Parse MicroDVD format text into cues, times are frame numbers
fn parse_microdvd(content: &str, fps: f64) -> Result<Vec<SubtitleCue>, FormatError> {
    let mut cues = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let caps = match MICRODVD_REGEX.captures(trimmed) {
            Some(caps) => caps,
            None => return Err(FormatError::Malformed(SubtitleFormat::MicroDvd)),
        };

        let start_frame: u64 = caps[1].parse().unwrap_or(0);
        let end_frame: u64 = caps[2].parse().unwrap_or(0);
        let text = caps[3].replace('|', "\n");

        let start_ms = (start_frame as f64 * 1000.0 / fps).round() as u64;
        let end_ms = (end_frame as f64 * 1000.0 / fps).round() as u64;

        if let Ok(cue) = SubtitleCue::new_validated(cues.len() + 1, start_ms, end_ms, text) {
            cues.push(cue);
        }
    }

    Ok(cues)
}

/// Serialize cues as MicroDVD at the given frame rate
fn compose_microdvd(cues: &[SubtitleCue], fps: f64) -> String {
    let mut out = String::new();
    for cue in cues {
        let start_frame = (cue.start_time_ms as f64 * fps / 1000.0).round() as u64;
        let end_frame = (cue.end_time_ms as f64 * fps / 1000.0).round() as u64;
        out.push_str(&format!("{{{}}}{{{}}}{}\n", start_frame, end_frame, cue.text.replace('\n', "|")));
    }
    out
}

/// Parse MPL2 format text into cues, times are tenths of a second
fn parse_mpl2(content: &str) -> Result<Vec<SubtitleCue>, FormatError> {
    let mut cues = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let caps = match MPL2_REGEX.captures(trimmed) {
            Some(caps) => caps,
            None => return Err(FormatError::Malformed(SubtitleFormat::Mpl2)),
        };

        let start_ds: u64 = caps[1].parse().unwrap_or(0);
        let end_ds: u64 = caps[2].parse().unwrap_or(0);
        let text = caps[3].replace('|', "\n");

        if let Ok(cue) = SubtitleCue::new_validated(cues.len() + 1, start_ds * 100, end_ds * 100, text) {
            cues.push(cue);
        }
    }

    Ok(cues)
}

/// Serialize cues as MPL2
fn compose_mpl2(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "[{}][{}]{}\n",
            cue.start_time_ms / 100,
            cue.end_time_ms / 100,
            cue.text.replace('\n', "|")
        ));
    }
    out
}

/// Parse TMP format text into cues
///
/// TMP carries no end times, each cue ends after four seconds or at the next
/// cue, whichever comes first.
fn parse_tmp(content: &str) -> Result<Vec<SubtitleCue>, FormatError> {
    let mut raw: Vec<(u64, String)> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let caps = match TMP_REGEX.captures(trimmed) {
            Some(caps) => caps,
            None => return Err(FormatError::Malformed(SubtitleFormat::Tmp)),
        };

        let hours: u64 = caps[1].parse().unwrap_or(0);
        let minutes: u64 = caps[2].parse().unwrap_or(0);
        let seconds: u64 = caps[3].parse().unwrap_or(0);
        let text = caps[4].replace('|', "\n");

        raw.push(((hours * 3600 + minutes * 60 + seconds) * 1000, text));
    }

    raw.sort_by_key(|(start, _)| *start);

    let mut cues = Vec::new();
    for i in 0..raw.len() {
        let (start_ms, text) = raw[i].clone();
        let mut end_ms = start_ms + 4000;
        if let Some((next_start, _)) = raw.get(i + 1) {
            end_ms = end_ms.min(*next_start);
        }
        if let Ok(cue) = SubtitleCue::new_validated(cues.len() + 1, start_ms, end_ms, text) {
            cues.push(cue);
        }
    }

    Ok(cues)
}

/// Serialize cues as TMP
fn compose_tmp(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        let total_seconds = cue.start_time_ms / 1000;
        out.push_str(&format!(
            "{:02}:{:02}:{:02}:{}\n",
            total_seconds / 3600,
            (total_seconds % 3600) / 60,
            total_seconds % 60,
            cue.text.replace('\n', "|")
        ));
    }
    out
}

/// Parse ASS/SSA events into cues, styles are ignored and override tags stripped
fn parse_ass(content: &str) -> Result<Vec<SubtitleCue>, FormatError> {
    if !content.contains("[Script Info]") {
        return Err(FormatError::Malformed(SubtitleFormat::Ass));
    }

    let mut in_events = false;
    let mut field_names: Vec<String> = Vec::new();
    let mut cues = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') {
            in_events = trimmed.eq_ignore_ascii_case("[Events]");
            continue;
        }
        if !in_events {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("Format:") {
            field_names = rest.split(',').map(|f| f.trim().to_string()).collect();
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("Dialogue:") {
            if field_names.is_empty() {
                return Err(FormatError::Malformed(SubtitleFormat::Ass));
            }

            // the Text field is last and may itself contain commas
            let fields: Vec<&str> = rest.splitn(field_names.len(), ',').map(str::trim).collect();
            let field = |name: &str| {
                field_names
                    .iter()
                    .position(|f| f.eq_ignore_ascii_case(name))
                    .and_then(|i| fields.get(i).copied())
            };

            let (start, end, text) = match (field("Start"), field("End"), field("Text")) {
                (Some(s), Some(e), Some(t)) => (s, e, t),
                _ => continue,
            };

            let (start_ms, end_ms) = match (parse_ass_timestamp(start), parse_ass_timestamp(end)) {
                (Some(s), Some(e)) => (s, e),
                _ => continue,
            };

            let text = ASS_TAG_REGEX.replace_all(text, "").replace("\\N", "\n").replace("\\n", "\n");
            if let Ok(cue) = SubtitleCue::new_validated(cues.len() + 1, start_ms, end_ms, text) {
                cues.push(cue);
            }
        }
    }

    Ok(cues)
}

/// Parse an ASS timestamp (H:MM:SS.cc) to milliseconds
fn parse_ass_timestamp(value: &str) -> Option<u64> {
    let mut parts = value.split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let rest = parts.next()?.trim();

    let (seconds, centis) = rest.split_once('.')?;
    let seconds: u64 = seconds.parse().ok()?;
    let centis: u64 = centis.parse().ok()?;

    Some((hours * 3600 + minutes * 60 + seconds) * 1000 + centis * 10)
}

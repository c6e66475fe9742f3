/*!
 * Tests for subtitle format detection, parsing and serialization
 */

use subscout::format::{self, DEFAULT_FRAME_RATE, SubtitleFormat};

use crate::common::TEST_SRT;

#[test]
fn test_detect_srt() {
    let doc = format::detect_and_parse(TEST_SRT, None, None).unwrap();
    assert_eq!(doc.format, SubtitleFormat::Srt);
    assert_eq!(doc.cues.len(), 2);
}

#[test]
fn test_detect_vtt_with_cue_identifiers() {
    let content = "WEBVTT\n\nintro\n00:00:01.000 --> 00:00:04.000\nHello\n\noutro\n00:00:05.000 --> 00:00:09.000\nBye\n";
    let doc = format::detect_and_parse(content, None, None).unwrap();
    assert_eq!(doc.format, SubtitleFormat::Vtt);
    assert_eq!(doc.cues.len(), 2);
    assert_eq!(doc.cues[1].text, "Bye");
}

#[test]
fn test_detect_ssa_by_styles_header() {
    let content = "[Script Info]\nScriptType: v4.00\n\n[V4 Styles]\n\n[Events]\nFormat: Marked, Start, End, Style, Text\nDialogue: Marked=0,0:00:01.00,0:00:02.00,Default,Hi\n";
    let doc = format::detect_and_parse(content, None, None).unwrap();
    assert_eq!(doc.format, SubtitleFormat::Ssa);
    assert_eq!(doc.cues[0].text, "Hi");
}

#[test]
fn test_mpl2_round_trip() {
    let content = "[10][45]First line|Second line\n[50][90]Another\n";
    let doc = format::parse(content, SubtitleFormat::Mpl2, None).unwrap();
    assert_eq!(doc.cues[0].start_time_ms, 1000);
    assert_eq!(doc.cues[0].end_time_ms, 4500);
    assert_eq!(doc.cues[0].text, "First line\nSecond line");

    let composed = format::compose(&doc, SubtitleFormat::Mpl2, None).unwrap();
    assert_eq!(composed, content);
}

#[test]
fn test_tmp_cues_end_at_the_next_cue() {
    let content = "00:00:01:First\n00:00:03:Second\n";
    let doc = format::parse(content, SubtitleFormat::Tmp, None).unwrap();
    // capped by the next cue start
    assert_eq!(doc.cues[0].end_time_ms, 3000);
    // last cue gets the default four seconds
    assert_eq!(doc.cues[1].end_time_ms, 7000);
}

#[test]
fn test_microdvd_declared_format_retries_default_fps() {
    let content = "{0}{48}Half way\n";
    let doc = format::detect_and_parse(content, Some(SubtitleFormat::MicroDvd), None).unwrap();
    // 48 frames at the default frame rate
    let expected_ms = (48.0 * 1000.0 / DEFAULT_FRAME_RATE).round() as u64;
    assert_eq!(doc.cues[0].end_time_ms, expected_ms);
}

#[test]
fn test_srt_to_vtt_timestamps_use_dots() {
    let doc = format::parse(TEST_SRT, SubtitleFormat::Srt, None).unwrap();
    let vtt = format::compose(&doc, SubtitleFormat::Vtt, None).unwrap();
    assert!(vtt.starts_with("WEBVTT"));
    assert!(vtt.contains("00:00:01.000 --> 00:00:04.000"));
    assert!(!vtt.contains(','));
}

#[test]
fn test_vtt_to_srt_round_trip_preserves_cues() {
    let content = "WEBVTT\n\n00:00:01.500 --> 00:00:04.250\nHello there\n";
    let doc = format::detect_and_parse(content, None, None).unwrap();
    let srt = format::compose(&doc, SubtitleFormat::Srt, None).unwrap();

    let reparsed = format::parse(&srt, SubtitleFormat::Srt, None).unwrap();
    assert_eq!(reparsed.cues[0].start_time_ms, 1500);
    assert_eq!(reparsed.cues[0].end_time_ms, 4250);
    assert_eq!(reparsed.cues[0].text, "Hello there");
}

#[test]
fn test_prose_is_not_a_subtitle() {
    let prose = "Dear diary,\n\ntoday nothing happened.\n";
    assert!(format::detect_and_parse(prose, None, None).is_err());
}

#[test]
fn test_extension_mapping() {
    assert_eq!(SubtitleFormat::Srt.extension(), ".srt");
    assert_eq!(SubtitleFormat::MicroDvd.extension(), ".sub");
    assert_eq!(SubtitleFormat::from_extension(".vtt"), Some(SubtitleFormat::Vtt));
    assert_eq!(SubtitleFormat::from_extension(".nfo"), None);
}

/*!
 * Text encoding inference for subtitle content.
 *
 * Candidate order: utf-8 first, then any encoding named by a byte-order mark,
 * then a fixed per-language candidate list, finally a statistical detector.
 * A candidate is accepted only if it decodes without error and the decoded
 * text is fully printable once line breaks and tabs are stripped.
 */

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::language_utils::LanguageTag;

/// BOMs for UTF content, UTF-32 first as the UTF-32LE BOM starts with the UTF-16LE BOM
const BOMS: &[(&[u8], &str)] = &[
    (&[0xEF, 0xBB, 0xBF], "utf-8"),
    (&[0x00, 0x00, 0xFE, 0xFF], "utf-32be"),
    (&[0xFF, 0xFE, 0x00, 0x00], "utf-32le"),
    (&[0xFE, 0xFF], "utf-16be"),
    (&[0xFF, 0xFE], "utf-16le"),
];

/// Find the UTF encoding if the raw content starts with a byte-order mark
pub fn find_encoding_with_bom(data: &[u8]) -> Option<&'static str> {
    BOMS.iter()
        .find(|(bom, _)| data.starts_with(bom))
        .map(|(_, label)| *label)
}

/// Potential encodings for the language of the subtitle
///
/// Lists follow common per-script encoding usage; the Western European list is
/// the default fallback.
pub fn potential_encodings(language: &LanguageTag) -> Vec<&'static str> {
    match language.alpha3() {
        "zho" => vec!["gbk", "gb2312", "big5", "gb18030", "utf-16"],
        "jpn" => vec!["shift_jis", "euc-jp", "iso-2022-jp"],
        "tha" => vec!["tis-620", "windows-874"],
        "ara" | "fas" => vec!["windows-1256", "utf-16le", "iso-8859-6"],
        "heb" => vec!["windows-1255", "iso-8859-8"],
        "tur" => vec!["windows-1254", "iso-8859-9", "iso-8859-3"],
        "ell" => vec!["windows-1253", "iso-8859-7"],
        "sqi" => vec![
            "windows-1250",
            "iso-8859-2",
            "windows-1252",
            "iso-8859-15",
        ],
        "slv" => vec!["windows-1250", "iso-8859-2", "iso-8859-4"],
        "pol" | "ces" | "slk" | "hun" | "bos" | "hrv" | "ron" => {
            vec!["windows-1250", "iso-8859-2"]
        }
        "bul" | "mkd" | "rus" | "ukr" => vec!["windows-1251", "iso-8859-5"],
        "srp" => match language.script() {
            Some("Latn") => vec!["windows-1250", "iso-8859-2"],
            Some("Cyrl") => vec!["windows-1251", "iso-8859-5"],
            _ => vec!["windows-1250", "windows-1251", "iso-8859-2", "iso-8859-5"],
        },
        // Western European / Northern European
        _ => vec![
            "windows-1252",
            "iso-8859-15",
            "iso-8859-9",
            "iso-8859-4",
            "iso-8859-1",
        ],
    }
}

/// Guess the encoding of `data` using the language, falling back on statistical detection
///
/// Returns an encoding label usable with [`decode`], or `None` for empty input.
pub fn guess_encoding(data: &[u8], language: &LanguageTag) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    info!("Guessing encoding for language {}", language);

    // always try utf-8 first
    let mut candidates: Vec<&str> = vec!["utf-8"];

    // add UTF encodings matched by the BOM
    if let Some(label) = find_encoding_with_bom(data) {
        candidates.push(label);
    }

    // add language-specific encodings
    candidates.extend(potential_encodings(language));

    debug!("Trying encodings {:?}", candidates);
    for label in candidates {
        if let Some(decoded) = decode_strict(data, label) {
            if is_printable(&decoded) {
                info!("Guessed encoding {}", label);
                return Some(label.to_string());
            }
        }
    }

    warn!("Could not guess encoding from language");

    // fallback on statistical detection, accepted even if uncertain
    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    let detected = detector.guess(None, true);
    info!("Detector found encoding {}", detected.name());

    Some(detected.name().to_ascii_lowercase())
}

/// Decode `data` under the encoding `label`, replacing malformed sequences
pub fn decode(data: &[u8], label: &str) -> Option<String> {
    match label {
        "utf-32be" => Some(decode_utf32(data, true, false)?),
        "utf-32le" => Some(decode_utf32(data, false, false)?),
        _ => {
            let encoding = Encoding::for_label(label.as_bytes())?;
            let (text, _, _) = encoding.decode(data);
            Some(text.into_owned())
        }
    }
}

/// Encode `text` under the encoding `label`, failing on unmappable characters
///
/// UTF-16 and UTF-32 are produced by hand (without a BOM): encoding_rs only
/// decodes those, its encoders fall back to UTF-8.
pub fn encode(text: &str, label: &str) -> Option<Vec<u8>> {
    match label {
        "utf-32be" | "utf-32le" => {
            let big_endian = label == "utf-32be";
            let mut out = Vec::with_capacity(text.len() * 4);
            for c in text.chars() {
                let v = c as u32;
                let bytes = if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
                out.extend_from_slice(&bytes);
            }
            Some(out)
        }
        "utf-16" | "utf-16le" | "utf-16be" => {
            let big_endian = label == "utf-16be";
            let mut out = Vec::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                let bytes = if big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() };
                out.extend_from_slice(&bytes);
            }
            Some(out)
        }
        _ => {
            let encoding = Encoding::for_label(label.as_bytes())?;
            let (bytes, _, had_errors) = encoding.encode(text);
            if had_errors {
                return None;
            }
            Some(bytes.into_owned())
        }
    }
}

/// Strict decode: `None` when the label is unknown or any byte sequence is invalid
fn decode_strict(data: &[u8], label: &str) -> Option<String> {
    match label {
        "utf-32be" => decode_utf32(data, true, true),
        "utf-32le" => decode_utf32(data, false, true),
        _ => {
            let encoding = Encoding::for_label(label.as_bytes())?;
            let (text, _, had_errors) = encoding.decode(data);
            if had_errors {
                return None;
            }
            Some(text.into_owned())
        }
    }
}

/// UTF-32 is absent from encoding_rs, decode it by hand
fn decode_utf32(data: &[u8], big_endian: bool, strict: bool) -> Option<String> {
    if strict && data.len() % 4 != 0 {
        return None;
    }

    let mut out = String::with_capacity(data.len() / 4);
    for (i, chunk) in data.chunks_exact(4).enumerate() {
        let raw = [chunk[0], chunk[1], chunk[2], chunk[3]];
        let value = if big_endian {
            u32::from_be_bytes(raw)
        } else {
            u32::from_le_bytes(raw)
        };

        // skip a leading BOM
        if i == 0 && value == 0xFEFF {
            continue;
        }

        match char::from_u32(value) {
            Some(c) => out.push(c),
            None if strict => return None,
            None => out.push(char::REPLACEMENT_CHARACTER),
        }
    }

    Some(out)
}

/// Whether the text is fully printable once `\r`, `\n` and `\t` are stripped
fn is_printable(text: &str) -> bool {
    text.chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .all(|c| !c.is_control())
}

/*!
 * Video archive inspection.
 *
 * An archive is scanned for its largest embedded video entry, which becomes
 * the video descriptor the subtitle search runs against. Password-protected,
 * broken and video-less archives fail the scan without affecting sibling
 * scans.
 */

use std::fs::File;
use std::path::Path;

use log::{debug, info};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::errors::{ArchiveError, Error};
use crate::matching::Guess;
use crate::video::{Video, has_video_extension};

/// Supported archive extensions
pub const ARCHIVE_EXTENSIONS: &[&str] = &[".zip"];

/// Signature of the external guesser turning a path into a structured guess
pub type Guesser = dyn Fn(&str) -> Guess + Send + Sync;

/// Check if the archive format is supported
pub fn is_supported_archive(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    ARCHIVE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Scan an archive for its largest embedded video
///
/// Returns the video descriptor built from the embedded entry name, with the
/// uncompressed size filled in.
pub fn scan_archive(path: &Path, guesser: &Guesser) -> Result<Video, Error> {
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    if !is_supported_archive(&extension) {
        return Err(ArchiveError::UnsupportedExtension(extension).into());
    }

    let dir_path = path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    info!("Scanning archive {:?} in {:?}", file_name, dir_path);

    let file = File::open(path).map_err(ArchiveError::Io)?;
    let mut archive = ZipArchive::new(file).map_err(map_zip_error)?;

    // find the largest embedded video, samples and intros are smaller
    let mut best: Option<(String, u64)> = None;
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(map_zip_error)?;
        if entry.is_dir() || !has_video_extension(entry.name()) {
            continue;
        }

        debug!("Found video entry {:?} ({} bytes)", entry.name(), entry.size());
        if best.as_ref().is_none_or(|(_, size)| entry.size() > *size) {
            best = Some((entry.name().to_string(), entry.size()));
        }
    }

    let (video_filename, size) = best.ok_or(ArchiveError::NoVideo)?;

    // the descriptor is built from the embedded name, placed next to the archive
    let video_path = dir_path.join(&video_filename).to_string_lossy().to_string();
    let guess = guesser(&video_path);
    let mut video = Video::from_guess(&video_path, &guess)?;
    video.size = Some(size);

    Ok(video)
}

/// Map a zip error into the archive error taxonomy
fn map_zip_error(error: ZipError) -> ArchiveError {
    match error {
        ZipError::Io(e) => ArchiveError::Io(e),
        ZipError::UnsupportedArchive(msg) if msg.contains("Password") => ArchiveError::Encrypted,
        other => ArchiveError::Broken(other.to_string()),
    }
}

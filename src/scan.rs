/*!
 * Filesystem scanning: videos, archives and external subtitles.
 *
 * Batch scans are forgiving: a file that fails to scan is logged and skipped,
 * the batch continues. Structured guessing from names is delegated to an
 * external guesser function.
 */

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive::{Guesser, is_supported_archive, scan_archive};
use crate::errors::Error;
use crate::format::SubtitleFormat;
use crate::language_utils::{LanguageTag, trim_suffix_token};
use crate::subtitle::Subtitle;
use crate::video::{Video, has_video_extension};

/// Subtitle extensions recognized next to a video
pub const SUBTITLE_EXTENSIONS: &[&str] = &[".srt", ".vtt", ".ass", ".ssa", ".sub", ".mpl", ".smi"];

/// Provider name stamped on subtitles discovered next to the video
pub const EXTERNAL_PROVIDER_NAME: &str = "external";

/// Options for [`scan_videos`]
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Maximum age of a video file, older files are skipped
    pub age: Option<Duration>,

    /// Use the latest of creation and modification time for the age
    pub use_ctime: bool,

    /// Also scan videos inside archives
    pub archives: bool,
}

/// Get the age of a file
pub fn get_age(path: &Path, use_ctime: bool) -> Result<Duration, Error> {
    let metadata = fs::metadata(path)?;
    let mut file_date = metadata.modified()?;

    if use_ctime {
        if let Ok(created) = metadata.created() {
            file_date = file_date.max(created);
        }
    }

    let file_date: DateTime<Utc> = DateTime::from(file_date);
    Ok(Utc::now() - file_date)
}

/// Scan a video from a name, existing or not
pub fn scan_name(path: &str, guesser: &Guesser) -> Result<Video, Error> {
    info!("Scanning video {:?}", path);
    Video::from_guess(path, &guesser(path))
}

/// Scan a video from an existing path
pub fn scan_video(path: &Path, guesser: &Guesser) -> Result<Video, Error> {
    if !path.exists() {
        return Err(Error::Configuration(format!("Path does not exist: {}", path.display())));
    }

    let name = path.to_string_lossy().to_string();
    if !has_video_extension(&name) {
        return Err(Error::Configuration(format!("{name:?} is not a valid video extension")));
    }

    let mut video = scan_name(&name, guesser)?;
    video.size = fs::metadata(path).ok().map(|m| m.len());
    debug!("Size is {:?}", video.size);

    Ok(video)
}

/// Scan a video or an archive from an existing path
pub fn scan_video_or_archive(path: &Path, guesser: &Guesser) -> Result<Video, Error> {
    let name = path.to_string_lossy().to_string();

    if has_video_extension(&name) {
        return scan_video(path, guesser);
    }
    if is_supported_archive(&name) {
        return scan_archive(path, guesser);
    }

    Err(Error::Configuration(format!("Unsupported file {name:?}")))
}

/// Scan a video or an archive from a path, existing or not
pub fn scan_path(path: &Path, guesser: &Guesser) -> Result<Video, Error> {
    if !path.is_file() {
        return scan_name(&path.to_string_lossy(), guesser);
    }
    scan_video_or_archive(path, guesser)
}

/// Collect video file paths under a directory
///
/// Hidden entries, sample files and directories, and symlinks are skipped.
pub fn collect_video_filepaths(path: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, Error> {
    if !path.exists() {
        return Err(Error::Configuration(format!("Path does not exist: {}", path.display())));
    }
    if !path.is_dir() {
        return Err(Error::Configuration(format!("Path is not a directory: {}", path.display())));
    }

    let mut filepaths = Vec::new();

    let walker = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            // skip hidden and sample directories
            !name.starts_with('.') && !name.eq_ignore_ascii_case("sample")
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error walking directory: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();

        // filter on videos and archives
        let is_video = has_video_extension(&file_name);
        let is_archive = options.archives && is_supported_archive(&file_name);
        if !is_video && !is_archive {
            continue;
        }

        // skip hidden and sample files
        if file_name.starts_with('.') {
            debug!("Skipping hidden filename {:?}", file_name);
            continue;
        }
        let stem = entry.path().file_stem().map(|s| s.to_string_lossy().to_lowercase());
        if stem.as_deref() == Some("sample") {
            debug!("Skipping sample filename {:?}", file_name);
            continue;
        }

        // skip links
        if entry.path_is_symlink() {
            debug!("Skipping link {:?}", file_name);
            continue;
        }

        // skip old files
        if let Some(max_age) = options.age {
            match get_age(entry.path(), options.use_ctime) {
                Ok(age) if age > max_age => {
                    debug!("Skipping old file {:?}", file_name);
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Could not get age of file {:?}: {}", file_name, e);
                    continue;
                }
            }
        }

        filepaths.push(entry.path().to_path_buf());
    }

    Ok(filepaths)
}

/// Scan a directory for videos
///
/// Files that fail to scan are logged and skipped.
pub fn scan_videos(path: &Path, options: &ScanOptions, guesser: &Guesser) -> Result<Vec<Video>, Error> {
    let filepaths = collect_video_filepaths(path, options)?;

    let mut videos = Vec::new();
    for filepath in filepaths {
        match scan_video_or_archive(&filepath, guesser) {
            Ok(video) => videos.push(video),
            Err(e) => {
                warn!("Error scanning video {:?}: {}", filepath.display(), e);
                continue;
            }
        }
    }

    Ok(videos)
}

/// Parse a subtitle filename for the language code suffixed to the video name
///
/// Returns `None` when the subtitle filename does not belong to the video.
pub fn parse_language_code(subtitle_filename: &str, video_filename: &str) -> Option<String> {
    let video_path = Path::new(video_filename);
    let fileroot = video_path.file_stem()?.to_string_lossy().to_string();

    let lower = subtitle_filename.to_lowercase();
    if !subtitle_filename.starts_with(&fileroot)
        || !SUBTITLE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    {
        return None;
    }

    let subtitle_stem = Path::new(subtitle_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())?;
    let code = subtitle_stem[fileroot.len()..].replace('_', "-");

    Some(code.trim_start_matches('.').to_string())
}

/// Build a subtitle record from a filename language code suffix
pub fn external_subtitle_from_code(language_code: &str, subtitle_path: &str) -> Subtitle {
    let extension = Path::new(subtitle_path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let format = SubtitleFormat::from_extension(&extension);

    let undetermined = LanguageTag::from_code("und").expect("und is a valid language code");
    let build = |language: LanguageTag, hi: Option<bool>, fo: Option<bool>| {
        let mut builder = Subtitle::builder(EXTERNAL_PROVIDER_NAME, subtitle_path, language).flags(hi, fo);
        if let Some(format) = format {
            builder = builder.format(format);
        }
        builder.build()
    };

    if language_code.is_empty() {
        return build(undetermined, None, None);
    }

    // try the language alone first, before trimming: 'hi' is also Hindi
    if let Ok(language) = LanguageTag::from_ietf(language_code) {
        return build(language, None, None);
    }

    // check for a hearing impaired token
    let (short_code, matched) =
        trim_suffix_token(language_code, &["[hi]", "[sdh]", "[cc]", "hi", "sdh", "cc"], '.');
    if matched {
        if let Ok(language) = LanguageTag::from_ietf(&short_code) {
            return build(language, Some(true), None);
        }
    }

    // check for a foreign only token
    let (short_code, matched) = trim_suffix_token(language_code, &["[fo]", "fo"], '.');
    if matched {
        if let Ok(language) = LanguageTag::from_ietf(&short_code) {
            return build(language, None, Some(true));
        }
    }

    build(undetermined, None, None)
}

/// Search for external subtitles next to a video
///
/// Returns subtitle records keyed by their filename.
pub fn search_external_subtitles(
    video_path: &Path,
    directory: Option<&Path>,
) -> Result<HashMap<String, Subtitle>, Error> {
    let dirpath = directory
        .map(Path::to_path_buf)
        .or_else(|| video_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let video_filename = video_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut subtitles = HashMap::new();
    for entry in fs::read_dir(&dirpath)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();

        let Some(language_code) = parse_language_code(&file_name, &video_filename) else {
            continue;
        };

        let subtitle = external_subtitle_from_code(&language_code, &file_name);
        subtitles.insert(file_name, subtitle);
    }

    debug!("Found external subtitles {:?}", subtitles.keys());

    Ok(subtitles)
}

/// Perform optional checks on a video before searching
///
/// Returns `false` when the requested languages are all known already, the
/// video is older than `age`, or `undefined` is set and an undetermined
/// language is among the known subtitles.
pub fn check_video(
    video: &Video,
    languages: Option<&std::collections::HashSet<LanguageTag>>,
    age: Option<Duration>,
    undefined: bool,
) -> bool {
    // language test
    if let Some(languages) = languages {
        if !languages.is_empty() && languages.is_subset(&video.subtitle_languages) {
            debug!("All languages exist for {}", video.name());
            return false;
        }
    }

    // age test
    if let Some(max_age) = age {
        if let Ok(video_age) = get_age(Path::new(video.name()), false) {
            if video_age > max_age {
                debug!("Video {} is too old", video.name());
                return false;
            }
        }
    }

    // undefined test
    if undefined {
        let undetermined = LanguageTag::from_code("und").expect("und is a valid language code");
        if video.subtitle_languages.contains(&undetermined) {
            debug!("Undefined language found for {}", video.name());
            return false;
        }
    }

    true
}

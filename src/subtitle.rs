use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::encoding;
use crate::errors::{ConversionError, Error};
use crate::format::{self, FormatError, SubtitleFormat};
use crate::language_utils::{LanguageCodeScheme, LanguageTag};
use crate::matching::{Guess, MatchKind, guess_matches};
use crate::video::Video;

// @module: Subtitle record and persistence

/// Classification of a subtitle track by audience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageType {
    /// Nothing is known about the subtitle
    #[default]
    Unknown,
    /// Forced subtitle: only foreign dialogue is transcribed
    ForeignOnly,
    /// Regular subtitle
    Normal,
    /// Subtitle for the deaf and hard of hearing
    HearingImpaired,
}

impl LanguageType {
    /// Compute the language type from the two nullable flags
    ///
    /// `hearing_impaired` takes precedence over `foreign_only`; an explicit
    /// `false` on either flag means the subtitle is known to be normal.
    pub fn from_flags(hearing_impaired: Option<bool>, foreign_only: Option<bool>) -> Self {
        if hearing_impaired == Some(true) {
            LanguageType::HearingImpaired
        } else if foreign_only == Some(true) {
            LanguageType::ForeignOnly
        } else if hearing_impaired == Some(false) || foreign_only == Some(false) {
            LanguageType::Normal
        } else {
            LanguageType::Unknown
        }
    }

    /// Hearing impaired flag, `None` when unknown
    pub fn is_hearing_impaired(&self) -> Option<bool> {
        match self {
            LanguageType::HearingImpaired => Some(true),
            LanguageType::Unknown => None,
            _ => Some(false),
        }
    }

    /// Foreign only flag, `None` when unknown
    pub fn is_foreign_only(&self) -> Option<bool> {
        match self {
            LanguageType::ForeignOnly => Some(true),
            LanguageType::Unknown => None,
            _ => Some(false),
        }
    }

    /// Bracketed path token for this type, if any
    fn suffix_token(&self) -> Option<&'static str> {
        match self {
            LanguageType::HearingImpaired => Some(".[hi]"),
            LanguageType::ForeignOnly => Some(".[fo]"),
            _ => None,
        }
    }
}

/// Decoded-text cache of a subtitle
#[derive(Debug, Clone, Default, PartialEq)]
enum DecodeState {
    /// Raw content has not been decoded yet
    #[default]
    NotDecoded,
    /// Cached decoded text
    Decoded(String),
}

/// A subtitle listed by a provider
///
/// The identity is the (provider name, provider-assigned id) pair, immutable
/// after construction and the only input to equality and hashing. Content is
/// absent until downloaded; decoded text and validity are computed lazily and
/// invalidated whenever the raw content is replaced.
#[derive(Debug, Clone)]
pub struct Subtitle {
    /// Name of the provider that listed this subtitle
    provider: String,

    /// Provider-assigned identifier
    id: String,

    /// Language the subtitle is written in
    pub language: LanguageTag,

    /// Audience classification, computed once from the provider's flags
    pub language_type: LanguageType,

    /// URL of the web page the subtitle can be downloaded from
    pub page_link: Option<String>,

    /// Declared subtitle format, `None` for automatic detection
    pub format: Option<SubtitleFormat>,

    /// Frame rate for frame-based formats
    pub fps: Option<f64>,

    /// Whether the subtitle is embedded in the video rather than external
    pub embedded: bool,

    /// Metadata declared by the provider, matched against the video
    pub metadata: Guess,

    /// Renumber and rewrite SRT content when validating
    pub auto_fix: bool,

    /// Encoding of the raw content, guessed when not declared
    encoding: Option<String>,

    /// Raw bytes, absent until downloaded
    content: Option<Vec<u8>>,

    /// Lazily decoded text
    decoded: DecodeState,

    /// Cached validity, `None` until first checked
    validity: Option<bool>,
}

impl Subtitle {
    /// Start building a subtitle with its immutable identity
    pub fn builder(provider: &str, id: &str, language: LanguageTag) -> SubtitleBuilder {
        SubtitleBuilder {
            subtitle: Subtitle {
                provider: provider.to_string(),
                id: id.to_string(),
                language,
                language_type: LanguageType::Unknown,
                page_link: None,
                format: None,
                fps: None,
                embedded: false,
                metadata: Guess::default(),
                auto_fix: false,
                encoding: None,
                content: None,
                decoded: DecodeState::NotDecoded,
                validity: None,
            },
        }
    }

    /// Name of the provider that listed this subtitle
    pub fn provider_name(&self) -> &str {
        &self.provider
    }

    /// Provider-assigned identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable description
    pub fn info(&self) -> String {
        let extra = self.language_type.suffix_token().unwrap_or("");
        format!("{}:{} [{}]{}", self.provider, self.id, self.language, extra)
    }

    /// Encoding of the raw content, if known
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Raw bytes, absent until downloaded
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Whether raw content is present
    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Replace the raw content, resetting the decode and validity state
    ///
    /// Line endings are normalized to `\n` and the encoding is re-guessed
    /// unless one was declared by the provider.
    pub fn set_content(&mut self, value: Vec<u8>) {
        let value = fix_line_ending(value);

        self.clear_content();
        if self.encoding.is_none() {
            self.encoding = encoding::guess_encoding(&value, &self.language);
        }
        self.content = Some(value);
    }

    /// Drop the content and every derived state
    pub fn clear_content(&mut self) {
        self.content = None;
        self.decoded = DecodeState::NotDecoded;
        self.validity = None;
    }

    /// Content as text, decoded on first access and cached
    pub fn text(&mut self) -> &str {
        if self.decoded == DecodeState::NotDecoded {
            let text = self.decode_content();
            self.decoded = DecodeState::Decoded(text);
        }

        match &self.decoded {
            DecodeState::Decoded(text) => text,
            DecodeState::NotDecoded => unreachable!(),
        }
    }

    fn decode_content(&self) -> String {
        let content = match &self.content {
            Some(content) if !content.is_empty() => content,
            _ => return String::new(),
        };

        let Some(label) = &self.encoding else {
            warn!("Cannot guess encoding to decode subtitle content");
            return String::new();
        };

        encoding::decode(content, label).unwrap_or_else(|| {
            warn!("Unknown encoding {} for subtitle {}", label, self.id);
            String::new()
        })
    }

    /// Re-encode the current text with the given encoding
    ///
    /// The decoded text becomes the new source of truth: content and encoding
    /// are replaced together.
    pub fn reencode(&mut self, target_encoding: &str) -> Result<(), ConversionError> {
        let text = self.text().to_string();

        // an empty text would erase the content
        if text.is_empty() {
            return Err(ConversionError::UnparsableContent);
        }

        let new_content = encoding::encode(&text, target_encoding)
            .ok_or_else(|| ConversionError::EncodingFailed(target_encoding.to_string()))?;

        self.clear_content();
        self.encoding = Some(target_encoding.to_string());
        self.content = Some(new_content);
        self.decoded = DecodeState::Decoded(text);
        Ok(())
    }

    /// Convert the subtitle to the given format and, optionally, encoding
    ///
    /// A no-op success when format and encoding already match the target. On
    /// any failure the previous content, format and encoding are untouched.
    pub fn convert(
        &mut self,
        output_format: SubtitleFormat,
        output_encoding: Option<&str>,
        fps: Option<f64>,
    ) -> Result<(), ConversionError> {
        let text = self.text().to_string();
        if text.is_empty() {
            return Err(ConversionError::UnparsableContent);
        }
        if self.encoding.is_none() {
            error!("The current encoding is not defined");
            return Err(ConversionError::UnknownEncoding);
        }

        // use the current encoding when none is requested
        let target_encoding = output_encoding
            .map(str::to_string)
            .or_else(|| self.encoding.clone())
            .ok_or(ConversionError::UnknownEncoding)?;

        // pick the subtitle fps unless overridden
        let fps = fps.filter(|f| *f > 0.0).or(self.fps);

        // try parsing the subtitle
        let doc = format::detect_and_parse(&text, self.format, fps).map_err(|e| match e {
            FormatError::MissingFrameRate => ConversionError::MissingFrameRate,
            _ => ConversionError::UnparsableContent,
        })?;
        self.format = Some(doc.format);

        if doc.format == output_format && self.encoding.as_deref() == Some(target_encoding.as_str()) {
            debug!("The subtitle is already in the correct format and encoding");
            return Ok(());
        }

        let new_text = if doc.format == output_format {
            text
        } else {
            format::compose(&doc, output_format, fps).map_err(|e| match e {
                FormatError::MissingFrameRate => ConversionError::MissingFrameRate,
                FormatError::UnsupportedTarget(f) => ConversionError::UnsupportedTarget(f.to_string()),
                _ => ConversionError::InvalidResult,
            })?
        };

        // converted SRT must still be structurally well-formed
        if output_format == SubtitleFormat::Srt
            && format::parse(&new_text, SubtitleFormat::Srt, fps).is_err()
        {
            error!("SRT parsing failed, converted subtitle is invalid");
            return Err(ConversionError::InvalidResult);
        }

        let new_content = encoding::encode(&new_text, &target_encoding)
            .ok_or_else(|| ConversionError::EncodingFailed(target_encoding.clone()))?;

        self.content = Some(new_content);
        self.decoded = DecodeState::Decoded(new_text);
        self.encoding = Some(target_encoding);
        self.format = Some(output_format);
        self.validity = Some(true);
        Ok(())
    }

    /// Check that the content is a well-formed subtitle
    ///
    /// The result is cached until the content changes. With `auto_fix` set,
    /// minor SRT structural issues are repaired in the cached text.
    pub fn is_valid(&mut self) -> bool {
        if let Some(valid) = self.validity {
            return valid;
        }

        let valid = self.check_is_valid();
        self.validity = Some(valid);
        valid
    }

    fn check_is_valid(&mut self) -> bool {
        let auto_fix = self.auto_fix;
        let declared = self.format;
        let fps = self.fps;

        let text = self.text().to_string();
        if text.is_empty() {
            return false;
        }

        let doc = match format::detect_and_parse(&text, declared, fps) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("Subtitle {} failed to parse: {}", self.id, e);
                return false;
            }
        };

        // keep the detected format
        self.format = Some(doc.format);

        if doc.format == SubtitleFormat::Srt && auto_fix {
            // renumbered, normalized SRT replaces the cached text
            if let Ok(fixed) = format::compose(&doc, SubtitleFormat::Srt, fps) {
                self.decoded = DecodeState::Decoded(fixed);
            }
        }

        true
    }

    /// Get the matches against the `video` from the declared metadata
    pub fn get_matches(&self, video: &Video) -> HashSet<MatchKind> {
        guess_matches(video, &self.metadata, false)
    }

    /// Build the path this subtitle should be saved to, next to the video
    pub fn get_path(
        &self,
        video: &Video,
        single: bool,
        extension: Option<&str>,
        language_type_suffix: bool,
        language_format: LanguageCodeScheme,
    ) -> PathBuf {
        let extension = extension.map(str::to_string).unwrap_or_else(|| {
            self.format
                .unwrap_or(SubtitleFormat::Srt)
                .extension()
                .to_string()
        });

        let suffix = if single {
            String::new()
        } else {
            get_subtitle_suffix(
                &self.language,
                language_format,
                self.language_type,
                language_type_suffix,
            )
        };

        get_subtitle_path(video.name(), &suffix, &extension)
    }
}

impl PartialEq for Subtitle {
    fn eq(&self, other: &Self) -> bool {
        self.provider == other.provider && self.id == other.id
    }
}

impl Eq for Subtitle {}

impl std::hash::Hash for Subtitle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Subtitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.info())
    }
}

/// Builder for [`Subtitle`]
pub struct SubtitleBuilder {
    subtitle: Subtitle,
}

impl SubtitleBuilder {
    /// Set the hearing-impaired and foreign-only flags together
    pub fn flags(mut self, hearing_impaired: Option<bool>, foreign_only: Option<bool>) -> Self {
        self.subtitle.language_type = LanguageType::from_flags(hearing_impaired, foreign_only);
        self
    }

    /// Set the web page the subtitle can be downloaded from
    pub fn page_link(mut self, link: &str) -> Self {
        self.subtitle.page_link = Some(link.to_string());
        self
    }

    /// Declare the subtitle format
    pub fn format(mut self, format: SubtitleFormat) -> Self {
        self.subtitle.format = Some(format);
        self
    }

    /// Declare the frame rate, ignored unless positive
    pub fn fps(mut self, fps: f64) -> Self {
        self.subtitle.fps = (fps > 0.0).then_some(fps);
        self
    }

    /// Mark the subtitle as embedded in the video
    pub fn embedded(mut self) -> Self {
        self.subtitle.embedded = true;
        self
    }

    /// Attach the metadata used for matching
    pub fn metadata(mut self, metadata: Guess) -> Self {
        self.subtitle.metadata = metadata;
        self
    }

    /// Declare the content encoding instead of guessing it
    pub fn encoding(mut self, encoding: &str) -> Self {
        self.subtitle.encoding = Some(encoding.to_string());
        self
    }

    /// Repair minor SRT structural issues when validating
    pub fn auto_fix(mut self) -> Self {
        self.subtitle.auto_fix = true;
        self
    }

    /// Finish building
    pub fn build(self) -> Subtitle {
        self.subtitle
    }
}

/// Get the file suffix for a language and language type
///
/// The language type token comes first and is bracketed to differentiate it
/// from the Hindi and Faroese language codes.
pub fn get_subtitle_suffix(
    language: &LanguageTag,
    language_format: LanguageCodeScheme,
    language_type: LanguageType,
    language_type_suffix: bool,
) -> String {
    let language_part = format!(".{}", language.code_with_qualifiers(language_format));

    let mut suffix = String::new();
    if language_type_suffix {
        if let Some(token) = language_type.suffix_token() {
            suffix.push_str(token);
        }
    }
    suffix.push_str(&language_part);

    suffix
}

/// Get the subtitle path from the video path, suffix and extension
pub fn get_subtitle_path(video_path: &str, suffix: &str, extension: &str) -> PathBuf {
    let path = Path::new(video_path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| video_path.to_string());

    let file_name = format!("{}{}{}", stem, suffix, extension);
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

/// Options controlling how subtitles are saved
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Save a single subtitle with no language suffix
    pub single: bool,

    /// Directory to save into, default is next to the video
    pub directory: Option<PathBuf>,

    /// Re-encode the text before saving, default keeps the original bytes
    pub encoding: Option<String>,

    /// Convert to this format before saving
    pub format: Option<SubtitleFormat>,

    /// Force this file extension
    pub extension: Option<String>,

    /// Add the `.[hi]`/`.[fo]` token to the file name
    pub language_type_suffix: bool,

    /// Rendering scheme for the language suffix
    pub language_format: LanguageCodeScheme,
}

/// Save subtitles on the filesystem, one per language
///
/// Subtitles are saved in order; subsequent subtitles sharing a language with
/// an already saved one are silently skipped. Returns the written paths.
pub fn save_subtitles(
    video: &Video,
    subtitles: &mut [Subtitle],
    options: &SaveOptions,
) -> Result<Vec<PathBuf>, Error> {
    let mut saved_languages: HashSet<LanguageTag> = HashSet::new();
    let mut saved_paths = Vec::new();

    for subtitle in subtitles.iter_mut() {
        if !subtitle.has_content() {
            error!("Skipping subtitle {}: no content", subtitle.id());
            continue;
        }

        if saved_languages.contains(&subtitle.language) {
            debug!("Skipping subtitle {}: language already saved", subtitle.id());
            continue;
        }

        // convert format ahead of saving
        if let Some(target_format) = options.format {
            // use the video frame rate when the subtitle has none
            let fps = if subtitle.fps.is_none() { video.frame_rate } else { None };
            if let Err(e) = subtitle.convert(target_format, options.encoding.as_deref(), fps) {
                warn!("Skipping subtitle {}: {}", subtitle.id(), e);
                continue;
            }
        }

        let mut subtitle_path = subtitle.get_path(
            video,
            options.single,
            options.extension.as_deref(),
            options.language_type_suffix,
            options.language_format,
        );
        if let Some(directory) = &options.directory {
            if let Some(file_name) = subtitle_path.file_name() {
                subtitle_path = directory.join(file_name);
            }
        }

        info!("Saving {} to {}", subtitle.info(), subtitle_path.display());
        match &options.encoding {
            None => {
                // save the raw bytes in their original encoding
                fs::write(&subtitle_path, subtitle.content().unwrap_or_default())?;
            }
            Some(target_encoding) => {
                if subtitle.reencode(target_encoding).is_err() {
                    warn!("Skipping subtitle {}: cannot encode as {}", subtitle.id(), target_encoding);
                    continue;
                }
                fs::write(&subtitle_path, subtitle.content().unwrap_or_default())?;
            }
        }

        saved_languages.insert(subtitle.language.clone());
        saved_paths.push(subtitle_path);

        if options.single {
            break;
        }
    }

    Ok(saved_paths)
}

/// Fix line endings by changing them to `\n`
fn fix_line_ending(content: Vec<u8>) -> Vec<u8> {
    if !content.windows(2).any(|w| w == b"\r\n") {
        return content;
    }

    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        if content[i] == b'\r' && content.get(i + 1) == Some(&b'\n') {
            i += 1;
            continue;
        }
        out.push(content[i]);
        i += 1;
    }
    out
}

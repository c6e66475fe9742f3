/*!
 * Matching between a video descriptor and the metadata declared by a subtitle.
 *
 * Each match kind is a named attribute dimension; `guess_matches` runs every
 * predicate against a [`Guess`] record and returns the set of agreeing kinds.
 * The scoring engine turns that set into a quality score.
 */

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scoring::equivalent_release_groups;
use crate::video::{Video, VideoKind};

// Frame rates are considered equal when the relative difference is below this,
// a bit more than 0.1% to be safe.
const FPS_RELATIVE_DIFF: f64 = 0.0011;

static STRIP_CHARS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-:\(\)\.,]").unwrap());
static MULTI_SPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static BRACKET_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\w+\]").unwrap());

/// Sanitize a string for title comparison: strip punctuation, squeeze spaces, lower case
pub fn sanitize(string: &str) -> String {
    let replaced = STRIP_CHARS_REGEX.replace_all(string, " ");
    let no_quotes = replaced.replace('\'', "");
    MULTI_SPACE_REGEX
        .replace_all(&no_quotes, " ")
        .trim()
        .to_lowercase()
}

/// Sanitize a release group: remove bracketed tags, strip and upper case
pub fn sanitize_release_group(string: &str) -> String {
    BRACKET_TAG_REGEX.replace_all(string, "").trim().to_uppercase()
}

/// Whether `actual` matches the expected `title` or any of the `alternative_titles`
pub fn matches_extended_title(actual: Option<&str>, title: &str, alternative_titles: &[String]) -> bool {
    let actual = match actual {
        Some(a) => sanitize(a),
        None => return false,
    };

    if actual == sanitize(title) {
        return true;
    }

    alternative_titles.iter().any(|t| sanitize(t) == actual)
}

/// A named attribute dimension on which subtitle metadata can agree with a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Exact content fingerprint, authoritative
    Hash,
    Series,
    Title,
    Season,
    Episode,
    Year,
    Country,
    Fps,
    ReleaseGroup,
    StreamingService,
    Resolution,
    Source,
    VideoCodec,
    AudioCodec,
    /// Hearing-impaired flag, carries the smallest weight
    HearingImpaired,
    ImdbId,
    TmdbId,
    TvdbId,
    SeriesImdbId,
    SeriesTmdbId,
    SeriesTvdbId,
}

impl MatchKind {
    /// Every kind that has a predicate, in evaluation order
    pub const PREDICATES: &'static [MatchKind] = &[
        MatchKind::Hash,
        MatchKind::Series,
        MatchKind::Title,
        MatchKind::Season,
        MatchKind::Episode,
        MatchKind::Year,
        MatchKind::Country,
        MatchKind::Fps,
        MatchKind::ReleaseGroup,
        MatchKind::StreamingService,
        MatchKind::Resolution,
        MatchKind::Source,
        MatchKind::VideoCodec,
        MatchKind::AudioCodec,
        MatchKind::ImdbId,
        MatchKind::TmdbId,
        MatchKind::TvdbId,
        MatchKind::SeriesImdbId,
        MatchKind::SeriesTmdbId,
        MatchKind::SeriesTvdbId,
    ];
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchKind::Hash => "hash",
            MatchKind::Series => "series",
            MatchKind::Title => "title",
            MatchKind::Season => "season",
            MatchKind::Episode => "episode",
            MatchKind::Year => "year",
            MatchKind::Country => "country",
            MatchKind::Fps => "fps",
            MatchKind::ReleaseGroup => "release_group",
            MatchKind::StreamingService => "streaming_service",
            MatchKind::Resolution => "resolution",
            MatchKind::Source => "source",
            MatchKind::VideoCodec => "video_codec",
            MatchKind::AudioCodec => "audio_codec",
            MatchKind::HearingImpaired => "hearing_impaired",
            MatchKind::ImdbId => "imdb_id",
            MatchKind::TmdbId => "tmdb_id",
            MatchKind::TvdbId => "tvdb_id",
            MatchKind::SeriesImdbId => "series_imdb_id",
            MatchKind::SeriesTmdbId => "series_tmdb_id",
            MatchKind::SeriesTvdbId => "series_tvdb_id",
        };
        write!(f, "{}", name)
    }
}

/// Asset type discriminator of a guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuessKind {
    Episode,
    Movie,
    /// Discriminator missing or unrecognized
    #[default]
    #[serde(other)]
    Unknown,
}

/// A declared content fingerprint: algorithm name plus hash string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoHash {
    /// Hash algorithm name, e.g. `opensubtitles`
    pub algorithm: String,
    /// Hash value
    pub value: String,
}

/// Structured description of a video asset
///
/// Produced by an external guesser from a release name or path, or assembled by
/// a provider from structured response fields. All attributes are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guess {
    /// Asset type discriminator
    #[serde(rename = "type")]
    pub kind: GuessKind,

    /// Movie title, or series name for episodes
    pub title: Option<String>,

    /// Episode title
    pub episode_title: Option<String>,

    /// Alternative titles or series names
    pub alternative_titles: Vec<String>,

    pub year: Option<i32>,

    /// ISO 3166-1 alpha-2 country code, upper case
    pub country: Option<String>,

    pub season: Option<u32>,

    /// Episode numbers, possibly several for multi-episode files
    pub episodes: Vec<u32>,

    pub release_group: Option<String>,
    pub streaming_service: Option<String>,

    /// Screen size, e.g. `1080p`
    pub resolution: Option<String>,

    /// Source of the rip, e.g. `Web`, `Blu-ray`
    pub source: Option<String>,

    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,

    /// Frame rate declared by the subtitle, for frame-based formats
    pub fps: Option<f64>,

    /// Declared content fingerprint
    pub video_hash: Option<VideoHash>,

    pub imdb_id: Option<String>,
    pub tmdb_id: Option<u64>,
    pub tvdb_id: Option<u64>,
    pub series_imdb_id: Option<String>,
    pub series_tmdb_id: Option<u64>,
    pub series_tvdb_id: Option<u64>,
}

impl Guess {
    /// A movie guess with just a title
    pub fn movie(title: &str) -> Self {
        Guess {
            kind: GuessKind::Movie,
            title: Some(title.to_string()),
            ..Guess::default()
        }
    }

    /// An episode guess with series name, season and episode number
    pub fn episode(series: &str, season: u32, episode: u32) -> Self {
        Guess {
            kind: GuessKind::Episode,
            title: Some(series.to_string()),
            season: Some(season),
            episodes: vec![episode],
            ..Guess::default()
        }
    }
}

/// Whether the video matches the guess on a single kind
///
/// If the guess is `partial`, the absence of information is not counted as a
/// match. If `strict`, the absence of frame rate information is counted as a
/// non-match.
fn kind_matches(kind: MatchKind, video: &Video, guess: &Guess, partial: bool, strict: bool) -> bool {
    match kind {
        MatchKind::Hash => guess
            .video_hash
            .as_ref()
            .is_some_and(|h| video.hashes.get(&h.algorithm) == Some(&h.value)),

        MatchKind::Series => match &video.kind {
            VideoKind::Episode(ep) => guess
                .title
                .as_deref()
                .is_some_and(|t| matches_extended_title(Some(t), &ep.series, &ep.alternative_series)),
            VideoKind::Movie(_) => false,
        },

        MatchKind::Title => match &video.kind {
            VideoKind::Episode(ep) => match (&ep.title, &guess.episode_title) {
                (Some(actual), Some(expected)) => sanitize(actual) == sanitize(expected),
                _ => false,
            },
            VideoKind::Movie(movie) => guess
                .title
                .as_deref()
                .is_some_and(|t| matches_extended_title(Some(t), &movie.title, &movie.alternative_titles)),
        },

        MatchKind::Season => match &video.kind {
            VideoKind::Episode(ep) => guess.season == Some(ep.season),
            VideoKind::Movie(_) => false,
        },

        MatchKind::Episode => match &video.kind {
            VideoKind::Episode(ep) => !guess.episodes.is_empty() && guess.episodes == ep.episodes,
            VideoKind::Movie(_) => false,
        },

        MatchKind::Year => {
            if video.year().is_some() && guess.year == video.year() {
                return true;
            }
            match &video.kind {
                // count "no year" as an information for the original series
                VideoKind::Episode(ep) => !partial && ep.original_series && guess.year.is_none(),
                VideoKind::Movie(_) => false,
            }
        }

        MatchKind::Country => {
            if video.country().is_some() && guess.country.as_deref() == video.country() {
                return true;
            }
            match &video.kind {
                // count "no country" as an information for the original series
                VideoKind::Episode(ep) => !partial && ep.original_series && guess.country.is_none(),
                VideoKind::Movie(_) => video.country().is_none() && guess.country.is_none(),
            }
        }

        MatchKind::Fps => fps_matches(video, guess.fps, strict),

        MatchKind::ReleaseGroup => match (&video.release_group, &guess.release_group) {
            (Some(video_group), Some(guess_group)) => {
                let sanitized_guess = sanitize_release_group(guess_group);
                equivalent_release_groups(&sanitize_release_group(video_group))
                    .iter()
                    .any(|group| sanitized_guess.contains(group.as_str()))
            }
            _ => false,
        },

        MatchKind::StreamingService => {
            video.streaming_service.is_some() && guess.streaming_service == video.streaming_service
        }

        MatchKind::Resolution => video.resolution.is_some() && guess.resolution == video.resolution,

        MatchKind::Source => video.source.is_some() && guess.source == video.source,

        MatchKind::VideoCodec => video.video_codec.is_some() && guess.video_codec == video.video_codec,

        MatchKind::AudioCodec => video.audio_codec.is_some() && guess.audio_codec == video.audio_codec,

        // no predicate can observe this, it is only produced by providers that
        // label their subtitles explicitly
        MatchKind::HearingImpaired => false,

        MatchKind::ImdbId => guess.imdb_id.is_some() && guess.imdb_id == video.imdb_id(),
        MatchKind::TmdbId => guess.tmdb_id.is_some() && guess.tmdb_id == video.tmdb_id(),
        MatchKind::TvdbId => match &video.kind {
            VideoKind::Episode(ep) => guess.tvdb_id.is_some() && guess.tvdb_id == ep.tvdb_id,
            VideoKind::Movie(_) => false,
        },
        MatchKind::SeriesImdbId => match &video.kind {
            VideoKind::Episode(ep) => {
                guess.series_imdb_id.is_some() && guess.series_imdb_id == ep.series_imdb_id
            }
            VideoKind::Movie(_) => false,
        },
        MatchKind::SeriesTmdbId => match &video.kind {
            VideoKind::Episode(ep) => {
                guess.series_tmdb_id.is_some() && guess.series_tmdb_id == ep.series_tmdb_id
            }
            VideoKind::Movie(_) => false,
        },
        MatchKind::SeriesTvdbId => match &video.kind {
            VideoKind::Episode(ep) => {
                guess.series_tvdb_id.is_some() && guess.series_tvdb_id == ep.series_tvdb_id
            }
            VideoKind::Movie(_) => false,
        },
    }
}

/// Whether the subtitle frame rate matches the video frame rate
pub fn fps_matches(video: &Video, fps: Option<f64>, strict: bool) -> bool {
    match (video.frame_rate, fps) {
        (Some(video_fps), Some(fps)) if video_fps > 0.0 && fps > 0.0 => {
            (video_fps - fps).abs() / video_fps < FPS_RELATIVE_DIFF
        }
        // information is missing, match only when not strict
        _ => !strict,
    }
}

/// Get the set of kinds on which the `video` and the `guess` agree
pub fn guess_matches(video: &Video, guess: &Guess, partial: bool) -> HashSet<MatchKind> {
    guess_matches_strict(video, guess, partial, true)
}

/// Like [`guess_matches`] with control over strict frame rate handling
pub fn guess_matches_strict(
    video: &Video,
    guess: &Guess,
    partial: bool,
    strict: bool,
) -> HashSet<MatchKind> {
    MatchKind::PREDICATES
        .iter()
        .copied()
        .filter(|kind| kind_matches(*kind, video, guess, partial, strict))
        .collect()
}

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::errors::Error;
use crate::language_utils::LanguageTag;
use crate::matching::{Guess, GuessKind};

/// Video descriptor module
/// A video is identified by its name or path and carries the release
/// attributes the scoring engine matches subtitles against. The asset type is
/// a closed variant: an episode or a movie.
/// Video extensions recognized when scanning
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".3gp", ".asf", ".avi", ".divx", ".flv", ".m2ts", ".m4v", ".mk3d", ".mkv", ".mov", ".mp4",
    ".mpeg", ".mpg", ".ogm", ".ogv", ".rm", ".rmvb", ".ts", ".vob", ".webm", ".wmv", ".x264",
    ".xvid",
];

/// Whether a file name carries a recognized video extension
pub fn has_video_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Episode-specific attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Episode {
    /// Series name
    pub series: String,

    /// Season number
    pub season: u32,

    /// Episode numbers, one or more for multi-episode files
    pub episodes: Vec<u32>,

    /// Episode title
    pub title: Option<String>,

    /// Year of the series
    pub year: Option<i32>,

    /// Country of the series, ISO 3166-1 alpha-2 upper case
    pub country: Option<String>,

    /// The series is the first with this name; absence of year or country
    /// then counts as a positive signal when matching
    pub original_series: bool,

    /// Alternative names of the series
    pub alternative_series: Vec<String>,

    /// IMDb id of the episode
    pub imdb_id: Option<String>,

    /// IMDb id of the series
    pub series_imdb_id: Option<String>,

    /// TMDB id of the episode
    pub tmdb_id: Option<u64>,

    /// TMDB id of the series
    pub series_tmdb_id: Option<u64>,

    /// TVDB id of the episode
    pub tvdb_id: Option<u64>,

    /// TVDB id of the series
    pub series_tvdb_id: Option<u64>,
}

/// Movie-specific attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Movie {
    /// Title of the movie
    pub title: String,

    /// Year of the movie
    pub year: Option<i32>,

    /// Country of the movie, ISO 3166-1 alpha-2 upper case
    pub country: Option<String>,

    /// Alternative titles of the movie
    pub alternative_titles: Vec<String>,

    /// IMDb id of the movie
    pub imdb_id: Option<String>,

    /// TMDB id of the movie
    pub tmdb_id: Option<u64>,
}

/// Asset type of a video: exactly one of episode or movie
#[derive(Debug, Clone, PartialEq)]
pub enum VideoKind {
    Episode(Episode),
    Movie(Movie),
}

/// A video asset, existing on disk or not
#[derive(Debug, Clone)]
pub struct Video {
    /// Name or path of the video, immutable: it is the identity used for
    /// equality and hashing
    name: String,

    /// Source of the video (HDTV, Web, Blu-ray, ...)
    pub source: Option<String>,

    /// Release group of the video
    pub release_group: Option<String>,

    /// Streaming service of the video
    pub streaming_service: Option<String>,

    /// Resolution of the video stream (480p, 720p, 1080p, ...)
    pub resolution: Option<String>,

    /// Codec of the video stream
    pub video_codec: Option<String>,

    /// Codec of the main audio stream
    pub audio_codec: Option<String>,

    /// Frame rate in frames per second
    pub frame_rate: Option<f64>,

    /// Duration of the video in seconds
    pub duration: Option<f64>,

    /// Hashes of the video file by algorithm name
    pub hashes: HashMap<String, String>,

    /// Size of the video file in bytes
    pub size: Option<u64>,

    /// Languages of the subtitles already present for this video
    pub subtitle_languages: HashSet<LanguageTag>,

    /// Episode or movie attributes
    pub kind: VideoKind,
}

impl Video {
    /// Create a movie video
    pub fn movie(name: &str, movie: Movie) -> Self {
        Self::new(name, VideoKind::Movie(movie))
    }

    /// Create an episode video
    pub fn episode(name: &str, episode: Episode) -> Self {
        Self::new(name, VideoKind::Episode(episode))
    }

    fn new(name: &str, kind: VideoKind) -> Self {
        Video {
            name: name.to_string(),
            source: None,
            release_group: None,
            streaming_service: None,
            resolution: None,
            video_codec: None,
            audio_codec: None,
            frame_rate: None,
            duration: None,
            hashes: HashMap::new(),
            size: None,
            subtitle_languages: HashSet::new(),
            kind,
        }
    }

    /// Build a video descriptor from a structured guess
    ///
    /// Fails when the guess discriminator is neither episode nor movie, or
    /// when the guess misses the data the asset type requires.
    pub fn from_guess(name: &str, guess: &Guess) -> Result<Self, Error> {
        let kind = match guess.kind {
            GuessKind::Episode => {
                let series = guess
                    .title
                    .clone()
                    .ok_or_else(|| Error::Guess(format!("Insufficient data to process the guess for {name:?}")))?;
                if guess.episodes.is_empty() {
                    return Err(Error::Guess(format!(
                        "Insufficient data to process the guess for {name:?}"
                    )));
                }

                VideoKind::Episode(Episode {
                    series,
                    season: guess.season.unwrap_or(1),
                    episodes: guess.episodes.clone(),
                    title: guess.episode_title.clone(),
                    year: guess.year,
                    country: guess.country.clone(),
                    original_series: guess.year.is_none() && guess.country.is_none(),
                    alternative_series: guess.alternative_titles.clone(),
                    imdb_id: guess.imdb_id.clone(),
                    series_imdb_id: guess.series_imdb_id.clone(),
                    tmdb_id: guess.tmdb_id,
                    series_tmdb_id: guess.series_tmdb_id,
                    tvdb_id: guess.tvdb_id,
                    series_tvdb_id: guess.series_tvdb_id,
                })
            }
            GuessKind::Movie => {
                let title = guess
                    .title
                    .clone()
                    .ok_or_else(|| Error::Guess(format!("Insufficient data to process the guess for {name:?}")))?;

                VideoKind::Movie(Movie {
                    title,
                    year: guess.year,
                    country: guess.country.clone(),
                    alternative_titles: guess.alternative_titles.clone(),
                    imdb_id: guess.imdb_id.clone(),
                    tmdb_id: guess.tmdb_id,
                })
            }
            GuessKind::Unknown => {
                return Err(Error::Guess(
                    "The guess must be an episode or a movie guess".to_string(),
                ));
            }
        };

        let mut video = Video::new(name, kind);
        video.source = guess.source.clone();
        video.release_group = guess.release_group.clone();
        video.streaming_service = guess.streaming_service.clone();
        video.resolution = guess.resolution.clone();
        video.video_codec = guess.video_codec.clone();
        video.audio_codec = guess.audio_codec.clone();
        video.frame_rate = guess.fps;

        Ok(video)
    }

    /// Name or path of the video, read-only
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Test whether the video exists on disk
    pub fn exists(&self) -> bool {
        Path::new(&self.name).exists()
    }

    /// Year of the asset, regardless of kind
    pub fn year(&self) -> Option<i32> {
        match &self.kind {
            VideoKind::Episode(ep) => ep.year,
            VideoKind::Movie(movie) => movie.year,
        }
    }

    /// Country of the asset, regardless of kind
    pub fn country(&self) -> Option<&str> {
        match &self.kind {
            VideoKind::Episode(ep) => ep.country.as_deref(),
            VideoKind::Movie(movie) => movie.country.as_deref(),
        }
    }

    /// IMDb id of the asset, regardless of kind
    pub fn imdb_id(&self) -> Option<String> {
        match &self.kind {
            VideoKind::Episode(ep) => ep.imdb_id.clone(),
            VideoKind::Movie(movie) => movie.imdb_id.clone(),
        }
    }

    /// TMDB id of the asset, regardless of kind
    pub fn tmdb_id(&self) -> Option<u64> {
        match &self.kind {
            VideoKind::Episode(ep) => ep.tmdb_id,
            VideoKind::Movie(movie) => movie.tmdb_id,
        }
    }

    /// Whether this video is an episode
    pub fn is_episode(&self) -> bool {
        matches!(self.kind, VideoKind::Episode(_))
    }

    /// Whether this video is a movie
    pub fn is_movie(&self) -> bool {
        matches!(self.kind, VideoKind::Movie(_))
    }
}

impl PartialEq for Video {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Video {}

impl std::hash::Hash for Video {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            VideoKind::Episode(ep) => {
                write!(f, "{} s{:02}e", ep.series, ep.season)?;
                let episodes: Vec<String> = ep.episodes.iter().map(|e| format!("{:02}", e)).collect();
                write!(f, "{}", episodes.join("-"))
            }
            VideoKind::Movie(movie) => {
                write!(f, "{}", movie.title)?;
                if let Some(year) = movie.year {
                    write!(f, " ({})", year)?;
                }
                Ok(())
            }
        }
    }
}

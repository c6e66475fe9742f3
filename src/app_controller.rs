use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::Config;
use crate::language_utils::LanguageTag;
use crate::matching::{Guess, GuessKind};
use crate::pool::{DownloadOptions, ParallelProviderPool};
use crate::providers::ProviderRegistry;
use crate::scan::{ScanOptions, check_video, scan_path, scan_videos, search_external_subtitles};
use crate::subtitle::{SaveOptions, save_subtitles};
use crate::video::Video;

/// Application controller module
/// Drives the full workflow: scan the input for videos, list subtitles across
/// the configured providers, pick the best candidates per language and save
/// them next to the videos.
// @const: SxxEyy episode numbering
static EPISODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})[._ ]?E(\d{1,3})\b").unwrap());

// @const: Release year
static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());

// @const: Release group after the last dash
static RELEASE_GROUP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([A-Za-z0-9]+)(?:\[\w+\])?$").unwrap());

/// Build a structured guess from a release file name
///
/// A light-weight stand-in for a full metadata guesser: recognizes SxxEyy
/// numbering, a release year, common resolution/source/codec tokens and the
/// trailing release group.
pub fn guess_from_name(path: &str) -> Guess {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    let mut guess = Guess::default();

    // episode numbering decides the asset type
    let title_end = if let Some(caps) = EPISODE_REGEX.captures(&stem) {
        guess.kind = GuessKind::Episode;
        guess.season = caps[1].parse().ok();
        guess.episodes = caps[2].parse().ok().into_iter().collect();
        caps.get(0).map(|m| m.start())
    } else {
        guess.kind = GuessKind::Movie;
        None
    };

    // a year ends the title for movies and dates the series for episodes
    let year_match = YEAR_REGEX.find(&stem);
    if let Some(year) = year_match {
        guess.year = year.as_str().parse().ok();
    }

    let title_end = match (title_end, year_match) {
        (Some(e), Some(y)) => Some(e.min(y.start())),
        (Some(e), None) => Some(e),
        (None, Some(y)) => Some(y.start()),
        (None, None) => None,
    };

    let title_part = match title_end {
        Some(end) => &stem[..end],
        None => stem.as_str(),
    };
    let title = title_part
        .split(['.', '_', ' '])
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('-')
        .trim()
        .to_string();
    if !title.is_empty() {
        guess.title = Some(title);
    }

    // release attribute tokens
    for token in stem.split(['.', '_', ' ', '-']) {
        match token.to_lowercase().as_str() {
            "480p" | "576p" | "720p" | "1080p" | "1080i" | "2160p" => {
                guess.resolution = Some(token.to_lowercase());
            }
            "bluray" | "blu-ray" | "bdrip" | "brrip" => guess.source = Some("Blu-ray".to_string()),
            "web" | "webrip" | "web-dl" | "webdl" => guess.source = Some("Web".to_string()),
            "hdtv" => guess.source = Some("HDTV".to_string()),
            "dvdrip" | "dvd" => guess.source = Some("DVD".to_string()),
            "x264" | "h264" => guess.video_codec = Some("H.264".to_string()),
            "x265" | "h265" | "hevc" => guess.video_codec = Some("H.265".to_string()),
            "xvid" => guess.video_codec = Some("Xvid".to_string()),
            "aac" => guess.audio_codec = Some("AAC".to_string()),
            "ac3" | "dd5" => guess.audio_codec = Some("Dolby Digital".to_string()),
            "dts" => guess.audio_codec = Some("DTS".to_string()),
            "flac" => guess.audio_codec = Some("FLAC".to_string()),
            _ => {}
        }
    }

    if let Some(caps) = RELEASE_GROUP_REGEX.captures(&stem) {
        guess.release_group = Some(caps[1].to_string());
    }

    guess
}

/// Summary of one processed video
#[derive(Debug)]
pub struct DownloadReport {
    /// Name of the video
    pub video: String,

    /// Paths of the saved subtitle files
    pub saved: Vec<PathBuf>,
}

/// Main application controller
pub struct Controller {
    /// Application configuration
    config: Config,

    /// Provider registry the pools are built from
    registry: Arc<ProviderRegistry>,
}

impl Controller {
    /// Create a controller with the built-in providers
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, Arc::new(ProviderRegistry::with_defaults()))
    }

    /// Create a controller with a custom provider registry
    pub fn with_registry(config: Config, registry: Arc<ProviderRegistry>) -> Self {
        Controller { config, registry }
    }

    /// Collect the videos to process from a file or directory path
    fn collect_videos(&self, input: &Path) -> Result<Vec<Video>> {
        let videos = if input.is_dir() {
            scan_videos(input, &ScanOptions { archives: true, ..ScanOptions::default() }, &guess_from_name)
                .map_err(|e| anyhow!("{e}"))?
        } else {
            vec![scan_path(input, &guess_from_name).map_err(|e| anyhow!("{e}"))?]
        };

        if videos.is_empty() {
            warn!("No video found in {}", input.display());
        }

        Ok(videos)
    }

    /// Download the best subtitles for every video under `input`
    pub async fn download(&self, input: &Path) -> Result<Vec<DownloadReport>> {
        let languages: HashSet<LanguageTag> =
            self.config.language_tags().context("Invalid language configuration")?.into_iter().collect();

        let mut videos = self.collect_videos(input)?;

        // account for subtitles already sitting next to the videos
        for video in &mut videos {
            if let Ok(found) = search_external_subtitles(Path::new(video.name()), None) {
                video
                    .subtitle_languages
                    .extend(found.values().map(|s| s.language.clone()));
            }
        }

        // drop videos that already have everything we want
        videos.retain(|v| check_video(v, Some(&languages), None, self.config.single));

        let save_options = self.save_options()?;
        let download_options = DownloadOptions {
            min_score: self.config.min_score,
            hearing_impaired: self.config.hearing_impaired,
            foreign_only: self.config.foreign_only,
            skip_wrong_fps: self.config.skip_wrong_fps,
            only_one: self.config.single,
            ignore: Vec::new(),
        };

        let mut pool = ParallelProviderPool::new(
            Arc::clone(&self.registry),
            self.config.providers.clone(),
            self.config.provider_configs.clone(),
            self.config.max_workers,
        );

        let progress = ProgressBar::new(videos.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        let mut reports = Vec::new();
        for video in &mut videos {
            progress.set_message(video.to_string());

            let wanted: HashSet<LanguageTag> =
                languages.difference(&video.subtitle_languages).cloned().collect();

            info!("Listing subtitles for {}", video.name());
            let candidates = pool.list_subtitles(video, &wanted).await;
            info!("Found {} subtitle(s)", candidates.len());

            let mut downloaded = pool
                .download_best_subtitles(candidates, video, &wanted, &download_options, None)
                .await;
            info!("Downloaded {} subtitle(s)", downloaded.len());

            let saved = save_subtitles(video, &mut downloaded, &save_options)
                .map_err(|e| anyhow!("{e}"))?;
            debug!("Saved {} file(s) for {}", saved.len(), video.name());

            reports.push(DownloadReport { video: video.name().to_string(), saved });
            progress.inc(1);
        }

        progress.finish_with_message("done");
        pool.terminate().await;

        Ok(reports)
    }

    /// List the videos and their missing languages without downloading
    pub fn preview(&self, input: &Path) -> Result<Vec<(String, Vec<String>)>> {
        let languages: HashSet<LanguageTag> =
            self.config.language_tags().context("Invalid language configuration")?.into_iter().collect();

        let mut videos = self.collect_videos(input)?;
        let mut out = Vec::new();
        for video in &mut videos {
            if let Ok(found) = search_external_subtitles(Path::new(video.name()), None) {
                video
                    .subtitle_languages
                    .extend(found.values().map(|s| s.language.clone()));
            }
            let missing: Vec<String> = languages
                .difference(&video.subtitle_languages)
                .map(|l| l.to_string())
                .collect();
            out.push((video.name().to_string(), missing));
        }

        Ok(out)
    }

    fn save_options(&self) -> Result<SaveOptions> {
        let format = match &self.config.output_format {
            Some(name) => Some(name.parse().map_err(|e| anyhow!("{e}"))?),
            None => None,
        };

        Ok(SaveOptions {
            single: self.config.single,
            directory: None,
            encoding: self.config.output_encoding.clone(),
            format,
            extension: None,
            language_type_suffix: self.config.language_type_suffix,
            language_format: self.config.language_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;

    #[test]
    fn test_guess_from_name_movie() {
        let guess = guess_from_name("Inception.2010.1080p.BluRay.x264-SPARKS.mkv");
        assert_eq!(guess.kind, GuessKind::Movie);
        assert_eq!(guess.title.as_deref(), Some("Inception"));
        assert_eq!(guess.year, Some(2010));
        assert_eq!(guess.resolution.as_deref(), Some("1080p"));
        assert_eq!(guess.source.as_deref(), Some("Blu-ray"));
        assert_eq!(guess.video_codec.as_deref(), Some("H.264"));
        assert_eq!(guess.release_group.as_deref(), Some("SPARKS"));
    }

    #[test]
    fn test_guess_from_name_episode() {
        let guess = guess_from_name("/videos/Breaking.Bad.S02E07.720p.HDTV.x264-CTU.mkv");
        assert_eq!(guess.kind, GuessKind::Episode);
        assert_eq!(guess.title.as_deref(), Some("Breaking Bad"));
        assert_eq!(guess.season, Some(2));
        assert_eq!(guess.episodes, vec![7]);
        assert_eq!(guess.source.as_deref(), Some("HDTV"));
        assert_eq!(guess.release_group.as_deref(), Some("CTU"));
    }

    #[test]
    fn test_guess_from_name_bare_title() {
        let guess = guess_from_name("Some Movie.mkv");
        assert_eq!(guess.kind, GuessKind::Movie);
        assert_eq!(guess.title.as_deref(), Some("Some Movie"));
        assert_eq!(guess.year, None);
    }

    #[tokio::test]
    async fn test_controller_downloads_and_saves() {
        let dir = tempfile::TempDir::new().unwrap();
        let video_path = dir.path().join("Movie.2020.1080p.mkv");
        std::fs::write(&video_path, b"fake video").unwrap();

        let mock = MockProvider::working("mock");
        let subtitle = mock.subtitle("1", &LanguageTag::from_code("en").unwrap());
        let mock = mock.with_subtitles(vec![subtitle]);

        let mut registry = ProviderRegistry::new();
        registry.register("mock", move |_| Ok(Box::new(mock.clone())));

        let config = Config { providers: vec!["mock".to_string()], ..Config::default() };
        let controller = Controller::with_registry(config, Arc::new(registry));

        let reports = controller.download(&video_path).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].saved.len(), 1);
        assert!(reports[0].saved[0].ends_with("Movie.2020.1080p.en.srt"));
        assert!(reports[0].saved[0].exists());
    }
}

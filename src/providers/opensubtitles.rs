use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::language_utils::LanguageTag;
use crate::matching::{Guess, GuessKind, VideoHash};
use crate::providers::{ProviderConfig, SubtitleProvider};
use crate::subtitle::Subtitle;
use crate::video::{Video, VideoKind};

/// OpenSubtitles REST API client
///
/// Implements the provider contract against the opensubtitles.com v1 API. An
/// API key is mandatory; a username/password pair upgrades the session to an
/// authenticated token during `initialize`.
#[derive(Debug)]
pub struct OpenSubtitlesProvider {
    /// Base URL of the API
    base_url: String,
    /// API key sent with every request
    api_key: String,
    /// Account user name, optional
    username: String,
    /// Account password, optional
    password: String,
    /// HTTP client for making requests
    client: Client,
    /// Session token obtained at login
    token: Option<String>,
}

/// Name under which this provider registers and stamps subtitles
pub const PROVIDER_NAME: &str = "opensubtitles";

/// Hash algorithm name this provider understands
pub const HASH_ALGORITHM: &str = "opensubtitles";

const DEFAULT_ENDPOINT: &str = "https://api.opensubtitles.com/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("subscout/", env!("CARGO_PKG_VERSION"));

/// Login request payload
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login response payload
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// Search response payload
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchResult>,
}

/// One search result
#[derive(Debug, Deserialize)]
struct SearchResult {
    attributes: SubtitleAttributes,
}

/// Attributes of a found subtitle
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubtitleAttributes {
    language: Option<String>,
    hearing_impaired: Option<bool>,
    foreign_parts_only: Option<bool>,
    moviehash_match: Option<bool>,
    fps: Option<f64>,
    release: Option<String>,
    url: Option<String>,
    files: Vec<SubtitleFile>,
    feature_details: Option<FeatureDetails>,
}

/// File entry of a found subtitle
#[derive(Debug, Deserialize)]
struct SubtitleFile {
    file_id: u64,
}

/// Feature (movie/episode) details of a found subtitle
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeatureDetails {
    title: Option<String>,
    year: Option<i32>,
    season_number: Option<u32>,
    episode_number: Option<u32>,
    parent_title: Option<String>,
    imdb_id: Option<u64>,
    tmdb_id: Option<u64>,
}

/// Download link request payload
#[derive(Debug, Serialize)]
struct DownloadRequest {
    file_id: u64,
}

/// Download link response payload
#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
    #[serde(default)]
    remaining: Option<i64>,
}

impl OpenSubtitlesProvider {
    /// Build a provider from its configuration bag
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Configuration(
                "opensubtitles requires an api_key".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        let base_url = if config.endpoint.is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else {
            config.endpoint.trim_end_matches('/').to_string()
        };
        url::Url::parse(&base_url)
            .map_err(|e| ProviderError::Configuration(format!("bad endpoint {base_url:?}: {e}")))?;

        Ok(OpenSubtitlesProvider {
            base_url,
            api_key: config.api_key.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
            token: None,
        })
    }

    /// Turn one search result into a subtitle record
    fn subtitle_from_result(&self, video: &Video, attributes: SubtitleAttributes) -> Option<Subtitle> {
        let file_id = attributes.files.first()?.file_id;
        let language = attributes
            .language
            .as_deref()
            .and_then(|code| LanguageTag::from_ietf(code).ok())?;

        let mut guess = Guess::default();
        if let Some(details) = attributes.feature_details {
            match video.kind {
                VideoKind::Episode(_) => {
                    guess.kind = GuessKind::Episode;
                    // for episodes the feature title is the episode title
                    guess.title = details.parent_title;
                    guess.episode_title = details.title;
                    guess.season = details.season_number;
                    guess.episodes = details.episode_number.into_iter().collect();
                    guess.imdb_id = details.imdb_id.map(format_imdb_id);
                    guess.tmdb_id = details.tmdb_id;
                }
                VideoKind::Movie(_) => {
                    guess.kind = GuessKind::Movie;
                    guess.title = details.title;
                    guess.imdb_id = details.imdb_id.map(format_imdb_id);
                    guess.tmdb_id = details.tmdb_id;
                }
            }
            guess.year = details.year;
        }
        guess.fps = attributes.fps.filter(|f| *f > 0.0);
        if let Some(release) = &attributes.release {
            // the release name carries the group after the last dash
            if let Some((_, group)) = release.rsplit_once('-') {
                guess.release_group = Some(group.trim().to_string());
            }
        }
        if attributes.moviehash_match == Some(true) {
            // the service compared the hash server-side, declare it as agreeing
            if let Some(value) = video.hashes.get(HASH_ALGORITHM) {
                guess.video_hash = Some(VideoHash {
                    algorithm: HASH_ALGORITHM.to_string(),
                    value: value.clone(),
                });
            }
        }

        let mut builder = Subtitle::builder(PROVIDER_NAME, &file_id.to_string(), language)
            .flags(attributes.hearing_impaired, attributes.foreign_parts_only)
            .metadata(guess);
        if let Some(url) = &attributes.url {
            builder = builder.page_link(url);
        }
        if let Some(fps) = attributes.fps.filter(|f| *f > 0.0) {
            builder = builder.fps(fps);
        }

        Some(builder.build())
    }

    /// Map an HTTP error status to a provider error
    fn status_error(status: StatusCode, context: &str) -> ProviderError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::Authentication(format!("{context}: {status}"))
            }
            StatusCode::NOT_ACCEPTABLE => {
                ProviderError::DownloadLimitExceeded(format!("{context}: {status}"))
            }
            s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                ProviderError::ServiceUnavailable(format!("{context}: {status}"))
            }
            _ => ProviderError::RequestFailed(format!("{context}: {status}")),
        }
    }
}

#[async_trait]
impl SubtitleProvider for OpenSubtitlesProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn initialize(&mut self) -> Result<(), ProviderError> {
        // anonymous sessions work with the API key alone
        if self.username.is_empty() {
            return Ok(());
        }

        info!("Logging in to opensubtitles as {}", self.username);
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .header("Api-Key", &self.api_key)
            .json(&LoginRequest { username: &self.username, password: &self.password })
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), "login"));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        self.token = Some(login.token);

        Ok(())
    }

    async fn terminate(&mut self) -> Result<(), ProviderError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };

        debug!("Logging out of opensubtitles");
        let result = self
            .client
            .delete(format!("{}/logout", self.base_url))
            .header("Api-Key", &self.api_key)
            .bearer_auth(&token)
            .send()
            .await;

        if let Err(e) = result {
            // logout is best effort
            warn!("Logout failed: {}", e);
        }

        Ok(())
    }

    fn check(&self, _video: &Video) -> bool {
        true
    }

    fn check_languages(&self, languages: &HashSet<LanguageTag>) -> HashSet<LanguageTag> {
        // the service is queried with two-letter codes
        languages
            .iter()
            .filter(|l| l.alpha2().is_some())
            .cloned()
            .collect()
    }

    async fn list_subtitles(
        &self,
        video: &Video,
        languages: &HashSet<LanguageTag>,
    ) -> Result<Vec<Subtitle>, ProviderError> {
        let mut language_codes: Vec<String> = languages
            .iter()
            .filter_map(|l| l.alpha2().map(str::to_string))
            .collect();
        language_codes.sort();

        let mut params: Vec<(&str, String)> = vec![("languages", language_codes.join(","))];
        match &video.kind {
            VideoKind::Episode(episode) => {
                params.push(("query", episode.series.clone()));
                params.push(("season_number", episode.season.to_string()));
                if let Some(number) = episode.episodes.first() {
                    params.push(("episode_number", number.to_string()));
                }
            }
            VideoKind::Movie(movie) => {
                params.push(("query", movie.title.clone()));
                if let Some(year) = movie.year {
                    params.push(("year", year.to_string()));
                }
            }
        }
        if let Some(hash) = video.hashes.get(HASH_ALGORITHM) {
            params.push(("moviehash", hash.clone()));
        }

        debug!("Searching opensubtitles with {:?}", params);
        let response = self
            .client
            .get(format!("{}/subtitles", self.base_url))
            .header("Api-Key", &self.api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), "search"));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let subtitles: Vec<Subtitle> = search
            .data
            .into_iter()
            .filter_map(|result| self.subtitle_from_result(video, result.attributes))
            .collect();
        info!("Found {} subtitle(s) on opensubtitles", subtitles.len());

        Ok(subtitles)
    }

    async fn download_subtitle(&self, subtitle: &mut Subtitle) -> Result<(), ProviderError> {
        let file_id: u64 = subtitle
            .id()
            .parse()
            .map_err(|_| ProviderError::RequestFailed(format!("bad file id {:?}", subtitle.id())))?;

        // ask for a download link first
        let mut request = self
            .client
            .post(format!("{}/download", self.base_url))
            .header("Api-Key", &self.api_key)
            .json(&DownloadRequest { file_id });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), "download"));
        }

        let download: DownloadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        if let Some(remaining) = download.remaining {
            debug!("{} download(s) remaining today", remaining);
        }

        // then fetch the content itself
        let response = self
            .client
            .get(&download.link)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), "content"));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        subtitle.set_content(bytes.to_vec());

        Ok(())
    }
}

/// Decorate a numeric IMDb id with the leading `tt` and zeroes
fn format_imdb_id(id: u64) -> String {
    format!("tt{:07}", id)
}

/*!
 * Subtitle source implementations behind a uniform capability contract.
 *
 * Every provider implements [`SubtitleProvider`] and is consumed
 * polymorphically by the provider pool. Transport details, retries and
 * timeouts belong to each provider; the pool only sees the contract.
 */

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ProviderError};
use crate::language_utils::LanguageTag;
use crate::subtitle::Subtitle;
use crate::video::Video;

/// Common trait for all subtitle providers
///
/// Lifecycle: `initialize` and `terminate` are called exactly once each, in
/// that order, per pool-managed instance. Construction must stay cheap, any
/// network work (login, session setup) belongs in `initialize`.
#[async_trait]
pub trait SubtitleProvider: Send + Sync + Debug {
    /// Name identifying this provider, also stamped on its subtitles
    fn name(&self) -> &str;

    /// Prepare the provider for use, e.g. log in or open a session
    async fn initialize(&mut self) -> Result<(), ProviderError>;

    /// Release provider resources, e.g. log out
    async fn terminate(&mut self) -> Result<(), ProviderError>;

    /// Whether this provider can plausibly serve this video type
    fn check(&self, video: &Video) -> bool;

    /// Intersect the requested languages with what this provider supports
    ///
    /// An empty result means the provider is skipped for this search.
    fn check_languages(&self, languages: &HashSet<LanguageTag>) -> HashSet<LanguageTag>;

    /// List available subtitles for the video in the given languages
    async fn list_subtitles(
        &self,
        video: &Video,
        languages: &HashSet<LanguageTag>,
    ) -> Result<Vec<Subtitle>, ProviderError>;

    /// Fetch the subtitle content, mutating the record in place
    async fn download_subtitle(&self, subtitle: &mut Subtitle) -> Result<(), ProviderError>;
}

/// Per-provider configuration bag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Service URL override
    pub endpoint: String,

    /// API key
    pub api_key: String,

    /// Account user name
    pub username: String,

    /// Account password
    pub password: String,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Factory building a provider instance from its configuration
pub type ProviderFactory =
    Box<dyn Fn(&ProviderConfig) -> Result<Box<dyn SubtitleProvider>, ProviderError> + Send + Sync>;

/// Explicit registry of provider factories
///
/// Constructed by the application and handed to the pool: there is no
/// process-wide provider state.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        ProviderRegistry { factories: HashMap::new() }
    }

    /// A registry with every built-in provider registered
    pub fn with_defaults() -> Self {
        let mut registry = ProviderRegistry::new();
        registry.register("opensubtitles", |config| {
            Ok(Box::new(opensubtitles::OpenSubtitlesProvider::from_config(config)?))
        });
        registry
    }

    /// Register a provider factory under a name
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&ProviderConfig) -> Result<Box<dyn SubtitleProvider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Whether a provider name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Names of every registered provider
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a provider instance from its registered factory
    pub fn build(&self, name: &str, config: &ProviderConfig) -> Result<Box<dyn SubtitleProvider>, Error> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))?;

        factory(config).map_err(|e| Error::Configuration(e.to_string()))
    }
}

impl Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

pub mod mock;
pub mod opensubtitles;

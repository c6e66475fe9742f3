/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scripted provider that simulates different behaviors:
 * - `MockProvider::working(..)` - lists its scripted subtitles and downloads succeed
 * - `MockProvider::listing_fails(..)` - every listing call errors
 * - `MockProvider::download_fails(..)` - downloads error
 * - `MockProvider::bad_archive(..)` - downloads error with a broken archive
 */

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::language_utils::LanguageTag;
use crate::providers::SubtitleProvider;
use crate::subtitle::Subtitle;
use crate::video::Video;

/// A valid SRT payload downloads deliver by default
pub const MOCK_SRT_CONTENT: &str =
    "1\n00:00:01,000 --> 00:00:04,000\nThis is a test subtitle.\n\n2\n00:00:05,000 --> 00:00:09,000\nIt contains multiple entries.\n";

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Lists scripted subtitles, downloads succeed with valid content
    Working,
    /// Every listing call fails with a service error
    ListingFails,
    /// Listing works, every download fails with a service error
    DownloadFails,
    /// Listing works, every download fails with a broken archive
    BadArchive,
    /// Listing works, downloads deliver unparsable content
    InvalidContent,
    /// The provider rejects every video
    RejectsVideos,
    /// The provider supports no language
    RejectsLanguages,
}

/// Observable side of a [`MockProvider`], shared across clones
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    initialized: Arc<AtomicBool>,
    terminated: Arc<AtomicBool>,
    list_calls: Arc<AtomicUsize>,
    download_calls: Arc<AtomicUsize>,
}

impl MockProbe {
    /// Whether `initialize` ran
    pub fn initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Whether `terminate` ran
    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Number of `list_subtitles` calls
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `download_subtitle` calls
    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

/// Scripted provider for testing pool behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Provider name, stamped on listed subtitles
    name: String,
    /// Behavior mode
    behavior: MockBehavior,
    /// Subtitles returned by a successful listing
    subtitles: Vec<Subtitle>,
    /// Shared observation counters
    probe: MockProbe,
}

impl MockProvider {
    /// Create a mock with the given name and behavior
    pub fn new(name: &str, behavior: MockBehavior) -> Self {
        MockProvider {
            name: name.to_string(),
            behavior,
            subtitles: Vec::new(),
            probe: MockProbe::default(),
        }
    }

    /// Create a working mock provider
    pub fn working(name: &str) -> Self {
        Self::new(name, MockBehavior::Working)
    }

    /// Create a mock whose listings always fail
    pub fn listing_fails(name: &str) -> Self {
        Self::new(name, MockBehavior::ListingFails)
    }

    /// Create a mock whose downloads always fail
    pub fn download_fails(name: &str) -> Self {
        Self::new(name, MockBehavior::DownloadFails)
    }

    /// Create a mock whose downloads deliver a broken archive
    pub fn bad_archive(name: &str) -> Self {
        Self::new(name, MockBehavior::BadArchive)
    }

    /// Set the subtitles a successful listing returns
    pub fn with_subtitles(mut self, subtitles: Vec<Subtitle>) -> Self {
        self.subtitles = subtitles;
        self
    }

    /// Get the observation handle, valid across clones
    pub fn probe(&self) -> MockProbe {
        self.probe.clone()
    }

    /// Build a subtitle listed under this provider's name
    pub fn subtitle(&self, id: &str, language: &LanguageTag) -> Subtitle {
        Subtitle::builder(&self.name, id, language.clone()).build()
    }
}

#[async_trait]
impl SubtitleProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(&mut self) -> Result<(), ProviderError> {
        self.probe.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn terminate(&mut self) -> Result<(), ProviderError> {
        self.probe.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn check(&self, _video: &Video) -> bool {
        self.behavior != MockBehavior::RejectsVideos
    }

    fn check_languages(&self, languages: &HashSet<LanguageTag>) -> HashSet<LanguageTag> {
        if self.behavior == MockBehavior::RejectsLanguages {
            return HashSet::new();
        }
        languages.clone()
    }

    async fn list_subtitles(
        &self,
        _video: &Video,
        languages: &HashSet<LanguageTag>,
    ) -> Result<Vec<Subtitle>, ProviderError> {
        self.probe.list_calls.fetch_add(1, Ordering::SeqCst);

        if self.behavior == MockBehavior::ListingFails {
            return Err(ProviderError::ServiceUnavailable(
                "simulated listing failure".to_string(),
            ));
        }

        Ok(self
            .subtitles
            .iter()
            .filter(|s| languages.contains(&s.language))
            .cloned()
            .collect())
    }

    async fn download_subtitle(&self, subtitle: &mut Subtitle) -> Result<(), ProviderError> {
        self.probe.download_calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::DownloadFails => Err(ProviderError::ServiceUnavailable(
                "simulated download failure".to_string(),
            )),
            MockBehavior::BadArchive => Err(ProviderError::BadArchive(
                "simulated broken archive".to_string(),
            )),
            MockBehavior::InvalidContent => {
                subtitle.set_content(b"certainly not a subtitle".to_vec());
                Ok(())
            }
            _ => {
                subtitle.set_content(MOCK_SRT_CONTENT.as_bytes().to_vec());
                Ok(())
            }
        }
    }
}

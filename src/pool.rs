/*!
 * Provider pools: a single point of access to a configured set of subtitle
 * sources, with lazy initialization and fault isolation.
 *
 * Providers are constructed on first use and initialized only once their
 * capability checks accept the search. A provider that fails is discarded for
 * the remainder of the pool's lifetime; discarding one provider never affects
 * the others. The parallel pool fans the listing out over a bounded set of
 * workers and merges results exactly like the sequential pool.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::errors::{Error, ProviderError};
use crate::language_utils::LanguageTag;
use crate::matching::fps_matches;
use crate::providers::{ProviderConfig, ProviderRegistry, SubtitleProvider};
use crate::scoring::compute_score;
use crate::subtitle::{LanguageType, Subtitle};
use crate::video::Video;

/// Result of listing subtitles with a single provider
///
/// `Skipped` and an empty `Listed` both keep the provider alive; only
/// `Failed` leads to the provider being discarded.
#[derive(Debug)]
pub enum ProviderListing {
    /// The provider produced subtitles, possibly none
    Listed(Vec<Subtitle>),
    /// The provider rejected the video or the languages, not a failure
    Skipped,
    /// The provider raised an error and should be discarded
    Failed(ProviderError),
}

/// A provider instance together with its initialization state
#[derive(Debug)]
pub struct ProviderSlot {
    /// The provider instance
    pub provider: Box<dyn SubtitleProvider>,
    /// Whether `initialize` has run
    pub initialized: bool,
}

/// Signature of a score function usable in place of the default scoring engine
pub type ScoreFn = dyn Fn(&Subtitle, &Video) -> u32 + Send + Sync;

/// Options for [`ProviderPool::download_best_subtitles`]
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Minimum score for a subtitle to be downloaded
    pub min_score: u32,

    /// Hearing impaired preference (yes/no/indifferent)
    pub hearing_impaired: Option<bool>,

    /// Foreign only preference (yes/no/indifferent)
    pub foreign_only: Option<bool>,

    /// Skip subtitles whose frame rate does not match the video
    pub skip_wrong_fps: bool,

    /// Download only one subtitle, not one per language
    pub only_one: bool,

    /// Subtitle identities (provider name, id) to exclude up front
    pub ignore: Vec<(String, String)>,
}

/// A pool of providers with the same API as a single provider
///
/// Lazily constructs and initializes providers when needed and automatically
/// discards providers on failure. All work happens on the caller's task.
pub struct ProviderPool {
    /// Registry the provider instances are built from
    registry: Arc<ProviderRegistry>,

    /// Names of the providers to use, in search order
    providers: Vec<String>,

    /// Provider configuration per provider name
    provider_configs: HashMap<String, ProviderConfig>,

    /// Constructed providers with their initialization state
    slots: HashMap<String, Arc<Mutex<ProviderSlot>>>,

    /// Construction order, used for deterministic teardown
    slot_order: Vec<String>,

    /// Discarded providers, never retried within this pool instance
    discarded: HashSet<String>,
}

impl ProviderPool {
    /// Create a pool over the given registry
    ///
    /// An empty `providers` list means every registered provider, in name
    /// order.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        providers: Vec<String>,
        provider_configs: HashMap<String, ProviderConfig>,
    ) -> Self {
        let providers = if providers.is_empty() { registry.names() } else { providers };

        ProviderPool {
            registry,
            providers,
            provider_configs,
            slots: HashMap::new(),
            slot_order: Vec::new(),
            discarded: HashSet::new(),
        }
    }

    /// Names of the providers this pool searches, in order
    pub fn provider_names(&self) -> &[String] {
        &self.providers
    }

    /// Providers discarded for the remainder of this pool's lifetime
    pub fn discarded_providers(&self) -> &HashSet<String> {
        &self.discarded
    }

    /// Get or construct the slot for a configured provider
    fn slot(&mut self, name: &str) -> Result<Arc<Mutex<ProviderSlot>>, Error> {
        if !self.providers.iter().any(|n| n == name) {
            return Err(Error::UnknownProvider(name.to_string()));
        }

        if let Some(slot) = self.slots.get(name) {
            return Ok(Arc::clone(slot));
        }

        let config = self.provider_configs.get(name).cloned().unwrap_or_default();
        let provider = self.registry.build(name, &config)?;
        let slot = Arc::new(Mutex::new(ProviderSlot { provider, initialized: false }));
        self.slots.insert(name.to_string(), Arc::clone(&slot));
        self.slot_order.push(name.to_string());

        Ok(slot)
    }

    /// Get the initialized provider slot, constructing and initializing on first use
    pub async fn acquire(&mut self, name: &str) -> Result<Arc<Mutex<ProviderSlot>>, Error> {
        let slot = self.slot(name)?;

        {
            let mut guard = slot.lock().await;
            if !guard.initialized {
                info!("Initializing provider {}", name);
                guard
                    .provider
                    .initialize()
                    .await
                    .map_err(|e| Error::Configuration(format!("provider {name}: {e}")))?;
                guard.initialized = true;
            }
        }

        Ok(slot)
    }

    /// Terminate and remove an initialized provider
    ///
    /// Termination errors are logged, not propagated.
    pub async fn release(&mut self, name: &str) -> Result<(), Error> {
        let slot = self
            .slots
            .remove(name)
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))?;
        self.slot_order.retain(|n| n != name);

        let mut guard = slot.lock().await;
        if guard.initialized {
            info!("Terminating provider {}", name);
            if let Err(e) = guard.provider.terminate().await {
                warn!("Provider {} improperly terminated: {}", name, e);
            }
            guard.initialized = false;
        }

        Ok(())
    }

    /// List subtitles with a single provider
    ///
    /// The video and languages are checked against the provider before any
    /// initialization happens. Fails only when `name` is not configured.
    pub async fn list_subtitles_for_provider(
        &mut self,
        name: &str,
        video: &Video,
        languages: &HashSet<LanguageTag>,
    ) -> Result<ProviderListing, Error> {
        let slot = match self.slot(name) {
            Ok(slot) => slot,
            Err(Error::UnknownProvider(name)) => return Err(Error::UnknownProvider(name)),
            // a provider that cannot even be constructed has failed
            Err(e) => return Ok(ProviderListing::Failed(ProviderError::Configuration(e.to_string()))),
        };

        Ok(list_with_slot(&slot, name, video, languages).await)
    }

    /// List subtitles with every configured provider, in order
    ///
    /// Failed providers are discarded and the search continues; results keep
    /// provider order and are not de-duplicated across providers.
    pub async fn list_subtitles(
        &mut self,
        video: &Video,
        languages: &HashSet<LanguageTag>,
    ) -> Vec<Subtitle> {
        let mut subtitles = Vec::new();

        for name in self.providers.clone() {
            // check discarded providers
            if self.discarded.contains(&name) {
                debug!("Skipping discarded provider {:?}", name);
                continue;
            }

            match self.list_subtitles_for_provider(&name, video, languages).await {
                Ok(ProviderListing::Listed(provider_subtitles)) => {
                    subtitles.extend(provider_subtitles);
                }
                Ok(ProviderListing::Skipped) => {}
                Ok(ProviderListing::Failed(e)) => {
                    error!("Provider {}: {}", name, e);
                    info!("Discarding provider {}", name);
                    self.discarded.insert(name);
                }
                Err(e) => {
                    // names come from the configured list, this cannot happen
                    error!("Provider {}: {}", name, e);
                }
            }
        }

        subtitles
    }

    /// Download the content of a subtitle
    ///
    /// Returns `true` only when the download succeeded and the content checks
    /// out as a valid subtitle. Broken-archive errors are swallowed, any other
    /// provider error discards the provider.
    pub async fn download_subtitle(&mut self, subtitle: &mut Subtitle) -> bool {
        let name = subtitle.provider_name().to_string();

        // check discarded providers
        if self.discarded.contains(&name) {
            warn!("Provider {:?} is discarded", name);
            return false;
        }

        info!("Downloading subtitle {}", subtitle.info());
        match self.acquire(&name).await {
            Ok(slot) => {
                let guard = slot.lock().await;
                match guard.provider.download_subtitle(subtitle).await {
                    Ok(()) => {}
                    Err(ProviderError::BadArchive(e)) => {
                        error!("Bad archive for subtitle {}: {}", subtitle.info(), e);
                    }
                    Err(e) => {
                        error!("Discarding provider {}: {}", name, e);
                        self.discarded.insert(name);
                    }
                }
            }
            Err(e) => {
                error!("Discarding provider {}: {}", name, e);
                self.discarded.insert(name);
            }
        }

        // check subtitle validity
        if !subtitle.is_valid() {
            error!("Invalid subtitle");
            return false;
        }

        true
    }

    /// Download the best matching subtitles from `subtitles`
    ///
    /// Candidates are scored, sorted and walked best-first; one subtitle per
    /// requested language is accepted (a single one with `only_one`). A failed
    /// download falls back to the next candidate in score order.
    pub async fn download_best_subtitles(
        &mut self,
        subtitles: Vec<Subtitle>,
        video: &Video,
        languages: &HashSet<LanguageTag>,
        options: &DownloadOptions,
        score_fn: Option<&ScoreFn>,
    ) -> Vec<Subtitle> {
        // ignore subtitles
        let mut subtitles: Vec<Subtitle> = subtitles
            .into_iter()
            .filter(|s| {
                !options
                    .ignore
                    .iter()
                    .any(|(provider, id)| provider == s.provider_name() && id == s.id())
            })
            .collect();

        // skip subtitles that do not match the FPS of the video, if defined
        if options.skip_wrong_fps && video.frame_rate.is_some_and(|f| f > 0.0) {
            subtitles.retain(|s| fps_matches(video, s.fps, false));
        }

        // sort by hearing impaired and foreign only preference
        let preferred_type =
            LanguageType::from_flags(options.hearing_impaired, options.foreign_only);
        if preferred_type != LanguageType::Unknown {
            info!("Sorting subtitles of the {:?} type first", preferred_type);
            subtitles.sort_by_key(|s| s.language_type != preferred_type);
        }

        // sort subtitles by score
        let mut scored_subtitles: Vec<(Subtitle, u32)> = subtitles
            .into_iter()
            .map(|s| {
                let score = match score_fn {
                    Some(f) => f(&s, video),
                    None => compute_score(&s, video),
                };
                (s, score)
            })
            .collect();
        scored_subtitles.sort_by(|a, b| b.1.cmp(&a.1));

        // download best subtitles, falling back on the next on error
        let mut downloaded_subtitles: Vec<Subtitle> = Vec::new();
        for (mut subtitle, score) in scored_subtitles {
            // check score: the list is sorted, nothing below can qualify
            if score < options.min_score {
                info!("Score {} is below min_score ({})", score, options.min_score);
                break;
            }

            // check downloaded languages
            if downloaded_subtitles.iter().any(|s| s.language == subtitle.language) {
                debug!("Skipping subtitle: {} already downloaded", subtitle.language);
                continue;
            }

            // download
            if self.download_subtitle(&mut subtitle).await {
                downloaded_subtitles.push(subtitle);
            }

            // stop when all languages are downloaded
            let accepted: HashSet<LanguageTag> =
                downloaded_subtitles.iter().map(|s| s.language.clone()).collect();
            if accepted == *languages {
                debug!("All languages downloaded");
                break;
            }

            // stop if only one subtitle is requested
            if options.only_one && !downloaded_subtitles.is_empty() {
                debug!("Only one subtitle downloaded");
                break;
            }
        }

        downloaded_subtitles
    }

    /// Terminate all initialized providers, best effort, in construction order
    pub async fn terminate(&mut self) {
        debug!("Terminating initialized providers");
        for name in std::mem::take(&mut self.slot_order) {
            let Some(slot) = self.slots.remove(&name) else { continue };
            let mut guard = slot.lock().await;
            if guard.initialized {
                info!("Terminating provider {}", name);
                if let Err(e) = guard.provider.terminate().await {
                    warn!("Provider {} improperly terminated: {}", name, e);
                }
                guard.initialized = false;
            }
        }
        self.slots.clear();
    }
}

/// Per-provider listing: capability checks, lazy initialization, then the call
///
/// Checks run before initialization so rejected searches never cost a login.
async fn list_with_slot(
    slot: &Arc<Mutex<ProviderSlot>>,
    name: &str,
    video: &Video,
    languages: &HashSet<LanguageTag>,
) -> ProviderListing {
    let mut guard = slot.lock().await;

    // check video validity
    if !guard.provider.check(video) {
        info!("Skipping provider {:?}: not a valid video", name);
        return ProviderListing::Skipped;
    }

    // check supported languages
    let provider_languages = guard.provider.check_languages(languages);
    if provider_languages.is_empty() {
        info!("Skipping provider {:?}: no language to search for", name);
        return ProviderListing::Skipped;
    }

    if !guard.initialized {
        info!("Initializing provider {}", name);
        if let Err(e) = guard.provider.initialize().await {
            return ProviderListing::Failed(e);
        }
        guard.initialized = true;
    }

    // list subtitles
    info!("Listing subtitles with provider {:?} and languages {:?}", name, provider_languages);
    match guard.provider.list_subtitles(video, &provider_languages).await {
        Ok(subtitles) => ProviderListing::Listed(subtitles),
        Err(e) => ProviderListing::Failed(e),
    }
}

/// A [`ProviderPool`] that parallelizes the per-provider listing calls
///
/// Identical external contract; listing fans out over a bounded worker set and
/// results are merged in completion order with the same discard semantics.
pub struct ParallelProviderPool {
    /// Inner sequential pool, used for everything but the listing fan-out
    pool: ProviderPool,

    /// Maximum number of concurrent listing workers
    max_workers: usize,
}

impl ParallelProviderPool {
    /// Create a parallel pool
    ///
    /// `max_workers` defaults to the number of configured providers.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        providers: Vec<String>,
        provider_configs: HashMap<String, ProviderConfig>,
        max_workers: Option<usize>,
    ) -> Self {
        let pool = ProviderPool::new(registry, providers, provider_configs);
        let max_workers = max_workers.unwrap_or(pool.providers.len());

        ParallelProviderPool { pool, max_workers }
    }

    /// Providers discarded for the remainder of this pool's lifetime
    pub fn discarded_providers(&self) -> &HashSet<String> {
        self.pool.discarded_providers()
    }

    /// List subtitles with every configured provider concurrently
    pub async fn list_subtitles(
        &mut self,
        video: &Video,
        languages: &HashSet<LanguageTag>,
    ) -> Vec<Subtitle> {
        let mut subtitles = Vec::new();

        // no workers, no work
        if self.max_workers == 0 {
            return subtitles;
        }

        // construct slots up front, on the caller's task
        let mut tasks: Vec<(String, Result<Arc<Mutex<ProviderSlot>>, Error>)> = Vec::new();
        for name in self.pool.providers.clone() {
            if self.pool.discarded.contains(&name) {
                debug!("Skipping discarded provider {:?}", name);
                continue;
            }
            let slot = self.pool.slot(&name);
            tasks.push((name, slot));
        }

        // fan out, workers share no mutable state
        let listings: Vec<(String, ProviderListing)> = stream::iter(tasks)
            .map(|(name, slot)| async move {
                let listing = match slot {
                    Ok(slot) => list_with_slot(&slot, &name, video, languages).await,
                    Err(e) => ProviderListing::Failed(ProviderError::Configuration(e.to_string())),
                };
                (name, listing)
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        // merge in completion order, discards applied post-hoc
        for (name, listing) in listings {
            match listing {
                ProviderListing::Listed(provider_subtitles) => subtitles.extend(provider_subtitles),
                ProviderListing::Skipped => {}
                ProviderListing::Failed(e) => {
                    error!("Provider {}: {}", name, e);
                    info!("Discarding provider {}", name);
                    self.pool.discarded.insert(name);
                }
            }
        }

        subtitles
    }

    /// Download the content of a subtitle, see [`ProviderPool::download_subtitle`]
    pub async fn download_subtitle(&mut self, subtitle: &mut Subtitle) -> bool {
        self.pool.download_subtitle(subtitle).await
    }

    /// Download the best matching subtitles, see [`ProviderPool::download_best_subtitles`]
    pub async fn download_best_subtitles(
        &mut self,
        subtitles: Vec<Subtitle>,
        video: &Video,
        languages: &HashSet<LanguageTag>,
        options: &DownloadOptions,
        score_fn: Option<&ScoreFn>,
    ) -> Vec<Subtitle> {
        self.pool
            .download_best_subtitles(subtitles, video, languages, options, score_fn)
            .await
    }

    /// Terminate all initialized providers
    pub async fn terminate(&mut self) {
        self.pool.terminate().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{MockBehavior, MockProvider};
    use crate::video::Movie;

    fn english() -> LanguageTag {
        LanguageTag::from_code("en").unwrap()
    }

    fn video() -> Video {
        Video::movie(
            "Movie.2020.mkv",
            Movie { title: "Movie".to_string(), year: Some(2020), ..Movie::default() },
        )
    }

    fn registry_with(mocks: Vec<MockProvider>) -> Arc<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        for mock in mocks {
            let name = mock.name().to_string();
            registry.register(&name, move |_| Ok(Box::new(mock.clone())));
        }
        Arc::new(registry)
    }

    fn pool_with(mocks: Vec<MockProvider>, order: Vec<&str>) -> ProviderPool {
        let registry = registry_with(mocks);
        ProviderPool::new(
            registry,
            order.into_iter().map(str::to_string).collect(),
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn test_acquire_unknown_provider_fails() {
        let mut pool = pool_with(vec![MockProvider::working("one")], vec!["one"]);
        let err = pool.acquire("nope").await.unwrap_err();
        assert!(matches!(err, Error::UnknownProvider(_)));
    }

    #[tokio::test]
    async fn test_list_subtitles_aggregates_in_provider_order() {
        let one = MockProvider::working("one");
        let one_sub = one.subtitle("a", &english());
        let one = one.with_subtitles(vec![one_sub]);
        let two = MockProvider::working("two");
        let two_sub = two.subtitle("b", &english());
        let two = two.with_subtitles(vec![two_sub]);

        let mut pool = pool_with(vec![one, two], vec!["one", "two"]);
        let listed = pool.list_subtitles(&video(), &HashSet::from([english()])).await;

        let providers: Vec<&str> = listed.iter().map(|s| s.provider_name()).collect();
        assert_eq!(providers, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_failed_provider_is_discarded_and_sticky() {
        let failing = MockProvider::listing_fails("bad");
        let probe = failing.probe();
        let good = MockProvider::working("good");
        let good_sub = good.subtitle("a", &english());
        let good = good.with_subtitles(vec![good_sub]);

        let mut pool = pool_with(vec![failing, good], vec!["bad", "good"]);
        let languages = HashSet::from([english()]);

        let listed = pool.list_subtitles(&video(), &languages).await;
        assert_eq!(listed.len(), 1);
        assert!(pool.discarded_providers().contains("bad"));

        // the discarded provider is never called again
        let listed = pool.list_subtitles(&video(), &languages).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(probe.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_capability_rejection_is_not_a_failure() {
        let rejecting = MockProvider::new("picky", MockBehavior::RejectsVideos);
        let probe = rejecting.probe();

        let mut pool = pool_with(vec![rejecting], vec!["picky"]);
        let listed = pool.list_subtitles(&video(), &HashSet::from([english()])).await;

        assert!(listed.is_empty());
        assert!(pool.discarded_providers().is_empty());
        // rejected searches never cost an initialization
        assert!(!probe.initialized());
    }

    #[tokio::test]
    async fn test_download_refused_for_discarded_provider() {
        let failing = MockProvider::listing_fails("bad");
        let mut subtitle = failing.subtitle("a", &english());

        let mut pool = pool_with(vec![failing], vec!["bad"]);
        pool.list_subtitles(&video(), &HashSet::from([english()])).await;
        assert!(pool.discarded_providers().contains("bad"));

        assert!(!pool.download_subtitle(&mut subtitle).await);
    }

    #[tokio::test]
    async fn test_download_bad_archive_is_swallowed_without_discard() {
        let provider = MockProvider::bad_archive("archivey");
        let mut subtitle = provider.subtitle("a", &english());

        let mut pool = pool_with(vec![provider], vec!["archivey"]);
        // download fails (no content) but the provider survives
        assert!(!pool.download_subtitle(&mut subtitle).await);
        assert!(pool.discarded_providers().is_empty());
    }

    #[tokio::test]
    async fn test_download_other_error_discards_provider() {
        let provider = MockProvider::download_fails("flaky");
        let mut subtitle = provider.subtitle("a", &english());

        let mut pool = pool_with(vec![provider], vec!["flaky"]);
        assert!(!pool.download_subtitle(&mut subtitle).await);
        assert!(pool.discarded_providers().contains("flaky"));
    }

    #[tokio::test]
    async fn test_download_invalid_content_reports_failure() {
        let provider = MockProvider::new("junky", MockBehavior::InvalidContent);
        let mut subtitle = provider.subtitle("a", &english());

        let mut pool = pool_with(vec![provider], vec!["junky"]);
        assert!(!pool.download_subtitle(&mut subtitle).await);
        // the provider did nothing wrong, only the content is bad
        assert!(pool.discarded_providers().is_empty());
    }

    #[tokio::test]
    async fn test_terminate_releases_initialized_providers() {
        let provider = MockProvider::working("one");
        let provider_sub = provider.subtitle("a", &english());
        let provider = provider.with_subtitles(vec![provider_sub]);
        let probe = provider.probe();

        let mut pool = pool_with(vec![provider], vec!["one"]);
        pool.list_subtitles(&video(), &HashSet::from([english()])).await;
        assert!(probe.initialized());

        pool.terminate().await;
        assert!(probe.terminated());
    }

    #[tokio::test]
    async fn test_download_best_subtitles_one_per_language() {
        let provider = MockProvider::working("one");
        let english_a = provider.subtitle("a", &english());
        let english_b = provider.subtitle("b", &english());
        let provider = provider.with_subtitles(vec![english_a.clone(), english_b.clone()]);

        let mut pool = pool_with(vec![provider], vec!["one"]);
        let languages = HashSet::from([english()]);
        let candidates = vec![english_a, english_b];

        // equal scores: only one subtitle per language is accepted
        let accepted = pool
            .download_best_subtitles(candidates, &video(), &languages, &DownloadOptions::default(), Some(&|_, _| 10))
            .await;
        assert_eq!(accepted.len(), 1);
    }

    #[tokio::test]
    async fn test_download_best_subtitles_honors_min_score() {
        let provider = MockProvider::working("one");
        let subtitle = provider.subtitle("a", &english());
        let probe = provider.probe();

        let mut pool = pool_with(vec![provider], vec!["one"]);
        let accepted = pool
            .download_best_subtitles(
                vec![subtitle],
                &video(),
                &HashSet::from([english()]),
                &DownloadOptions { min_score: 50, ..DownloadOptions::default() },
                Some(&|_, _| 49),
            )
            .await;

        assert!(accepted.is_empty());
        // the walk stopped before any download was attempted
        assert_eq!(probe.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_download_best_subtitles_ignore_list() {
        let provider = MockProvider::working("one");
        let subtitle = provider.subtitle("a", &english());

        let mut pool = pool_with(vec![provider], vec!["one"]);
        let options = DownloadOptions {
            ignore: vec![("one".to_string(), "a".to_string())],
            ..DownloadOptions::default()
        };
        let accepted = pool
            .download_best_subtitles(
                vec![subtitle],
                &video(),
                &HashSet::from([english()]),
                &options,
                Some(&|_, _| 100),
            )
            .await;
        assert!(accepted.is_empty());
    }

    #[tokio::test]
    async fn test_download_best_subtitles_prefers_language_type() {
        let provider = MockProvider::working("one");
        let normal = provider.subtitle("normal", &english());
        let hi = Subtitle::builder("one", "hi", english()).flags(Some(true), None).build();

        let mut pool = pool_with(vec![provider], vec!["one"]);
        let options = DownloadOptions { hearing_impaired: Some(true), ..DownloadOptions::default() };

        // same score: the preferred hearing impaired subtitle comes first
        let accepted = pool
            .download_best_subtitles(
                vec![normal, hi],
                &video(),
                &HashSet::from([english()]),
                &options,
                Some(&|_, _| 10),
            )
            .await;
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id(), "hi");
    }

    #[tokio::test]
    async fn test_download_best_falls_back_on_failed_download() {
        let failing = MockProvider::download_fails("flaky");
        let good = MockProvider::working("good");
        let best = failing.subtitle("best", &english());
        let second = good.subtitle("second", &english());

        let mut pool = pool_with(vec![failing, good], vec!["flaky", "good"]);
        let accepted = pool
            .download_best_subtitles(
                vec![best.clone(), second.clone()],
                &video(),
                &HashSet::from([english()]),
                &DownloadOptions::default(),
                Some(&|s, _| if s.id() == "best" { 100 } else { 50 }),
            )
            .await;

        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id(), "second");
    }

    #[tokio::test]
    async fn test_parallel_pool_zero_workers_returns_empty() {
        let provider = MockProvider::working("one");
        let provider_sub = provider.subtitle("a", &english());
        let provider = provider.with_subtitles(vec![provider_sub]);
        let probe = provider.probe();

        let registry = registry_with(vec![provider]);
        let mut pool =
            ParallelProviderPool::new(registry, vec!["one".to_string()], HashMap::new(), Some(0));

        let listed = pool.list_subtitles(&video(), &HashSet::from([english()])).await;
        assert!(listed.is_empty());
        assert_eq!(probe.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_parallel_pool_matches_sequential_results() {
        let make_mocks = || {
            let one = MockProvider::working("one");
            let one_sub = one.subtitle("a", &english());
            let one = one.with_subtitles(vec![one_sub]);
            let bad = MockProvider::listing_fails("bad");
            let two = MockProvider::working("two");
            let two_sub_b = two.subtitle("b", &english());
            let two_sub_c = two.subtitle("c", &english());
            let two = two.with_subtitles(vec![two_sub_b, two_sub_c]);
            vec![one, bad, two]
        };
        let names = vec!["one".to_string(), "bad".to_string(), "two".to_string()];
        let languages = HashSet::from([english()]);

        let mut sequential = ProviderPool::new(registry_with(make_mocks()), names.clone(), HashMap::new());
        let mut parallel =
            ParallelProviderPool::new(registry_with(make_mocks()), names, HashMap::new(), None);

        let from_sequential: HashSet<Subtitle> =
            sequential.list_subtitles(&video(), &languages).await.into_iter().collect();
        let from_parallel: HashSet<Subtitle> =
            parallel.list_subtitles(&video(), &languages).await.into_iter().collect();

        assert_eq!(from_sequential, from_parallel);
        assert_eq!(sequential.discarded_providers(), parallel.discarded_providers());
    }
}

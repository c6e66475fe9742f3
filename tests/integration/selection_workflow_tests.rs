/*!
 * End-to-end selection tests: scoring, ordering and early exit
 */

use std::collections::HashSet;

use subscout::matching::{Guess, VideoHash};
use subscout::pool::DownloadOptions;
use subscout::providers::mock::MockProvider;
use subscout::subtitle::Subtitle;

use crate::common::{english, movie_x, pool_with};

/// A candidate whose declared hash agrees with the video (scores 269)
fn hash_candidate(provider: &MockProvider) -> Subtitle {
    let mut guess = Guess::movie("Completely Different Title");
    guess.video_hash = Some(VideoHash {
        algorithm: "opensubtitles".to_string(),
        value: "deadbeef".to_string(),
    });

    Subtitle::builder(provider_name(provider), "hash", english())
        .metadata(guess)
        .build()
}

/// A candidate agreeing on title, year and country (scores 135)
fn metadata_candidate(provider: &MockProvider) -> Subtitle {
    let mut guess = Guess::movie("X");
    guess.year = Some(2020);

    Subtitle::builder(provider_name(provider), "meta", english())
        .metadata(guess)
        .build()
}

/// A candidate agreeing on resolution only (scores 2)
fn resolution_candidate(provider: &MockProvider) -> Subtitle {
    let mut guess = Guess::movie("Unrelated");
    guess.year = Some(1999);
    guess.country = Some("FR".to_string());
    guess.resolution = Some("1080p".to_string());

    Subtitle::builder(provider_name(provider), "res", english())
        .metadata(guess)
        .build()
}

fn provider_name(provider: &MockProvider) -> &str {
    use subscout::providers::SubtitleProvider;
    provider.name()
}

#[tokio::test]
async fn test_movie_selection_accepts_only_the_hash_match() {
    let provider = MockProvider::working("mock");
    let probe = provider.probe();

    let candidates = vec![
        resolution_candidate(&provider),
        metadata_candidate(&provider),
        hash_candidate(&provider),
    ];

    let mut pool = pool_with(vec![provider], vec!["mock"]);
    let video = movie_x();
    let languages = HashSet::from([english()]);
    let options = DownloadOptions { min_score: 50, ..DownloadOptions::default() };

    let accepted = pool
        .download_best_subtitles(candidates, &video, &languages, &options, None)
        .await;

    // only the hash match is accepted, in a single download attempt
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].id(), "hash");
    assert_eq!(probe.download_calls(), 1);
}

#[tokio::test]
async fn test_selection_falls_back_below_the_failed_best() {
    let provider = MockProvider::download_fails("flaky");
    let backup = MockProvider::working("solid");

    let best = hash_candidate(&provider);
    let second = metadata_candidate(&backup);

    let mut pool = pool_with(vec![provider, backup], vec!["flaky", "solid"]);
    let video = movie_x();
    let languages = HashSet::from([english()]);
    let options = DownloadOptions { min_score: 50, ..DownloadOptions::default() };

    let accepted = pool
        .download_best_subtitles(vec![best, second], &video, &languages, &options, None)
        .await;

    // the failed hash download falls back to the next best candidate
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].id(), "meta");
    assert_eq!(accepted[0].provider_name(), "solid");
}

#[tokio::test]
async fn test_selection_stops_at_min_score_without_downloading() {
    let provider = MockProvider::working("mock");
    let probe = provider.probe();

    // both candidates score below the bar
    let candidates = vec![resolution_candidate(&provider)];

    let mut pool = pool_with(vec![provider], vec!["mock"]);
    let options = DownloadOptions { min_score: 50, ..DownloadOptions::default() };
    let accepted = pool
        .download_best_subtitles(candidates, &movie_x(), &HashSet::from([english()]), &options, None)
        .await;

    assert!(accepted.is_empty());
    assert_eq!(probe.download_calls(), 0);
}

#[tokio::test]
async fn test_selection_covers_each_requested_language_once() {
    let provider = MockProvider::working("mock");

    let english_best = metadata_candidate(&provider);
    let english_backup = resolution_candidate(&provider);
    let french_candidate = Subtitle::builder("mock", "fr-1", crate::common::french())
        .metadata(english_best.metadata.clone())
        .build();

    let mut pool = pool_with(vec![provider], vec!["mock"]);
    let languages = HashSet::from([english(), crate::common::french()]);

    let accepted = pool
        .download_best_subtitles(
            vec![english_best, english_backup, french_candidate],
            &movie_x(),
            &languages,
            &DownloadOptions::default(),
            None,
        )
        .await;

    // one subtitle per requested language, no duplicates
    assert_eq!(accepted.len(), 2);
    let langs: HashSet<_> = accepted.iter().map(|s| s.language.clone()).collect();
    assert_eq!(langs, languages);
}

#[tokio::test]
async fn test_only_one_stops_after_the_first_accept() {
    let provider = MockProvider::working("mock");
    let probe = provider.probe();

    let english_candidate = metadata_candidate(&provider);
    let french_candidate = Subtitle::builder("mock", "fr-1", crate::common::french())
        .metadata(english_candidate.metadata.clone())
        .build();

    let mut pool = pool_with(vec![provider], vec!["mock"]);
    let languages = HashSet::from([english(), crate::common::french()]);
    let options = DownloadOptions { only_one: true, ..DownloadOptions::default() };

    let accepted = pool
        .download_best_subtitles(
            vec![english_candidate, french_candidate],
            &movie_x(),
            &languages,
            &options,
            None,
        )
        .await;

    assert_eq!(accepted.len(), 1);
    assert_eq!(probe.download_calls(), 1);
}

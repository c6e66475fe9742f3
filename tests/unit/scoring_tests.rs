/*!
 * Tests for the scoring engine
 */

use std::collections::HashSet;

use subscout::matching::{Guess, GuessKind, MatchKind, VideoHash};
use subscout::scoring::{EPISODE_SCORES, MOVIE_SCORES, compute_score, expand_matches, max_score};
use subscout::subtitle::Subtitle;
use subscout::video::{Episode, Video};

use crate::common::{english, movie_x};

fn subtitle_with(guess: Guess) -> Subtitle {
    Subtitle::builder("mock", "1", english()).metadata(guess).build()
}

fn episode_video() -> Video {
    Video::episode(
        "Show.S03E04.720p.WEB.mkv",
        Episode {
            series: "Show".to_string(),
            season: 3,
            episodes: vec![4],
            original_series: true,
            ..Episode::default()
        },
    )
}

#[test]
fn test_weight_tables_are_clippable() {
    // for both tables the hash weight bounds any simultaneous combination
    for scores in [&*EPISODE_SCORES, &*MOVIE_SCORES] {
        let hash = scores[&MatchKind::Hash];
        let sum: u32 = scores.iter().filter(|(k, _)| **k != MatchKind::Hash).map(|(_, w)| w).sum();
        assert!(hash >= sum, "hash weight {hash} below total {sum}");
    }
}

#[test]
fn test_weight_tables_priority_ordering() {
    let episode = &*EPISODE_SCORES;
    assert!(episode[&MatchKind::Series] > episode[&MatchKind::Year]);
    assert_eq!(episode[&MatchKind::Year], episode[&MatchKind::Country]);
    assert!(episode[&MatchKind::Year] > episode[&MatchKind::Season]);
    assert_eq!(episode[&MatchKind::Season], episode[&MatchKind::Episode]);
    assert!(episode[&MatchKind::Season] > episode[&MatchKind::ReleaseGroup]);
    assert_eq!(episode[&MatchKind::ReleaseGroup], episode[&MatchKind::StreamingService]);
    assert!(episode[&MatchKind::ReleaseGroup] > episode[&MatchKind::Source]);
    assert!(episode[&MatchKind::Source] > episode[&MatchKind::AudioCodec]);
    assert_eq!(episode[&MatchKind::AudioCodec], episode[&MatchKind::Resolution]);
    assert_eq!(episode[&MatchKind::Resolution], episode[&MatchKind::VideoCodec]);
    assert!(episode[&MatchKind::VideoCodec] > episode[&MatchKind::HearingImpaired]);

    let movie = &*MOVIE_SCORES;
    assert!(movie[&MatchKind::Title] > movie[&MatchKind::Year]);
    assert_eq!(movie[&MatchKind::Year], movie[&MatchKind::Country]);
    assert!(movie[&MatchKind::Year] > movie[&MatchKind::ReleaseGroup]);
}

#[test]
fn test_hash_discards_other_matches() {
    let video = movie_x();

    // a full metadata agreement plus a hash
    let mut guess = Guess::movie("X");
    guess.year = Some(2020);
    guess.resolution = Some("1080p".to_string());
    guess.video_hash = Some(VideoHash {
        algorithm: "opensubtitles".to_string(),
        value: "deadbeef".to_string(),
    });

    // the score is exactly the hash weight, nothing stacks on top
    assert_eq!(compute_score(&subtitle_with(guess), &video), max_score(&video));
}

#[test]
fn test_mismatched_hash_is_not_a_match() {
    let video = movie_x();
    let mut guess = Guess::movie("X");
    guess.year = Some(2020);
    guess.video_hash = Some(VideoHash {
        algorithm: "opensubtitles".to_string(),
        value: "feedface".to_string(),
    });

    // falls back to the metadata score: title + year + country
    assert_eq!(compute_score(&subtitle_with(guess), &video), 135);
}

#[test]
fn test_episode_series_id_expansion() {
    let mut video = episode_video();
    if let subscout::video::VideoKind::Episode(ep) = &mut video.kind {
        ep.series_tvdb_id = Some(7);
        ep.original_series = false;
    }

    let mut guess = Guess::default();
    guess.kind = GuessKind::Episode;
    guess.series_tvdb_id = Some(7);
    guess.country = Some("US".to_string());

    // series id implies series + year + country but not season or episode
    let score = compute_score(&subtitle_with(guess), &video);
    let scores = &*EPISODE_SCORES;
    assert_eq!(
        score,
        scores[&MatchKind::Series] + scores[&MatchKind::Year] + scores[&MatchKind::Country]
    );
}

#[test]
fn test_expansion_only_adds() {
    let video = episode_video();
    let before = HashSet::from([MatchKind::Resolution, MatchKind::TvdbId]);
    let mut after = before.clone();
    expand_matches(&mut after, &video);

    assert!(after.is_superset(&before));
    assert!(after.contains(&MatchKind::Series));
    assert!(after.contains(&MatchKind::Episode));
}

#[test]
fn test_score_never_exceeds_max() {
    let video = movie_x();

    // pile on everything at once
    let mut guess = Guess::movie("X");
    guess.year = Some(2020);
    guess.resolution = Some("1080p".to_string());
    guess.imdb_id = None;
    guess.release_group = Some("GROUP".to_string());
    guess.source = Some("Web".to_string());

    let score = compute_score(&subtitle_with(guess), &video);
    assert!(score <= max_score(&video));
}

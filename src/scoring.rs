/*!
 * Scoring of a subtitle against a video.
 *
 * A pure function from the (subtitle, video) pair to a non-negative integer:
 * the match-set is computed, a hash match discards everything else, external
 * identifier matches expand to the attributes they imply, and the weights of
 * the final set are summed.
 *
 * Weight tables are fixed constants per asset type. Only the relative ordering
 * and the additive property matter: hash > series/title > year = country >
 * season = episode > release group = streaming service > fps > source >
 * audio codec = resolution = video codec > hearing impaired.
 */

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};
use once_cell::sync::Lazy;

use crate::matching::MatchKind;
use crate::subtitle::Subtitle;
use crate::video::{Video, VideoKind};

/// Scores for episodes
pub static EPISODE_SCORES: Lazy<HashMap<MatchKind, u32>> = Lazy::new(|| {
    HashMap::from([
        (MatchKind::Hash, 809),
        (MatchKind::Series, 243),
        (MatchKind::Year, 81),
        (MatchKind::Country, 81),
        (MatchKind::Season, 27),
        (MatchKind::Episode, 27),
        (MatchKind::ReleaseGroup, 9),
        (MatchKind::StreamingService, 9),
        (MatchKind::Fps, 6),
        (MatchKind::Source, 4),
        (MatchKind::AudioCodec, 2),
        (MatchKind::Resolution, 2),
        (MatchKind::VideoCodec, 2),
        (MatchKind::HearingImpaired, 1),
    ])
});

/// Scores for movies
pub static MOVIE_SCORES: Lazy<HashMap<MatchKind, u32>> = Lazy::new(|| {
    HashMap::from([
        (MatchKind::Hash, 269),
        (MatchKind::Title, 81),
        (MatchKind::Year, 27),
        (MatchKind::Country, 27),
        (MatchKind::ReleaseGroup, 9),
        (MatchKind::StreamingService, 9),
        (MatchKind::Fps, 6),
        (MatchKind::Source, 4),
        (MatchKind::AudioCodec, 2),
        (MatchKind::Resolution, 2),
        (MatchKind::VideoCodec, 2),
        (MatchKind::HearingImpaired, 1),
    ])
});

/// Release groups that are interchangeable under different names
static EQUIVALENT_RELEASE_GROUPS: &[&[&str]] = &[
    &["LOL", "DIMENSION"],
    &["ASAP", "IMMERSE", "FLEET"],
    &["AVS", "SVA"],
];

/// Get all the equivalents of the given release group, itself included
pub fn equivalent_release_groups(release_group: &str) -> Vec<String> {
    for group_set in EQUIVALENT_RELEASE_GROUPS {
        if group_set.contains(&release_group) {
            return group_set.iter().map(|g| (*g).to_string()).collect();
        }
    }

    vec![release_group.to_string()]
}

/// Get the weight table for the given video
pub fn get_scores(video: &Video) -> &'static HashMap<MatchKind, u32> {
    match video.kind {
        VideoKind::Episode(_) => &EPISODE_SCORES,
        VideoKind::Movie(_) => &MOVIE_SCORES,
    }
}

/// The maximum possible score for the given video: the weight of a hash match
pub fn max_score(video: &Video) -> u32 {
    get_scores(video)[&MatchKind::Hash]
}

/// Expand external identifier matches to the attribute matches they imply
///
/// Expansion only adds kinds, never removes, and is idempotent.
pub fn expand_matches(matches: &mut HashSet<MatchKind>, video: &Video) {
    match video.kind {
        VideoKind::Episode(_) => {
            if matches.contains(&MatchKind::Title) {
                // a matching episode title implies the right episode
                debug!("Adding title match equivalent");
                matches.insert(MatchKind::Episode);
            }
            for series_id in [
                MatchKind::SeriesImdbId,
                MatchKind::SeriesTmdbId,
                MatchKind::SeriesTvdbId,
            ] {
                if matches.contains(&series_id) {
                    debug!("Adding {} match equivalents", series_id);
                    matches.extend([MatchKind::Series, MatchKind::Year, MatchKind::Country]);
                }
            }
            for episode_id in [MatchKind::ImdbId, MatchKind::TmdbId, MatchKind::TvdbId] {
                if matches.contains(&episode_id) {
                    debug!("Adding {} match equivalents", episode_id);
                    matches.extend([
                        MatchKind::Series,
                        MatchKind::Year,
                        MatchKind::Country,
                        MatchKind::Season,
                        MatchKind::Episode,
                    ]);
                }
            }
        }
        VideoKind::Movie(_) => {
            for movie_id in [MatchKind::ImdbId, MatchKind::TmdbId] {
                if matches.contains(&movie_id) {
                    debug!("Adding {} match equivalents", movie_id);
                    matches.extend([MatchKind::Title, MatchKind::Year, MatchKind::Country]);
                }
            }
        }
    }
}

/// Compute the score of the `subtitle` against the `video`
pub fn compute_score(subtitle: &Subtitle, video: &Video) -> u32 {
    info!("Computing score of {} for video {}", subtitle.id(), video.name());

    let scores = get_scores(video);

    // get the matches
    let mut matches = subtitle.get_matches(video);
    debug!("Found matches {:?}", matches);

    // on hash match, discard everything else
    if matches.contains(&MatchKind::Hash) {
        debug!("Keeping only hash match");
        matches.retain(|m| *m == MatchKind::Hash);
    }

    // handle equivalent matches
    expand_matches(&mut matches, video);

    // compute the score
    let score: u32 = matches.iter().filter_map(|m| scores.get(m)).sum();
    info!("Computed score {} with final matches {:?}", score, matches);

    // ensure the score is within valid bounds
    let max = scores[&MatchKind::Hash];
    if score > max {
        warn!("Clipping score {} between 0 and {}", score, max);
        return max;
    }

    score
}

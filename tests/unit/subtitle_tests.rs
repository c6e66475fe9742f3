/*!
 * Tests for the subtitle record, path naming and persistence
 */

use subscout::format::SubtitleFormat;
use subscout::language_utils::{LanguageCodeScheme, LanguageTag};
use subscout::subtitle::{LanguageType, SaveOptions, Subtitle, save_subtitles};
use subscout::video::{Movie, Video};

use crate::common::{TEST_SRT, create_temp_dir, create_test_file, english, french};

fn downloaded(id: &str, language: LanguageTag) -> Subtitle {
    let mut subtitle = Subtitle::builder("mock", id, language).build();
    subtitle.set_content(TEST_SRT.as_bytes().to_vec());
    subtitle
}

#[test]
fn test_path_suffix_type_before_language() {
    let video = Video::movie(
        "/media/Show.2021.mkv",
        Movie { title: "Show".to_string(), ..Movie::default() },
    );

    let subtitle = Subtitle::builder("mock", "1", english())
        .flags(Some(true), None)
        .format(SubtitleFormat::Srt)
        .build();

    let path = subtitle.get_path(&video, false, None, true, LanguageCodeScheme::Alpha2);
    assert_eq!(path.to_string_lossy(), "/media/Show.2021.[hi].en.srt");
}

#[test]
fn test_path_without_type_suffix() {
    let video = Video::movie(
        "/media/Show.2021.mkv",
        Movie { title: "Show".to_string(), ..Movie::default() },
    );
    let subtitle = Subtitle::builder("mock", "1", english())
        .flags(Some(true), None)
        .build();

    let path = subtitle.get_path(&video, false, None, false, LanguageCodeScheme::Alpha2);
    assert_eq!(path.to_string_lossy(), "/media/Show.2021.en.srt");
}

#[test]
fn test_path_alpha3_and_name_schemes() {
    let video = Video::movie("Show.mkv", Movie { title: "Show".to_string(), ..Movie::default() });
    let subtitle = Subtitle::builder("mock", "1", french()).build();

    let alpha3 = subtitle.get_path(&video, false, None, false, LanguageCodeScheme::Alpha3);
    assert_eq!(alpha3.to_string_lossy(), "Show.fra.srt");

    let name = subtitle.get_path(&video, false, None, false, LanguageCodeScheme::Name);
    assert_eq!(name.to_string_lossy(), "Show.French.srt");
}

#[test]
fn test_save_subtitles_one_file_per_language() {
    let dir = create_temp_dir().unwrap();
    let video_path = create_test_file(dir.path(), "Movie.mkv", b"video").unwrap();
    let video = Video::movie(
        &video_path.to_string_lossy(),
        Movie { title: "Movie".to_string(), ..Movie::default() },
    );

    let mut subtitles = vec![
        downloaded("1", english()),
        downloaded("2", french()),
        // same language again: silently skipped
        downloaded("3", english()),
    ];

    let saved = save_subtitles(&video, &mut subtitles, &SaveOptions::default()).unwrap();
    assert_eq!(saved.len(), 2);
    assert!(dir.path().join("Movie.en.srt").exists());
    assert!(dir.path().join("Movie.fr.srt").exists());
}

#[test]
fn test_save_subtitles_single_mode() {
    let dir = create_temp_dir().unwrap();
    let video_path = create_test_file(dir.path(), "Movie.mkv", b"video").unwrap();
    let video = Video::movie(
        &video_path.to_string_lossy(),
        Movie { title: "Movie".to_string(), ..Movie::default() },
    );

    let mut subtitles = vec![downloaded("1", english()), downloaded("2", french())];
    let options = SaveOptions { single: true, ..SaveOptions::default() };

    let saved = save_subtitles(&video, &mut subtitles, &options).unwrap();
    assert_eq!(saved.len(), 1);
    // no language suffix in single mode
    assert!(dir.path().join("Movie.srt").exists());
    assert!(!dir.path().join("Movie.en.srt").exists());
}

#[test]
fn test_save_subtitles_skips_content_free_records() {
    let dir = create_temp_dir().unwrap();
    let video_path = create_test_file(dir.path(), "Movie.mkv", b"video").unwrap();
    let video = Video::movie(
        &video_path.to_string_lossy(),
        Movie { title: "Movie".to_string(), ..Movie::default() },
    );

    let mut subtitles = vec![Subtitle::builder("mock", "1", english()).build()];
    let saved = save_subtitles(&video, &mut subtitles, &SaveOptions::default()).unwrap();
    assert!(saved.is_empty());
}

#[test]
fn test_save_subtitles_with_format_conversion() {
    let dir = create_temp_dir().unwrap();
    let video_path = create_test_file(dir.path(), "Movie.mkv", b"video").unwrap();
    let video = Video::movie(
        &video_path.to_string_lossy(),
        Movie { title: "Movie".to_string(), ..Movie::default() },
    );

    let mut subtitles = vec![downloaded("1", english())];
    let options = SaveOptions {
        format: Some(SubtitleFormat::Vtt),
        encoding: Some("utf-8".to_string()),
        ..SaveOptions::default()
    };

    let saved = save_subtitles(&video, &mut subtitles, &options).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].extension().unwrap(), "vtt");

    let written = std::fs::read_to_string(&saved[0]).unwrap();
    assert!(written.starts_with("WEBVTT"));
}

#[test]
fn test_reencode_round_trip_changes_bytes() {
    let mut subtitle = Subtitle::builder("mock", "1", french()).build();
    subtitle.set_content("1\n00:00:01,000 --> 00:00:02,000\nCafé\n".as_bytes().to_vec());
    assert_eq!(subtitle.encoding(), Some("utf-8"));

    subtitle.reencode("windows-1252").unwrap();
    assert_eq!(subtitle.encoding(), Some("windows-1252"));
    // é is a single byte in windows-1252
    assert!(subtitle.content().unwrap().contains(&0xE9));
    assert!(subtitle.text().contains("Café"));
}

#[test]
fn test_language_type_flags_round_trip() {
    assert_eq!(LanguageType::HearingImpaired.is_hearing_impaired(), Some(true));
    assert_eq!(LanguageType::HearingImpaired.is_foreign_only(), Some(false));
    assert_eq!(LanguageType::Unknown.is_hearing_impaired(), None);
    assert_eq!(LanguageType::Normal.is_foreign_only(), Some(false));
}

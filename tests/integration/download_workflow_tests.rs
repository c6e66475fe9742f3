/*!
 * Full workflow tests: scan a directory, search, select and save
 */

use std::fs;
use std::sync::Arc;

use subscout::app_config::Config;
use subscout::app_controller::Controller;
use subscout::providers::ProviderRegistry;
use subscout::providers::mock::MockProvider;

use crate::common::{create_temp_dir, english, french, registry_with};

fn mock_with_languages(name: &str) -> MockProvider {
    let provider = MockProvider::working(name);
    let subtitles = vec![
        provider.subtitle("en-1", &english()),
        provider.subtitle("fr-1", &french()),
    ];
    provider.with_subtitles(subtitles)
}

fn config_for(providers: Vec<&str>, languages: Vec<&str>) -> Config {
    Config {
        providers: providers.into_iter().map(str::to_string).collect(),
        languages: languages.into_iter().map(str::to_string).collect(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_directory_workflow_saves_one_file_per_language() {
    let dir = create_temp_dir().unwrap();
    fs::write(dir.path().join("First.Movie.2020.mkv"), b"video").unwrap();
    fs::write(dir.path().join("Second.Movie.2021.mkv"), b"video").unwrap();

    let registry = registry_with(vec![mock_with_languages("mock")]);
    let config = config_for(vec!["mock"], vec!["en", "fr"]);
    let controller = Controller::with_registry(config, registry);

    let reports = controller.download(dir.path()).await.unwrap();
    assert_eq!(reports.len(), 2);

    for name in ["First.Movie.2020", "Second.Movie.2021"] {
        assert!(dir.path().join(format!("{name}.en.srt")).exists());
        assert!(dir.path().join(format!("{name}.fr.srt")).exists());
    }
}

#[tokio::test]
async fn test_existing_external_subtitle_narrows_the_search() {
    let dir = create_temp_dir().unwrap();
    fs::write(dir.path().join("Movie.2020.mkv"), b"video").unwrap();
    // an English subtitle already sits next to the video
    fs::write(dir.path().join("Movie.2020.en.srt"), b"existing").unwrap();

    let registry = registry_with(vec![mock_with_languages("mock")]);
    let config = config_for(vec!["mock"], vec!["en", "fr"]);
    let controller = Controller::with_registry(config, registry);

    let reports = controller.download(dir.path()).await.unwrap();
    assert_eq!(reports.len(), 1);

    // only the missing language is downloaded
    assert_eq!(reports[0].saved.len(), 1);
    assert!(reports[0].saved[0].ends_with("Movie.2020.fr.srt"));
    assert_eq!(fs::read(dir.path().join("Movie.2020.en.srt")).unwrap(), b"existing");
}

#[tokio::test]
async fn test_video_with_all_languages_is_skipped() {
    let dir = create_temp_dir().unwrap();
    fs::write(dir.path().join("Movie.2020.mkv"), b"video").unwrap();
    fs::write(dir.path().join("Movie.2020.en.srt"), b"existing").unwrap();

    let provider = mock_with_languages("mock");
    let probe = provider.probe();
    let registry = registry_with(vec![provider]);
    let config = config_for(vec!["mock"], vec!["en"]);
    let controller = Controller::with_registry(config, registry);

    let reports = controller.download(dir.path()).await.unwrap();
    // nothing left to search for
    assert!(reports.is_empty());
    assert_eq!(probe.list_calls(), 0);
}

#[tokio::test]
async fn test_failing_provider_yields_empty_results_not_errors() {
    let dir = create_temp_dir().unwrap();
    fs::write(dir.path().join("Movie.2020.mkv"), b"video").unwrap();

    let registry = registry_with(vec![MockProvider::listing_fails("broken")]);
    let config = config_for(vec!["broken"], vec!["en"]);
    let controller = Controller::with_registry(config, registry);

    // silent degradation: the run succeeds with nothing saved
    let reports = controller.download(dir.path()).await.unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].saved.is_empty());
}

#[tokio::test]
async fn test_single_mode_saves_one_unsuffixed_file() {
    let dir = create_temp_dir().unwrap();
    fs::write(dir.path().join("Movie.2020.mkv"), b"video").unwrap();

    let registry = registry_with(vec![mock_with_languages("mock")]);
    let mut config = config_for(vec!["mock"], vec!["en", "fr"]);
    config.single = true;
    let controller = Controller::with_registry(config, registry);

    let reports = controller.download(dir.path()).await.unwrap();
    assert_eq!(reports[0].saved.len(), 1);
    assert!(dir.path().join("Movie.2020.srt").exists());
}

#[test]
fn test_preview_reports_missing_languages() {
    let dir = create_temp_dir().unwrap();
    fs::write(dir.path().join("Movie.2020.mkv"), b"video").unwrap();
    fs::write(dir.path().join("Movie.2020.en.srt"), b"existing").unwrap();

    let registry = Arc::new(ProviderRegistry::new());
    let config = config_for(vec![], vec!["en", "fr"]);
    let controller = Controller::with_registry(config, registry);

    let preview = controller.preview(dir.path()).unwrap();
    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].1, vec!["fr".to_string()]);
}

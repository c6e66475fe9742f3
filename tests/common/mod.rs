/*!
 * Common test utilities for the subscout test suite
 */

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use subscout::language_utils::LanguageTag;
use subscout::pool::ProviderPool;
use subscout::providers::mock::MockProvider;
use subscout::providers::{ProviderRegistry, SubtitleProvider};
use subscout::video::{Movie, Video};

/// A small valid SRT payload
pub const TEST_SRT: &str = "1\n00:00:01,000 --> 00:00:04,000\nThis is a test subtitle.\n\n2\n00:00:05,000 --> 00:00:09,000\nIt contains multiple entries.\n";

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// English language tag
pub fn english() -> LanguageTag {
    LanguageTag::from_code("en").unwrap()
}

/// French language tag
pub fn french() -> LanguageTag {
    LanguageTag::from_code("fr").unwrap()
}

/// A movie video named "X" from 2020 in 1080p with a known hash
pub fn movie_x() -> Video {
    let mut video = Video::movie(
        "X.2020.1080p.mkv",
        Movie { title: "X".to_string(), year: Some(2020), ..Movie::default() },
    );
    video.resolution = Some("1080p".to_string());
    video
        .hashes
        .insert("opensubtitles".to_string(), "deadbeef".to_string());
    video
}

/// A registry holding the given mock providers
pub fn registry_with(mocks: Vec<MockProvider>) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for mock in mocks {
        let name = mock.name().to_string();
        registry.register(&name, move |_| Ok(Box::new(mock.clone())));
    }
    Arc::new(registry)
}

/// A sequential pool over the given mock providers, searched in the given order
pub fn pool_with(mocks: Vec<MockProvider>, order: Vec<&str>) -> ProviderPool {
    let registry = registry_with(mocks);
    ProviderPool::new(
        registry,
        order.into_iter().map(str::to_string).collect(),
        HashMap::new(),
    )
}

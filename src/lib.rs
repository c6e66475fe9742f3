/*!
 * # subscout
 *
 * A Rust library for searching, ranking and downloading video subtitles.
 *
 * ## Features
 *
 * - Query multiple subtitle providers behind a uniform capability contract
 * - Fault isolation: a failing provider is discarded, the search continues
 * - Sequential and parallel provider pools with identical semantics
 * - Deterministic scoring of candidates against the video's release metadata
 * - Text encoding inference with per-language candidates and a statistical fallback
 * - Subtitle validation and conversion between SRT, WebVTT, MicroDVD and more
 * - Directory scanning with archive support and external subtitle discovery
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `video`: video descriptor, an episode or a movie with release attributes
 * - `matching`: match predicates between a video and declared subtitle metadata
 * - `scoring`: weight tables and score computation
 * - `subtitle`: the subtitle record with its lazy decode/validate state
 * - `encoding`: text encoding inference for subtitle content
 * - `format`: subtitle format detection, parsing and serialization
 * - `providers`: the provider contract, registry and implementations
 * - `pool`: provider pools and the best-subtitle selection algorithm
 * - `scan`: filesystem scanning for videos, archives and external subtitles
 * - `archive`: video archive inspection
 * - `app_config`: configuration management
 * - `app_controller`: main application controller
 * - `errors`: custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod archive;
pub mod encoding;
pub mod errors;
pub mod format;
pub mod language_utils;
pub mod matching;
pub mod pool;
pub mod providers;
pub mod scan;
pub mod scoring;
pub mod subtitle;
pub mod video;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{ArchiveError, ConversionError, Error, ProviderError};
pub use language_utils::{LanguageCodeScheme, LanguageTag};
pub use pool::{DownloadOptions, ParallelProviderPool, ProviderListing, ProviderPool};
pub use providers::{ProviderConfig, ProviderRegistry, SubtitleProvider};
pub use scoring::compute_score;
pub use subtitle::{LanguageType, SaveOptions, Subtitle, save_subtitles};
pub use video::{Episode, Movie, Video, VideoKind};

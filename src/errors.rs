/*!
 * Error types for the subscout library.
 *
 * This module contains custom error types for different parts of the library,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors raised by subtitle providers
///
/// Providers own their transport details, so network failures surface here in a
/// provider-agnostic shape. None of these errors cross the provider pool
/// boundary: the pool converts them to discard-and-continue.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider was constructed with a bad configuration
    #[error("Provider misconfigured: {0}")]
    Configuration(String),

    /// Authentication against the remote service failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The remote service is unreachable or answered with a server error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The provider enforces a download quota and it is exhausted
    #[error("Download limit exceeded: {0}")]
    DownloadLimitExceeded(String),

    /// A request could not be sent or completed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// A response could not be parsed
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The downloaded payload is a broken or unsupported archive
    ///
    /// This is the only download error the pool swallows without discarding
    /// the provider.
    #[error("Bad subtitle archive: {0}")]
    BadArchive(String),

    /// An operation was attempted before `initialize` was called
    #[error("Provider not initialized")]
    NotInitialized,
}

/// Errors raised while reading a video archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The file is not an archive format we can read
    #[error("{0:?} is not a valid archive extension")]
    UnsupportedExtension(String),

    /// The archive requires a password
    #[error("Archive requires a password")]
    Encrypted,

    /// The archive is structurally broken
    #[error("Broken archive: {0}")]
    Broken(String),

    /// The archive contains no video entry
    #[error("No video in archive")]
    NoVideo,

    /// Error reading the archive file itself
    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when converting subtitle content to another format or encoding
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The current text does not parse under any known subtitle format
    #[error("Content is not a parsable subtitle")]
    UnparsableContent,

    /// The current encoding is unknown, so the text cannot be produced
    #[error("Current encoding is not defined")]
    UnknownEncoding,

    /// A frame rate is required to convert a frame-based format
    #[error("A frame rate is required to convert this subtitle")]
    MissingFrameRate,

    /// The requested target format cannot be serialized
    #[error("Cannot serialize to format {0}")]
    UnsupportedTarget(String),

    /// The text cannot be represented in the requested encoding
    #[error("Cannot encode text as {0}")]
    EncodingFailed(String),

    /// The converted text failed structural validation
    #[error("Converted subtitle failed validation")]
    InvalidResult,
}

/// Main library error type that wraps all other errors
#[derive(Error, Debug)]
pub enum Error {
    /// A provider name is not part of the configured set
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Caller misuse: invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A structured guess could not be turned into a video descriptor
    #[error("Guessing error: {0}")]
    Guess(String),

    /// Error from reading a video archive
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Decoded content failed subtitle syntax checks
    #[error("Invalid subtitle content: {0}")]
    Validation(String),

    /// Format or encoding conversion could not complete
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Error from a file operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

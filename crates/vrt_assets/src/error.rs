//! Error types for asset parsing and loading

use thiserror::Error;

/// Errors produced by the VRT/MTL loaders and the texture pipeline
#[derive(Error, Debug)]
pub enum AssetError {
    /// A length prefix or fixed-size field ran past the end of the buffer
    #[error("Truncated VRT data: {what} at offset {offset}")]
    Truncated {
        /// What was being read when the buffer ran out
        what: &'static str,
        /// Byte offset of the failed read
        offset: usize,
    },

    /// A length-prefixed string was not valid UTF-8
    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// A fetch through the host capability failed
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed {
        /// The URL that was requested
        url: String,
        /// Transport-level failure description
        reason: String,
    },

    /// Image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

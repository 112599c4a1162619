//! Cache key derivation

use crate::config::FilenameMode;
use sha2::{Digest, Sha256};

/// Longest filename produced for readable keys, extension included
pub const MAX_FILENAME_LENGTH: usize = 130;

const READABLE_EXTENSION: &str = ".html";

/// Derives the cache filename for a URL
pub fn cache_key(url: &str, mode: FilenameMode) -> String {
    match mode {
        FilenameMode::Hashed => hashed_key(url),
        FilenameMode::Readable => readable_key(url),
    }
}

/// 128-bit digest of the URL, hex encoded
pub fn hashed_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..16])
}

/// URL with everything outside `[A-Za-z0-9_-]` removed, truncated to fit
/// [`MAX_FILENAME_LENGTH`]
pub fn readable_key(url: &str) -> String {
    let max = MAX_FILENAME_LENGTH - READABLE_EXTENSION.len();
    let clean: String = url
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(max)
        .collect();
    format!("{}{}", clean, READABLE_EXTENSION)
}

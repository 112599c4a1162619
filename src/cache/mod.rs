//! Page cache ("stash") for fetched bodies
//!
//! One file per cached URL inside a single folder. Entries have no expiry:
//! once a URL is stashed it is served from disk until the file is removed.

mod disk;
mod key;

pub use disk::DiskCache;
pub use key::{cache_key, hashed_key, readable_key, MAX_FILENAME_LENGTH};

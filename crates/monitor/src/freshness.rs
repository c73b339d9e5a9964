//! Freshness filter: was a chain file written recently enough to count as a live run?

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// [`is_fresh_at`] evaluated against the current wall clock.
pub fn is_fresh(path: &Path, window: Duration, require_nonempty: bool) -> bool {
    is_fresh_at(path, window, require_nonempty, SystemTime::now())
}

/// True iff `|now - mtime| <= window` (and the file is non-empty when
/// `require_nonempty` is set).
///
/// Any stat failure, including the file having vanished since discovery,
/// is reported as not fresh.
pub fn is_fresh_at(path: &Path, window: Duration, require_nonempty: bool, now: SystemTime) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    if require_nonempty && meta.len() == 0 {
        return false;
    }
    let Ok(modified) = meta.modified() else {
        return false;
    };

    // mtime may sit slightly in the future (clock skew on shared filesystems).
    let age = match now.duration_since(modified) {
        Ok(age) => age,
        Err(ahead) => ahead.duration(),
    };
    age <= window
}

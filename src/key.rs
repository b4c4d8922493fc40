//! Lookup key for viewer mappings.
//!
//! A mapping applies to an (extension, media type) pair. Both halves compare
//! ASCII case-insensitively, so `LOG`/`Text/Plain` and `log`/`text/plain`
//! address the same entry.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;

#[derive(Clone, Debug)]
pub struct ViewerKey {
    extension: String,
    media_type: String,
}

impl ViewerKey {
    /// Key for an explicit extension. A leading dot (as written by older
    /// settings files) is dropped.
    pub fn new(extension: &str, media_type: &str) -> Self {
        Self {
            extension: normalize_extension(extension).to_string(),
            media_type: media_type.to_string(),
        }
    }

    /// Key for a file path; a path without an extension maps to `""`.
    pub fn for_path(path: &Path, media_type: &str) -> Self {
        Self::new(&extension_of(path), media_type)
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// True when `extension` names the same extension as this key.
    pub fn matches_extension(&self, extension: &str) -> bool {
        normalize_extension(extension).eq_ignore_ascii_case(&self.extension)
    }

    pub fn matches_media_type(&self, media_type: &str) -> bool {
        media_type.eq_ignore_ascii_case(&self.media_type)
    }

    fn folded(&self) -> (String, String) {
        (
            self.extension.to_ascii_lowercase(),
            self.media_type.to_ascii_lowercase(),
        )
    }
}

/// Extension of `path` without the dot; empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn normalize_extension(extension: &str) -> &str {
    extension.strip_prefix('.').unwrap_or(extension)
}

impl PartialEq for ViewerKey {
    fn eq(&self, other: &Self) -> bool {
        self.extension.eq_ignore_ascii_case(&other.extension)
            && self.media_type.eq_ignore_ascii_case(&other.media_type)
    }
}

impl Eq for ViewerKey {}

impl Hash for ViewerKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded().hash(state);
    }
}

impl Ord for ViewerKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(&other.folded())
    }
}

impl PartialOrd for ViewerKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ViewerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.extension, self.media_type)
    }
}

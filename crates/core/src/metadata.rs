//! Per-object content type and cache policy

use std::path::{Path, PathBuf};

/// Entry documents are revalidated on every request
pub const CACHE_CONTROL_REVALIDATE: &str = "no-cache";

/// Everything else is cached for one day
pub const CACHE_CONTROL_ASSET: &str = "public, max-age=86400";

/// A file ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub local_path: PathBuf,
    pub storage_key: String,
    pub content_type: Option<String>,
    pub cache_control: &'static str,
}

/// Derives object metadata from the key and local path
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    revalidate_suffix: String,
}

impl MetadataResolver {
    /// Keys ending in the entry document's extension get the no-cache policy
    pub fn for_entry_document(entry_document: &str) -> Self {
        let revalidate_suffix = match Path::new(entry_document).extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy()),
            None => entry_document.to_string(),
        };
        Self { revalidate_suffix }
    }

    pub fn cache_control(&self, storage_key: &str) -> &'static str {
        if storage_key.ends_with(&self.revalidate_suffix) {
            CACHE_CONTROL_REVALIDATE
        } else {
            CACHE_CONTROL_ASSET
        }
    }

    pub fn content_type(&self, local_path: &Path) -> Option<String> {
        mime_guess::from_path(local_path)
            .first()
            .map(|mime| mime.to_string())
    }

    pub fn resolve(&self, local_path: &Path, storage_key: &str) -> ContentItem {
        ContentItem {
            local_path: local_path.to_path_buf(),
            storage_key: storage_key.to_string(),
            content_type: self.content_type(local_path),
            cache_control: self.cache_control(storage_key),
        }
    }
}

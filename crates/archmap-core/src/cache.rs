use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::index::{ArchitectureIndex, IndexBuilder};

/// Caller-owned cache of built indexes keyed by the SHA-256 of the container
/// text. Nothing is shared implicitly: concurrent users wrap it in their own
/// lock.
#[derive(Default)]
pub struct IndexCache {
    entries: HashMap<String, Arc<ArchitectureIndex>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for `container`, building it on a miss.
    pub fn get_or_build(&mut self, builder: &IndexBuilder, container: &str) -> Arc<ArchitectureIndex> {
        let key = compute_hash(container);
        if let Some(index) = self.entries.get(&key) {
            tracing::debug!("index cache hit for {}", &key[..12]);
            return Arc::clone(index);
        }
        let index = Arc::new(builder.build_from_container(container));
        self.entries.insert(key, Arc::clone(&index));
        index
    }

    pub fn get(&self, container: &str) -> Option<Arc<ArchitectureIndex>> {
        self.entries.get(&compute_hash(container)).cloned()
    }

    /// Drop the entry for `container`. Returns whether one was present.
    pub fn invalidate(&mut self, container: &str) -> bool {
        self.entries.remove(&compute_hash(container)).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compute SHA-256 hash of container text.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: &str = "filepath:///a.ts /// /// ///\nfile code{\nimport './b';\n}\n";

    #[test]
    fn test_compute_hash_deterministic() {
        assert_eq!(compute_hash("hello world"), compute_hash("hello world"));
        assert_ne!(compute_hash("hello"), compute_hash("world"));
        assert_eq!(compute_hash("").len(), 64);
    }

    #[test]
    fn test_get_or_build_reuses_index() {
        let builder = IndexBuilder::default();
        let mut cache = IndexCache::new();

        let first = cache.get_or_build(&builder, CONTAINER);
        let second = cache.get_or_build(&builder, CONTAINER);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.module_count(), 1);
    }

    #[test]
    fn test_different_content_builds_new_entry() {
        let builder = IndexBuilder::default();
        let mut cache = IndexCache::new();

        cache.get_or_build(&builder, CONTAINER);
        cache.get_or_build(&builder, "");
        assert_eq!(cache.len(), 2);
        assert!(cache.get("").is_some_and(|index| index.is_empty()));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let builder = IndexBuilder::default();
        let mut cache = IndexCache::new();

        let first = cache.get_or_build(&builder, CONTAINER);
        assert!(cache.invalidate(CONTAINER));
        assert!(!cache.invalidate(CONTAINER));
        assert!(cache.get(CONTAINER).is_none());

        let rebuilt = cache.get_or_build(&builder, CONTAINER);
        assert!(!Arc::ptr_eq(&first, &rebuilt));

        cache.clear();
        assert!(cache.is_empty());
    }
}

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::types::SourceRecord;

/// Symbols pulled out of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.exports.is_empty()
            && self.classes.is_empty()
            && self.functions.is_empty()
    }
}

/// Push `item` unless it is already present, keeping first-seen order.
pub fn push_unique(list: &mut Vec<String>, item: &str) {
    if !item.is_empty() && !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Optional syntax-aware extraction pass, tried before the regex heuristics.
///
/// Implementations are expected to be best effort: an `Err` makes the index
/// builder fall back to [`crate::extract::HeuristicExtractor`] for that file.
pub trait SyntaxExtractor: Send + Sync {
    /// Extractor name (e.g., "typescript")
    fn name(&self) -> &'static str;

    /// Whether this extractor understands the record (usually by extension).
    fn supports(&self, record: &SourceRecord) -> bool;

    /// Extract imports, exports, classes and functions.
    fn extract(&self, record: &SourceRecord) -> Result<Extraction>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_unique_keeps_order() {
        let mut list = Vec::new();
        push_unique(&mut list, "b");
        push_unique(&mut list, "a");
        push_unique(&mut list, "b");
        push_unique(&mut list, "");
        assert_eq!(list, vec!["b", "a"]);
    }

    #[test]
    fn test_extraction_is_empty() {
        let mut extraction = Extraction::default();
        assert!(extraction.is_empty());
        extraction.functions.push("main".to_string());
        assert!(!extraction.is_empty());
    }
}

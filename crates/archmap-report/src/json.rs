use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use archmap_core::ArchitectureIndex;

/// JSON projection of an index with generation metadata.
#[derive(Serialize)]
pub struct IndexReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub tool_version: &'static str,
    #[serde(flatten)]
    pub index: &'a ArchitectureIndex,
}

impl<'a> IndexReport<'a> {
    pub fn new(index: &'a ArchitectureIndex) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION"),
            index,
        }
    }
}

/// Format an index as JSON.
pub fn format_index(index: &ArchitectureIndex, compact: bool) -> Result<String> {
    let report = IndexReport::new(index);
    let json = if compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    };
    json.context("failed to serialize index")
}

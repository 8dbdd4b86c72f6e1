//! Ingestion boundary: everything that turns some outside representation of a
//! codebase into an ordered list of [`SourceRecord`]s.
//!
//! Two adapters feed the same downstream pipeline:
//!
//! - [`TextContainerAdapter`] parses the consolidated container format
//!   (`filepath:///<path> /// /// ///`, `file code{`, content, `}`).
//! - [`FileTreeAdapter`] walks a directory on disk.
//!
//! [`consolidate`] goes the other way and renders records as container text.

use std::path::{Path, PathBuf};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::types::SourceRecord;

pub const HEADER_PREFIX: &str = "filepath:///";
pub const HEADER_SUFFIX: &str = "/// /// ///";
pub const OPEN_MARKER: &str = "file code{";
pub const CLOSE_MARKER: &str = "}";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid directory: {0}")]
    InvalidDirectory(PathBuf),
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A source of file records for the indexing pipeline.
pub trait SourceAdapter {
    /// Short description used in log output.
    fn describe(&self) -> String;

    fn records(&self) -> Result<Vec<SourceRecord>>;
}

/// Adapter over an in-memory consolidated container.
pub struct TextContainerAdapter<'a> {
    text: &'a str,
}

impl<'a> TextContainerAdapter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }
}

impl SourceAdapter for TextContainerAdapter<'_> {
    fn describe(&self) -> String {
        format!("text container ({} bytes)", self.text.len())
    }

    fn records(&self) -> Result<Vec<SourceRecord>> {
        Ok(parse_container(self.text))
    }
}

struct OpenBlock {
    path: String,
    lines: Vec<String>,
    opened: bool,
    last_close: Option<usize>,
}

impl OpenBlock {
    fn new(path: String) -> Self {
        Self {
            path,
            lines: Vec::new(),
            opened: false,
            last_close: None,
        }
    }

    fn finish(mut self) -> Option<SourceRecord> {
        if self.path.is_empty() {
            tracing::warn!("skipping file block with an empty path");
            return None;
        }
        match self.last_close {
            Some(close) => self.lines.truncate(close),
            None if self.opened => {
                tracing::debug!(path = %self.path, "file block has no closing marker");
            }
            None => {}
        }
        Some(SourceRecord::new(self.path, self.lines))
    }
}

/// Split a consolidated container into ordered records.
///
/// Never fails. Text before the first header is ignored, a new header flushes
/// the open block, and a block still open at end of input keeps everything
/// collected so far. A line consisting of `}` only marks a candidate end of the
/// block; the last such line before the next header is taken as the closing
/// marker, so closing braces inside the file body survive.
///
/// Lines inside a file body that start with `filepath:///` are still read as
/// headers and split the file. Likewise, when the final block has no closing
/// marker but its body contains a bare `}` line, that line is taken as the
/// closer and whatever follows it is dropped.
pub fn parse_container(text: &str) -> Vec<SourceRecord> {
    let mut records = Vec::new();
    let mut current: Option<OpenBlock> = None;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(HEADER_PREFIX) {
            if let Some(record) = current.take().and_then(OpenBlock::finish) {
                records.push(record);
            }
            current = Some(OpenBlock::new(parse_header_path(rest)));
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };

        if !block.opened {
            if line.trim() == OPEN_MARKER {
                block.opened = true;
            }
            continue;
        }

        if line.trim_end() == CLOSE_MARKER {
            block.last_close = Some(block.lines.len());
        }
        block.lines.push(line.to_string());
    }

    if let Some(record) = current.take().and_then(OpenBlock::finish) {
        records.push(record);
    }

    records
}

fn parse_header_path(rest: &str) -> String {
    let rest = rest.trim_end();
    let rest = rest.strip_suffix(HEADER_SUFFIX).unwrap_or(rest);
    rest.trim().to_string()
}

/// Render records in the container format understood by [`parse_container`].
pub fn consolidate(records: &[SourceRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!("{HEADER_PREFIX}{} {HEADER_SUFFIX}\n", record.path));
        out.push_str(OPEN_MARKER);
        out.push('\n');
        for line in &record.content {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(CLOSE_MARKER);
        out.push_str("\n\n");
    }
    out
}

/// Derive the dotted module name of a file path: `src/app/main.py` -> `src.app.main`.
pub fn derive_module_name(path: &str) -> String {
    let normalized = path.trim().replace('\\', "/");
    let mut rest = normalized.as_str();

    let bytes = rest.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        rest = &rest[2..];
    }

    let mut segments: Vec<&str> = rest
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    if let Some(last) = segments.last_mut() {
        if let Some((stem, _)) = last.rsplit_once('.') {
            if !stem.is_empty() {
                *last = stem;
            }
        }
    }

    segments.join(".")
}

/// Adapter that reads source files from a directory tree.
pub struct FileTreeAdapter {
    root: PathBuf,
    scan: ScanConfig,
}

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => tracing::warn!("ignoring invalid exclude pattern '{pattern}': {e}"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

impl FileTreeAdapter {
    pub fn new(root: impl Into<PathBuf>, scan: ScanConfig) -> Self {
        Self {
            root: root.into(),
            scan,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        self.scan
            .exclude_dirs
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
    }

    fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.scan
                    .extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }

    /// Collect candidate file paths, without reading them.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(IngestError::InvalidDirectory(self.root.clone()).into());
        }

        let excluded_files = build_globset(&self.scan.exclude_files);
        let max_size = self.scan.max_file_size;

        let files = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !self.is_excluded_dir(&e.file_name().to_string_lossy())
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.has_allowed_extension(e.path()))
            .filter(|e| !excluded_files.is_match(e.file_name()))
            .filter(|e| e.metadata().map(|m| m.len() <= max_size).unwrap_or(false))
            .map(|e| e.into_path())
            .collect();

        Ok(files)
    }

    fn relative_path(&self, file_path: &Path) -> String {
        file_path
            .strip_prefix(&self.root)
            .unwrap_or(file_path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl SourceAdapter for FileTreeAdapter {
    fn describe(&self) -> String {
        format!("file tree at {}", self.root.display())
    }

    fn records(&self) -> Result<Vec<SourceRecord>> {
        let files = self.source_files()?;

        let mut records: Vec<SourceRecord> = files
            .par_iter()
            .filter_map(|file_path| {
                let bytes = match std::fs::read(file_path) {
                    Ok(b) => b,
                    Err(source) => {
                        let err = IngestError::Read {
                            path: file_path.clone(),
                            source,
                        };
                        tracing::warn!("{err}: {}", err_source(&err));
                        return None;
                    }
                };
                let text = String::from_utf8_lossy(&bytes);
                Some(SourceRecord::from_text(self.relative_path(file_path), &text))
            })
            .collect();

        records.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!("read {} files from {}", records.len(), self.root.display());
        Ok(records)
    }
}

fn err_source(err: &IngestError) -> String {
    std::error::Error::source(err)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(path: &str, body: &str) -> String {
        format!("filepath:///{path} /// /// ///\nfile code{{\n{body}\n}}\n\n")
    }

    #[test]
    fn test_parse_well_formed_container() {
        let text = format!(
            "{}{}",
            block("src/a.ts", "import { b } from './b';\nexport const a = 1;"),
            block("src/b.ts", "export const b = 2;")
        );
        let records = parse_container(&text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "src/a.ts");
        assert_eq!(records[0].extension, "ts");
        assert_eq!(records[0].content.len(), 2);
        assert_eq!(records[1].content, vec!["export const b = 2;"]);
    }

    #[test]
    fn test_preamble_is_ignored() {
        let text = format!("some notes\n}}\n{}", block("main.py", "print('hi')"));
        let records = parse_container(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, vec!["print('hi')"]);
    }

    #[test]
    fn test_missing_close_marker_flushes_on_next_header() {
        let text = "filepath:///a.py /// /// ///\nfile code{\nimport b\nfilepath:///b.py /// /// ///\nfile code{\nx = 1\n}\n";
        let records = parse_container(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, vec!["import b"]);
        assert_eq!(records[1].content, vec!["x = 1"]);
    }

    #[test]
    fn test_missing_close_marker_at_end_of_input() {
        let text = "filepath:///a.py /// /// ///\nfile code{\nimport b\ny = 2";
        let records = parse_container(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, vec!["import b", "y = 2"]);
    }

    #[test]
    fn test_unclosed_final_block_stops_at_last_brace_line() {
        let text = "filepath:///f.js /// /// ///\nfile code{\nfunction f() {\n}\nf();";
        let records = parse_container(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, vec!["function f() {"]);
    }

    #[test]
    fn test_closing_braces_inside_body_are_kept() {
        let text = block("src/f.js", "function f() {\n  return 1;\n}");
        let records = parse_container(&text);
        assert_eq!(
            records[0].content,
            vec!["function f() {", "  return 1;", "}"]
        );
    }

    #[test]
    fn test_header_without_open_marker_yields_empty_record() {
        let text = "filepath:///empty.txt /// /// ///\nfilepath:///b.md /// /// ///\nfile code{\n# B\n}\n";
        let records = parse_container(text);
        assert_eq!(records.len(), 2);
        assert!(records[0].content.is_empty());
        assert_eq!(records[1].content, vec!["# B"]);
    }

    #[test]
    fn test_empty_header_path_is_skipped() {
        let text = "filepath:/// /// /// ///\nfile code{\nx\n}\n";
        assert!(parse_container(text).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_container("").is_empty());
    }

    #[test]
    fn test_consolidate_round_trip() {
        let records = vec![
            SourceRecord::from_text("pkg/a.py", "from . import b\n\nclass A:\n    pass"),
            SourceRecord::from_text("pkg/b.py", ""),
            SourceRecord::from_text("web/c.js", "function c() {\n}\n"),
        ];
        let text = consolidate(&records);
        assert_eq!(text.matches(HEADER_PREFIX).count(), 3);
        let parsed = parse_container(&text);
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_derive_module_name() {
        assert_eq!(derive_module_name("a.ts"), "a");
        assert_eq!(derive_module_name("src/app/main.py"), "src.app.main");
        assert_eq!(derive_module_name("./src/util.js"), "src.util");
        assert_eq!(derive_module_name("/home/dev/proj/x.rs"), "home.dev.proj.x");
        assert_eq!(derive_module_name("C:\\proj\\lib\\core.cs"), "proj.lib.core");
        assert_eq!(derive_module_name("Makefile"), "Makefile");
        assert_eq!(derive_module_name("src/.env"), "src..env");
    }

    #[test]
    fn test_file_tree_adapter_filters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/components")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/react")).unwrap();
        std::fs::write(root.join("src/main.ts"), "import './components/button';\n").unwrap();
        std::fs::write(
            root.join("src/components/button.ts"),
            "export class Button {}\n",
        )
        .unwrap();
        std::fs::write(root.join("src/bundle.min.js"), "var a=1;").unwrap();
        std::fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();
        std::fs::write(root.join("node_modules/react/index.js"), "module.exports = {};").unwrap();

        let adapter = FileTreeAdapter::new(root, ScanConfig::default());
        let records = adapter.records().unwrap();
        let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["src/components/button.ts", "src/main.ts"]);
        assert_eq!(records[1].content, vec!["import './components/button';"]);
    }

    #[test]
    fn test_file_tree_adapter_respects_max_size() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.py"), "x = 1\n".repeat(100)).unwrap();
        std::fs::write(dir.path().join("small.py"), "x = 1\n").unwrap();
        let scan = ScanConfig {
            max_file_size: 64,
            ..ScanConfig::default()
        };
        let records = FileTreeAdapter::new(dir.path(), scan).records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "small.py");
    }

    #[test]
    fn test_file_tree_adapter_invalid_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = FileTreeAdapter::new(&missing, ScanConfig::default())
            .records()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IngestError>(),
            Some(IngestError::InvalidDirectory(_))
        ));
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::Layer;

pub const CONFIG_FILE: &str = ".archmap.toml";

/// Top-level configuration from `.archmap.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub layers: LayersConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// How many modules `core_modules` keeps.
    #[serde(default = "default_core_module_limit")]
    pub core_module_limit: usize,
    #[serde(default = "default_entry_point_keywords")]
    pub entry_point_keywords: Vec<String>,
    /// Run registered syntax extractors before the regex heuristics.
    #[serde(default = "default_true")]
    pub syntax_pass: bool,
}

fn default_core_module_limit() -> usize {
    10
}

fn default_entry_point_keywords() -> Vec<String> {
    to_strings(&["main", "index", "app", "server", "start"])
}

fn default_true() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            core_module_limit: default_core_module_limit(),
            entry_point_keywords: default_entry_point_keywords(),
            syntax_pass: true,
        }
    }
}

/// Keyword lists mapping module names and paths to layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayersConfig {
    #[serde(default = "default_presentation_keywords")]
    pub presentation: Vec<String>,
    #[serde(default = "default_business_keywords")]
    pub business: Vec<String>,
    #[serde(default = "default_data_keywords")]
    pub data: Vec<String>,
    #[serde(default = "default_infrastructure_keywords")]
    pub infrastructure: Vec<String>,
    #[serde(default = "default_shared_keywords")]
    pub shared: Vec<String>,
}

fn default_presentation_keywords() -> Vec<String> {
    to_strings(&["component", "view", "page", "ui", "widget", "screen", "layout"])
}

fn default_business_keywords() -> Vec<String> {
    to_strings(&["service", "controller", "handler", "manager", "logic", "processor"])
}

fn default_data_keywords() -> Vec<String> {
    to_strings(&["model", "entity", "repository", "dao", "schema", "database"])
}

fn default_infrastructure_keywords() -> Vec<String> {
    to_strings(&["config", "util", "helper", "middleware", "adapter", "provider"])
}

fn default_shared_keywords() -> Vec<String> {
    to_strings(&["common", "shared", "core", "base", "constants"])
}

impl LayersConfig {
    pub fn keywords(&self, layer: Layer) -> &[String] {
        match layer {
            Layer::Presentation => &self.presentation,
            Layer::Business => &self.business,
            Layer::Data => &self.data,
            Layer::Infrastructure => &self.infrastructure,
            Layer::Shared => &self.shared,
        }
    }
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            presentation: default_presentation_keywords(),
            business: default_business_keywords(),
            data: default_data_keywords(),
            infrastructure: default_infrastructure_keywords(),
            shared: default_shared_keywords(),
        }
    }
}

/// Filters applied by the file-tree adapter and the consolidator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    /// Glob patterns matched against file names.
    #[serde(default = "default_exclude_files")]
    pub exclude_files: Vec<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_extensions() -> Vec<String> {
    to_strings(&[
        "py", "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte", "java", "kt", "scala",
        "c", "h", "cpp", "hpp", "cs", "go", "rs", "rb", "php", "swift", "html", "css", "scss",
        "json", "xml", "yaml", "yml", "toml", "md", "sh", "sql",
    ])
}

fn default_exclude_dirs() -> Vec<String> {
    to_strings(&[
        "node_modules",
        "venv",
        ".git",
        "build",
        "dist",
        "bin",
        "obj",
        "__pycache__",
        ".vs",
        ".idea",
        "packages",
        "vendor",
        "bower_components",
        "jspm_packages",
        "out",
        "target",
        "Debug",
        "Release",
        ".next",
        "coverage",
    ])
}

fn default_exclude_files() -> Vec<String> {
    to_strings(&[
        "*-lock.json",
        "*.lock",
        "*.log",
        "*.min.js",
        "*.min.css",
        "*.map",
        "*.bak",
        "*.tmp",
        "*.swp",
    ])
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
            exclude_files: default_exclude_files(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from a `.archmap.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `archmap init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.archmap.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(
                            "failed to load config from '{}': {e:#}. Using defaults.",
                            config_path.display()
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `archmap init`. Values come from
    /// [`Config::default`], so the written file parses back to the defaults.
    pub fn default_toml() -> Result<String> {
        let defaults = Config::default();
        let index = toml::to_string(&defaults.index).context("failed to render [index]")?;
        let layers = toml::to_string(&defaults.layers).context("failed to render [layers]")?;
        let scan = toml::to_string(&defaults.scan).context("failed to render [scan]")?;

        Ok(format!(
            r#"# archmap - codebase structure index configuration

[index]
# core_module_limit: most-depended-on modules reported as core modules
# entry_point_keywords: a module whose name or path contains one is an entry point
# syntax_pass: try AST extraction (JS/TS) before the regex heuristics
{index}
[layers]
# Lower-case substrings matched against module name and path.
# Layers are tried in this order; the first match wins.
{layers}
[scan]
# exclude_files holds glob patterns matched against file names
{scan}"#
        ))
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// One file block taken from an ingestion adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub path: String,
    pub content: Vec<String>,
    /// Extension without the leading dot; empty when the file has none.
    pub extension: String,
}

impl SourceRecord {
    pub fn new(path: impl Into<String>, content: Vec<String>) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self {
            path,
            content,
            extension,
        }
    }

    /// Build a record from raw file text, splitting it into lines.
    pub fn from_text(path: impl Into<String>, text: &str) -> Self {
        Self::new(path, text.lines().map(str::to_string).collect())
    }

    pub fn line_count(&self) -> usize {
        self.content.len()
    }

    pub fn family(&self) -> LanguageFamily {
        LanguageFamily::from_extension(&self.extension)
    }

    pub fn text(&self) -> String {
        self.content.join("\n")
    }
}

/// Extension of the last path segment, lower-cased, without the dot.
pub fn extension_of(path: &str) -> String {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

/// Structural facts about a single module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub path: String,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    /// Line count.
    pub size: usize,
}

/// Closed set of language families the heuristic extractor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFamily {
    Python,
    JavaScript,
    Rust,
    Go,
    Jvm,
    CFamily,
    Other,
}

impl LanguageFamily {
    pub const ALL: [LanguageFamily; 7] = [
        LanguageFamily::Python,
        LanguageFamily::JavaScript,
        LanguageFamily::Rust,
        LanguageFamily::Go,
        LanguageFamily::Jvm,
        LanguageFamily::CFamily,
        LanguageFamily::Other,
    ];

    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "py" | "pyi" => LanguageFamily::Python,
            "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" | "vue" | "svelte" => {
                LanguageFamily::JavaScript
            }
            "rs" => LanguageFamily::Rust,
            "go" => LanguageFamily::Go,
            "java" | "kt" | "kts" | "scala" => LanguageFamily::Jvm,
            "c" | "h" | "cc" | "cpp" | "hpp" | "cs" => LanguageFamily::CFamily,
            _ => LanguageFamily::Other,
        }
    }
}

impl fmt::Display for LanguageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageFamily::Python => write!(f, "python"),
            LanguageFamily::JavaScript => write!(f, "javascript"),
            LanguageFamily::Rust => write!(f, "rust"),
            LanguageFamily::Go => write!(f, "go"),
            LanguageFamily::Jvm => write!(f, "jvm"),
            LanguageFamily::CFamily => write!(f, "c-family"),
            LanguageFamily::Other => write!(f, "other"),
        }
    }
}

/// Architectural layer bucket.
/// Declaration order is the classification order: the first matching layer wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Presentation,
    Business,
    Data,
    Infrastructure,
    Shared,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::Presentation,
        Layer::Business,
        Layer::Data,
        Layer::Infrastructure,
        Layer::Shared,
    ];
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Presentation => write!(f, "presentation"),
            Layer::Business => write!(f, "business"),
            Layer::Data => write!(f, "data"),
            Layer::Infrastructure => write!(f, "infrastructure"),
            Layer::Shared => write!(f, "shared"),
        }
    }
}

impl std::str::FromStr for Layer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "presentation" => Ok(Layer::Presentation),
            "business" => Ok(Layer::Business),
            "data" => Ok(Layer::Data),
            "infrastructure" | "infra" => Ok(Layer::Infrastructure),
            "shared" => Ok(Layer::Shared),
            _ => Err(anyhow::anyhow!("unknown layer: {s}")),
        }
    }
}

/// Coupling classification from the average out-degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CouplingLevel {
    Low,
    Medium,
    High,
}

impl CouplingLevel {
    /// `avg > 10` is High, `5 < avg <= 10` is Medium, anything else Low.
    pub fn from_average(avg: f64) -> Self {
        if avg > 10.0 {
            CouplingLevel::High
        } else if avg > 5.0 {
            CouplingLevel::Medium
        } else {
            CouplingLevel::Low
        }
    }
}

impl fmt::Display for CouplingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouplingLevel::Low => write!(f, "Low"),
            CouplingLevel::Medium => write!(f, "Medium"),
            CouplingLevel::High => write!(f, "High"),
        }
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;
use crate::types::{CouplingLevel, SourceRecord};

/// Lines longer than this count against maintainability.
const LONG_LINE: usize = 120;

/// Keyword-count approximation of cyclomatic complexity over the whole corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    /// Branching lines per file.
    pub cyclomatic_complexity: f64,
    pub total_conditionals: usize,
    pub total_loops: usize,
    pub total_switches: usize,
    pub total_exceptions: usize,
}

impl ComplexityMetrics {
    /// Counts lines containing `if`/`elif`, `for`/`while`, `switch`/`case` and
    /// `try` as whole words. A line counts once per keyword group.
    pub fn compute(records: &[SourceRecord]) -> Self {
        let mut metrics = Self::default();
        for line in records.iter().flat_map(|r| r.content.iter()) {
            let words: Vec<&str> = words(line).collect();
            if has_any(&words, &["if", "elif"]) {
                metrics.total_conditionals += 1;
            }
            if has_any(&words, &["for", "while"]) {
                metrics.total_loops += 1;
            }
            if has_any(&words, &["switch", "case"]) {
                metrics.total_switches += 1;
            }
            if has_any(&words, &["try"]) {
                metrics.total_exceptions += 1;
            }
        }

        let branches = metrics.total_conditionals
            + metrics.total_loops
            + metrics.total_switches
            + metrics.total_exceptions;
        metrics.cyclomatic_complexity = branches as f64 / records.len().max(1) as f64;
        metrics
    }
}

fn has_any(words: &[&str], keys: &[&str]) -> bool {
    words.iter().any(|w| keys.iter().any(|k| k == w))
}

fn words(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

/// Simplified maintainability index in `[0, 100]`.
///
/// `100 - 0.5 * (long% + complex%) + 0.3 * comment%` over every content line.
/// An empty corpus scores 100.
pub fn maintainability_index(records: &[SourceRecord]) -> f64 {
    let mut total = 0usize;
    let mut comments = 0usize;
    let mut long = 0usize;
    let mut complex = 0usize;

    for line in records.iter().flat_map(|r| r.content.iter()) {
        total += 1;
        let trimmed = line.trim();
        if ["//", "#", "/*", "*"].iter().any(|p| trimmed.starts_with(*p)) {
            comments += 1;
        }
        if line.chars().count() > LONG_LINE {
            long += 1;
        }
        if line.matches(';').count() > 1
            || line.matches("&&").count() + line.matches("||").count() > 2
        {
            complex += 1;
        }
    }

    let ratio = |n: usize| n as f64 / total.max(1) as f64 * 100.0;
    let mi = 100.0 - 0.5 * (ratio(long) + ratio(complex)) + 0.3 * ratio(comments);
    mi.clamp(0.0, 100.0)
}

/// Corpus-wide coupling from out-degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingMetrics {
    pub average_dependencies: f64,
    pub max_dependencies: usize,
    pub level: CouplingLevel,
}

impl CouplingMetrics {
    pub fn compute(graph: &DependencyGraph) -> Self {
        let names = graph.module_names();
        let degrees: Vec<usize> = names.iter().map(|n| graph.out_degree(n)).collect();
        let average = if degrees.is_empty() {
            0.0
        } else {
            degrees.iter().sum::<usize>() as f64 / degrees.len() as f64
        };
        Self {
            average_dependencies: average,
            max_dependencies: degrees.into_iter().max().unwrap_or(0),
            level: CouplingLevel::from_average(average),
        }
    }
}

impl Default for CouplingMetrics {
    fn default() -> Self {
        Self {
            average_dependencies: 0.0,
            max_dependencies: 0,
            level: CouplingLevel::Low,
        }
    }
}

/// Afferent/efferent coupling of one module.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleCoupling {
    /// Ca: modules depending on this one.
    pub afferent: usize,
    /// Ce: modules this one depends on.
    pub efferent: usize,
    pub instability: f64,
}

impl ModuleCoupling {
    pub fn new(afferent: usize, efferent: usize) -> Self {
        Self {
            afferent,
            efferent,
            instability: instability(afferent, efferent),
        }
    }
}

/// `Ce / (Ca + Ce)`, or 0 for an isolated module.
pub fn instability(afferent: usize, efferent: usize) -> f64 {
    let total = afferent + efferent;
    if total == 0 {
        0.0
    } else {
        efferent as f64 / total as f64
    }
}

/// All metrics of one index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub complexity: ComplexityMetrics,
    pub maintainability_index: f64,
    pub coupling: CouplingMetrics,
    pub modules: BTreeMap<String, ModuleCoupling>,
}

impl Metrics {
    pub fn compute(records: &[SourceRecord], graph: &DependencyGraph) -> Self {
        let modules = graph
            .module_names()
            .into_iter()
            .map(|name| {
                let coupling = ModuleCoupling::new(graph.in_degree(name), graph.out_degree(name));
                (name.to_string(), coupling)
            })
            .collect();

        Self {
            complexity: ComplexityMetrics::compute(records),
            maintainability_index: maintainability_index(records),
            coupling: CouplingMetrics::compute(graph),
            modules,
        }
    }

    pub fn module(&self, name: &str) -> Option<&ModuleCoupling> {
        self.modules.get(name)
    }

    /// Modules sorted by instability, most unstable first, then by name.
    pub fn most_unstable(&self, limit: usize) -> Vec<(&str, &ModuleCoupling)> {
        let mut ranked: Vec<(&str, &ModuleCoupling)> =
            self.modules.iter().map(|(k, v)| (k.as_str(), v)).collect();
        ranked.sort_by(|a, b| b.1.instability.total_cmp(&a.1.instability).then(a.0.cmp(b.0)));
        ranked.truncate(limit);
        ranked
    }
}

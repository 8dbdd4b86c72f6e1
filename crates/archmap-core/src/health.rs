use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;
use crate::types::{CouplingLevel, SourceRecord};

const MAX_RECOMMENDATIONS: usize = 5;

/// High-level architectural style guessed from vocabulary in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchitecturePattern {
    Mvc,
    ServiceOriented,
    ComponentBased,
    EventDriven,
    Layered,
    Repository,
    Microservices,
    Monolithic,
}

impl ArchitecturePattern {
    pub fn description(self) -> &'static str {
        match self {
            ArchitecturePattern::Mvc => "Clear separation of models, views and controllers",
            ArchitecturePattern::ServiceOriented => "Modular service design",
            ArchitecturePattern::ComponentBased => "Reusable UI components",
            ArchitecturePattern::EventDriven => "Loose coupling through events",
            ArchitecturePattern::Layered => "Organized in logical layers",
            ArchitecturePattern::Repository => "Data access abstraction",
            ArchitecturePattern::Microservices => "Distributed service design",
            ArchitecturePattern::Monolithic => "Single unified codebase",
        }
    }

    /// Detect patterns from lower-cased corpus text. Falls back to `Monolithic`.
    pub fn detect(corpus_lower: &str) -> Vec<ArchitecturePattern> {
        let has = |term: &str| corpus_lower.contains(term);
        let count = |term: &str| corpus_lower.matches(term).count();
        let services = count("service");

        let mut patterns = Vec::new();
        if has("model") && has("view") && has("controller") {
            patterns.push(ArchitecturePattern::Mvc);
        }
        if services > 5 {
            patterns.push(ArchitecturePattern::ServiceOriented);
        }
        if count("component") > 10 {
            patterns.push(ArchitecturePattern::ComponentBased);
        }
        if ["event", "listener", "emitter", "subscribe"].iter().any(|t| has(t)) {
            patterns.push(ArchitecturePattern::EventDriven);
        }
        if ["layer", "tier", "presentation", "business", "data"].iter().any(|t| has(t)) {
            patterns.push(ArchitecturePattern::Layered);
        }
        if has("repository") {
            patterns.push(ArchitecturePattern::Repository);
        }
        if services > 20 && has("api") {
            patterns.push(ArchitecturePattern::Microservices);
        }

        if patterns.is_empty() {
            patterns.push(ArchitecturePattern::Monolithic);
        }
        patterns
    }
}

impl fmt::Display for ArchitecturePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchitecturePattern::Mvc => write!(f, "MVC (Model-View-Controller)"),
            ArchitecturePattern::ServiceOriented => write!(f, "Service-Oriented Architecture"),
            ArchitecturePattern::ComponentBased => write!(f, "Component-Based Architecture"),
            ArchitecturePattern::EventDriven => write!(f, "Event-Driven Architecture"),
            ArchitecturePattern::Layered => write!(f, "Layered Architecture"),
            ArchitecturePattern::Repository => write!(f, "Repository Pattern"),
            ArchitecturePattern::Microservices => write!(f, "Microservices Architecture"),
            ArchitecturePattern::Monolithic => write!(f, "Monolithic Architecture"),
        }
    }
}

/// Cheap signals about code quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIndicators {
    pub has_tests: bool,
    pub has_docs: bool,
    pub has_error_handling: bool,
    pub uses_typescript: bool,
    /// Percentage of modules whose name mentions `test` or `spec`.
    pub estimated_test_coverage: u32,
    pub quality_score: u32,
}

impl QualityIndicators {
    pub fn compute(records: &[SourceRecord], corpus_lower: &str, module_names: &[&str]) -> Self {
        let has_tests = corpus_lower.contains("test") || corpus_lower.contains("spec");
        let has_docs = records.iter().flat_map(|r| r.content.iter()).any(|line| {
            line.contains("/**") || line.contains("\"\"\"") || line.contains("///")
        });
        let has_error_handling = ["try", "catch", "error"]
            .iter()
            .any(|t| corpus_lower.contains(*t));
        let uses_typescript = records
            .iter()
            .any(|r| r.extension == "ts" || r.extension == "tsx");

        let estimated_test_coverage = if has_tests {
            let test_modules = module_names
                .iter()
                .map(|n| n.to_lowercase())
                .filter(|n| n.contains("test") || n.contains("spec"))
                .count();
            (test_modules as f64 / module_names.len().max(1) as f64 * 100.0).round() as u32
        } else {
            0
        };

        let mut quality_score: u32 = 70;
        if has_tests {
            quality_score += 10;
        }
        if has_docs {
            quality_score += 10;
        }
        if has_error_handling {
            quality_score += 5;
        }
        if uses_typescript {
            quality_score += 5;
        }

        Self {
            has_tests,
            has_docs,
            has_error_handling,
            uses_typescript,
            estimated_test_coverage,
            quality_score: quality_score.min(100),
        }
    }
}

/// Overall health assessment of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// 0-100, higher is healthier.
    pub score: u32,
    pub indicators: QualityIndicators,
    pub patterns: Vec<ArchitecturePattern>,
    pub recommendations: Vec<String>,
}

impl HealthReport {
    pub fn analyze(
        records: &[SourceRecord],
        module_names: &[&str],
        metrics: &Metrics,
        cycle_count: usize,
    ) -> Self {
        let corpus_lower = corpus_lower(records);
        let score = health_score(metrics, cycle_count, corpus_lower.contains("test"));
        let indicators = QualityIndicators::compute(records, &corpus_lower, module_names);
        let patterns = ArchitecturePattern::detect(&corpus_lower);
        let recommendations = recommendations(score, metrics, cycle_count, &indicators);

        Self {
            score,
            indicators,
            patterns,
            recommendations,
        }
    }
}

/// Paths and contents of every record, lower-cased.
fn corpus_lower(records: &[SourceRecord]) -> String {
    let mut corpus = String::new();
    for record in records {
        corpus.push_str(&record.path.to_lowercase());
        corpus.push('\n');
        for line in &record.content {
            corpus.push_str(&line.to_lowercase());
            corpus.push('\n');
        }
    }
    corpus
}

fn health_score(metrics: &Metrics, cycle_count: usize, mentions_tests: bool) -> u32 {
    let mut score: i64 = 100;

    let complexity = metrics.complexity.cyclomatic_complexity;
    if complexity > 10.0 {
        score -= 10;
    } else if complexity > 5.0 {
        score -= 5;
    }

    if metrics.maintainability_index < 50.0 {
        score -= 10;
    } else if metrics.maintainability_index < 70.0 {
        score -= 5;
    }

    match metrics.coupling.level {
        CouplingLevel::High => score -= 10,
        CouplingLevel::Medium => score -= 5,
        CouplingLevel::Low => {}
    }

    score -= (cycle_count as i64 * 2).min(10);

    if !mentions_tests {
        score -= 10;
    }

    score.clamp(0, 100) as u32
}

fn recommendations(
    score: u32,
    metrics: &Metrics,
    cycle_count: usize,
    indicators: &QualityIndicators,
) -> Vec<String> {
    let mut out = Vec::new();
    if score < 70 {
        out.push("Priority: address critical issues to improve codebase health".to_string());
    }
    if metrics.complexity.cyclomatic_complexity > 10.0 {
        out.push("Reduce complexity: refactor complex functions into smaller units".to_string());
    }
    if metrics.coupling.level == CouplingLevel::High {
        out.push("Reduce coupling: introduce interfaces and dependency injection".to_string());
    }
    if cycle_count > 0 {
        out.push(format!(
            "Fix circular dependencies: refactor to break {cycle_count} dependency cycle(s)"
        ));
    }
    if out.is_empty() {
        out.push("Good health: continue following current practices".to_string());
    }
    if indicators.estimated_test_coverage < 50 {
        out.push(format!(
            "Increase test coverage: estimated coverage is {}%",
            indicators.estimated_test_coverage
        ));
    }
    out.truncate(MAX_RECOMMENDATIONS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ComplexityMetrics, CouplingMetrics};

    fn metrics(complexity: f64, mi: f64, level: CouplingLevel) -> Metrics {
        Metrics {
            complexity: ComplexityMetrics {
                cyclomatic_complexity: complexity,
                ..ComplexityMetrics::default()
            },
            maintainability_index: mi,
            coupling: CouplingMetrics {
                level,
                ..CouplingMetrics::default()
            },
            ..Metrics::default()
        }
    }

    #[test]
    fn test_perfect_health() {
        let m = metrics(1.0, 90.0, CouplingLevel::Low);
        assert_eq!(health_score(&m, 0, true), 100);
    }

    #[test]
    fn test_health_deductions() {
        let m = metrics(11.0, 40.0, CouplingLevel::High);
        // -10 complexity, -10 maintainability, -10 coupling, -10 cycles (capped), -10 tests
        assert_eq!(health_score(&m, 7, false), 50);

        let m = metrics(6.0, 60.0, CouplingLevel::Medium);
        // -5, -5, -5, -4 for two cycles
        assert_eq!(health_score(&m, 2, true), 81);
    }

    #[test]
    fn test_detect_patterns() {
        let text = "class UserModel {}\nclass UserView {}\nclass UserController {}\nrepository.save()";
        let patterns = ArchitecturePattern::detect(&text.to_lowercase());
        assert!(patterns.contains(&ArchitecturePattern::Mvc));
        assert!(patterns.contains(&ArchitecturePattern::Repository));
        assert!(!patterns.contains(&ArchitecturePattern::Monolithic));
    }

    #[test]
    fn test_detect_falls_back_to_monolithic() {
        let patterns = ArchitecturePattern::detect("fn main() { println!(\"hi\"); }");
        assert_eq!(patterns, vec![ArchitecturePattern::Monolithic]);
    }

    #[test]
    fn test_service_thresholds() {
        let six = "service ".repeat(6);
        assert!(ArchitecturePattern::detect(&six).contains(&ArchitecturePattern::ServiceOriented));
        let many = format!("{} api", "service ".repeat(21));
        assert!(ArchitecturePattern::detect(&many).contains(&ArchitecturePattern::Microservices));
    }

    #[test]
    fn test_quality_indicators() {
        let records = vec![
            SourceRecord::from_text("src/app.ts", "/** docs */\ntry { run() } catch (e) {}"),
            SourceRecord::from_text("src/app.test.ts", "test('runs', () => {})"),
        ];
        let corpus = corpus_lower(&records);
        let indicators = QualityIndicators::compute(&records, &corpus, &["src.app", "src.app.test"]);
        assert!(indicators.has_tests);
        assert!(indicators.has_docs);
        assert!(indicators.has_error_handling);
        assert!(indicators.uses_typescript);
        assert_eq!(indicators.estimated_test_coverage, 50);
        assert_eq!(indicators.quality_score, 100);
    }

    #[test]
    fn test_recommendations_are_capped() {
        let m = metrics(12.0, 30.0, CouplingLevel::High);
        let indicators = QualityIndicators {
            has_tests: false,
            has_docs: false,
            has_error_handling: false,
            uses_typescript: false,
            estimated_test_coverage: 0,
            quality_score: 70,
        };
        let recs = recommendations(40, &m, 3, &indicators);
        assert_eq!(recs.len(), 5);
        assert!(recs[0].starts_with("Priority"));
        assert!(recs[3].contains("3 dependency cycle"));
        assert!(recs[4].starts_with("Increase test coverage"));
    }

    #[test]
    fn test_good_health_recommendation() {
        let m = metrics(1.0, 95.0, CouplingLevel::Low);
        let indicators = QualityIndicators {
            has_tests: true,
            has_docs: true,
            has_error_handling: true,
            uses_typescript: false,
            estimated_test_coverage: 60,
            quality_score: 95,
        };
        let recs = recommendations(100, &m, 0, &indicators);
        assert_eq!(recs, vec!["Good health: continue following current practices"]);
    }

    #[test]
    fn test_analyze_empty_corpus() {
        let metrics = Metrics::compute(&[], &crate::graph::DependencyGraph::new());
        let report = HealthReport::analyze(&[], &[], &metrics, 0);
        // Only the missing-tests deduction applies
        assert_eq!(report.score, 90);
        assert_eq!(report.patterns, vec![ArchitecturePattern::Monolithic]);
        assert!(!report.indicators.has_tests);
    }
}

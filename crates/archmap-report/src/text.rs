use colored::Colorize;

use archmap_core::{ArchitectureIndex, CouplingLevel, Layer};

/// Number of rows shown in the core and unstable module lists.
const LIST_LIMIT: usize = 5;

/// Format a full index summary for terminal output.
pub fn format_report(index: &ArchitectureIndex) -> String {
    let mut out = String::new();

    // Header
    out.push_str(&format!("\n{}\n", "ArchMap - Codebase Structure".bold()));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    out.push_str(&format_score_section(index.health.score));

    // Stats
    out.push_str(&format!(
        "\n{}: {} files, {} lines, {} modules, {} dependencies\n",
        "Summary".bold(),
        index.stats.file_count,
        index.stats.total_lines,
        index.module_count(),
        index.graph.edge_count(),
    ));

    // Metrics
    let metrics = &index.metrics;
    out.push_str(&format!("\n{}\n{}\n", "Metrics".bold(), "-".repeat(40)));
    out.push_str(&format!(
        "  Cyclomatic complexity: {:.2}\n",
        metrics.complexity.cyclomatic_complexity
    ));
    out.push_str(&format!(
        "  Maintainability index: {:.1}\n",
        metrics.maintainability_index
    ));
    let level = metrics.coupling.level.to_string();
    let level = match metrics.coupling.level {
        CouplingLevel::Low => level.green(),
        CouplingLevel::Medium => level.yellow(),
        CouplingLevel::High => level.red(),
    };
    out.push_str(&format!(
        "  Coupling: {} (avg {:.2}, max {})\n",
        level, metrics.coupling.average_dependencies, metrics.coupling.max_dependencies
    ));
    out.push_str(&format!(
        "  Dependency depth: {}\n",
        index.max_dependency_depth()
    ));

    // Layers
    out.push_str(&format!("\n{}\n", "Layers".bold()));
    for layer in Layer::ALL {
        let count = index.layers.get(&layer).map_or(0, Vec::len);
        out.push_str(&format!("  {layer}: {count}\n"));
    }

    if !index.entry_points.is_empty() {
        out.push_str(&format!(
            "\n{}: {}\n",
            "Entry points".bold(),
            index.entry_points.join(", ")
        ));
    }

    if !index.core_modules.is_empty() {
        out.push_str(&format!("\n{}\n", "Core modules".bold()));
        for name in index.core_modules.iter().take(LIST_LIMIT) {
            out.push_str(&format!(
                "  {name} ({} dependents)\n",
                index.graph.in_degree(name)
            ));
        }
    }

    let unstable = metrics.most_unstable(LIST_LIMIT);
    if !unstable.is_empty() {
        out.push_str(&format!("\n{}\n", "Most unstable".bold()));
        for (name, coupling) in unstable {
            out.push_str(&format!(
                "  {name}: I={:.2} (Ca={}, Ce={})\n",
                coupling.instability, coupling.afferent, coupling.efferent
            ));
        }
    }

    // Cycles
    if index.cycles.is_empty() {
        out.push_str(&format!(
            "\n{}\n",
            "No circular dependencies found!".green().bold()
        ));
    } else {
        out.push_str(&format!(
            "\n{} ({} found)\n{}\n",
            "Circular dependencies".red().bold(),
            index.cycles.len(),
            "-".repeat(40),
        ));
        for cycle in &index.cycles {
            out.push_str(&format!("  {}\n", cycle.join(" -> ")));
        }
    }

    if !index.health.recommendations.is_empty() {
        out.push_str(&format!("\n{}\n", "Recommendations".bold()));
        for rec in &index.health.recommendations {
            out.push_str(&format!("  - {}\n", rec.cyan()));
        }
    }

    out.push('\n');
    out
}

fn format_score_section(score: u32) -> String {
    let score_str = score.to_string();
    let colored_score = if score >= 80 {
        score_str.green()
    } else if score >= 50 {
        score_str.yellow()
    } else {
        score_str.red()
    };
    format!("{}: {}/100\n", "Health Score".bold(), colored_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{acyclic_index, sample_index};

    #[test]
    fn test_format_report_lists_cycle() {
        let report = format_report(&sample_index());
        assert!(report.contains("Health Score"));
        assert!(report.contains("4 files"));
        assert!(report.contains("src.services.api -> src.models.user -> src.services.api"));
        assert!(report.contains("src.services.api (2 dependents)"));
        assert!(report.contains("Entry points"));
    }

    #[test]
    fn test_format_report_without_cycles() {
        let report = format_report(&acyclic_index());
        assert!(report.contains("No circular dependencies found!"));
        assert!(report.contains("presentation: 0"));
    }

    #[test]
    fn test_format_report_empty_index() {
        let index = archmap_core::IndexBuilder::default().build_from_container("");
        let report = format_report(&index);
        assert!(report.contains("0 files"));
        assert!(!report.contains("Core modules"));
    }
}

use archmap_core::{ArchitectureIndex, Layer};

use crate::diagram::generate_dependency_diagram;

/// Architecture overview: stats, file distribution, layers, entry points,
/// core modules, module families and external imports.
pub fn format_overview(index: &ArchitectureIndex) -> String {
    let mut out = String::new();

    out.push_str("# Architecture Overview\n\n");

    let stats = &index.stats;
    out.push_str("## Statistics\n\n");
    out.push_str(&format!("- **Files:** {}\n", stats.file_count));
    out.push_str(&format!("- **Lines:** {}\n", stats.total_lines));
    out.push_str(&format!("- **Modules:** {}\n", index.module_count()));
    out.push_str(&format!("- **Classes:** {}\n", stats.total_classes));
    out.push_str(&format!("- **Functions:** {}\n", stats.total_functions));
    out.push_str(&format!(
        "- **Internal dependencies:** {}\n",
        index.graph.edge_count()
    ));

    if !stats.by_extension.is_empty() {
        out.push_str("\n## File Distribution\n\n");
        out.push_str("| Extension | Files |\n");
        out.push_str("|-----------|-------|\n");
        for (ext, count) in &stats.by_extension {
            let ext = if ext.is_empty() { "(none)" } else { ext.as_str() };
            out.push_str(&format!("| {ext} | {count} |\n"));
        }
    }

    out.push_str("\n## Layers\n\n");
    let mut any_layer = false;
    for layer in Layer::ALL {
        let Some(members) = index.layers.get(&layer).filter(|m| !m.is_empty()) else {
            continue;
        };
        any_layer = true;
        out.push_str(&format!("### {} ({})\n\n", title(layer), members.len()));
        for name in members {
            out.push_str(&format!("- `{name}`\n"));
        }
        out.push('\n');
    }
    if !any_layer {
        out.push_str("No modules matched a layer keyword.\n\n");
    }

    out.push_str("## Entry Points\n\n");
    if index.entry_points.is_empty() {
        out.push_str("None detected.\n");
    } else {
        for name in &index.entry_points {
            out.push_str(&format!("- `{name}`\n"));
        }
    }

    if !index.core_modules.is_empty() {
        out.push_str("\n## Core Modules\n\n");
        out.push_str("| Module | Dependents | Dependencies |\n");
        out.push_str("|--------|------------|--------------|\n");
        for name in &index.core_modules {
            out.push_str(&format!(
                "| `{name}` | {} | {} |\n",
                index.graph.in_degree(name),
                index.graph.out_degree(name)
            ));
        }
    }

    if !index.module_families.is_empty() {
        out.push_str("\n## Module Families\n\n");
        out.push_str("| Family | Modules |\n");
        out.push_str("|--------|---------|\n");
        for (family, members) in &index.module_families {
            out.push_str(&format!("| {family} | {} |\n", members.len()));
        }
    }

    if !index.external_dependencies.is_empty() {
        out.push_str("\n## External Dependencies\n\n");
        out.push_str("| Import | Uses |\n");
        out.push_str("|--------|------|\n");
        for (import, count) in &index.external_dependencies {
            out.push_str(&format!("| `{import}` | {count} |\n"));
        }
    }

    if index.graph.edge_count() > 0 {
        out.push_str("\n## Dependency Diagram\n\n```mermaid\n");
        out.push_str(&generate_dependency_diagram(index));
        out.push_str("```\n");
    }

    out.push('\n');
    out
}

/// Health report: score, metrics, quality indicators, detected patterns,
/// circular dependencies and recommendations.
pub fn format_health(index: &ArchitectureIndex) -> String {
    let mut out = String::new();
    let health = &index.health;
    let metrics = &index.metrics;

    out.push_str("# Codebase Health Report\n\n");
    out.push_str(&format!(
        "**Overall Health Score: {}/100**\n\n",
        health.score
    ));

    out.push_str("## Metrics\n\n");
    out.push_str("| Metric | Value |\n");
    out.push_str("|--------|-------|\n");
    out.push_str(&format!(
        "| Cyclomatic Complexity | {:.2} |\n",
        metrics.complexity.cyclomatic_complexity
    ));
    out.push_str(&format!(
        "| Maintainability Index | {:.1} |\n",
        metrics.maintainability_index
    ));
    out.push_str(&format!("| Coupling Level | {} |\n", metrics.coupling.level));
    out.push_str(&format!(
        "| Average Dependencies | {:.2} |\n",
        metrics.coupling.average_dependencies
    ));
    out.push_str(&format!(
        "| Max Dependencies | {} |\n",
        metrics.coupling.max_dependencies
    ));
    out.push_str(&format!(
        "| Max Dependency Depth | {} |\n",
        index.max_dependency_depth()
    ));

    let complexity = &metrics.complexity;
    out.push_str(&format!(
        "\n**Decision points:** {} conditionals, {} loops, {} switches, {} exception handlers\n",
        complexity.total_conditionals,
        complexity.total_loops,
        complexity.total_switches,
        complexity.total_exceptions
    ));

    let indicators = &health.indicators;
    out.push_str("\n## Quality Indicators\n\n");
    out.push_str(&format!("- **Tests:** {}\n", yes_no(indicators.has_tests)));
    out.push_str(&format!(
        "- **Documentation:** {}\n",
        yes_no(indicators.has_docs)
    ));
    out.push_str(&format!(
        "- **Error handling:** {}\n",
        yes_no(indicators.has_error_handling)
    ));
    out.push_str(&format!(
        "- **TypeScript:** {}\n",
        yes_no(indicators.uses_typescript)
    ));
    out.push_str(&format!(
        "- **Estimated test coverage:** {}%\n",
        indicators.estimated_test_coverage
    ));
    out.push_str(&format!(
        "- **Quality score:** {}/100\n",
        indicators.quality_score
    ));

    out.push_str("\n## Detected Patterns\n\n");
    for pattern in &health.patterns {
        out.push_str(&format!("- **{pattern}**: {}\n", pattern.description()));
    }

    out.push_str("\n## Circular Dependencies\n\n");
    if index.cycles.is_empty() {
        out.push_str("No circular dependencies found.\n");
    } else {
        for cycle in &index.cycles {
            out.push_str(&format!("- {}\n", cycle.join(" → ")));
        }

        // Every module caught in a cycle, including ones the DFS did not report.
        out.push_str("\n### Strongly Connected Regions\n\n");
        for region in index.strongly_connected_regions() {
            let members: Vec<String> = region.iter().map(|m| format!("`{m}`")).collect();
            out.push_str(&format!(
                "- {} modules: {}\n",
                region.len(),
                members.join(", ")
            ));
        }
    }

    let unstable = metrics.most_unstable(10);
    if !unstable.is_empty() {
        out.push_str("\n## Most Unstable Modules\n\n");
        out.push_str("| Module | Ca | Ce | Instability |\n");
        out.push_str("|--------|----|----|-------------|\n");
        for (name, coupling) in unstable {
            out.push_str(&format!(
                "| `{name}` | {} | {} | {:.2} |\n",
                coupling.afferent, coupling.efferent, coupling.instability
            ));
        }
    }

    out.push_str("\n## Recommendations\n\n");
    for (i, rec) in health.recommendations.iter().enumerate() {
        out.push_str(&format!("{}. {rec}\n", i + 1));
    }

    out.push('\n');
    out
}

fn title(layer: Layer) -> String {
    let name = layer.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

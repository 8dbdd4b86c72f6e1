use std::collections::HashSet;

use archmap_core::{ArchitectureIndex, Layer};

const STACK_WIDTH: usize = 40;

/// Generate a Mermaid flowchart with layers as subgraphs. Edges that take
/// part in a reported cycle are drawn dashed.
///
/// Subgraph ids carry a `layer_` prefix so a module named after a layer
/// (`shared.ts`) never shares an id with the subgraph that contains it.
pub fn generate_dependency_diagram(index: &ArchitectureIndex) -> String {
    let mut out = String::new();
    out.push_str("flowchart TB\n");

    let mut classified: HashSet<&str> = HashSet::new();
    for layer in Layer::ALL {
        let Some(members) = index.layers.get(&layer).filter(|m| !m.is_empty()) else {
            continue;
        };
        out.push_str(&format!("  subgraph layer_{layer}[\"{layer}\"]\n"));
        for name in members {
            classified.insert(name.as_str());
            out.push_str(&format!("    {}[\"{name}\"]\n", sanitize_mermaid_id(name)));
        }
        out.push_str("  end\n");
    }

    let unclassified: Vec<&str> = index
        .modules
        .iter()
        .map(|m| m.name.as_str())
        .filter(|name| !classified.contains(name))
        .collect();
    if !unclassified.is_empty() {
        out.push_str("  subgraph layer_unclassified[\"unclassified\"]\n");
        for name in unclassified {
            out.push_str(&format!("    {}[\"{name}\"]\n", sanitize_mermaid_id(name)));
        }
        out.push_str("  end\n");
    }

    let in_cycle = cycle_edges(&index.cycles);
    for (from, to) in index.graph.edges() {
        let from_id = sanitize_mermaid_id(from);
        let to_id = sanitize_mermaid_id(to);
        if in_cycle.contains(&(from, to)) {
            out.push_str(&format!("  {from_id} -.->|cycle| {to_id}\n"));
        } else {
            out.push_str(&format!("  {from_id} --> {to_id}\n"));
        }
    }

    out
}

/// Generate a Mermaid flowchart centred on one module: what it imports and
/// what imports it. `None` when the module is unknown.
pub fn generate_module_diagram(index: &ArchitectureIndex, name: &str) -> Option<String> {
    index.module(name)?;

    let mut out = String::new();
    out.push_str("flowchart LR\n");
    let id = sanitize_mermaid_id(name);
    out.push_str(&format!("  {id}[\"{name}\"]\n"));
    out.push_str(&format!(
        "  style {id} fill:#ffeb3b,stroke:#f57f17,stroke-width:3px\n"
    ));

    for dep in index.dependencies(name) {
        if dep == name {
            continue;
        }
        out.push_str(&format!(
            "  {id} --> {}[\"{dep}\"]\n",
            sanitize_mermaid_id(dep)
        ));
    }
    for dependent in index.dependents(name) {
        if dependent == name {
            continue;
        }
        out.push_str(&format!(
            "  {}[\"{dependent}\"] --> {id}\n",
            sanitize_mermaid_id(dependent)
        ));
    }

    Some(out)
}

/// ASCII stack of the five layers, top to bottom, with module counts.
pub fn generate_layer_stack(index: &ArchitectureIndex) -> String {
    let border = format!("+{}+\n", "-".repeat(STACK_WIDTH));
    let mut out = border.clone();

    let mut classified = 0;
    for layer in Layer::ALL {
        let count = index.layers.get(&layer).map_or(0, Vec::len);
        classified += count;
        out.push_str(&stack_row(&format!("{layer} ({count})")));
        out.push_str(&border);
    }

    let unclassified = index.module_count().saturating_sub(classified);
    if unclassified > 0 {
        out.push_str(&stack_row(&format!("unclassified ({unclassified})")));
        out.push_str(&border);
    }
    out
}

fn stack_row(label: &str) -> String {
    format!("| {label:<width$} |\n", width = STACK_WIDTH - 2)
}

/// Consecutive module pairs of every reported cycle.
pub(crate) fn cycle_edges(cycles: &[Vec<String>]) -> HashSet<(&str, &str)> {
    cycles
        .iter()
        .flat_map(|cycle| cycle.windows(2))
        .map(|pair| (pair[0].as_str(), pair[1].as_str()))
        .collect()
}

/// Sanitize a string to be a valid Mermaid node ID.
fn sanitize_mermaid_id(s: &str) -> String {
    s.replace("::", "_")
        .replace(['/', '.', '-', ' ', '@'], "_")
        .replace(['<', '>', '"'], "")
}

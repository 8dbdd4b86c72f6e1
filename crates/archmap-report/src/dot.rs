use std::collections::HashSet;

use archmap_core::{ArchitectureIndex, Layer};

use crate::diagram::cycle_edges;

fn layer_color(layer: Layer) -> &'static str {
    match layer {
        Layer::Presentation => "#fce4ec",
        Layer::Business => "#e3f2fd",
        Layer::Data => "#e8f5e9",
        Layer::Infrastructure => "#fff3e0",
        Layer::Shared => "#f3e5f5",
    }
}

/// Generate a GraphViz DOT diagram with one cluster per layer.
pub fn generate_dependency_graph(index: &ArchitectureIndex) -> String {
    let mut out = String::new();
    out.push_str("digraph archmap {\n");
    out.push_str("  rankdir=TB;\n");
    out.push_str("  node [shape=box, style=filled];\n\n");

    let mut classified: HashSet<&str> = HashSet::new();
    for layer in Layer::ALL {
        let Some(members) = index.layers.get(&layer).filter(|m| !m.is_empty()) else {
            continue;
        };
        out.push_str(&format!("  subgraph cluster_{layer} {{\n"));
        out.push_str(&format!("    label=\"{layer}\";\n"));
        out.push_str("    style=filled;\n");
        out.push_str(&format!("    color=\"{}\";\n", layer_color(layer)));
        out.push_str("    node [fillcolor=white];\n");
        for name in members {
            classified.insert(name.as_str());
            out.push_str(&format!("    {} [label=\"{name}\"];\n", sanitize_dot_id(name)));
        }
        out.push_str("  }\n\n");
    }

    let unclassified: Vec<&str> = index
        .modules
        .iter()
        .map(|m| m.name.as_str())
        .filter(|name| !classified.contains(name))
        .collect();
    if !unclassified.is_empty() {
        out.push_str("  subgraph cluster_unclassified {\n");
        out.push_str("    label=\"unclassified\";\n");
        out.push_str("    style=dashed;\n");
        out.push_str("    node [fillcolor=white];\n");
        for name in unclassified {
            out.push_str(&format!("    {} [label=\"{name}\"];\n", sanitize_dot_id(name)));
        }
        out.push_str("  }\n\n");
    }

    let in_cycle = cycle_edges(&index.cycles);
    for (from, to) in index.graph.edges() {
        let from_id = sanitize_dot_id(from);
        let to_id = sanitize_dot_id(to);
        if in_cycle.contains(&(from, to)) {
            out.push_str(&format!(
                "  {from_id} -> {to_id} [color=red, style=dashed, label=\"cycle\"];\n"
            ));
        } else {
            out.push_str(&format!("  {from_id} -> {to_id};\n"));
        }
    }

    out.push_str("}\n");
    out
}

/// Sanitize a string to be a valid DOT node ID.
fn sanitize_dot_id(s: &str) -> String {
    let id: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n_{id}")
    } else {
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{acyclic_index, sample_index};

    #[test]
    fn test_generate_dependency_graph() {
        let dot = generate_dependency_graph(&sample_index());
        assert!(dot.starts_with("digraph archmap {"));
        assert!(dot.contains("subgraph cluster_presentation"));
        assert!(dot.contains("subgraph cluster_data"));
        assert!(dot.contains("subgraph cluster_unclassified"));
        assert!(dot.contains("src_index [label=\"src.index\"];"));
        assert!(dot.contains("src_index -> src_components_Header;"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_cycle_edges_marked() {
        let dot = generate_dependency_graph(&sample_index());
        assert!(dot.contains(
            "src_services_api -> src_models_user [color=red, style=dashed, label=\"cycle\"];"
        ));

        let acyclic = generate_dependency_graph(&acyclic_index());
        assert!(!acyclic.contains("color=red"));
        assert!(acyclic.contains("a -> b;"));
    }

    #[test]
    fn test_sanitize_dot_id() {
        assert_eq!(sanitize_dot_id("src.models.user"), "src_models_user");
        assert_eq!(sanitize_dot_id("2fa.handler"), "n_2fa_handler");
    }
}

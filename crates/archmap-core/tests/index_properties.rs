use std::collections::BTreeSet;

use archmap_core::{
    consolidate, parse_container, CouplingLevel, FileTreeAdapter, IndexBuilder, ScanConfig,
    SourceRecord,
};

fn block(path: &str, body: &str) -> String {
    format!("filepath:///{path} /// /// ///\nfile code{{\n{body}\n}}\n\n")
}

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {path}: {e}"))
}

fn edge_set(index: &archmap_core::ArchitectureIndex) -> BTreeSet<(String, String)> {
    index
        .graph
        .edges()
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

#[test]
fn file_count_matches_header_lines() {
    let container = fixture("shop.container");
    let headers = container
        .lines()
        .filter(|l| l.starts_with("filepath:///"))
        .count();

    let index = IndexBuilder::default().build_from_container(&container);
    assert_eq!(index.stats.file_count, headers);
}

#[test]
fn round_trip_preserves_paths_and_sizes() {
    let inputs = vec![
        SourceRecord::from_text("src/app.ts", "import { api } from './api';\nrun(api);\n"),
        SourceRecord::from_text("src/api.ts", "export const api = {};\n"),
        SourceRecord::from_text("lib/util.py", "def helper():\n    if x:\n        return 1\n    return 2\n"),
        SourceRecord::from_text("README.md", "# Title\n\nSome } text\n}\n"),
    ];
    let container = consolidate(&inputs);
    let index = IndexBuilder::default().build_from_container(&container);

    assert_eq!(index.module_count(), inputs.len());
    for input in &inputs {
        let module = index
            .modules
            .iter()
            .find(|m| m.path == input.path)
            .unwrap_or_else(|| panic!("no module for {}", input.path));
        assert_eq!(module.size, input.line_count(), "size of {}", input.path);
    }
}

#[test]
fn indexing_is_idempotent() {
    let container = fixture("shop.container");
    let builder = IndexBuilder::default();
    let first = builder.build_from_container(&container);
    let second = builder.build_from_container(&container);

    let names = |index: &archmap_core::ArchitectureIndex| -> BTreeSet<String> {
        index.modules.iter().map(|m| m.name.clone()).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(edge_set(&first), edge_set(&second));
    assert_eq!(first.cycles, second.cycles);
}

#[test]
fn three_module_cycle_scenario() {
    let container = [
        block("a.ts", "import './b'"),
        block("b.ts", "import './c'"),
        block("c.ts", "import './a'"),
    ]
    .concat();
    let index = IndexBuilder::default().build_from_container(&container);

    assert_eq!(index.module_count(), 3);
    let expected: BTreeSet<(String, String)> = [("a", "b"), ("b", "c"), ("c", "a")]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    assert_eq!(edge_set(&index), expected);
    assert_eq!(index.cycles, vec![vec!["a", "b", "c", "a"]]);
    assert_eq!(index.metrics.coupling.level, CouplingLevel::Low);
}

#[test]
fn acyclic_chain_has_no_cycles() {
    let container = [
        block("a.ts", "import './b'"),
        block("b.ts", "import './c'"),
        block("c.ts", "export const c = 1;"),
    ]
    .concat();
    let index = IndexBuilder::default().build_from_container(&container);

    assert!(index.cycles.is_empty());
    assert_eq!(index.max_dependency_depth(), 2);
}

#[test]
fn instability_bounds_hold() {
    let index = IndexBuilder::default().build_from_container(&fixture("shop.container"));
    assert!(!index.metrics.modules.is_empty());
    for (name, coupling) in &index.metrics.modules {
        assert!(
            (0.0..=1.0).contains(&coupling.instability),
            "{name} has instability {}",
            coupling.instability
        );
        if coupling.afferent == 0 && coupling.efferent > 0 {
            assert_eq!(coupling.instability, 1.0, "{name}");
        }
        if coupling.efferent == 0 {
            assert_eq!(coupling.instability, 0.0, "{name}");
        }
    }
}

#[test]
fn missing_closing_marker_keeps_collected_content() {
    let container = format!(
        "{}filepath:///last.py /// /// ///\nfile code{{\nimport os\n\ndef run():\n    pass\n",
        block("first.py", "x = 1")
    );
    let index = IndexBuilder::default().build_from_container(&container);

    assert_eq!(index.module_count(), 2);
    let last = index.module("last").expect("last module");
    assert_eq!(last.size, 4);
    assert_eq!(last.functions, vec!["run"]);
    assert_eq!(last.imports, vec!["os"]);
}

#[test]
fn self_import_keeps_self_edge() {
    let index =
        IndexBuilder::default().build_from_container(&block("loop.js", "const me = require('./loop');"));

    assert_eq!(index.dependencies("loop"), vec!["loop"]);
    let coupling = index.coupling("loop").expect("coupling");
    assert_eq!((coupling.afferent, coupling.efferent), (1, 1));
    assert_eq!(index.cycles, vec![vec!["loop", "loop"]]);
}

#[test]
fn empty_input_yields_neutral_index() {
    for text in ["", "just some text\nwith no headers\n"] {
        let index = IndexBuilder::default().build_from_container(text);
        assert!(index.is_empty());
        assert_eq!(index.stats.file_count, 0);
        assert!(index.graph.edges().is_empty());
        assert!(index.entry_points.is_empty());
        assert!(index.core_modules.is_empty());
        assert_eq!(index.metrics.coupling.level, CouplingLevel::Low);
    }
}

#[test]
fn fixture_structure() {
    let index = IndexBuilder::default().build_from_container(&fixture("shop.container"));

    assert_eq!(index.core_modules.first().map(String::as_str), Some("src.models.product"));
    assert!(index.entry_points.contains(&"src.index".to_string()));
    assert_eq!(index.external_dependencies.get("express"), Some(&1));
    assert_eq!(
        index.cycles,
        vec![vec![
            "src.services.cart".to_string(),
            "src.services.pricing".to_string(),
            "src.services.cart".to_string()
        ]]
    );
}

#[test]
fn file_tree_and_container_agree() {
    let dir = tempfile::tempdir().unwrap();
    let records = parse_container(&fixture("shop.container"));
    for record in &records {
        let path = dir.path().join(&record.path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, record.text()).unwrap();
    }

    let builder = IndexBuilder::default();
    let adapter = FileTreeAdapter::new(dir.path(), ScanConfig::default());
    let from_tree = builder.build_from_adapter(&adapter).unwrap();
    let from_text = builder.build_from_container(&fixture("shop.container"));

    assert_eq!(from_tree.module_count(), from_text.module_count());
    assert_eq!(edge_set(&from_tree), edge_set(&from_text));
}

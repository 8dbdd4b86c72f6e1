use std::path::Path;
use std::process::{Command, Output};

fn archmap_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_archmap"))
}

fn run(args: &[&str], cwd: &Path) -> Output {
    archmap_cmd()
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run archmap")
}

fn write_project(root: &Path) {
    let files = [
        (
            "src/index.ts",
            "import { cart } from './services/cart';\n\ncart();\n",
        ),
        (
            "src/services/cart.ts",
            "import { price } from './pricing';\n\nexport function cart() {\n  return price();\n}\n",
        ),
        (
            "src/services/pricing.ts",
            "import { cart } from './cart';\n\nexport function price() {\n  return 1;\n}\n",
        ),
        (
            "src/models/product.ts",
            "export class Product {\n  constructor(public name: string) {}\n}\n",
        ),
    ];
    for (path, content) in files {
        let target = root.join(path);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(target, content).unwrap();
    }
}

#[test]
fn test_analyze_directory_text_report() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = run(&["analyze", "."], dir.path());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "archmap analyze failed: stdout={stdout}, stderr={stderr}"
    );
    assert!(stdout.contains("Health Score"), "should contain score: {stdout}");
    assert!(stdout.contains("4 files"), "should count files: {stdout}");
    assert!(
        stdout.contains("src.services.cart -> src.services.pricing -> src.services.cart"),
        "should list the cycle: {stdout}"
    );
}

#[test]
fn test_consolidate_then_analyze_container() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    write_project(&project);

    let output = run(
        &["consolidate", "project", "-o", "codebase.txt"],
        dir.path(),
    );
    assert!(
        output.status.success(),
        "consolidate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let container = std::fs::read_to_string(dir.path().join("codebase.txt")).unwrap();
    assert_eq!(container.matches("filepath:///").count(), 4);
    assert!(container.contains("filepath:///src/services/cart.ts /// /// ///"));

    let output = run(
        &["analyze", "codebase.txt", "--format", "json"],
        dir.path(),
    );
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("analyze --format json should be JSON");
    assert_eq!(parsed["stats"]["file_count"], 4);
    assert_eq!(parsed["core_modules"][0], "src.services.cart");
    assert!(parsed.get("generated_at").is_some());
}

#[test]
fn test_consolidate_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = run(&["consolidate", "."], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("filepath:///src/index.ts /// /// ///\nfile code{\n"));
}

#[test]
fn test_analyze_output_formats() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let cases = [
        ("markdown", "# Architecture Overview"),
        ("health", "# Codebase Health Report"),
        ("mermaid", "flowchart TB"),
        ("dot", "digraph archmap {"),
        ("layers", "| business (2)"),
    ];
    for (format, expected) in cases {
        let output = run(&["analyze", ".", "--format", format], dir.path());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(output.status.success(), "format {format} failed");
        assert!(
            stdout.contains(expected),
            "format {format} should contain {expected:?}: {stdout}"
        );
    }
}

#[test]
fn test_module_diagram() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = run(
        &["analyze", ".", "--format", "mermaid", "--module", "src.services.cart"],
        dir.path(),
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("flowchart LR"));
    assert!(stdout.contains("src_index[\"src.index\"] --> src_services_cart"));

    let output = run(
        &["analyze", ".", "--format", "mermaid", "--module", "nope"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("module 'nope' not found"));
}

#[test]
fn test_top_limits_core_modules() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = run(
        &["analyze", ".", "--format", "json", "--top", "1", "--compact"],
        dir.path(),
    );
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["core_modules"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_report_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    write_project(&project);

    let output = run(&["report", "project", "-o", "out"], dir.path());
    assert!(
        output.status.success(),
        "report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    for name in ["overview.md", "health.md", "dependencies.mmd", "architecture.json"] {
        assert!(dir.path().join("out").join(name).exists(), "{name} missing");
    }
    let health = std::fs::read_to_string(dir.path().join("out/health.md")).unwrap();
    assert!(health.contains("## Circular Dependencies"));
}

#[test]
fn test_init_creates_config() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(&["init"], dir.path());
    assert!(output.status.success(), "init should succeed");

    let config_path = dir.path().join(".archmap.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[index]"));
    assert!(content.contains("[layers]"));
    assert!(content.contains("[scan]"));
    assert!(content.contains("svelte"), "init should list every default extension");
    assert!(content.contains("__pycache__"), "init should list every default excluded dir");

    let output = run(&["init"], dir.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));

    let output = run(&["init", "--force"], dir.path());
    assert!(output.status.success());
}

#[test]
fn test_config_changes_layers() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    std::fs::write(
        dir.path().join("custom.toml"),
        "[layers]\nbusiness = []\ndata = [\"services\"]\n",
    )
    .unwrap();

    let output = run(
        &["analyze", ".", "--format", "layers", "--config", "custom.toml"],
        dir.path(),
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("| business (0)"), "{stdout}");
    assert!(stdout.contains("| data (2)"), "{stdout}");
}

#[test]
fn test_missing_path_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(&["analyze", "does-not-exist"], dir.path());
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("does not exist"), "{stderr}");
}

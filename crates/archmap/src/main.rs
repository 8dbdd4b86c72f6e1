use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use archmap_core::config::CONFIG_FILE;
use archmap_core::{
    consolidate, ArchitectureIndex, Config, FileTreeAdapter, IndexBuilder, SourceAdapter,
    SyntaxExtractor,
};
use archmap_report::{diagram, dot, json, markdown, text};
use archmap_typescript::TypeScriptExtractor;

#[derive(Parser)]
#[command(name = "archmap")]
#[command(about = "Index a codebase's structure: dependencies, layers, coupling and health")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory or a consolidated container file and print a report
    Analyze {
        /// Project directory or container file
        path: PathBuf,
        /// Config file path (defaults to .archmap.toml found from the project upward)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Number of core modules to report (overrides config)
        #[arg(long)]
        top: Option<usize>,
        /// Focus the Mermaid diagram on one module
        #[arg(long)]
        module: Option<String>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Write the overview, health report, diagram and JSON index into a directory
    Report {
        /// Project directory or container file
        path: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "archmap-report")]
        output: PathBuf,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Concatenate a directory into the consolidated container format
    Consolidate {
        /// Project directory
        dir: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Create a default .archmap.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Health,
    Json,
    Mermaid,
    Dot,
    Layers,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            path,
            config,
            format,
            top,
            module,
            compact,
        } => cmd_analyze(
            &path,
            config.as_deref(),
            format,
            top,
            module.as_deref(),
            compact,
        ),
        Commands::Report {
            path,
            output,
            config,
        } => cmd_report(&path, &output, config.as_deref()),
        Commands::Consolidate {
            dir,
            output,
            config,
        } => cmd_consolidate(&dir, output.as_deref(), config.as_deref()),
        Commands::Init { force } => cmd_init(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_analyze(
    path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
    top: Option<usize>,
    module: Option<&str>,
    compact: bool,
) -> Result<()> {
    let mut config = load_config(path, config_path)?;
    if let Some(top) = top {
        config.index.core_module_limit = top;
    }
    let index = run_index(path, config)?;

    let report = match format {
        OutputFormat::Text => text::format_report(&index),
        OutputFormat::Markdown => markdown::format_overview(&index),
        OutputFormat::Health => markdown::format_health(&index),
        OutputFormat::Json => json::format_index(&index, compact)?,
        OutputFormat::Mermaid => match module {
            Some(name) => diagram::generate_module_diagram(&index, name)
                .with_context(|| format!("module '{name}' not found in index"))?,
            None => diagram::generate_dependency_diagram(&index),
        },
        OutputFormat::Dot => dot::generate_dependency_graph(&index),
        OutputFormat::Layers => diagram::generate_layer_stack(&index),
    };
    print!("{report}");
    if matches!(format, OutputFormat::Json) {
        println!();
    }
    Ok(())
}

fn cmd_report(path: &Path, output: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(path, config_path)?;
    let index = run_index(path, config)?;

    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let files = [
        ("overview.md", markdown::format_overview(&index)),
        ("health.md", markdown::format_health(&index)),
        ("dependencies.mmd", diagram::generate_dependency_diagram(&index)),
        ("architecture.json", json::format_index(&index, false)?),
    ];
    for (name, content) in &files {
        let target = output.join(name);
        std::fs::write(&target, content)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }

    println!(
        "{} {} reports for {} modules to {}",
        "Wrote".green().bold(),
        files.len(),
        index.module_count(),
        output.display()
    );
    Ok(())
}

fn cmd_consolidate(dir: &Path, output: Option<&Path>, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(dir, config_path)?;
    let adapter = FileTreeAdapter::new(dir, config.scan);
    let records = adapter.records()?;
    let container = consolidate(&records);

    match output {
        Some(target) => {
            std::fs::write(target, &container)
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!(
                "Consolidated {} files into {}",
                records.len(),
                target.display()
            );
        }
        None => print!("{container}"),
    }
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml()?)
        .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
    println!("Created {CONFIG_FILE} with default configuration.");
    Ok(())
}

fn load_config(project_path: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => {
            let search_from = if project_path.is_dir() {
                project_path
            } else {
                project_path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new("."))
            };
            Ok(Config::load_or_default(search_from))
        }
    }
}

fn syntax_extractors() -> Vec<Box<dyn SyntaxExtractor>> {
    match TypeScriptExtractor::new() {
        Ok(extractor) => vec![Box::new(extractor)],
        Err(e) => {
            tracing::warn!("TypeScript syntax pass unavailable: {e:#}");
            Vec::new()
        }
    }
}

fn run_index(path: &Path, config: Config) -> Result<ArchitectureIndex> {
    if !path.exists() {
        anyhow::bail!("path '{}' does not exist", path.display());
    }

    if path.is_dir() {
        let adapter = FileTreeAdapter::new(path, config.scan.clone());
        let builder = IndexBuilder::new(syntax_extractors(), config);
        builder.build_from_adapter(&adapter)
    } else {
        let container = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read container {}", path.display()))?;
        let builder = IndexBuilder::new(syntax_extractors(), config);
        Ok(builder.build_from_container(&container))
    }
}

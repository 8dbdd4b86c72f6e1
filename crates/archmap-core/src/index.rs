use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde::Serialize;

use crate::analyzer::{Extraction, SyntaxExtractor};
use crate::config::Config;
use crate::extract::HeuristicExtractor;
use crate::graph::DependencyGraph;
use crate::health::HealthReport;
use crate::ingest::{derive_module_name, parse_container, SourceAdapter};
use crate::layer::LayerClassifier;
use crate::metrics::{Metrics, ModuleCoupling};
use crate::types::{Layer, ModuleInfo, SourceRecord};

/// Corpus-level counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of file blocks read, duplicates included.
    pub file_count: usize,
    pub total_lines: usize,
    pub total_classes: usize,
    pub total_functions: usize,
    /// Files per extension; `""` for files without one.
    pub by_extension: BTreeMap<String, usize>,
    /// Parent directory -> module names; `"."` for top-level files.
    pub by_directory: BTreeMap<String, Vec<String>>,
}

/// Structural index of one codebase snapshot. Built once by [`IndexBuilder`]
/// and never mutated afterwards.
#[derive(Serialize)]
pub struct ArchitectureIndex {
    /// In first-seen order. A later file with the same module name replaces
    /// the earlier one in place.
    pub modules: Vec<ModuleInfo>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
    pub graph: DependencyGraph,
    pub metrics: Metrics,
    pub cycles: Vec<Vec<String>>,
    pub layers: BTreeMap<Layer, Vec<String>>,
    pub entry_points: Vec<String>,
    pub core_modules: Vec<String>,
    pub module_families: BTreeMap<String, Vec<String>>,
    pub stats: IndexStats,
    /// Unresolved import strings and how often they appear.
    pub external_dependencies: BTreeMap<String, usize>,
    /// Class names, and capitalised function names, to the file defining them.
    pub component_map: BTreeMap<String, String>,
    pub health: HealthReport,
}

impl ArchitectureIndex {
    pub fn module(&self, name: &str) -> Option<&ModuleInfo> {
        self.lookup.get(name).map(|&i| &self.modules[i])
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.graph.dependencies(name)
    }

    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.graph.dependents(name)
    }

    pub fn coupling(&self, name: &str) -> Option<&ModuleCoupling> {
        self.metrics.module(name)
    }

    pub fn layer_of(&self, name: &str) -> Option<Layer> {
        self.layers
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == name))
            .map(|(layer, _)| *layer)
    }

    /// Modules whose name contains `term`, case-insensitively.
    pub fn find_modules(&self, term: &str) -> Vec<&ModuleInfo> {
        let term = term.to_lowercase();
        self.modules
            .iter()
            .filter(|m| m.name.to_lowercase().contains(&term))
            .collect()
    }

    pub fn strongly_connected_regions(&self) -> Vec<Vec<String>> {
        self.graph.strongly_connected_regions()
    }

    pub fn max_dependency_depth(&self) -> usize {
        self.graph.max_dependency_depth()
    }
}

/// Builds [`ArchitectureIndex`] values. Holds no state between builds.
pub struct IndexBuilder {
    extractors: Vec<Box<dyn SyntaxExtractor>>,
    heuristics: HeuristicExtractor,
    classifier: LayerClassifier,
    config: Config,
}

impl IndexBuilder {
    pub fn new(extractors: Vec<Box<dyn SyntaxExtractor>>, config: Config) -> Self {
        let classifier = LayerClassifier::new(&config.layers);
        Self {
            extractors,
            heuristics: HeuristicExtractor::new(),
            classifier,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Index a consolidated container. Never fails; malformed blocks degrade
    /// to truncated or empty modules.
    pub fn build_from_container(&self, text: &str) -> ArchitectureIndex {
        self.build(parse_container(text))
    }

    /// Index whatever `adapter` yields. Only the adapter itself can fail.
    pub fn build_from_adapter(&self, adapter: &dyn SourceAdapter) -> Result<ArchitectureIndex> {
        let records = adapter.records()?;
        tracing::info!("indexing {} files from {}", records.len(), adapter.describe());
        Ok(self.build(records))
    }

    pub fn build(&self, records: Vec<SourceRecord>) -> ArchitectureIndex {
        let mut modules: Vec<ModuleInfo> = Vec::new();
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut stats = IndexStats {
            file_count: records.len(),
            ..IndexStats::default()
        };

        for record in &records {
            stats.total_lines += record.line_count();
            *stats
                .by_extension
                .entry(record.extension.clone())
                .or_insert(0) += 1;

            let module = self.module_info(record);
            match lookup.get(&module.name) {
                Some(&i) => {
                    tracing::debug!("module '{}' redefined by {}", module.name, record.path);
                    modules[i] = module;
                }
                None => {
                    lookup.insert(module.name.clone(), modules.len());
                    modules.push(module);
                }
            }
        }

        let (graph, external_dependencies) = DependencyGraph::build(&modules);
        let metrics = Metrics::compute(&records, &graph);
        let cycles = graph.find_cycles();
        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        let health = HealthReport::analyze(&records, &names, &metrics, cycles.len());

        stats.total_classes = modules.iter().map(|m| m.classes.len()).sum();
        stats.total_functions = modules.iter().map(|m| m.functions.len()).sum();
        for module in &modules {
            stats
                .by_directory
                .entry(parent_directory(&module.path))
                .or_default()
                .push(module.name.clone());
        }

        let layers = self.classifier.classify_all(&modules);
        let entry_points = self.entry_points(&modules);
        let core_modules = core_modules(&modules, &graph, self.config.index.core_module_limit);
        let module_families = module_families(&modules);
        let component_map = component_map(&modules);

        tracing::info!(
            "indexed {} modules, {} edges, {} cycles",
            modules.len(),
            graph.edge_count(),
            cycles.len()
        );

        ArchitectureIndex {
            modules,
            lookup,
            graph,
            metrics,
            cycles,
            layers,
            entry_points,
            core_modules,
            module_families,
            stats,
            external_dependencies,
            component_map,
            health,
        }
    }

    fn module_info(&self, record: &SourceRecord) -> ModuleInfo {
        let extraction = self.extract(record);
        let name = match derive_module_name(&record.path) {
            name if name.is_empty() => record.path.clone(),
            name => name,
        };
        ModuleInfo {
            name,
            path: record.path.clone(),
            imports: extraction.imports,
            exports: extraction.exports,
            classes: extraction.classes,
            functions: extraction.functions,
            size: record.line_count(),
        }
    }

    /// Syntax pass first when enabled, falling back to the heuristics.
    fn extract(&self, record: &SourceRecord) -> Extraction {
        if self.config.index.syntax_pass {
            if let Some(extractor) = self.extractors.iter().find(|e| e.supports(record)) {
                match extractor.extract(record) {
                    Ok(extraction) => return extraction,
                    Err(e) => tracing::debug!(
                        "{} extractor failed on {}: {e:#}; using heuristics",
                        extractor.name(),
                        record.path
                    ),
                }
            }
        }
        self.heuristics.extract(record)
    }

    fn entry_points(&self, modules: &[ModuleInfo]) -> Vec<String> {
        let keywords: Vec<String> = self
            .config
            .index
            .entry_point_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        modules
            .iter()
            .filter(|m| {
                let name = m.name.to_lowercase();
                let path = m.path.to_lowercase();
                keywords
                    .iter()
                    .any(|k| name.contains(k.as_str()) || path.contains(k.as_str()))
            })
            .map(|m| m.name.clone())
            .collect()
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(Vec::new(), Config::default())
    }
}

/// Most depended-on modules. Ties keep module order; modules nobody imports
/// are never core.
fn core_modules(modules: &[ModuleInfo], graph: &DependencyGraph, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(&str, usize)> = modules
        .iter()
        .map(|m| (m.name.as_str(), graph.in_degree(&m.name)))
        .filter(|&(_, degree)| degree > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn module_families(modules: &[ModuleInfo]) -> BTreeMap<String, Vec<String>> {
    let mut families: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for module in modules {
        let family = match module.name.split_once('.') {
            Some((first, _)) if !first.is_empty() => first.to_string(),
            _ => "root".to_string(),
        };
        families.entry(family).or_default().push(module.name.clone());
    }
    families
}

fn component_map(modules: &[ModuleInfo]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for module in modules {
        let components = module.classes.iter().chain(
            module
                .functions
                .iter()
                .filter(|f| f.chars().next().is_some_and(char::is_uppercase)),
        );
        for name in components {
            map.entry(name.clone()).or_insert_with(|| module.path.clone());
        }
    }
    map
}

fn parent_directory(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    match normalized.trim_start_matches("./").rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ".".to_string(),
    }
}

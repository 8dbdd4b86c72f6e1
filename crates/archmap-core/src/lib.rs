pub mod analyzer;
pub mod cache;
pub mod config;
pub mod extract;
pub mod graph;
pub mod health;
pub mod index;
pub mod ingest;
pub mod layer;
pub mod metrics;
pub mod types;

pub use analyzer::{Extraction, SyntaxExtractor};
pub use cache::IndexCache;
pub use config::{Config, IndexConfig, LayersConfig, ScanConfig};
pub use graph::DependencyGraph;
pub use health::{ArchitecturePattern, HealthReport, QualityIndicators};
pub use index::{ArchitectureIndex, IndexBuilder, IndexStats};
pub use ingest::{
    consolidate, derive_module_name, parse_container, FileTreeAdapter, IngestError, SourceAdapter,
    TextContainerAdapter,
};
pub use layer::LayerClassifier;
pub use metrics::{ComplexityMetrics, CouplingMetrics, Metrics, ModuleCoupling};
pub use types::*;

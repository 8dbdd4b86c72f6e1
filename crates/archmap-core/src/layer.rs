use std::collections::BTreeMap;

use crate::config::LayersConfig;
use crate::types::{Layer, ModuleInfo};

/// Classifies modules into layers by lower-cased keyword substrings.
pub struct LayerClassifier {
    /// In `Layer::ALL` order; the first layer with a matching keyword wins.
    rules: Vec<(Layer, Vec<String>)>,
}

impl LayerClassifier {
    pub fn new(config: &LayersConfig) -> Self {
        let rules = Layer::ALL
            .iter()
            .map(|&layer| {
                let keywords = config
                    .keywords(layer)
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (layer, keywords)
            })
            .collect();
        Self { rules }
    }

    /// Classify a module from its name and path.
    pub fn classify(&self, name: &str, path: &str) -> Option<Layer> {
        let name = name.to_lowercase();
        let path = path.replace('\\', "/").to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|k| name.contains(k.as_str()) || path.contains(k.as_str()))
            })
            .map(|(layer, _)| *layer)
    }

    /// Group modules by layer. Every layer is present, possibly empty; modules
    /// matching no layer are left out.
    pub fn classify_all(&self, modules: &[ModuleInfo]) -> BTreeMap<Layer, Vec<String>> {
        let mut layers: BTreeMap<Layer, Vec<String>> =
            Layer::ALL.iter().map(|&layer| (layer, Vec::new())).collect();
        for module in modules {
            if let Some(layer) = self.classify(&module.name, &module.path) {
                layers.entry(layer).or_default().push(module.name.clone());
            }
        }
        layers
    }
}

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Serialize, Serializer};

use crate::types::{LanguageFamily, ModuleInfo};

/// Directed graph of resolved internal imports between modules.
///
/// Nodes are added in module encounter order, so node order doubles as the
/// tie-breaking order everywhere a deterministic sequence is needed. Edges have
/// set semantics; a module importing itself keeps its self-edge.
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build the graph for `modules`, resolving every raw import against the
    /// known module names. Unresolved imports are counted by raw string.
    pub fn build(modules: &[ModuleInfo]) -> (Self, BTreeMap<String, usize>) {
        let mut graph = Self::new();
        for module in modules {
            graph.add_module(&module.name);
        }

        let names: Vec<&str> = modules.iter().map(|m| m.name.as_str()).collect();
        let resolver = Resolver::new(&names);
        let mut external: BTreeMap<String, usize> = BTreeMap::new();

        for module in modules {
            for raw in &module.imports {
                let target = candidate_module(&module.path, raw)
                    .and_then(|candidate| resolver.resolve(&candidate));
                match target {
                    Some(target) => graph.add_dependency(&module.name, target),
                    None => *external.entry(raw.clone()).or_insert(0) += 1,
                }
            }
        }

        tracing::debug!(
            "dependency graph: {} modules, {} edges, {} external imports",
            graph.node_count(),
            graph.edge_count(),
            external.len()
        );
        (graph, external)
    }

    /// Add a module as a node. Returns the existing node if already present.
    pub fn add_module(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Add an edge `from -> to`, creating missing nodes. Repeated edges collapse.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.add_module(from);
        let to_idx = self.add_module(to);
        self.graph.update_edge(from_idx, to_idx, ());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Module names in node order.
    pub fn module_names(&self) -> Vec<&str> {
        self.graph.node_weights().map(String::as_str).collect()
    }

    /// Modules `name` depends on, in node order.
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.neighbor_names(name, Direction::Outgoing)
    }

    /// Modules depending on `name`, in node order.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.neighbor_names(name, Direction::Incoming)
    }

    /// Number of distinct modules with an edge into `name` (Ca).
    pub fn in_degree(&self, name: &str) -> usize {
        self.degree(name, Direction::Incoming)
    }

    /// Number of distinct modules `name` has an edge to (Ce).
    pub fn out_degree(&self, name: &str) -> usize {
        self.degree(name, Direction::Outgoing)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// All edges as `(from, to)`, ordered by source then target node.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(NodeIndex, NodeIndex)> = self
            .graph
            .edge_references()
            .map(|e| (e.source(), e.target()))
            .collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(a, b)| (self.graph[a].as_str(), self.graph[b].as_str()))
            .collect()
    }

    fn degree(&self, name: &str, direction: Direction) -> usize {
        self.index
            .get(name)
            .map(|&idx| self.graph.neighbors_directed(idx, direction).count())
            .unwrap_or(0)
    }

    fn neighbor_names(&self, name: &str, direction: Direction) -> Vec<&str> {
        match self.index.get(name) {
            Some(&idx) => self
                .sorted_neighbors(idx, direction)
                .into_iter()
                .map(|n| self.graph[n].as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    fn sorted_neighbors(&self, idx: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        neighbors.sort();
        neighbors
    }

    /// Depth-first cycle search.
    ///
    /// Roots are taken in node order and every root starts with an empty path.
    /// When an edge reaches a module still on the current path, the path slice
    /// from that module to the current one (closed with the module again) is
    /// recorded and the current module's remaining edges are skipped. Each module
    /// is expanded at most once, so at least one cycle is reported per cyclic
    /// region but not every simple cycle.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let n = self.graph.node_count();
        let mut visited = vec![false; n];
        let mut on_path = vec![false; n];
        let mut cycles = Vec::new();

        for root in self.graph.node_indices() {
            if visited[root.index()] {
                continue;
            }

            let mut path: Vec<NodeIndex> = vec![root];
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> =
                vec![(root, self.sorted_neighbors(root, Direction::Outgoing), 0)];
            visited[root.index()] = true;
            on_path[root.index()] = true;

            while let Some((node, neighbors, cursor)) = stack.last_mut() {
                let node = *node;
                let Some(&next) = neighbors.get(*cursor) else {
                    on_path[node.index()] = false;
                    path.pop();
                    stack.pop();
                    continue;
                };
                *cursor += 1;

                if on_path[next.index()] {
                    if let Some(start) = path.iter().position(|&p| p == next) {
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|&p| self.graph[p].clone()).collect();
                        cycle.push(self.graph[next].clone());
                        cycles.push(cycle);
                    }
                    *cursor = neighbors.len();
                } else if !visited[next.index()] {
                    visited[next.index()] = true;
                    on_path[next.index()] = true;
                    path.push(next);
                    stack.push((next, self.sorted_neighbors(next, Direction::Outgoing), 0));
                }
            }
        }

        cycles
    }

    /// Strongly connected regions that contain a cycle: more than one module,
    /// or a single module with a self-edge. Members and regions are in node order.
    pub fn strongly_connected_regions(&self) -> Vec<Vec<String>> {
        let mut regions: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.first().is_some_and(|&n| self.graph.contains_edge(n, n))
            })
            .map(|mut scc| {
                scc.sort();
                scc
            })
            .collect();
        regions.sort();
        regions
            .into_iter()
            .map(|scc| scc.into_iter().map(|n| self.graph[n].clone()).collect())
            .collect()
    }

    /// Longest chain of dependencies, counted in edges, after collapsing each
    /// strongly connected region into one step.
    pub fn max_dependency_depth(&self) -> usize {
        // tarjan_scc yields regions in reverse topological order, so every
        // region a component points at has already been measured.
        let sccs = tarjan_scc(&self.graph);
        let mut component = vec![0usize; self.graph.node_count()];
        for (i, scc) in sccs.iter().enumerate() {
            for &node in scc {
                component[node.index()] = i;
            }
        }

        let mut depth = vec![0usize; sccs.len()];
        for (i, scc) in sccs.iter().enumerate() {
            let mut best = 0;
            for &node in scc {
                for next in self.graph.neighbors(node) {
                    let c = component[next.index()];
                    if c != i {
                        best = best.max(depth[c] + 1);
                    }
                }
            }
            depth[i] = best;
        }
        depth.into_iter().max().unwrap_or(0)
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized as `{ module: [dependencies] }` in node order.
impl Serialize for DependencyGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.graph.node_indices().map(|idx| {
            let deps: Vec<&str> = self
                .sorted_neighbors(idx, Direction::Outgoing)
                .into_iter()
                .map(|n| self.graph[n].as_str())
                .collect();
            (self.graph[idx].as_str(), deps)
        }))
    }
}

/// Turn a raw import into a dotted candidate module name.
///
/// Relative forms are resolved against the directory of `importer_path`:
/// `./x`, a single leading dot, `self::` and the first `super::` stay in that
/// directory, and each further `../`, dot or `super::` climbs one level. Path
/// separators and `::` become dots and a trailing source-file extension is
/// dropped from path-style imports.
pub fn candidate_module(importer_path: &str, raw: &str) -> Option<String> {
    let raw = raw.trim().trim_matches(['\'', '"']);
    if raw.is_empty() {
        return None;
    }
    if importer_path.ends_with(".rs") && is_rust_module_path(raw) {
        return rust_candidate(importer_path, raw);
    }

    let (level, rest, path_style) = split_relative(raw);
    let mut segments: Vec<&str> = match level {
        Some(level) => {
            let mut base = directory_segments(importer_path);
            base.truncate(base.len().saturating_sub(level.saturating_sub(1)));
            base
        }
        None => Vec::new(),
    };

    let rest = rest.replace("::", ".");
    let rest = if path_style {
        strip_source_extension(&rest).replace(['/', '\\'], ".")
    } else {
        rest
    };
    segments.extend(rest.split('.').filter(|s| !s.is_empty()));

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("."))
    }
}

fn is_rust_module_path(raw: &str) -> bool {
    ["crate::", "self::", "super::"]
        .iter()
        .any(|prefix| raw.starts_with(prefix))
}

/// Resolve a `crate::`, `self::` or `super::` path from a Rust file.
///
/// `crate::` starts at the nearest `src` directory above the importer (or the
/// directory of a `lib.rs`/`main.rs` outside one). `self::` starts at the
/// importer's own module: its directory for `lib.rs`, `main.rs` and `mod.rs`,
/// otherwise that directory plus the file stem. Each `super::` climbs one module.
fn rust_candidate(importer_path: &str, raw: &str) -> Option<String> {
    let mut base: Vec<&str> = directory_segments(importer_path);
    let stem = file_stem(importer_path);

    let rest = if let Some(rest) = raw.strip_prefix("crate::") {
        match base.iter().rposition(|s| *s == "src") {
            Some(pos) => base.truncate(pos + 1),
            None if matches!(stem, "lib" | "main") => {}
            None => base.clear(),
        }
        rest
    } else {
        if !matches!(stem, "lib" | "main" | "mod") {
            base.push(stem);
        }
        let mut rest = raw;
        loop {
            if let Some(r) = rest.strip_prefix("super::") {
                base.pop();
                rest = r;
            } else if let Some(r) = rest.strip_prefix("self::") {
                rest = r;
            } else {
                break;
            }
        }
        rest
    };

    base.extend(rest.split("::").filter(|s| !s.is_empty()));
    if base.is_empty() {
        None
    } else {
        Some(base.join("."))
    }
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    name.split_once('.').map_or(name, |(stem, _)| stem)
}

/// Directory part of a file path, split the same way module names are derived.
fn directory_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    if segments.first().is_some_and(|s| s.ends_with(':')) {
        segments.remove(0);
    }
    segments.pop();
    segments
}

/// Returns `(level, remainder, is path-style)` where level 1 is the importer's
/// own directory and `None` means absolute.
fn split_relative(raw: &str) -> (Option<usize>, &str, bool) {
    if raw.starts_with("./") || raw.starts_with("../") {
        let mut level = 1;
        let mut rest = raw;
        loop {
            if let Some(r) = rest.strip_prefix("./") {
                rest = r;
            } else if let Some(r) = rest.strip_prefix("../") {
                level += 1;
                rest = r;
            } else {
                break;
            }
        }
        return (Some(level), rest, true);
    }

    if raw.starts_with('.') {
        let rest = raw.trim_start_matches('.');
        return (Some(raw.len() - rest.len()), rest, false);
    }

    if raw.starts_with("super::") || raw.starts_with("self::") {
        let mut supers = 0;
        let mut rest = raw;
        loop {
            if let Some(r) = rest.strip_prefix("super::") {
                supers += 1;
                rest = r;
            } else if let Some(r) = rest.strip_prefix("self::") {
                rest = r;
            } else {
                break;
            }
        }
        return (Some(supers.max(1)), rest, false);
    }

    let rest = raw.strip_prefix("crate::").unwrap_or(raw);
    let path_style = rest.contains('/') || rest.contains('\\');
    (None, rest.trim_start_matches(['/', '\\']), path_style)
}

fn strip_source_extension(path: &str) -> &str {
    let last_sep = path.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    match path[last_sep..].rfind('.') {
        Some(dot) if dot > 0 => {
            let ext = &path[last_sep + dot + 1..];
            if LanguageFamily::from_extension(ext) != LanguageFamily::Other {
                &path[..last_sep + dot]
            } else {
                path
            }
        }
        _ => path,
    }
}

/// Maps candidates onto known module names.
struct Resolver<'a> {
    known: HashSet<&'a str>,
    /// Every proper dotted prefix of a module name -> first module carrying it.
    package_owner: HashMap<&'a str, &'a str>,
}

impl<'a> Resolver<'a> {
    fn new(names: &[&'a str]) -> Self {
        let known = names.iter().copied().collect();
        let mut package_owner = HashMap::new();
        for &name in names {
            let mut end = name.len();
            while let Some(pos) = name[..end].rfind('.') {
                package_owner.entry(&name[..pos]).or_insert(name);
                end = pos;
            }
        }
        Self {
            known,
            package_owner,
        }
    }

    /// Exact name, then the longest module that is a dotted prefix of the
    /// candidate, then the first module the candidate is a dotted prefix of.
    fn resolve(&self, candidate: &str) -> Option<&'a str> {
        if let Some(&name) = self.known.get(candidate) {
            return Some(name);
        }
        let mut end = candidate.len();
        while let Some(pos) = candidate[..end].rfind('.') {
            if let Some(&name) = self.known.get(&candidate[..pos]) {
                return Some(name);
            }
            end = pos;
        }
        self.package_owner.get(candidate).copied()
    }
}

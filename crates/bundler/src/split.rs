//! Chunk 划分
//!
//! 边界（入口和动态 import 目标）各自成为一个 chunk；手动分组固定匹配到的模块；
//! 其余模块按「哪些边界能通过静态边到达它」归属：唯一归属进该边界的 chunk，
//! 多个归属进 `shared~a~b`。

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crosswind_core::{BuildConfig, Diagnostic, ManualChunk};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::{ModuleGraph, ModuleNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkKind {
    Entry,
    Dynamic,
    Manual,
    Shared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub name: String,
    pub kind: ChunkKind,
    /// 发现顺序
    pub modules: Vec<PathBuf>,
    /// 静态依赖的其他 chunk
    pub imports: Vec<String>,
    pub dynamic_imports: Vec<String>,
}

impl Chunk {
    fn new(name: String, kind: ChunkKind) -> Self {
        Self {
            name,
            kind,
            modules: Vec::new(),
            imports: Vec::new(),
            dynamic_imports: Vec::new(),
        }
    }
}

/// 划分策略
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SplitPolicy {
    #[default]
    Automatic,
    /// 按声明顺序匹配，先声明的分组优先
    Manual(Vec<ManualChunk>),
}

impl SplitPolicy {
    pub fn from_config(build: &BuildConfig) -> Self {
        if build.manual_chunks.is_empty() {
            SplitPolicy::Automatic
        } else {
            SplitPolicy::Manual(build.manual_chunks.clone())
        }
    }

    fn groups(&self) -> &[ManualChunk] {
        match self {
            SplitPolicy::Automatic => &[],
            SplitPolicy::Manual(groups) => groups,
        }
    }
}

#[derive(Debug, Default)]
pub struct ChunkPlan {
    pub chunks: Vec<Chunk>,
    assignment: IndexMap<PathBuf, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ChunkPlan {
    pub fn chunk_of(&self, module: &Path) -> Option<&Chunk> {
        self.assignment.get(module).map(|&i| &self.chunks[i])
    }

    pub fn get(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    /// 检查划分结果：图中每个模块恰好属于一个 chunk，chunk 中没有图外模块
    pub fn verify_partition(&self, graph: &ModuleGraph) -> Result<(), String> {
        let mut seen: HashMap<&Path, &str> = HashMap::new();
        for chunk in &self.chunks {
            for module in &chunk.modules {
                if !graph.contains(module) {
                    return Err(format!(
                        "chunk `{}` contains unknown module {}",
                        chunk.name,
                        module.display()
                    ));
                }
                if let Some(other) = seen.insert(module.as_path(), chunk.name.as_str()) {
                    return Err(format!(
                        "module {} is in both `{}` and `{}`",
                        module.display(),
                        other,
                        chunk.name
                    ));
                }
            }
        }
        for node in graph.discovery_order() {
            if !seen.contains_key(node.id.as_path()) {
                return Err(format!("module {} is not in any chunk", node.name));
            }
        }
        Ok(())
    }
}

/// 模块的归属位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Boundary(usize),
    Manual(usize),
    Shared(Vec<usize>),
}

pub fn split(graph: &ModuleGraph, policy: &SplitPolicy) -> ChunkPlan {
    let mut diagnostics = Vec::new();

    let boundaries = collect_boundaries(graph);
    let boundary_index: HashMap<&Path, usize> = boundaries
        .iter()
        .enumerate()
        .map(|(i, (path, _))| (path.as_path(), i))
        .collect();
    // 边界、手动分组、共享 chunk 共用一个命名空间
    let mut names = ChunkNames::default();
    let boundary_names: Vec<String> = boundaries
        .iter()
        .map(|(path, _)| names.claim(file_stem(path)))
        .collect();

    // 手动分组
    let groups = policy.groups();
    let mut pinned: HashMap<&Path, usize> = HashMap::new();
    for node in graph.discovery_order() {
        if boundary_index.contains_key(node.id.as_path()) {
            continue;
        }
        if let Some(g) = groups.iter().position(|group| group_matches(group, node)) {
            pinned.insert(node.id.as_path(), g);
        }
    }
    for (g, group) in groups.iter().enumerate() {
        if !pinned.values().any(|&p| p == g) {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "manual chunk `{}` matches no module and is skipped",
                    group.name
                ))
                .emit(),
            );
        }
    }

    // 每个边界沿静态边深度优先可达的模块；遇到其他边界停止，穿过固定模块
    let mut owners: HashMap<&Path, Vec<usize>> = HashMap::new();
    for (b, (start, _)) in boundaries.iter().enumerate() {
        let mut visited: HashSet<&Path> = HashSet::new();
        let mut stack: Vec<&Path> = vec![start.as_path()];
        visited.insert(start.as_path());

        while let Some(current) = stack.pop() {
            let Some(node) = graph.get(current) else {
                continue;
            };
            let targets: Vec<&Path> = node.static_targets().collect();
            for target in targets.into_iter().rev() {
                if boundary_index.contains_key(target) || !visited.insert(target) {
                    continue;
                }
                owners.entry(target).or_default().push(b);
                stack.push(target);
            }
        }
    }

    let slot_of = |node: &ModuleNode| -> Slot {
        let id = node.id.as_path();
        if let Some(&b) = boundary_index.get(id) {
            return Slot::Boundary(b);
        }
        if let Some(&g) = pinned.get(id) {
            return Slot::Manual(g);
        }
        match owners.get(id).map(Vec::as_slice) {
            Some([only]) => Slot::Boundary(*only),
            Some(many) if !many.is_empty() => {
                let mut set = many.to_vec();
                set.sort_unstable();
                Slot::Shared(set)
            }
            // 不可达（理论上不会出现）：归入第一个入口
            _ => Slot::Boundary(0),
        }
    };

    // chunk 顺序：边界 → 手动分组 → 共享
    let mut chunks: Vec<Chunk> = boundaries
        .iter()
        .zip(&boundary_names)
        .map(|((_, kind), name)| Chunk::new(name.clone(), *kind))
        .collect();

    let mut manual_chunk: HashMap<usize, usize> = HashMap::new();
    for (g, group) in groups.iter().enumerate() {
        if pinned.values().any(|&p| p == g) {
            manual_chunk.insert(g, chunks.len());
            let name = names.claim(&group.name);
            if name != group.name {
                tracing::debug!("manual chunk `{}` renamed to `{}`", group.name, name);
            }
            chunks.push(Chunk::new(name, ChunkKind::Manual));
        }
    }

    let mut shared_chunk: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut assignment = IndexMap::new();
    for node in graph.discovery_order() {
        let index = match slot_of(node) {
            Slot::Boundary(b) => b,
            Slot::Manual(g) => manual_chunk[&g],
            Slot::Shared(set) => *shared_chunk.entry(set.clone()).or_insert_with(|| {
                let base = std::iter::once("shared")
                    .chain(set.iter().map(|&b| boundary_names[b].as_str()))
                    .collect::<Vec<_>>()
                    .join("~");
                let name = names.claim(&base);
                chunks.push(Chunk::new(name, ChunkKind::Shared));
                chunks.len() - 1
            }),
        };
        // 没有入口时 Boundary(0) 不存在
        if index >= chunks.len() {
            continue;
        }
        chunks[index].modules.push(node.id.clone());
        assignment.insert(node.id.clone(), index);
    }

    link_chunks(graph, &mut chunks, &assignment);

    if let Some(cycle) = find_cycle(&chunks) {
        diagnostics.push(
            Diagnostic::warning(format!("chunk import cycle: {}", cycle.join(" -> "))).emit(),
        );
    }

    tracing::info!(
        "split {} modules into {} chunks",
        assignment.len(),
        chunks.len()
    );

    ChunkPlan {
        chunks,
        assignment,
        diagnostics,
    }
}

/// 入口（声明顺序）+ 动态 import 目标（发现顺序）
fn collect_boundaries(graph: &ModuleGraph) -> Vec<(PathBuf, ChunkKind)> {
    let mut boundaries: Vec<(PathBuf, ChunkKind)> = graph
        .entries()
        .iter()
        .map(|e| (e.clone(), ChunkKind::Entry))
        .collect();
    for node in graph.discovery_order() {
        for target in node.dynamic_targets() {
            if !boundaries.iter().any(|(b, _)| b == target) {
                boundaries.push((target.to_path_buf(), ChunkKind::Dynamic));
            }
        }
    }
    boundaries
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("chunk")
}

/// chunk 名称表，重名时追加序号（`index`, `index-2`, ...）
#[derive(Debug, Default)]
struct ChunkNames {
    used: HashSet<String>,
}

impl ChunkNames {
    fn claim(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while !self.used.insert(name.clone()) {
            n += 1;
            name = format!("{}-{}", base, n);
        }
        name
    }
}

/// 标识符匹配包名，或相对路径（文件本身或其所在目录）
fn group_matches(group: &ManualChunk, node: &ModuleNode) -> bool {
    group.modules.iter().any(|ident| {
        let ident = ident.trim_start_matches("./").trim_end_matches('/');
        node.package.as_deref() == Some(ident)
            || node.name == ident
            || node
                .name
                .strip_prefix(ident)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn link_chunks(graph: &ModuleGraph, chunks: &mut [Chunk], assignment: &IndexMap<PathBuf, usize>) {
    let mut links: Vec<(Vec<String>, Vec<String>)> = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.iter().enumerate() {
        let mut imports = Vec::new();
        let mut dynamic = Vec::new();
        for module in &chunk.modules {
            for edge in graph.imports_of(module) {
                let Some(&target) = assignment.get(&edge.target) else {
                    continue;
                };
                if target == index {
                    continue;
                }
                let name = &chunks[target].name;
                let list = if edge.kind.is_static() {
                    &mut imports
                } else {
                    &mut dynamic
                };
                if !list.contains(name) {
                    list.push(name.clone());
                }
            }
        }
        links.push((imports, dynamic));
    }
    for (chunk, (imports, dynamic)) in chunks.iter_mut().zip(links) {
        chunk.imports = imports;
        chunk.dynamic_imports = dynamic;
    }
}

/// 静态 chunk 依赖中的第一个环
fn find_cycle(chunks: &[Chunk]) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        White,
        Grey,
        Black,
    }

    fn visit(
        index: usize,
        chunks: &[Chunk],
        by_name: &HashMap<&str, usize>,
        marks: &mut [Mark],
        path: &mut Vec<usize>,
    ) -> Option<Vec<String>> {
        marks[index] = Mark::Grey;
        path.push(index);
        for import in &chunks[index].imports {
            let Some(&next) = by_name.get(import.as_str()) else {
                continue;
            };
            match marks[next] {
                Mark::Grey => {
                    let start = path.iter().position(|&i| i == next).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|&i| chunks[i].name.clone()).collect();
                    cycle.push(chunks[next].name.clone());
                    return Some(cycle);
                }
                Mark::White => {
                    if let Some(cycle) = visit(next, chunks, by_name, marks, path) {
                        return Some(cycle);
                    }
                }
                Mark::Black => {}
            }
        }
        path.pop();
        marks[index] = Mark::Black;
        None
    }

    let by_name: HashMap<&str, usize> = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect();
    let mut marks = vec![Mark::White; chunks.len()];
    for index in 0..chunks.len() {
        if marks[index] == Mark::White {
            let mut path = Vec::new();
            if let Some(cycle) = visit(index, chunks, &by_name, &mut marks, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::resolve::ModuleResolver;
    use crosswind_core::BuildMode;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn touch(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn graph(root: &Path, entries: &[&str]) -> ModuleGraph {
        let resolver = ModuleResolver::new(root, IndexMap::new());
        let entries: Vec<_> = entries.iter().map(|e| root.join(e)).collect();
        GraphBuilder::new(&resolver, BuildMode::Production)
            .build(&entries)
            .unwrap()
    }

    fn names(plan: &ChunkPlan, root: &Path, chunk: &str) -> Vec<String> {
        plan.get(chunk)
            .unwrap()
            .modules
            .iter()
            .map(|m| m.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_two_entries_share_module() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.js", "import './m.js'; import './only-main.js';");
        touch(dir.path(), "admin.js", "import './m.js';");
        touch(dir.path(), "m.js", "export const m = 1;");
        touch(dir.path(), "only-main.js", "export const o = 1;");

        let graph = graph(dir.path(), &["main.js", "admin.js"]);
        let plan = split(&graph, &SplitPolicy::Automatic);

        let chunk_names: Vec<_> = plan.chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(chunk_names, vec!["main", "admin", "shared~main~admin"]);
        assert_eq!(names(&plan, dir.path(), "main"), vec!["main.js", "only-main.js"]);
        assert_eq!(names(&plan, dir.path(), "shared~main~admin"), vec!["m.js"]);
        assert_eq!(plan.get("admin").unwrap().imports, vec!["shared~main~admin"]);
        plan.verify_partition(&graph).unwrap();
    }

    #[test]
    fn test_dynamic_import_is_boundary() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            "main.js",
            "import './util.js'; const page = () => import('./page.js');",
        );
        touch(dir.path(), "page.js", "import './util.js'; import './chart.js';");
        touch(dir.path(), "util.js", "");
        touch(dir.path(), "chart.js", "");

        let graph = graph(dir.path(), &["main.js"]);
        let plan = split(&graph, &SplitPolicy::Automatic);

        let page = plan.get("page").unwrap();
        assert_eq!(page.kind, ChunkKind::Dynamic);
        assert_eq!(names(&plan, dir.path(), "page"), vec!["page.js", "chart.js"]);
        assert_eq!(plan.get("main").unwrap().dynamic_imports, vec!["page"]);
        assert!(plan.get("shared~main~page").is_some());
        plan.verify_partition(&graph).unwrap();
    }

    #[test]
    fn test_manual_groups_pin_packages() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.js", "import 'react'; import './app.js';");
        touch(dir.path(), "src/app.js", "import 'react';");
        touch(dir.path(), "node_modules/react/index.js", "import './cjs/react.js';");
        touch(dir.path(), "node_modules/react/cjs/react.js", "");

        let graph = graph(dir.path(), &["src/main.js"]);
        let policy = SplitPolicy::Manual(vec![
            ManualChunk {
                name: "vendor".to_string(),
                modules: vec!["react".to_string()],
            },
            ManualChunk {
                name: "charts".to_string(),
                modules: vec!["recharts".to_string()],
            },
        ]);
        let plan = split(&graph, &policy);

        assert_eq!(
            names(&plan, dir.path(), "vendor"),
            vec!["node_modules/react/index.js", "node_modules/react/cjs/react.js"]
        );
        assert!(plan.get("charts").is_none());
        assert_eq!(plan.diagnostics.len(), 1);
        assert!(plan.diagnostics[0].message.contains("charts"));
        assert_eq!(plan.get("main").unwrap().imports, vec!["vendor"]);
        plan.verify_partition(&graph).unwrap();
    }

    #[test]
    fn test_chunk_cycle_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.js", "import './v.js';");
        touch(dir.path(), "v.js", "import './u.js';");
        touch(dir.path(), "u.js", "");

        let graph = graph(dir.path(), &["main.js"]);
        let policy = SplitPolicy::Manual(vec![ManualChunk {
            name: "vendor".to_string(),
            modules: vec!["v.js".to_string()],
        }]);
        let plan = split(&graph, &policy);

        // u.js 穿过固定模块仍归属 main，不会被搬动
        assert_eq!(names(&plan, dir.path(), "main"), vec!["main.js", "u.js"]);
        assert_eq!(plan.diagnostics.len(), 1);
        assert_eq!(
            plan.diagnostics[0].message,
            "chunk import cycle: main -> vendor -> main"
        );
    }

    #[test]
    fn test_verify_partition_detects_missing_module() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.js", "import './a.js';");
        touch(dir.path(), "a.js", "");

        let graph = graph(dir.path(), &["main.js"]);
        let mut plan = split(&graph, &SplitPolicy::Automatic);
        plan.chunks[0].modules.pop();
        assert!(plan.verify_partition(&graph).is_err());
    }

    #[test]
    fn test_chunk_names_never_repeat() {
        let mut names = ChunkNames::default();
        assert_eq!(names.claim("index"), "index");
        assert_eq!(names.claim("index-2"), "index-2");
        assert_eq!(names.claim("index"), "index-3");
        assert_eq!(names.claim(file_stem(Path::new("/b/index.js"))), "index-4");
    }

    #[test]
    fn test_manual_group_named_like_entry() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "vendor.js", "import 'react';");
        touch(dir.path(), "node_modules/react/index.js", "");

        let graph = graph(dir.path(), &["vendor.js"]);
        let policy = SplitPolicy::Manual(vec![ManualChunk {
            name: "vendor".to_string(),
            modules: vec!["react".to_string()],
        }]);
        let plan = split(&graph, &policy);

        let chunk_names: Vec<_> = plan.chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(chunk_names, vec!["vendor", "vendor-2"]);
        assert_eq!(names(&plan, dir.path(), "vendor"), vec!["vendor.js"]);
        assert_eq!(
            names(&plan, dir.path(), "vendor-2"),
            vec!["node_modules/react/index.js"]
        );
        assert_eq!(plan.get("vendor").unwrap().imports, vec!["vendor-2"]);
        assert!(plan.diagnostics.is_empty());
        plan.verify_partition(&graph).unwrap();
    }
}

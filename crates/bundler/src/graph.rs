//! 模块依赖图
//!
//! 从入口出发按波次发现模块：同一波次内并行读取和解析，
//! 再按波次顺序合并，节点顺序因此与线程调度无关。

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crosswind_core::{read_to_string_with_retry, BuildMode, Diagnostic, RetryPolicy};
use crosswind_transform::{is_script, parse_imports, ImportKind, ImportRecord, TransformError};
use indexmap::IndexMap;
use rayon::prelude::*;

use crate::error::BuildError;
use crate::resolve::ModuleResolver;

/// 模块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Script,
    Style,
    Json,
    Asset,
    /// 开发模式下无法解析或解析失败的占位模块
    Broken,
}

impl ModuleKind {
    pub fn from_path(path: &Path) -> Self {
        if is_script(path) {
            return ModuleKind::Script;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("css") => ModuleKind::Style,
            Some("json") => ModuleKind::Json,
            _ => ModuleKind::Asset,
        }
    }
}

/// 已解析的一条 import 边
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    pub specifier: String,
    pub kind: ImportKind,
    pub target: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ModuleNode {
    /// 绝对路径；Broken 节点为 `broken:<specifier>`
    pub id: PathBuf,
    /// 相对项目根目录的名字
    pub name: String,
    pub kind: ModuleKind,
    pub package: Option<String>,
    pub imports: Vec<ImportRecord>,
    pub resolved: Vec<ResolvedImport>,
}

impl ModuleNode {
    fn broken(specifier: &str) -> Self {
        Self {
            id: broken_id(specifier),
            name: format!("broken:{}", specifier),
            kind: ModuleKind::Broken,
            package: None,
            imports: Vec::new(),
            resolved: Vec::new(),
        }
    }

    /// 静态边（import / re-export / side-effect）的目标
    pub fn static_targets(&self) -> impl Iterator<Item = &Path> {
        self.resolved
            .iter()
            .filter(|r| r.kind.is_static())
            .map(|r| r.target.as_path())
    }

    /// 动态 `import()` 的目标
    pub fn dynamic_targets(&self) -> impl Iterator<Item = &Path> {
        self.resolved
            .iter()
            .filter(|r| r.kind == ImportKind::Dynamic)
            .map(|r| r.target.as_path())
    }
}

pub fn broken_id(specifier: &str) -> PathBuf {
    PathBuf::from(format!("broken:{}", specifier))
}

/// 模块依赖图
///
/// `nodes` 保持发现顺序；`importers` 是与正向边同时建立的反向邻接表。
#[derive(Debug, Default)]
pub struct ModuleGraph {
    nodes: IndexMap<PathBuf, ModuleNode>,
    importers: IndexMap<PathBuf, Vec<PathBuf>>,
    entries: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ModuleGraph {
    pub fn get(&self, id: &Path) -> Option<&ModuleNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &Path) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn imports_of(&self, id: &Path) -> &[ResolvedImport] {
        self.nodes
            .get(id)
            .map(|node| node.resolved.as_slice())
            .unwrap_or(&[])
    }

    /// 直接引用 `id` 的模块，按建边顺序
    pub fn importers_of(&self, id: &Path) -> &[PathBuf] {
        self.importers
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 所有直接或间接引用 `id` 的模块（不含自身，除非处于环中）
    pub fn dependents_closure(&self, id: &Path) -> Vec<PathBuf> {
        let mut seen: HashSet<&Path> = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<&Path> = vec![id];

        while let Some(current) = stack.pop() {
            for importer in self.importers_of(current) {
                if seen.insert(importer.as_path()) {
                    order.push(importer.clone());
                    stack.push(importer.as_path());
                }
            }
        }
        order
    }

    pub fn discovery_order(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes.values()
    }

    pub fn position(&self, id: &Path) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    fn insert(&mut self, node: ModuleNode) {
        for target in node.resolved.iter().map(|r| &r.target) {
            let importers = self.importers.entry(target.clone()).or_default();
            if !importers.contains(&node.id) {
                importers.push(node.id.clone());
            }
        }
        self.nodes.insert(node.id.clone(), node);
    }
}

/// 单个文件的加载结果（并行阶段产出，合并阶段消费）
struct Loaded {
    path: PathBuf,
    kind: ModuleKind,
    outcome: Result<Vec<ImportRecord>, LoadError>,
}

enum LoadError {
    Io(std::io::Error),
    Parse(TransformError),
}

/// 依赖图构建器
///
/// Production 严格：未解析的 import 直接失败。
/// Development 宽松：记录 Warning 并插入 Broken 占位节点。
pub struct GraphBuilder<'a> {
    resolver: &'a ModuleResolver,
    mode: BuildMode,
    retry: RetryPolicy,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(resolver: &'a ModuleResolver, mode: BuildMode) -> Self {
        Self {
            resolver,
            mode,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(&self, entries: &[PathBuf]) -> Result<ModuleGraph, BuildError> {
        let mut graph = ModuleGraph::default();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut wave: Vec<PathBuf> = Vec::new();

        for entry in entries {
            if !entry.is_file() {
                return Err(BuildError::MissingEntry(entry.clone()));
            }
            if visited.insert(entry.clone()) {
                graph.entries.push(entry.clone());
                wave.push(entry.clone());
            }
        }

        let mut waves = 0;
        while !wave.is_empty() {
            waves += 1;
            let loaded: Vec<Loaded> = wave.par_iter().map(|path| self.load(path)).collect();

            let mut next = Vec::new();
            for item in loaded {
                let node = self.link(item, &mut graph)?;
                for target in node.resolved.iter().map(|r| &r.target) {
                    if visited.insert(target.clone()) {
                        if graph.contains(target) {
                            continue;
                        }
                        next.push(target.clone());
                    }
                }
                graph.insert(node);
            }
            wave = next;
        }

        tracing::info!(
            "module graph: {} modules in {} waves, {} diagnostics",
            graph.len(),
            waves,
            graph.diagnostics.len()
        );
        Ok(graph)
    }

    fn load(&self, path: &Path) -> Loaded {
        let kind = ModuleKind::from_path(path);
        let outcome = if kind == ModuleKind::Script {
            read_to_string_with_retry(path, self.retry)
                .map_err(LoadError::Io)
                .and_then(|source| {
                    parse_imports(&source, &path.to_string_lossy()).map_err(LoadError::Parse)
                })
        } else {
            Ok(Vec::new())
        };
        tracing::debug!("loaded {}", path.display());
        Loaded {
            path: path.to_path_buf(),
            kind,
            outcome,
        }
    }

    /// 把加载结果变成节点：解析说明符，处理失败
    fn link(&self, loaded: Loaded, graph: &mut ModuleGraph) -> Result<ModuleNode, BuildError> {
        let Loaded {
            path,
            mut kind,
            outcome,
        } = loaded;

        let imports = match outcome {
            Ok(imports) => imports,
            Err(LoadError::Io(err)) => return Err(BuildError::io(&path, err)),
            Err(LoadError::Parse(err)) => {
                if self.mode.is_production() {
                    return Err(err.into());
                }
                graph
                    .diagnostics
                    .push(Diagnostic::warning(err.to_string()).emit());
                kind = ModuleKind::Broken;
                Vec::new()
            }
        };

        let mut resolved = Vec::with_capacity(imports.len());
        for record in &imports {
            let target = match self.resolver.resolve(&path, &record.specifier) {
                Some(target) => target,
                None => {
                    let importer = self.resolver.module_name(&path);
                    if self.mode.is_production() {
                        return Err(BuildError::UnresolvedImport {
                            importer,
                            specifier: record.specifier.clone(),
                        });
                    }
                    graph.diagnostics.push(
                        Diagnostic::warning(format!(
                            "cannot resolve `{}` imported from {}",
                            record.specifier, importer
                        ))
                        .emit(),
                    );
                    let placeholder = ModuleNode::broken(&record.specifier);
                    let id = placeholder.id.clone();
                    if !graph.contains(&id) {
                        graph.insert(placeholder);
                    }
                    id
                }
            };
            resolved.push(ResolvedImport {
                specifier: record.specifier.clone(),
                kind: record.kind,
                target,
            });
        }

        Ok(ModuleNode {
            name: self.resolver.module_name(&path),
            package: self.resolver.package_of(&path),
            id: path,
            kind,
            imports,
            resolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn resolver(root: &Path) -> ModuleResolver {
        ModuleResolver::new(root, IndexMap::new())
    }

    #[test]
    fn test_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.js", "import './b.js';");
        touch(dir.path(), "b.js", "import './c.js';");
        touch(dir.path(), "c.js", "import './a.js';");

        let resolver = resolver(dir.path());
        let graph = GraphBuilder::new(&resolver, BuildMode::Production)
            .build(&[dir.path().join("a.js")])
            .unwrap();

        let names: Vec<_> = graph.discovery_order().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a.js", "b.js", "c.js"]);
        assert_eq!(graph.importers_of(&dir.path().join("a.js")), &[dir.path().join("c.js")]);
    }

    #[test]
    fn test_module_kinds_and_leaves() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            "main.ts",
            "import './index.css';\nimport data from './data.json';\nimport logo from './logo.svg';",
        );
        touch(dir.path(), "index.css", "@tailwind base;");
        touch(dir.path(), "data.json", "{}");
        touch(dir.path(), "logo.svg", "<svg/>");

        let resolver = resolver(dir.path());
        let graph = GraphBuilder::new(&resolver, BuildMode::Production)
            .build(&[dir.path().join("main.ts")])
            .unwrap();

        let kinds: Vec<_> = graph.discovery_order().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ModuleKind::Script,
                ModuleKind::Style,
                ModuleKind::Json,
                ModuleKind::Asset
            ]
        );
    }

    #[test]
    fn test_unresolved_strict_vs_lenient() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "main.js", "import { x } from './missing';");
        let resolver = resolver(dir.path());
        let entries = [dir.path().join("main.js")];

        let err = GraphBuilder::new(&resolver, BuildMode::Production)
            .build(&entries)
            .unwrap_err();
        match err {
            BuildError::UnresolvedImport { importer, specifier } => {
                assert_eq!(importer, "main.js");
                assert_eq!(specifier, "./missing");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let graph = GraphBuilder::new(&resolver, BuildMode::Development)
            .build(&entries)
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.diagnostics.len(), 1);
        let broken = graph.get(&broken_id("./missing")).unwrap();
        assert_eq!(broken.kind, ModuleKind::Broken);
    }

    #[test]
    fn test_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());
        let err = GraphBuilder::new(&resolver, BuildMode::Development)
            .build(&[dir.path().join("nope.ts")])
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingEntry(_)));
    }

    #[test]
    fn test_dependents_closure() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "c.js", "import './b.js';");
        touch(dir.path(), "b.js", "import './a.js';");
        touch(dir.path(), "a.js", "export const a = 1;");

        let resolver = resolver(dir.path());
        let graph = GraphBuilder::new(&resolver, BuildMode::Production)
            .build(&[dir.path().join("c.js")])
            .unwrap();

        let mut closure = graph.dependents_closure(&dir.path().join("a.js"));
        closure.sort();
        assert_eq!(closure, vec![dir.path().join("b.js"), dir.path().join("c.js")]);
        assert!(graph.dependents_closure(&dir.path().join("c.js")).is_empty());
    }
}

//! 生产构建：扫描 → 生成样式 → 依赖图 → 划分 → 输出

use std::fs;
use std::path::{Path, PathBuf};

use crosswind_core::{
    create_naming_strategy, read_to_string_with_retry, BuildMode, CrosswindConfig, Diagnostic,
    EnvSnapshot, NamingStrategy, RetryPolicy,
};
use crosswind_scanner::scan;
use crosswind_transform::{transform_module, TransformOptions};
use crosswind_utilities::{generate_stylesheet, Stylesheet};
use indexmap::IndexMap;
use rayon::prelude::*;

use crate::error::BuildError;
use crate::graph::{GraphBuilder, ModuleGraph, ModuleKind, ModuleNode};
use crate::manifest::{Manifest, ManifestChunk};
use crate::resolve::ModuleResolver;
use crate::split::{split, Chunk, ChunkKind, ChunkPlan, SplitPolicy};

const ASSETS_DIR: &str = "assets";

#[derive(Debug, Clone)]
pub struct StyleArtifact {
    pub file_name: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct ChunkArtifact {
    pub name: String,
    pub kind: ChunkKind,
    /// 相对输出目录，如 `assets/main-3f2a9c1d.js`
    pub file_name: String,
    pub modules: Vec<String>,
    pub code: String,
}

#[derive(Debug)]
pub struct BuildOutput {
    pub stylesheet: StyleArtifact,
    pub chunks: Vec<ChunkArtifact>,
    pub manifest: Manifest,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutput {
    /// 写出所有产物和 `manifest.json`，返回写出的文件
    pub fn write_to(&self, out_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let assets = out_dir.join(ASSETS_DIR);
        fs::create_dir_all(&assets).map_err(|e| BuildError::io(&assets, e))?;

        let mut written = Vec::with_capacity(self.chunks.len() + 2);
        let files = self
            .chunks
            .iter()
            .map(|c| (c.file_name.as_str(), c.code.as_str()))
            .chain(std::iter::once((
                self.stylesheet.file_name.as_str(),
                self.stylesheet.code.as_str(),
            )));
        for (file_name, code) in files {
            let path = out_dir.join(file_name);
            fs::write(&path, code).map_err(|e| BuildError::io(&path, e))?;
            written.push(path);
        }

        let manifest_path = out_dir.join("manifest.json");
        fs::write(&manifest_path, self.manifest.to_json()?)
            .map_err(|e| BuildError::io(&manifest_path, e))?;
        written.push(manifest_path);

        tracing::info!("wrote {} files to {}", written.len(), out_dir.display());
        Ok(written)
    }
}

/// 执行一次完整构建（不写盘）
pub fn build(
    config: &CrosswindConfig,
    env: &EnvSnapshot,
    mode: BuildMode,
) -> Result<BuildOutput, BuildError> {
    let mut diagnostics = Vec::new();

    let report = scan(&config.content_sources());
    diagnostics.extend(report.diagnostics.iter().cloned());
    let sheet = generate_stylesheet(config, &report.tokens)?;

    let resolver = ModuleResolver::from_config(config);
    let graph = GraphBuilder::new(&resolver, mode).build(&config.entry_paths())?;
    diagnostics.extend(graph.diagnostics.iter().cloned());

    let plan = split(&graph, &SplitPolicy::from_config(&config.build));
    diagnostics.extend(plan.diagnostics.iter().cloned());

    let naming = create_naming_strategy(config.build.naming);
    let css = collect_styles(&graph, &sheet)?;
    let stylesheet = StyleArtifact {
        file_name: asset_path(naming.as_ref(), "style", &css, "css"),
        code: css,
    };

    let emitter = ChunkEmitter {
        graph: &graph,
        env,
        naming: naming.as_ref(),
    };
    let chunks = plan
        .chunks
        .par_iter()
        .map(|chunk| emitter.emit(chunk))
        .collect::<Result<Vec<_>, _>>()?;

    let limit = config.build.chunk_size_warning_limit.saturating_mul(1024);
    for chunk in &chunks {
        let size = chunk.code.len() as u64;
        if size > limit {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "chunk `{}` is {} KiB, over the {} KiB warning limit",
                    chunk.name,
                    size / 1024,
                    config.build.chunk_size_warning_limit
                ))
                .emit(),
            );
        }
    }

    let manifest = build_manifest(&plan, &chunks, &stylesheet);

    tracing::info!(
        "built {} chunks from {} modules ({} utility tokens)",
        chunks.len(),
        graph.len(),
        report.tokens.len()
    );

    Ok(BuildOutput {
        stylesheet,
        chunks,
        manifest,
        diagnostics,
    })
}

/// 依赖图中的 CSS 模块按发现顺序合并
///
/// 第一个带 `@tailwind` 指令的样式表注入生成的样式；
/// 没有任何指令时生成的样式放在最前面。
fn collect_styles(graph: &ModuleGraph, sheet: &Stylesheet) -> Result<String, BuildError> {
    let mut parts = Vec::new();
    let mut injected = false;

    for node in graph.discovery_order() {
        if node.kind != ModuleKind::Style {
            continue;
        }
        let source = read_to_string_with_retry(&node.id, RetryPolicy::default())
            .map_err(|e| BuildError::io(&node.id, e))?;
        if !injected && source.contains("@tailwind") {
            parts.push(sheet.inject_into(&source));
            injected = true;
        } else {
            parts.push(source);
        }
    }

    if !injected {
        parts.insert(0, sheet.to_css());
    }
    Ok(parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn asset_path(naming: &dyn NamingStrategy, stem: &str, code: &str, ext: &str) -> String {
    format!(
        "{}/{}",
        ASSETS_DIR,
        naming.file_name(stem, code.as_bytes(), ext)
    )
}

struct ChunkEmitter<'a> {
    graph: &'a ModuleGraph,
    env: &'a EnvSnapshot,
    naming: &'a dyn NamingStrategy,
}

impl ChunkEmitter<'_> {
    fn emit(&self, chunk: &Chunk) -> Result<ChunkArtifact, BuildError> {
        let mut code = String::new();
        let mut modules = Vec::with_capacity(chunk.modules.len());

        for id in &chunk.modules {
            let Some(node) = self.graph.get(id) else {
                continue;
            };
            modules.push(node.name.clone());
            let Some(body) = self.emit_module(node)? else {
                continue;
            };
            code.push_str(&format!("// {}\n", node.name));
            code.push_str(body.trim_end());
            code.push_str("\n\n");
        }

        tracing::debug!("emitted chunk `{}` ({} bytes)", chunk.name, code.len());
        Ok(ChunkArtifact {
            name: chunk.name.clone(),
            kind: chunk.kind,
            file_name: asset_path(self.naming, &chunk.name, &code, "js"),
            modules,
            code,
        })
    }

    /// CSS 模块提取到样式表，返回 None
    fn emit_module(&self, node: &ModuleNode) -> Result<Option<String>, BuildError> {
        let code = match node.kind {
            ModuleKind::Style => return Ok(None),
            ModuleKind::Script => {
                let source = read_to_string_with_retry(&node.id, RetryPolicy::default())
                    .map_err(|e| BuildError::io(&node.id, e))?;
                let specifiers = self.specifier_map(node);
                let options = TransformOptions {
                    env: Some(self.env),
                    specifiers: Some(&specifiers),
                };
                transform_module(&source, &node.id.to_string_lossy(), options)?.code
            }
            ModuleKind::Json => {
                let source = read_to_string_with_retry(&node.id, RetryPolicy::default())
                    .map_err(|e| BuildError::io(&node.id, e))?;
                format!("export default {};", source.trim())
            }
            ModuleKind::Asset => format!("export default {};", js_string(&format!("/{}", node.name))),
            ModuleKind::Broken => format!(
                "throw new Error({});",
                js_string(&format!("module `{}` could not be built", node.name))
            ),
        };
        Ok(Some(code))
    }

    /// 原始说明符 → 目标模块的根相对路径
    fn specifier_map(&self, node: &ModuleNode) -> IndexMap<String, String> {
        node.resolved
            .iter()
            .filter_map(|edge| {
                let target = self.graph.get(&edge.target)?;
                Some((edge.specifier.clone(), format!("/{}", target.name)))
            })
            .collect()
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn build_manifest(plan: &ChunkPlan, chunks: &[ChunkArtifact], style: &StyleArtifact) -> Manifest {
    let mut manifest = Manifest {
        css: (!style.code.is_empty()).then(|| style.file_name.clone()),
        ..Default::default()
    };
    for (chunk, artifact) in plan.chunks.iter().zip(chunks) {
        manifest.chunks.insert(
            chunk.name.clone(),
            ManifestChunk {
                file: artifact.file_name.clone(),
                kind: chunk.kind,
                modules: artifact.modules.clone(),
                imports: chunk.imports.clone(),
                dynamic_imports: chunk.dynamic_imports.clone(),
            },
        );
    }
    manifest
}

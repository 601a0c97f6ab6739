//! 按需构建的模块服务
//!
//! 每个模块有一把构建锁和一把状态锁。构建锁只串行化同一模块的重建，
//! 互不相关的模块可以同时重建。失效遍历只锁受影响模块的状态锁
//! （按路径顺序一次全部持有），不等待任何进行中的构建：构建开始时记下
//! 模块的失效代数，结束时代数变了就丢弃 Built 标记重新构建。
//!
//! 锁顺序：`modules` → 模块状态 → `importers`。

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crosswind_bundler::{ModuleKind, ModuleResolver};
use crosswind_core::{
    normalize_join, read_to_string_with_retry, CrosswindConfig, Diagnostic, EnvSnapshot,
    RetryPolicy, WatchEvent, WatchKind,
};
use crosswind_scanner::{scan, ContentMatcher};
use crosswind_transform::{parse_imports, transform_module, TransformOptions};
use crosswind_utilities::{Assembler, Resolver, Stylesheet};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::error::DevServerError;
use crate::response::{content_type_for, DevResponse, ReloadNotice, CSS, HTML, JAVASCRIPT, JSON};
use crate::watch::is_ignored;

pub const STYLES_PATH: &str = "/@crosswind/styles.css";
pub const EVENTS_PATH: &str = "/@crosswind/events";
pub const CLIENT_PATH: &str = "/@crosswind/client.js";
pub const BROKEN_PATH: &str = "/@crosswind/broken";

/// 从脚本 import 的非脚本模块带上该查询参数，以 JS 模块形式返回
const IMPORT_QUERY: &str = "import";

/// 构建期间被反复失效时的最多构建次数
const BUILD_ATTEMPTS: usize = 3;

const EVENT_CAPACITY: usize = 64;

const CLIENT_SCRIPT: &str = r#"const source = new EventSource("/@crosswind/events");
source.onmessage = (event) => {
  const notice = JSON.parse(event.data);
  if (notice.type === "reload" && notice.changed.length > 0) {
    location.reload();
  }
};
"#;

/// 模块状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Unbuilt,
    Built,
    Stale,
}

#[derive(Debug)]
struct ModuleEntry {
    state: ModuleState,
    kind: ModuleKind,
    body: Arc<Vec<u8>>,
    /// 已解析的依赖，同时登记在反向图中
    deps: Vec<PathBuf>,
    /// 存在无法解析的 import
    has_broken: bool,
    /// 每次失效加一
    generation: u64,
}

impl ModuleEntry {
    fn new(path: &Path) -> Self {
        Self {
            state: ModuleState::Unbuilt,
            kind: ModuleKind::from_path(path),
            body: Arc::new(Vec::new()),
            deps: Vec::new(),
            has_broken: false,
            generation: 0,
        }
    }
}

struct ModuleSlot {
    build: Mutex<()>,
    state: Mutex<ModuleEntry>,
}

impl ModuleSlot {
    fn new(path: &Path) -> Self {
        Self {
            build: Mutex::new(()),
            state: Mutex::new(ModuleEntry::new(path)),
        }
    }
}

/// 样式表缓存；内容变更时清空并加一代
#[derive(Default)]
struct StyleCache {
    sheet: Option<Arc<Stylesheet>>,
    generation: u64,
}

/// 一次成功构建的结果
struct BuiltModule {
    body: Vec<u8>,
    deps: Vec<PathBuf>,
    has_broken: bool,
}

enum BuildFailure {
    NotFound,
    Failed(String),
}

impl From<io::Error> for BuildFailure {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            BuildFailure::NotFound
        } else {
            BuildFailure::Failed(err.to_string())
        }
    }
}

struct Inner {
    config: CrosswindConfig,
    env: EnvSnapshot,
    resolver: ModuleResolver,
    utilities: Resolver,
    content: ContentMatcher,
    modules: RwLock<HashMap<PathBuf, Arc<ModuleSlot>>>,
    /// 反向图：被引用模块 → 引用它的模块
    importers: RwLock<HashMap<PathBuf, Vec<PathBuf>>>,
    styles: Mutex<StyleCache>,
    styles_build: Mutex<()>,
    diagnostics: Mutex<Vec<Diagnostic>>,
    events: broadcast::Sender<ReloadNotice>,
}

/// 开发服务器（可廉价克隆，内部共享状态）
#[derive(Clone)]
pub struct DevServer {
    inner: Arc<Inner>,
}

impl DevServer {
    pub fn new(mut config: CrosswindConfig, env: EnvSnapshot) -> Result<Self, DevServerError> {
        config.root = config
            .root
            .canonicalize()
            .map_err(|source| DevServerError::Io {
                path: config.root.clone(),
                source,
            })?;

        let utilities = Resolver::from_config(&config)?;
        let (content, diagnostics) = ContentMatcher::new(&config.content_sources());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                resolver: ModuleResolver::from_config(&config),
                utilities,
                content,
                config,
                env,
                modules: RwLock::new(HashMap::new()),
                importers: RwLock::new(HashMap::new()),
                styles: Mutex::new(StyleCache::default()),
                styles_build: Mutex::new(()),
                diagnostics: Mutex::new(diagnostics),
                events,
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.config.root
    }

    pub fn config(&self) -> &CrosswindConfig {
        &self.inner.config
    }

    /// 订阅失效推送
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadNotice> {
        self.inner.events.subscribe()
    }

    /// 累计的诊断信息
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.diagnostics.lock().clone()
    }

    pub fn record(&self, diagnostic: Diagnostic) {
        self.inner.diagnostics.lock().push(diagnostic);
    }

    /// 模块当前状态；从未请求过的模块返回 None
    pub fn state_of(&self, path: &Path) -> Option<ModuleState> {
        let modules = self.inner.modules.read();
        modules.get(path).map(|slot| slot.state.lock().state)
    }

    /// 处理一个 `GET` 请求
    ///
    /// 路径和查询参数按百分号编码解码；只识别 `?import`，其他查询参数忽略。
    pub fn request(&self, url: &str) -> DevResponse {
        let (raw_path, raw_query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };
        let Some(path) = percent_decode(raw_path).filter(|p| !p.contains('\0')) else {
            return DevResponse::status(400, "bad request");
        };

        match path.as_str() {
            STYLES_PATH => {
                return DevResponse::ok(CSS, self.stylesheet().to_css());
            }
            CLIENT_PATH => return DevResponse::ok(JAVASCRIPT, CLIENT_SCRIPT),
            BROKEN_PATH => {
                let specifier = raw_query.and_then(percent_decode).unwrap_or_default();
                let message = format!("cannot resolve `{}`", specifier);
                return DevResponse::ok(JAVASCRIPT, throw_module(&message));
            }
            _ => {}
        }
        let as_module = raw_query.is_some_and(|query| {
            query
                .split('&')
                .any(|param| param.split('=').next() == Some(IMPORT_QUERY))
        });

        let path = if path == "/" { "/index.html" } else { path.as_str() };
        let Some(file) = self.file_for(path) else {
            return DevResponse::not_found();
        };

        let (kind, body) = match self.ensure_built(&file) {
            Ok(built) => built,
            Err(BuildFailure::NotFound) => return DevResponse::not_found(),
            Err(BuildFailure::Failed(message)) => {
                tracing::warn!("{}", message);
                return DevResponse::error(message);
            }
        };
        self.respond(&file, kind, &body, as_module)
    }

    /// 应用一次文件变更：把变更模块和所有直接、间接引用它的模块标记为 Stale
    ///
    /// 只标记不重建，重建发生在下一次请求时。
    pub fn apply_event(&self, event: WatchEvent) -> ReloadNotice {
        let root = self.root();
        if is_ignored(root, &event.path) {
            return ReloadNotice::default();
        }

        let modules = self.inner.modules.read();
        let mut queue: VecDeque<PathBuf> = VecDeque::from([event.path.clone()]);
        // 新文件可能让此前无法解析的 import 变得可解析
        if event.kind == WatchKind::Created {
            queue.extend(
                modules
                    .iter()
                    .filter(|(_, slot)| slot.state.lock().has_broken)
                    .map(|(path, _)| path.clone()),
            );
        }

        // 受影响集合：变更模块及其所有直接、间接引用者
        let mut affected: Vec<PathBuf> = Vec::new();
        {
            let importers = self.inner.importers.read();
            let mut seen: HashSet<PathBuf> = HashSet::new();
            while let Some(path) = queue.pop_front() {
                if !seen.insert(path.clone()) {
                    continue;
                }
                if let Some(list) = importers.get(&path) {
                    queue.extend(list.iter().cloned());
                }
                affected.push(path);
            }
        }

        // 按路径顺序一次锁住整个集合，其他请求要么看到失效前、要么看到失效后
        let mut slots: Vec<(&PathBuf, &Arc<ModuleSlot>)> = affected
            .iter()
            .filter_map(|path| modules.get_key_value(path))
            .collect();
        slots.sort_by(|a, b| a.0.cmp(b.0));
        let mut guards: Vec<_> = slots.iter().map(|(_, slot)| slot.state.lock()).collect();
        for module in guards.iter_mut() {
            module.generation += 1;
            if module.state == ModuleState::Built {
                module.state = ModuleState::Stale;
            }
        }
        drop(guards);
        drop(slots);

        let mut changed: Vec<String> = affected
            .iter()
            .filter(|path| modules.contains_key(*path))
            .map(|path| self.url_of(path))
            .collect();
        drop(modules);

        if self.inner.content.is_match(&event.path) {
            let mut styles = self.inner.styles.lock();
            styles.sheet = None;
            styles.generation += 1;
            changed.push(STYLES_PATH.to_string());
        }

        let notice = ReloadNotice { changed };
        if !notice.is_empty() {
            tracing::info!(
                "{} changed, invalidated {} modules",
                self.url_of(&event.path),
                notice.changed.len()
            );
            // 没有订阅者时发送失败，忽略即可
            let _ = self.inner.events.send(notice.clone());
        }
        notice
    }

    fn url_of(&self, path: &Path) -> String {
        format!("/{}", percent_encode(&self.inner.resolver.module_name(path)))
    }

    /// URL 路径 → 项目内文件；越出项目根目录的路径拒绝
    fn file_for(&self, path: &str) -> Option<PathBuf> {
        let root = self.root();
        let file = normalize_join(root, path.trim_start_matches('/'));
        (file.starts_with(root) && file != root).then_some(file)
    }

    fn slot(&self, file: &Path) -> Arc<ModuleSlot> {
        if let Some(slot) = self.inner.modules.read().get(file) {
            return slot.clone();
        }
        self.inner
            .modules
            .write()
            .entry(file.to_path_buf())
            .or_insert_with(|| Arc::new(ModuleSlot::new(file)))
            .clone()
    }

    /// 构建期间只持有本模块的构建锁；状态锁只在读写状态时短暂持有
    fn ensure_built(&self, file: &Path) -> Result<(ModuleKind, Arc<Vec<u8>>), BuildFailure> {
        let slot = self.slot(file);
        let _build = slot.build.lock();

        for _ in 0..BUILD_ATTEMPTS {
            let (kind, generation) = {
                let module = slot.state.lock();
                if module.state == ModuleState::Built {
                    return Ok((module.kind, module.body.clone()));
                }
                (module.kind, module.generation)
            };

            let built = self.build_module(file, kind)?;

            let mut module = slot.state.lock();
            self.relink(file, &module.deps, &built.deps);
            module.body = Arc::new(built.body);
            module.deps = built.deps;
            module.has_broken = built.has_broken;
            if module.generation == generation {
                module.state = ModuleState::Built;
                tracing::debug!("built {}", self.url_of(file));
                return Ok((module.kind, module.body.clone()));
            }
            tracing::debug!("{} invalidated while building, rebuilding", self.url_of(file));
        }

        // 一直在被失效：返回最后一次结果，状态保持不变，下次请求再建
        let module = slot.state.lock();
        Ok((module.kind, module.body.clone()))
    }

    fn build_module(&self, file: &Path, kind: ModuleKind) -> Result<BuiltModule, BuildFailure> {
        let retry = RetryPolicy::default();
        if kind != ModuleKind::Script {
            return Ok(BuiltModule {
                body: retry.run(|| std::fs::read(file))?,
                deps: Vec::new(),
                has_broken: false,
            });
        }

        let source = read_to_string_with_retry(file, retry)?;
        let filename = file.to_string_lossy();
        let records =
            parse_imports(&source, &filename).map_err(|e| BuildFailure::Failed(e.to_string()))?;

        let mut specifiers = IndexMap::new();
        let mut deps = Vec::new();
        let mut has_broken = false;
        for record in records {
            let url = match self.inner.resolver.resolve(file, &record.specifier) {
                Some(target) => {
                    let mut url = self.url_of(&target);
                    if ModuleKind::from_path(&target) != ModuleKind::Script {
                        url = format!("{}?{}", url, IMPORT_QUERY);
                    }
                    if !deps.contains(&target) {
                        deps.push(target);
                    }
                    url
                }
                None => {
                    has_broken = true;
                    self.record(
                        Diagnostic::warning(format!(
                            "cannot resolve `{}` imported from {}",
                            record.specifier,
                            self.url_of(file)
                        ))
                        .emit(),
                    );
                    format!("{}?{}", BROKEN_PATH, percent_encode(&record.specifier))
                }
            };
            specifiers.insert(record.specifier, url);
        }

        let options = TransformOptions {
            env: Some(&self.inner.env),
            specifiers: Some(&specifiers),
        };
        let code = transform_module(&source, &filename, options)
            .map_err(|e| BuildFailure::Failed(e.to_string()))?
            .code;

        Ok(BuiltModule {
            body: code.into_bytes(),
            deps,
            has_broken,
        })
    }

    /// 用新的依赖列表替换反向图中 `file` 的旧边
    fn relink(&self, file: &Path, old: &[PathBuf], new: &[PathBuf]) {
        let mut importers = self.inner.importers.write();
        for dep in old {
            if let Some(list) = importers.get_mut(dep) {
                list.retain(|importer| importer != file);
            }
        }
        for dep in new {
            let list = importers.entry(dep.clone()).or_default();
            if !list.iter().any(|importer| importer == file) {
                list.push(file.to_path_buf());
            }
        }
    }

    fn respond(&self, file: &Path, kind: ModuleKind, body: &[u8], as_module: bool) -> DevResponse {
        match kind {
            ModuleKind::Script => DevResponse::ok(JAVASCRIPT, body.to_vec()),
            ModuleKind::Style => {
                let source = String::from_utf8_lossy(body);
                let css = if source.contains("@tailwind") {
                    self.stylesheet().inject_into(&source)
                } else {
                    source.into_owned()
                };
                if as_module {
                    DevResponse::ok(JAVASCRIPT, style_module(&css))
                } else {
                    DevResponse::ok(CSS, css)
                }
            }
            ModuleKind::Json if as_module => DevResponse::ok(
                JAVASCRIPT,
                format!("export default {};\n", String::from_utf8_lossy(body).trim()),
            ),
            ModuleKind::Json => DevResponse::ok(JSON, body.to_vec()),
            _ if as_module => DevResponse::ok(
                JAVASCRIPT,
                format!("export default {};\n", js_string(&self.url_of(file))),
            ),
            _ => {
                let content_type = content_type_for(file);
                if content_type == HTML {
                    DevResponse::ok(HTML, inject_client(&String::from_utf8_lossy(body)))
                } else {
                    DevResponse::ok(content_type, body.to_vec())
                }
            }
        }
    }

    /// 当前样式表；内容变更后首次访问时重新扫描生成
    fn stylesheet(&self) -> Arc<Stylesheet> {
        let _build = self.inner.styles_build.lock();
        let generation = {
            let cache = self.inner.styles.lock();
            if let Some(sheet) = &cache.sheet {
                return sheet.clone();
            }
            cache.generation
        };

        let config = &self.inner.config;
        let report = scan(&config.content_sources());
        self.inner
            .diagnostics
            .lock()
            .extend(report.diagnostics.iter().cloned());
        let rules = self.inner.utilities.resolve_all(&report.tokens);
        let sheet = Arc::new(
            Assembler::new(self.inner.utilities.theme())
                .with_preflight(config.build.preflight)
                .assemble(&rules),
        );
        tracing::debug!("regenerated stylesheet from {} tokens", report.tokens.len());
        let mut cache = self.inner.styles.lock();
        if cache.generation == generation {
            cache.sheet = Some(sheet.clone());
        }
        sheet
    }
}

/// `%XX` 解码；转义不完整或结果不是 UTF-8 时返回 None
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// URL 路径和查询中不需要转义的字符之外一律编码为 `%XX`
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~/@:!$'()*+,;=".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn throw_module(message: &str) -> String {
    format!("throw new Error({});\n", js_string(message))
}

/// CSS 以 `<style>` 注入页面
fn style_module(css: &str) -> String {
    format!(
        "const css = {};\nconst style = document.createElement(\"style\");\nstyle.textContent = css;\ndocument.head.appendChild(style);\nexport default css;\n",
        js_string(css)
    )
}

/// 在 `</head>` 前插入热更新客户端
fn inject_client(html: &str) -> String {
    let tag = format!("<script type=\"module\" src=\"{}\"></script>", CLIENT_PATH);
    match html.find("</head>") {
        Some(index) => format!("{}{}\n{}", &html[..index], tag, &html[index..]),
        None => format!("{}\n{}", tag, html),
    }
}

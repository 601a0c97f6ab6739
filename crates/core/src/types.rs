use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// 产物命名策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingMode {
    /// 基于内容 hash（如 "main-3f2a9c1d.js"）
    #[default]
    Hash,
    /// 调试友好，不带 hash（如 "main.js"）
    Readable,
}

/// 构建模式
///
/// Production 下未解析的 import 直接失败；Development 下降级为警告。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, BuildMode::Production)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CSS 声明
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Declaration {
    /// CSS 属性名（如 "padding"）
    pub property: String,
    /// CSS 属性值（如 "1rem"）
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)
    }
}

/// 诊断信息
///
/// 非致命问题（无法读取的内容文件、匹配为空的分组等）随结果一起返回。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level == DiagnosticLevel::Warning
    }

    /// 同时通过 tracing 输出
    pub fn emit(self) -> Self {
        match self.level {
            DiagnosticLevel::Warning => tracing::warn!("{}", self.message),
            DiagnosticLevel::Error => tracing::error!("{}", self.message),
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

/// 内容源：根目录 + glob 模式
///
/// 配置加载时确定，之后只读；每次扫描都会重新读取匹配到的文件。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentSource {
    pub root: PathBuf,
    pub pattern: String,
}

impl ContentSource {
    /// 从配置中的模式构造，去掉前导 `./`
    ///
    /// `("/app", "./src/**/*.tsx")` → root `/app`, pattern `src/**/*.tsx`
    pub fn new(root: impl Into<PathBuf>, pattern: &str) -> Self {
        let mut pattern = pattern.trim();
        while let Some(rest) = pattern.strip_prefix("./") {
            pattern = rest;
        }
        Self {
            root: root.into(),
            pattern: pattern.to_string(),
        }
    }

    /// 模式中第一个通配符之前的目录部分，用于限定遍历范围和监听范围
    pub fn base_dir(&self) -> PathBuf {
        let mut base = self.root.clone();
        for segment in self.pattern.split('/') {
            if segment.contains(['*', '?', '{', '[']) {
                return base;
            }
            base.push(segment);
        }
        // 模式不含通配符：指向单个文件，监听其所在目录
        base.parent().map(Path::to_path_buf).unwrap_or(base)
    }

    /// 模式是否只匹配一个具体文件
    pub fn is_literal(&self) -> bool {
        !self.pattern.contains(['*', '?', '{', '['])
    }
}

/// 文件系统变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: WatchKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, WatchKind::Modified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Created,
    Modified,
    Deleted,
}

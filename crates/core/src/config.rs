//! 项目配置
//!
//! 分层加载：内置默认值 → `crosswind.toml` → `CROSSWIND_*` 环境变量
//! （`__` 表示嵌套，如 `CROSSWIND_SERVER__PORT=3000`）。

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::theme::{ColorValue, ThemeConfig};
use crate::types::{ContentSource, NamingMode};

/// 默认配置文件名
pub const CONFIG_FILE: &str = "crosswind.toml";

/// 默认路径别名 `@ → ./src`
pub const DEFAULT_ALIAS: (&str, &str) = ("@", "./src");

/// 规则参数可引用的主题表
pub const PARAM_TABLES: [&str; 8] = [
    "colors",
    "spacing",
    "radius",
    "opacity",
    "font-size",
    "font-weight",
    "animation",
    "screens",
];

/// 暗色模式策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
    /// `.dark .x`
    #[default]
    Class,
    /// `@media (prefers-color-scheme: dark)`
    Media,
}

/// 用户自定义工具类规则
///
/// ```toml
/// [[rules]]
/// pattern = "bg-{color}"
/// declarations = ["background-color: var(--{color})"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub pattern: String,
    pub declarations: Vec<String>,
    #[serde(default)]
    pub negatable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// 单段别名 → 目录（相对项目根）
    pub alias: IndexMap<String, String>,
}

/// 手动分组：名称 + 包名或项目相对路径
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualChunk {
    pub name: String,
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub entries: Vec<String>,
    pub out_dir: String,
    /// 按声明顺序匹配，先声明者优先
    pub manual_chunks: Vec<ManualChunk>,
    /// KiB
    pub chunk_size_warning_limit: u64,
    pub preflight: bool,
    pub naming: NamingMode,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            entries: vec!["src/main.tsx".to_string()],
            out_dir: "dist".to_string(),
            manual_chunks: Vec::new(),
            chunk_size_warning_limit: 500,
            preflight: true,
            naming: NamingMode::Hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "::".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosswindConfig {
    /// 项目根目录（配置文件所在目录），不参与序列化
    #[serde(skip)]
    pub root: PathBuf,
    pub content: Vec<String>,
    pub dark_mode: DarkMode,
    pub env_prefix: String,
    pub theme: ThemeConfig,
    pub rules: Vec<RuleConfig>,
    pub resolve: ResolveConfig,
    pub build: BuildConfig,
    pub server: ServerConfig,
}

impl Default for CrosswindConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            content: vec![
                "./index.html".to_string(),
                "./src/**/*.{js,ts,jsx,tsx}".to_string(),
            ],
            dark_mode: DarkMode::Class,
            env_prefix: "VITE_".to_string(),
            theme: ThemeConfig::default(),
            rules: Vec::new(),
            resolve: ResolveConfig {
                alias: IndexMap::from([(
                    DEFAULT_ALIAS.0.to_string(),
                    DEFAULT_ALIAS.1.to_string(),
                )]),
            },
            build: BuildConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl CrosswindConfig {
    /// 加载并校验配置
    ///
    /// 配置文件不存在时只使用默认值和环境变量；项目根为配置文件所在目录。
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(CrosswindConfig::default()));
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
        }
        figment = figment.merge(Env::prefixed("CROSSWIND_").split("__"));

        Self::from_figment(figment, project_root(path))
    }

    /// 从 TOML 文本加载（不读取环境变量）
    pub fn from_toml_str(toml: &str, root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(CrosswindConfig::default()))
            .merge(Toml::string(toml));
        Self::from_figment(figment, root.into())
    }

    fn from_figment(figment: Figment, root: PathBuf) -> Result<Self, ConfigError> {
        let mut config: CrosswindConfig = figment.extract()?;
        config.root = root;
        config.validate()?;
        tracing::debug!(root = %config.root.display(), rules = config.rules.len(), "configuration loaded");
        Ok(config)
    }

    /// 校验配置；错误中携带出错的配置项路径
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.is_empty() || self.content.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::new("content", "at least one non-empty pattern is required"));
        }
        if self.env_prefix.is_empty() {
            return Err(ConfigError::new(
                "env_prefix",
                "an empty prefix would expose every environment variable",
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::new("server.port", "port must be non-zero"));
        }
        if self.build.entries.is_empty() {
            return Err(ConfigError::new("build.entries", "at least one entry is required"));
        }

        for (i, rule) in self.rules.iter().enumerate() {
            validate_rule(i, rule)?;
        }
        self.validate_theme()?;
        self.validate_aliases()?;

        for (i, group) in self.build.manual_chunks.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(ConfigError::new(
                    format!("build.manual_chunks[{}].name", i),
                    "group name must not be empty",
                ));
            }
        }
        Ok(())
    }

    fn validate_theme(&self) -> Result<(), ConfigError> {
        for (name, value) in &self.theme.colors {
            let empty = match value {
                ColorValue::Single(v) => v.trim().is_empty(),
                ColorValue::Palette(shades) => {
                    shades.is_empty() || shades.values().any(|v| v.trim().is_empty())
                }
            };
            if empty {
                return Err(ConfigError::new(
                    format!("theme.colors.{}", name),
                    "color value must not be empty",
                ));
            }
        }

        let tables = [
            ("spacing", &self.theme.spacing),
            ("screens", &self.theme.screens),
            ("border_radius", &self.theme.border_radius),
            ("font_size", &self.theme.font_size),
            ("font_weight", &self.theme.font_weight),
            ("opacity", &self.theme.opacity),
            ("animation", &self.theme.animation),
        ];
        for (table, values) in tables {
            if let Some((key, _)) = values.iter().find(|(_, v)| v.trim().is_empty()) {
                return Err(ConfigError::new(
                    format!("theme.{}.{}", table, key),
                    "theme value must not be empty",
                ));
            }
        }
        Ok(())
    }

    fn validate_aliases(&self) -> Result<(), ConfigError> {
        for (alias, target) in &self.resolve.alias {
            let key = format!("resolve.alias.{}", alias);
            if alias.is_empty() || alias.contains('/') {
                return Err(ConfigError::new(key, "alias must be a single path segment"));
            }
            let dir = self.root.join(target);
            if !dir.is_dir() {
                // 未改动的默认别名允许目录不存在
                if (alias.as_str(), target.as_str()) == DEFAULT_ALIAS {
                    tracing::debug!(dir = %dir.display(), "default alias target missing, skipped");
                    continue;
                }
                return Err(ConfigError::new(
                    key,
                    format!("target directory `{}` does not exist", dir.display()),
                ));
            }
        }
        Ok(())
    }

    /// 配置中的内容模式 → ContentSource
    pub fn content_sources(&self) -> Vec<ContentSource> {
        self.content
            .iter()
            .map(|pattern| ContentSource::new(self.root.clone(), pattern))
            .collect()
    }

    /// 别名 → 绝对目录
    pub fn alias_dirs(&self) -> IndexMap<String, PathBuf> {
        self.resolve
            .alias
            .iter()
            .map(|(alias, target)| (alias.clone(), normalize_join(&self.root, target)))
            .collect()
    }

    pub fn out_dir(&self) -> PathBuf {
        normalize_join(&self.root, &self.build.out_dir)
    }

    pub fn entry_paths(&self) -> Vec<PathBuf> {
        self.build
            .entries
            .iter()
            .map(|entry| normalize_join(&self.root, entry))
            .collect()
    }
}

fn project_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `root.join("./src")` 去掉多余的 `.` 段
pub fn normalize_join(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                path.pop();
            }
            other => path.push(other),
        }
    }
    path
}

fn validate_rule(index: usize, rule: &RuleConfig) -> Result<(), ConfigError> {
    let pattern_key = format!("rules[{}].pattern", index);
    let params = rule_params(&rule.pattern).map_err(|msg| ConfigError::new(&pattern_key, msg))?;

    if rule.declarations.is_empty() {
        return Err(ConfigError::new(
            format!("rules[{}].declarations", index),
            "at least one declaration is required",
        ));
    }

    for (j, decl) in rule.declarations.iter().enumerate() {
        let key = format!("rules[{}].declarations[{}]", index, j);
        let Some((property, value)) = decl.split_once(':') else {
            return Err(ConfigError::new(key, "expected `property: value`"));
        };
        if property.trim().is_empty() || value.trim().is_empty() {
            return Err(ConfigError::new(key, "expected `property: value`"));
        }
        for name in placeholders(decl).map_err(|msg| ConfigError::new(&key, msg))? {
            if !params.iter().any(|p| p == name) {
                return Err(ConfigError::new(
                    key,
                    format!("unknown placeholder `{{{}}}`", name),
                ));
            }
        }
    }
    Ok(())
}

/// 规则模式：字面量（`flex`），或字面量前缀 + 结尾的单个参数（`bg-{color}`、`p-{v:spacing}`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePattern {
    /// 参数之前的字面量部分（如 "bg-"），字面量规则为整个模式
    pub prefix: String,
    pub param: Option<RuleParam>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleParam {
    pub name: String,
    /// `{v:spacing}` 中的表名；`{color}` 为 None（任意文本）
    pub table: Option<String>,
}

impl RulePattern {
    /// 只做语法检查，表名是否存在由调用方决定
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if pattern.trim().is_empty() {
            return Err("pattern must not be empty".to_string());
        }
        let Some(open) = pattern.find('{') else {
            if pattern.contains('}') {
                return Err("unbalanced `}`".to_string());
            }
            return Ok(Self {
                prefix: pattern.to_string(),
                param: None,
            });
        };

        let prefix = &pattern[..open];
        if prefix.is_empty() {
            return Err("a parameter needs a literal prefix".to_string());
        }
        let rest = &pattern[open + 1..];
        let Some(close) = rest.find('}') else {
            return Err("unbalanced `{`".to_string());
        };
        if close + 1 != rest.len() {
            return Err("the parameter must be the last part of the pattern".to_string());
        }

        let inner = &rest[..close];
        let (name, table) = match inner.split_once(':') {
            Some((name, table)) => (name, Some(table.to_string())),
            None => (inner, None),
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid parameter name `{}`", name));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            param: Some(RuleParam {
                name: name.to_string(),
                table,
            }),
        })
    }
}

/// 校验用户规则模式，返回参数名列表
fn rule_params(pattern: &str) -> Result<Vec<String>, String> {
    let parsed = RulePattern::parse(pattern)?;
    let Some(param) = parsed.param else {
        return Ok(Vec::new());
    };
    if let Some(table) = &param.table {
        if !PARAM_TABLES.contains(&table.as_str()) {
            return Err(format!(
                "unknown table `{}` (expected one of {})",
                table,
                PARAM_TABLES.join(", ")
            ));
        }
    }
    Ok(vec![param.name])
}

/// 声明模板中的 `{name}` 占位符
pub fn placeholders(template: &str) -> Result<Vec<&str>, String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err("unbalanced `{`".to_string());
        };
        names.push(&after[..close]);
        rest = &after[close + 1..];
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        dir
    }

    #[test]
    fn test_defaults_validate() {
        let dir = project();
        let config = CrosswindConfig::from_toml_str("", dir.path()).unwrap();

        assert_eq!(config.env_prefix, "VITE_");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.build.chunk_size_warning_limit, 500);
        assert_eq!(config.dark_mode, DarkMode::Class);
        assert_eq!(config.alias_dirs().get("@"), Some(&dir.path().join("src")));
    }

    #[test]
    fn test_rule_pattern_params() {
        assert_eq!(rule_params("flex").unwrap(), Vec::<String>::new());
        assert_eq!(rule_params("bg-{color}").unwrap(), vec!["color"]);
        assert_eq!(rule_params("p-{v:spacing}").unwrap(), vec!["v"]);
        assert!(rule_params("{color}").is_err());
        assert!(rule_params("bg-{color").is_err());
        assert!(rule_params("bg-{c}-x").is_err());
        assert!(rule_params("bg-{c:unknown}").is_err());
    }

    #[test]
    fn test_invalid_rule_reports_key() {
        let dir = project();
        let toml = r#"
            [[rules]]
            pattern = "bg-{color}"
            declarations = ["background-color: var(--{colour})"]
        "#;
        let err = CrosswindConfig::from_toml_str(toml, dir.path()).unwrap_err();
        assert_eq!(err.key, "rules[0].declarations[0]");
    }

    #[test]
    fn test_missing_alias_dir_reports_key() {
        let dir = project();
        let toml = "[resolve.alias]\n\"~\" = \"./lib\"\n";
        let err = CrosswindConfig::from_toml_str(toml, dir.path()).unwrap_err();
        assert_eq!(err.key, "resolve.alias.~");
    }

    #[test]
    fn test_default_alias_without_src_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = CrosswindConfig::from_toml_str("content = [\"./index.html\"]", dir.path()).unwrap();
        assert_eq!(config.alias_dirs().get("@"), Some(&dir.path().join("src")));

        // 用户改写了默认别名时照常校验
        let err = CrosswindConfig::from_toml_str("[resolve.alias]\n\"@\" = \"./app\"\n", dir.path())
            .unwrap_err();
        assert_eq!(err.key, "resolve.alias.@");
    }

    #[test]
    fn test_port_zero_rejected() {
        let dir = project();
        let err = CrosswindConfig::from_toml_str("[server]\nport = 0", dir.path()).unwrap_err();
        assert_eq!(err.key, "server.port");
    }

    #[test]
    fn test_normalize_join() {
        assert_eq!(
            normalize_join(Path::new("/app"), "./src"),
            PathBuf::from("/app/src")
        );
        assert_eq!(
            normalize_join(Path::new("/app/web"), "../shared/x.ts"),
            PathBuf::from("/app/shared/x.ts")
        );
    }
}

//! import 说明符 → 模块文件
//!
//! 解析顺序：相对路径（`./`、`../`、根相对 `/`）→ 路径别名 → node_modules 包。
//! 每一步都依次尝试原路径、补全扩展名、目录下的 `index.*`。

use std::path::{Component, Path, PathBuf};

use crosswind_core::{normalize_join, CrosswindConfig};
use indexmap::IndexMap;

/// 按顺序尝试的扩展名
pub const EXTENSIONS: [&str; 7] = ["tsx", "ts", "jsx", "js", "mjs", "json", "css"];

#[derive(Debug, Clone)]
pub struct ModuleResolver {
    root: PathBuf,
    aliases: IndexMap<String, PathBuf>,
}

impl ModuleResolver {
    pub fn new(root: impl Into<PathBuf>, aliases: IndexMap<String, PathBuf>) -> Self {
        Self {
            root: root.into(),
            aliases,
        }
    }

    pub fn from_config(config: &CrosswindConfig) -> Self {
        Self::new(config.root.clone(), config.alias_dirs())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 解析失败返回 None，由调用方决定报错还是降级
    pub fn resolve(&self, importer: &Path, specifier: &str) -> Option<PathBuf> {
        if specifier.is_empty() {
            return None;
        }

        if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." {
            let dir = importer.parent().unwrap_or(&self.root);
            return resolve_file(&normalize_join(dir, specifier));
        }

        if let Some(rest) = specifier.strip_prefix('/') {
            return resolve_file(&normalize_join(&self.root, rest));
        }

        if let Some(path) = self.resolve_alias(specifier) {
            return Some(path);
        }

        self.resolve_package(importer, specifier)
    }

    /// `@/components/x` 且 `@ → ./src` → `src/components/x`
    fn resolve_alias(&self, specifier: &str) -> Option<PathBuf> {
        for (alias, dir) in &self.aliases {
            let rest = if specifier == alias {
                ""
            } else if let Some(rest) = specifier
                .strip_prefix(alias.as_str())
                .and_then(|r| r.strip_prefix('/'))
            {
                rest
            } else {
                continue;
            };
            return resolve_file(&normalize_join(dir, rest));
        }
        None
    }

    /// 从 importer 所在目录逐级向上查找 node_modules
    fn resolve_package(&self, importer: &Path, specifier: &str) -> Option<PathBuf> {
        let (name, subpath) = split_package(specifier)?;

        let mut dir = importer.parent();
        while let Some(current) = dir {
            let package_dir = current.join("node_modules").join(name);
            if package_dir.is_dir() {
                return match subpath {
                    Some(subpath) => resolve_file(&normalize_join(&package_dir, subpath)),
                    None => resolve_package_entry(&package_dir),
                };
            }
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            dir = current.parent();
        }
        None
    }

    /// 模块所属的包名（`node_modules/@radix-ui/react-slot/dist/index.mjs` → `@radix-ui/react-slot`）
    pub fn package_of(&self, path: &Path) -> Option<String> {
        let components: Vec<_> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        let position = components.iter().rposition(|c| *c == "node_modules")?;
        let first = components.get(position + 1)?;
        if first.starts_with('@') {
            let second = components.get(position + 2)?;
            Some(format!("{}/{}", first, second))
        } else {
            Some(first.to_string())
        }
    }

    /// 相对项目根目录的模块标识，统一用 `/` 分隔
    pub fn module_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// `react-dom/client` → ("react-dom", Some("client"))；`@scope/pkg` → ("@scope/pkg", None)
fn split_package(specifier: &str) -> Option<(&str, Option<&str>)> {
    let segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut split_at = None;
    let mut seen = 0;
    for (i, ch) in specifier.char_indices() {
        if ch == '/' {
            seen += 1;
            if seen == segments {
                split_at = Some(i);
                break;
            }
        }
    }
    match split_at {
        Some(i) => {
            let subpath = &specifier[i + 1..];
            Some((&specifier[..i], (!subpath.is_empty()).then_some(subpath)))
        }
        // `@scope` 本身不是合法包名
        None if segments == 2 && !specifier.contains('/') => None,
        None => Some((specifier, None)),
    }
}

/// package.json 的 `module`，然后 `main`，最后 `index.js`
fn resolve_package_entry(package_dir: &Path) -> Option<PathBuf> {
    let manifest = std::fs::read_to_string(package_dir.join("package.json"))
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok());

    if let Some(manifest) = manifest {
        for field in ["module", "main"] {
            if let Some(entry) = manifest.get(field).and_then(|v| v.as_str()) {
                if let Some(path) = resolve_file(&normalize_join(package_dir, entry)) {
                    return Some(path);
                }
            }
        }
    }
    resolve_file(&package_dir.join("index.js"))
}

/// 原路径 → 补扩展名 → 目录 index
fn resolve_file(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    if let Some(name) = base.file_name().and_then(|n| n.to_str()) {
        for ext in EXTENSIONS {
            let candidate = base.with_file_name(format!("{}.{}", name, ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    if base.is_dir() {
        for ext in EXTENSIONS {
            let candidate = base.join(format!("index.{}", ext));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
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

    fn project() -> (tempfile::TempDir, ModuleResolver) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/main.tsx", "");
        touch(root, "src/App.tsx", "");
        touch(root, "src/lib/utils.ts", "");
        touch(root, "src/components/ui/index.ts", "");
        touch(root, "src/data.json", "{}");
        touch(root, "node_modules/react/package.json", r#"{"main": "index.js"}"#);
        touch(root, "node_modules/react/index.js", "");
        touch(root, "node_modules/react-dom/client.js", "");
        touch(
            root,
            "node_modules/@radix-ui/react-slot/package.json",
            r#"{"module": "dist/index.mjs", "main": "dist/index.js"}"#,
        );
        touch(root, "node_modules/@radix-ui/react-slot/dist/index.mjs", "");
        touch(root, "node_modules/clsx/index.js", "");

        let mut aliases = IndexMap::new();
        aliases.insert("@".to_string(), root.join("src"));
        let resolver = ModuleResolver::new(root, aliases);
        (dir, resolver)
    }

    #[test]
    fn test_relative_and_extensions() {
        let (dir, resolver) = project();
        let main = dir.path().join("src/main.tsx");
        assert_eq!(
            resolver.resolve(&main, "./App"),
            Some(dir.path().join("src/App.tsx"))
        );
        assert_eq!(
            resolver.resolve(&main, "./data.json"),
            Some(dir.path().join("src/data.json"))
        );
        assert_eq!(
            resolver.resolve(&main, "./components/ui"),
            Some(dir.path().join("src/components/ui/index.ts"))
        );
        assert_eq!(
            resolver.resolve(&main, "/src/lib/utils"),
            Some(dir.path().join("src/lib/utils.ts"))
        );
        assert_eq!(resolver.resolve(&main, "./missing"), None);
    }

    #[test]
    fn test_alias() {
        let (dir, resolver) = project();
        let app = dir.path().join("src/App.tsx");
        assert_eq!(
            resolver.resolve(&app, "@/lib/utils"),
            Some(dir.path().join("src/lib/utils.ts"))
        );
    }

    #[test]
    fn test_packages() {
        let (dir, resolver) = project();
        let app = dir.path().join("src/App.tsx");
        assert_eq!(
            resolver.resolve(&app, "react"),
            Some(dir.path().join("node_modules/react/index.js"))
        );
        assert_eq!(
            resolver.resolve(&app, "react-dom/client"),
            Some(dir.path().join("node_modules/react-dom/client.js"))
        );
        // module 优先于 main
        assert_eq!(
            resolver.resolve(&app, "@radix-ui/react-slot"),
            Some(dir.path().join("node_modules/@radix-ui/react-slot/dist/index.mjs"))
        );
        // 没有 package.json 时回退到 index.js
        assert_eq!(
            resolver.resolve(&app, "clsx"),
            Some(dir.path().join("node_modules/clsx/index.js"))
        );
        assert_eq!(resolver.resolve(&app, "lodash"), None);
    }

    #[test]
    fn test_package_of_and_module_name() {
        let (dir, resolver) = project();
        let slot = dir
            .path()
            .join("node_modules/@radix-ui/react-slot/dist/index.mjs");
        assert_eq!(resolver.package_of(&slot).as_deref(), Some("@radix-ui/react-slot"));
        assert_eq!(
            resolver.module_name(&slot),
            "node_modules/@radix-ui/react-slot/dist/index.mjs"
        );
        assert_eq!(resolver.package_of(&dir.path().join("src/App.tsx")), None);
    }

    #[test]
    fn test_split_package() {
        assert_eq!(split_package("react"), Some(("react", None)));
        assert_eq!(split_package("react-dom/client"), Some(("react-dom", Some("client"))));
        assert_eq!(split_package("@scope/pkg/sub"), Some(("@scope/pkg", Some("sub"))));
        assert_eq!(split_package("@scope"), None);
    }
}

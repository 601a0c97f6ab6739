use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crosswind_core::{ContentSource, Diagnostic};
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;

/// 展开内容源为具体文件列表（排序、去重）
///
/// 遵循 `.gitignore`；除非模式中显式包含 `node_modules`，否则跳过该目录。
/// 无效模式和不存在的目录产生警告，不中断其余内容源。
pub fn expand_sources(sources: &[ContentSource]) -> (Vec<PathBuf>, Vec<Diagnostic>) {
    let mut files = BTreeSet::new();
    let mut diagnostics = Vec::new();

    for source in sources {
        if source.is_literal() {
            let path = source.root.join(&source.pattern);
            if path.is_file() {
                files.insert(path);
            } else {
                diagnostics.push(
                    Diagnostic::warning(format!("content file not found: {}", path.display()))
                        .emit(),
                );
            }
            continue;
        }

        let matcher = match build_matcher(&source.pattern) {
            Ok(matcher) => matcher,
            Err(message) => {
                diagnostics.push(Diagnostic::warning(message).emit());
                continue;
            }
        };

        let base = source.base_dir();
        if !base.is_dir() {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "content directory not found: {} (pattern `{}`)",
                    base.display(),
                    source.pattern
                ))
                .emit(),
            );
            continue;
        }

        let include_node_modules = source.pattern.contains("node_modules");
        let walker = WalkBuilder::new(&base)
            .hidden(true)
            .git_ignore(true)
            .git_exclude(true)
            .require_git(false)
            .filter_entry(move |entry| {
                include_node_modules || entry.file_name() != "node_modules"
            })
            .build();

        let before = files.len();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&source.root) else {
                continue;
            };
            if matcher.is_match(relative) {
                files.insert(entry.path().to_path_buf());
            }
        }
        tracing::debug!(
            pattern = %source.pattern,
            matched = files.len() - before,
            "expanded content source"
        );
    }

    (files.into_iter().collect(), diagnostics)
}

/// 判断文件是否属于某个内容源（开发服务器据此决定是否重新生成样式）
#[derive(Debug, Clone, Default)]
pub struct ContentMatcher {
    sources: Vec<(PathBuf, GlobMatcher)>,
}

impl ContentMatcher {
    /// 无效模式被跳过，警告与 `expand_sources` 一致
    pub fn new(sources: &[ContentSource]) -> (Self, Vec<Diagnostic>) {
        let mut matcher = ContentMatcher::default();
        let mut diagnostics = Vec::new();
        for source in sources {
            match build_matcher(&source.pattern) {
                Ok(glob) => matcher.sources.push((source.root.clone(), glob)),
                Err(message) => diagnostics.push(Diagnostic::warning(message).emit()),
            }
        }
        (matcher, diagnostics)
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.sources.iter().any(|(root, glob)| {
            path.strip_prefix(root)
                .is_ok_and(|relative| glob.is_match(relative))
        })
    }
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher, String> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|err| format!("invalid glob pattern '{}': {}", pattern, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &std::path::Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_expand_brace_glob_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "index.html");
        touch(root, "src/main.tsx");
        touch(root, "src/lib/utils.ts");
        touch(root, "src/style.css");
        touch(root, "node_modules/react/index.js");

        let sources = vec![
            ContentSource::new(root, "./index.html"),
            ContentSource::new(root, "./src/**/*.{js,ts,jsx,tsx}"),
        ];
        let (files, diagnostics) = expand_sources(&sources);

        assert!(diagnostics.is_empty());
        assert_eq!(
            files,
            vec![
                root.join("index.html"),
                root.join("src/lib/utils.ts"),
                root.join("src/main.tsx"),
            ]
        );
    }

    #[test]
    fn test_skips_node_modules_and_gitignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".gitignore"), "generated/\n").unwrap();
        touch(root, "app.ts");
        touch(root, "generated/out.ts");
        touch(root, "node_modules/pkg/index.ts");

        let (files, _) = expand_sources(&[ContentSource::new(root, "**/*.ts")]);
        assert_eq!(files, vec![root.join("app.ts")]);
    }

    #[test]
    fn test_content_matcher() {
        let sources = vec![
            ContentSource::new("/app", "./index.html"),
            ContentSource::new("/app", "./src/**/*.{js,ts,jsx,tsx}"),
        ];
        let (matcher, diagnostics) = ContentMatcher::new(&sources);
        assert!(diagnostics.is_empty());
        assert!(matcher.is_match(Path::new("/app/index.html")));
        assert!(matcher.is_match(Path::new("/app/src/components/ui/button.tsx")));
        assert!(!matcher.is_match(Path::new("/app/src/index.css")));
        assert!(!matcher.is_match(Path::new("/other/index.html")));
    }

    #[test]
    fn test_missing_sources_warn() {
        let dir = tempfile::tempdir().unwrap();
        let (files, diagnostics) = expand_sources(&[
            ContentSource::new(dir.path(), "./index.html"),
            ContentSource::new(dir.path(), "./src/**/*.tsx"),
        ]);

        assert!(files.is_empty());
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.is_warning()));
    }
}

//! 文件监听
//!
//! 优先使用系统原生通知；失败时退化为轮询，再失败则关闭热更新。
//! 两种退化都只产生警告，不影响服务器本身。

use std::path::{Component, Path};
use std::time::Duration;

use crosswind_core::{Diagnostic, WatchEvent, WatchKind};
use notify::event::ModifyKind;
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 不参与监听和失效的目录
const IGNORED_DIRS: [&str; 3] = ["node_modules", "dist", "target"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    Native,
    Polling,
    Disabled,
}

/// 持有底层 watcher；drop 后停止监听
pub struct ProjectWatcher {
    _inner: Option<Box<dyn Watcher + Send>>,
    mode: WatchMode,
}

impl ProjectWatcher {
    pub fn mode(&self) -> WatchMode {
        self.mode
    }
}

/// 递归监听 `root`，变更通过 `tx` 发出
pub fn watch_project(
    root: &Path,
    tx: UnboundedSender<WatchEvent>,
) -> (ProjectWatcher, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let native = notify::recommended_watcher(handler(root, tx.clone())).and_then(|mut watcher| {
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(watcher)
    });
    match native {
        Ok(watcher) => {
            tracing::info!("watching {} for changes", root.display());
            return (
                ProjectWatcher {
                    _inner: Some(Box::new(watcher)),
                    mode: WatchMode::Native,
                },
                diagnostics,
            );
        }
        Err(err) => diagnostics.push(
            Diagnostic::warning(format!(
                "native file watching unavailable ({}), falling back to polling",
                err
            ))
            .emit(),
        ),
    }

    let config = notify::Config::default().with_poll_interval(POLL_INTERVAL);
    let polling = notify::PollWatcher::new(handler(root, tx), config).and_then(|mut watcher| {
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(watcher)
    });
    match polling {
        Ok(watcher) => (
            ProjectWatcher {
                _inner: Some(Box::new(watcher)),
                mode: WatchMode::Polling,
            },
            diagnostics,
        ),
        Err(err) => {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "file watching failed ({}), live reload is disabled",
                    err
                ))
                .emit(),
            );
            (
                ProjectWatcher {
                    _inner: None,
                    mode: WatchMode::Disabled,
                },
                diagnostics,
            )
        }
    }
}

fn handler(
    root: &Path,
    tx: UnboundedSender<WatchEvent>,
) -> impl FnMut(notify::Result<notify::Event>) + Send + 'static {
    let root = root.to_path_buf();
    move |result| match result {
        Ok(event) => {
            for event in convert(&root, event) {
                // 接收端关闭说明服务器已退出
                if tx.send(event).is_err() {
                    return;
                }
            }
        }
        Err(err) => tracing::warn!("watch error: {}", err),
    }
}

/// notify 事件 → WatchEvent，忽略元数据变化和被忽略的路径
pub fn convert(root: &Path, event: notify::Event) -> Vec<WatchEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => WatchKind::Created,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => WatchKind::Modified,
        EventKind::Remove(_) => WatchKind::Deleted,
        _ => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .filter(|path| !is_ignored(root, path))
        .map(|path| WatchEvent::new(path, kind))
        .collect()
}

/// 隐藏文件、`node_modules`、`dist`、`target` 下的路径
pub fn is_ignored(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| match component {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| name.starts_with('.') || IGNORED_DIRS.contains(&name)),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use notify::event::{CreateKind, DataChange, MetadataKind};

    #[test]
    fn test_is_ignored() {
        let root = Path::new("/app");
        assert!(is_ignored(root, Path::new("/app/.git/index")));
        assert!(is_ignored(root, Path::new("/app/src/.App.tsx.swp")));
        assert!(is_ignored(root, Path::new("/app/node_modules/react/index.js")));
        assert!(is_ignored(root, Path::new("/app/dist/assets/main.js")));
        assert!(!is_ignored(root, Path::new("/app/src/App.tsx")));
        // 根目录本身在隐藏目录中不影响判断
        assert!(!is_ignored(
            Path::new("/home/u/.projects/app"),
            Path::new("/home/u/.projects/app/src/a.ts")
        ));
    }

    #[test]
    fn test_convert_events() {
        let root = Path::new("/app");
        let event = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/app/src/new.ts"))
            .add_path(PathBuf::from("/app/node_modules/x.js"));
        assert_eq!(
            convert(root, event),
            vec![WatchEvent::new("/app/src/new.ts", WatchKind::Created)]
        );

        let event = notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/app/src/a.ts"));
        assert_eq!(convert(root, event), vec![WatchEvent::modified("/app/src/a.ts")]);

        let event = notify::Event::new(EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::Permissions,
        )))
        .add_path(PathBuf::from("/app/src/a.ts"));
        assert!(convert(root, event).is_empty());
    }
}

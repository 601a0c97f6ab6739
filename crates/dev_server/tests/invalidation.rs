use std::fs;
use std::path::Path;
use std::time::Duration;

use crosswind_core::{BuildMode, CrosswindConfig, EnvSnapshot, WatchEvent, WatchKind};
use crosswind_dev::{bind, serve, DevServer, ModuleState, STYLES_PATH};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

fn touch(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn server(root: &Path) -> DevServer {
    let mut config = CrosswindConfig::default();
    config.root = root.to_path_buf();
    config.build.preflight = false;
    let env = EnvSnapshot::from_vars(
        [
            ("VITE_API_URL", "https://api.example.com"),
            ("SECRET_KEY", "hunter2"),
        ],
        "VITE_",
        BuildMode::Development,
    );
    DevServer::new(config, env).unwrap()
}

/// `a` ← `b` ← `c`
fn chain() -> (tempfile::TempDir, DevServer) {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "src/a.js", "export const a = 1;\n");
    touch(dir.path(), "src/b.js", "import { a } from './a.js';\nexport const b = a;\n");
    touch(dir.path(), "src/c.js", "import { b } from './b.js';\nconsole.log(b);\n");
    let server = server(dir.path());
    (dir, server)
}

#[test]
fn test_edit_marks_importers_stale_and_rebuilds_lazily() {
    let (dir, server) = chain();
    let root = server.root().to_path_buf();
    let (a, b, c) = (root.join("src/a.js"), root.join("src/b.js"), root.join("src/c.js"));

    assert_eq!(server.state_of(&a), None);
    for url in ["/src/c.js", "/src/b.js", "/src/a.js"] {
        assert_eq!(server.request(url).status, 200);
    }
    assert_eq!(server.state_of(&a), Some(ModuleState::Built));

    touch(dir.path(), "src/a.js", "export const a = 2;\n");
    let notice = server.apply_event(WatchEvent::modified(&a));
    assert_eq!(
        notice.changed,
        vec!["/src/a.js", "/src/b.js", "/src/c.js", STYLES_PATH]
    );
    assert_eq!(server.state_of(&b), Some(ModuleState::Stale));
    assert_eq!(server.state_of(&c), Some(ModuleState::Stale));

    let response = server.request("/src/a.js");
    assert!(response.text().contains("export const a = 2;"));
    assert_eq!(server.state_of(&a), Some(ModuleState::Built));
    assert_eq!(server.state_of(&b), Some(ModuleState::Stale));
    assert_eq!(server.state_of(&c), Some(ModuleState::Stale));
}

#[test]
fn test_unrelated_edit_leaves_modules_built() {
    let (dir, server) = chain();
    touch(dir.path(), "src/other.js", "export const o = 1;\n");
    server.request("/src/c.js");
    server.request("/src/other.js");

    let other = server.root().join("src/other.js");
    let notice = server.apply_event(WatchEvent::modified(&other));
    assert_eq!(notice.changed, vec!["/src/other.js", STYLES_PATH]);
    assert_eq!(
        server.state_of(&server.root().join("src/c.js")),
        Some(ModuleState::Built)
    );
}

#[test]
fn test_ignored_paths_do_not_invalidate() {
    let (_dir, server) = chain();
    server.request("/src/a.js");
    let notice =
        server.apply_event(WatchEvent::modified(server.root().join("node_modules/x/index.js")));
    assert!(notice.is_empty());
}

#[test]
fn test_module_transform() {
    let dir = tempfile::tempdir().unwrap();
    touch(
        dir.path(),
        "src/main.tsx",
        r#"import React from "react";
import { cn } from "@/lib/utils";
import "./index.css";
import { missing } from "./missing";

const secret = import.meta.env.SECRET_KEY;
const api = import.meta.env.VITE_API_URL;
"#,
    );
    touch(dir.path(), "src/lib/utils.ts", "export const cn = () => '';\n");
    touch(dir.path(), "src/index.css", "@tailwind utilities;\n");
    touch(dir.path(), "node_modules/react/index.js", "export default {};\n");
    let server = server(dir.path());

    let code = server.request("/src/main.tsx").text();
    assert!(code.contains(r#"from "/node_modules/react/index.js""#));
    assert!(code.contains(r#"from "/src/lib/utils.ts""#));
    assert!(code.contains(r#"import "/src/index.css?import""#));
    assert!(code.contains(r#"from "/@crosswind/broken?./missing""#));
    assert!(code.contains("https://api.example.com"));
    assert!(!code.contains("hunter2"));

    assert!(server
        .diagnostics()
        .iter()
        .any(|d| d.message.contains("./missing")));
    let broken = server.request("/@crosswind/broken?./missing");
    assert_eq!(broken.status, 200);
    assert!(broken.text().starts_with("throw new Error("));

    let style = server.request("/src/index.css?import");
    assert!(style.text().contains("document.createElement(\"style\")"));
}

#[test]
fn test_created_file_repairs_broken_import() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "src/main.js", "import { x } from './late.js';\n");
    let server = server(dir.path());

    assert!(server
        .request("/src/main.js")
        .text()
        .contains("/@crosswind/broken?./late.js"));

    touch(dir.path(), "src/late.js", "export const x = 1;\n");
    let notice = server.apply_event(WatchEvent::new(
        server.root().join("src/late.js"),
        WatchKind::Created,
    ));
    assert!(notice.changed.contains(&"/src/main.js".to_string()));
    assert!(server
        .request("/src/main.js")
        .text()
        .contains(r#"from "/src/late.js""#));
}

#[test]
fn test_styles_follow_content_changes() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "index.html", r#"<div class="p-4"></div>"#);
    let server = server(dir.path());

    let css = server.request(STYLES_PATH).text();
    assert!(css.contains(".p-4"));
    assert!(!css.contains(".m-2"));

    touch(dir.path(), "index.html", r#"<div class="p-4 m-2"></div>"#);
    server.apply_event(WatchEvent::modified(server.root().join("index.html")));
    assert!(server.request(STYLES_PATH).text().contains(".m-2"));
}

#[test]
fn test_not_found_and_index() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "index.html", "<html><head></head><body></body></html>");
    let server = server(dir.path());

    let missing = server.request("/src/nope.js");
    assert_eq!(missing.status, 404);
    assert_eq!(missing.text(), "module not found");
    assert_eq!(server.request("/../secret.txt").status, 404);

    let index = server.request("/");
    assert_eq!(index.status, 200);
    assert!(index.text().contains("/@crosswind/client.js"));
}

#[test]
fn test_encoded_paths_and_queries() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "src/my file.js", "export const f = 1;\n");
    touch(dir.path(), "src/main.js", "import { f } from './my file.js';\nimport './app.css';\n");
    touch(dir.path(), "src/app.css", ".a { color: red; }\n");
    let server = server(dir.path());

    let main = server.request("/src/main.js?t=1700000000").text();
    assert!(main.contains(r#"from "/src/my%20file.js""#));
    assert_eq!(server.request("/src/my%20file.js").status, 200);

    let css = server.request("/src/app.css?t=1&import");
    assert!(css.text().contains("document.createElement(\"style\")"));
    let raw = server.request("/src/app.css?t=1");
    assert!(raw.content_type.starts_with("text/css"));

    assert_eq!(server.request("/src/%2e%2e/%2e%2e/etc/passwd").status, 404);
    assert_eq!(server.request("/src/a%zz.js").status, 400);
}

#[test]
fn test_concurrent_edits_to_unrelated_modules() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..8 {
        touch(dir.path(), &format!("src/leaf{}.js", i), "export const v = 0;\n");
        touch(
            dir.path(),
            &format!("src/page{}.js", i),
            &format!("import {{ v }} from './leaf{}.js';\nconsole.log(v);\n", i),
        );
    }
    let server = server(dir.path());

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let server = server.clone();
            std::thread::spawn(move || {
                let leaf = server.root().join(format!("src/leaf{}.js", i));
                let page = format!("/src/page{}.js", i);
                for round in 0..20 {
                    assert_eq!(server.request(&page).status, 200);
                    fs::write(&leaf, format!("export const v = {};\n", round)).unwrap();
                    let notice = server.apply_event(WatchEvent::modified(&leaf));
                    assert!(notice.changed.contains(&page));
                    assert!(notice.changed.iter().all(|url| !url.contains("page") || *url == page));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    for i in 0..8 {
        let page = server.root().join(format!("src/page{}.js", i));
        assert_eq!(server.state_of(&page), Some(ModuleState::Stale));
        server.request(&format!("/src/page{}.js", i));
        assert_eq!(server.state_of(&page), Some(ModuleState::Built));
    }
}

#[tokio::test]
async fn test_subscribers_receive_notice() {
    let (_dir, server) = chain();
    server.request("/src/b.js");
    let mut rx = server.subscribe();

    let a = server.root().join("src/a.js");
    server.apply_event(WatchEvent::modified(&a));
    let notice = rx.recv().await.unwrap();
    assert_eq!(notice.changed, vec!["/src/b.js", STYLES_PATH]);
}

#[tokio::test]
async fn test_http_round_trip_and_event_stream() {
    let (_dir, server) = chain();
    let listener = bind("127.0.0.1", 0).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(server.clone(), listener));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /src/b.js HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Type: application/javascript"));
    assert!(response.contains(r#"from "/src/a.js""#));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /@crosswind/events HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut lines = BufReader::new(stream).lines();
    let wait = Duration::from_secs(5);
    loop {
        let line = tokio::time::timeout(wait, lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if line == ": connected" {
            break;
        }
    }

    server.apply_event(WatchEvent::modified(server.root().join("src/a.js")));
    let data = loop {
        let line = tokio::time::timeout(wait, lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Some(data) = line.strip_prefix("data: ") {
            break data.to_string();
        }
    };
    assert_eq!(
        data,
        r#"{"type":"reload","changed":["/src/b.js","/@crosswind/styles.css"]}"#
    );
}

use crosswind_core::ContentSource;
use crosswind_scanner::scan;
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_scan_project_sources() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src/components")).unwrap();
    fs::write(
        root.join("index.html"),
        r#"<body class="bg-background text-foreground"><div id="root"></div></body>"#,
    )
    .unwrap();
    fs::write(
        root.join("src/components/Button.tsx"),
        r#"export const Button = () => <button className="bg-primary hover:bg-secondary p-4" />;"#,
    )
    .unwrap();
    fs::write(root.join("src/notes.md"), "class=\"ignored-by-pattern\"").unwrap();

    let sources = vec![
        ContentSource::new(root, "./index.html"),
        ContentSource::new(root, "./src/**/*.{js,ts,jsx,tsx}"),
    ];
    let report = scan(&sources);

    assert_eq!(report.files_scanned, 2);
    assert!(report.diagnostics.is_empty());
    for token in [
        "bg-background",
        "text-foreground",
        "bg-primary",
        "hover:bg-secondary",
        "p-4",
    ] {
        assert!(report.tokens.contains(token), "missing {}", token);
    }
    assert!(!report.tokens.contains("ignored-by-pattern"));
}

#[test]
fn test_rescan_sees_new_content() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("index.html");
    fs::write(&file, r#"<p class="flex">"#).unwrap();
    let sources = vec![ContentSource::new(dir.path(), "index.html")];

    let first = scan(&sources);
    assert!(first.tokens.contains("flex"));

    fs::write(&file, r#"<p class="grid">"#).unwrap();
    let second = scan(&sources);
    assert!(second.tokens.contains("grid"));
    assert!(!second.tokens.contains("flex"));
}

#[test]
fn test_scan_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..20 {
        fs::write(
            dir.path().join(format!("f{}.ts", i)),
            format!("const c = \"p-{} m-{} flex\";", i, i),
        )
        .unwrap();
    }
    let sources = vec![ContentSource::new(dir.path(), "*.ts")];

    let a = scan(&sources);
    let b = scan(&sources);
    assert_eq!(a, b);
    assert_eq!(a.files_scanned, 20);
}

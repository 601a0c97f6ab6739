use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crosswind_bundler::{build, split, GraphBuilder, ModuleResolver, SplitPolicy};
use crosswind_core::{BuildMode, CrosswindConfig, EnvSnapshot, NamingMode};
use crosswind_scanner::scan;
use crosswind_utilities::generate_stylesheet;

use crate::args::{Cli, Command};

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    match cli.command {
        Command::Scan => run_scan(&config),
        Command::Css { out } => run_css(&config, out.as_deref()),
        Command::Build {
            mode,
            out_dir,
            readable,
        } => run_build(config, mode.into(), out_dir, readable),
        Command::Graph => run_graph(&config),
        Command::Dev { host, port } => run_dev(config, host, port),
    }
}

/// 加载配置，项目根目录转为绝对路径
fn load_config(path: &Path) -> Result<CrosswindConfig> {
    let mut config = CrosswindConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    config.root = config
        .root
        .canonicalize()
        .with_context(|| format!("project root {} not found", config.root.display()))?;
    tracing::debug!("project root: {}", config.root.display());
    Ok(config)
}

fn run_scan(config: &CrosswindConfig) -> Result<()> {
    let report = scan(&config.content_sources());
    let mut out = String::new();
    for token in &report.tokens {
        writeln!(out, "{}", token)?;
    }
    print!("{}", out);
    tracing::info!(
        "{} tokens in {} files",
        report.tokens.len(),
        report.files_scanned
    );
    Ok(())
}

fn run_css(config: &CrosswindConfig, out: Option<&Path>) -> Result<()> {
    let report = scan(&config.content_sources());
    let css = generate_stylesheet(config, &report.tokens)?.to_css();
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create {}", parent.display()))?;
            }
            fs::write(path, &css).with_context(|| format!("cannot write {}", path.display()))?;
            tracing::info!("wrote {} ({} bytes)", path.display(), css.len());
        }
        None => print!("{}", css),
    }
    Ok(())
}

fn run_build(
    mut config: CrosswindConfig,
    mode: BuildMode,
    out_dir: Option<PathBuf>,
    readable: bool,
) -> Result<()> {
    if readable {
        config.build.naming = NamingMode::Readable;
    }
    let out_dir = out_dir.unwrap_or_else(|| config.out_dir());
    let env = EnvSnapshot::capture(&config.env_prefix, mode);

    let output = build(&config, &env, mode)?;
    output.write_to(&out_dir)?;

    let mut summary = String::new();
    for chunk in &output.chunks {
        writeln!(
            summary,
            "  {:<40} {:>8.2} KiB",
            chunk.file_name,
            chunk.code.len() as f64 / 1024.0
        )?;
    }
    writeln!(
        summary,
        "  {:<40} {:>8.2} KiB",
        output.stylesheet.file_name,
        output.stylesheet.code.len() as f64 / 1024.0
    )?;
    print!("{}", summary);

    tracing::info!(
        "{} build finished with {} warnings -> {}",
        mode,
        output.diagnostics.len(),
        out_dir.display()
    );
    Ok(())
}

fn run_graph(config: &CrosswindConfig) -> Result<()> {
    let resolver = ModuleResolver::from_config(config);
    let graph = GraphBuilder::new(&resolver, BuildMode::Development).build(&config.entry_paths())?;
    let plan = split(&graph, &SplitPolicy::from_config(&config.build));

    let mut out = String::new();
    for chunk in &plan.chunks {
        writeln!(out, "{} ({:?})", chunk.name, chunk.kind)?;
        for module in &chunk.modules {
            let name = graph
                .get(module)
                .map(|node| node.name.as_str())
                .unwrap_or_default();
            writeln!(out, "  {}", name)?;
        }
        if !chunk.imports.is_empty() {
            writeln!(out, "  imports: {}", chunk.imports.join(", "))?;
        }
        if !chunk.dynamic_imports.is_empty() {
            writeln!(out, "  dynamic: {}", chunk.dynamic_imports.join(", "))?;
        }
    }
    print!("{}", out);

    if let Err(message) = plan.verify_partition(&graph) {
        anyhow::bail!("invalid chunk plan: {}", message);
    }
    Ok(())
}

fn run_dev(mut config: CrosswindConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let env = EnvSnapshot::capture(&config.env_prefix, BuildMode::Development);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(crosswind_dev::run(config, env))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_resolves_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crosswind.toml");
        fs::write(&path, "content = [\"./index.html\"]\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.root.is_absolute());
        assert_eq!(config.content, vec!["./index.html"]);
    }

    #[test]
    fn test_css_to_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), r#"<p class="p-4"></p>"#).unwrap();
        let path = dir.path().join("crosswind.toml");
        fs::write(
            &path,
            "content = [\"./index.html\"]\n\n[build]\npreflight = false\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        let out = dir.path().join("out/app.css");
        run_css(&config, Some(&out)).unwrap();
        let css = fs::read_to_string(out).unwrap();
        assert!(css.contains(".p-4"));
        assert!(!css.contains("box-sizing"));
    }
}

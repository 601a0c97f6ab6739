use std::collections::BTreeSet;
use std::path::PathBuf;

use crosswind_core::{read_to_string_with_retry, ContentSource, Diagnostic, RetryPolicy};
use rayon::prelude::*;

use crate::sources::expand_sources;
use crate::tokenizer::extract_tokens;

/// 一次扫描的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// 去重后的候选 token（有序）
    pub tokens: BTreeSet<String>,
    /// 成功读取的文件数
    pub files_scanned: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanReport {
    /// 合并两个部分结果（集合并集，与合并顺序无关）
    pub fn merge(mut self, other: ScanReport) -> ScanReport {
        self.tokens.extend(other.tokens);
        self.files_scanned += other.files_scanned;
        self.diagnostics.extend(other.diagnostics);
        self
    }
}

/// 扫描全部内容源
pub fn scan(sources: &[ContentSource]) -> ScanReport {
    let (files, diagnostics) = expand_sources(sources);
    let mut report = scan_files(&files);

    let mut all = diagnostics;
    all.append(&mut report.diagnostics);
    report.diagnostics = all;

    tracing::info!(
        files = report.files_scanned,
        tokens = report.tokens.len(),
        "content scan finished"
    );
    report
}

/// 扫描给定文件列表（并行读取）
///
/// 无法读取的文件产生警告并跳过，其余文件照常扫描。
pub fn scan_files(files: &[PathBuf]) -> ScanReport {
    files
        .par_iter()
        .map(|path| match read_to_string_with_retry(path, RetryPolicy::default()) {
            Ok(text) => {
                let tokens: BTreeSet<String> =
                    extract_tokens(&text).into_iter().map(str::to_string).collect();
                tracing::debug!(path = %path.display(), tokens = tokens.len(), "scanned file");
                ScanReport {
                    tokens,
                    files_scanned: 1,
                    diagnostics: Vec::new(),
                }
            }
            Err(err) => ScanReport {
                diagnostics: vec![Diagnostic::warning(format!(
                    "cannot read {}: {}",
                    path.display(),
                    err
                ))
                .emit()],
                ..ScanReport::default()
            },
        })
        .reduce(ScanReport::default, ScanReport::merge)
}

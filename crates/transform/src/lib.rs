pub mod env;
pub mod error;
pub mod imports;

use std::path::Path;

use crosswind_core::EnvSnapshot;
use indexmap::IndexMap;
use swc_core::common::comments::{Comments, SingleThreadedComments};
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, SourceMap, Spanned, GLOBALS};
use swc_core::ecma::ast::*;
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config as CodegenConfig, Emitter};
use swc_core::ecma::parser::{parse_file_as_module, EsSyntax, Syntax, TsSyntax};
use swc_core::ecma::visit::VisitMutWith;

// Re-exports
pub use env::EnvVisitor;
pub use error::TransformError;
pub use imports::{ImportKind, ImportRecord, ImportVisitor};

/// 转换选项
#[derive(Debug, Default, Clone, Copy)]
pub struct TransformOptions<'a> {
    /// 设置后替换 `import.meta.env`
    pub env: Option<&'a EnvSnapshot>,
    /// 说明符改写表：原始说明符 → 输出说明符（`@/lib/utils` → `/src/lib/utils.ts`）
    pub specifiers: Option<&'a IndexMap<String, String>>,
}

/// 转换结果
#[derive(Debug, Clone)]
pub struct ModuleTransform {
    /// 转换后的源码
    pub code: String,
    /// 源码中的 import（改写前的原始说明符），按出现顺序
    pub imports: Vec<ImportRecord>,
}

/// 文件是否按 JS/TS 模块处理
pub fn is_script(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts")
    )
}

/// 根据文件名选择语法
fn syntax_for(filename: &str) -> Syntax {
    if filename.ends_with(".tsx") {
        Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        })
    } else if filename.ends_with(".ts") || filename.ends_with(".mts") || filename.ends_with(".cts")
    {
        Syntax::Typescript(TsSyntax {
            tsx: false,
            ..Default::default()
        })
    } else {
        // .jsx / .js 默认支持 JSX
        Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        })
    }
}

fn parse(
    cm: &Lrc<SourceMap>,
    source: &str,
    filename: &str,
    comments: Option<&SingleThreadedComments>,
) -> Result<Module, TransformError> {
    let fm = cm.new_source_file(
        FileName::Custom(filename.to_string()).into(),
        source.to_string(),
    );

    let mut errors = vec![];
    let module = parse_file_as_module(
        &fm,
        syntax_for(filename),
        EsVersion::latest(),
        comments.map(|c| c as &dyn Comments),
        &mut errors,
    )
    .map_err(|e| parse_error(cm, filename, &e))?;

    // 可恢复的语法错误同样视为失败
    if let Some(e) = errors.first() {
        return Err(parse_error(cm, filename, e));
    }
    Ok(module)
}

fn parse_error(
    cm: &Lrc<SourceMap>,
    filename: &str,
    error: &swc_core::ecma::parser::error::Error,
) -> TransformError {
    let loc = cm.lookup_char_pos(error.span().lo);
    TransformError::Parse {
        file: filename.to_string(),
        message: format!("{}:{}: {:?}", loc.line, loc.col_display + 1, error.kind()),
    }
}

/// 只提取 import，不生成代码（依赖图构建用）
pub fn parse_imports(source: &str, filename: &str) -> Result<Vec<ImportRecord>, TransformError> {
    let cm: Lrc<SourceMap> = Default::default();
    let mut module = GLOBALS.set(&Globals::new(), || parse(&cm, source, filename, None))?;

    let mut visitor = ImportVisitor::new(None);
    module.visit_mut_with(&mut visitor);
    Ok(visitor.into_records())
}

/// 转换 JS/TS 模块源码
///
/// 依次做 env 替换和说明符改写，再用 SWC codegen 输出（保留注释和空行）。
/// TypeScript 类型标注原样保留。
///
/// # 示例
///
/// ```no_run
/// use crosswind_transform::{transform_module, TransformOptions};
///
/// let source = r#"import { cn } from "@/lib/utils";
/// export const api = import.meta.env.VITE_API_URL;"#;
///
/// let result = transform_module(source, "src/api.ts", TransformOptions::default()).unwrap();
/// println!("{}", result.code);
/// ```
pub fn transform_module(
    source: &str,
    filename: &str,
    options: TransformOptions<'_>,
) -> Result<ModuleTransform, TransformError> {
    // 用占位符注释保留空行位置，防止 SWC parse→emit 吞掉空行
    let preserved_source = preserve_empty_lines(source);

    let cm: Lrc<SourceMap> = Default::default();
    let comments = SingleThreadedComments::default();

    let (code, imports) = GLOBALS.set(&Globals::new(), || {
        let mut module = parse(&cm, &preserved_source, filename, Some(&comments))?;

        if let Some(env) = options.env {
            let mut env_visitor = EnvVisitor::new(env);
            module.visit_mut_with(&mut env_visitor);
            tracing::debug!(
                "{}: replaced {} import.meta.env references",
                filename,
                env_visitor.replaced()
            );
        }

        let mut import_visitor = ImportVisitor::new(options.specifiers);
        module.visit_mut_with(&mut import_visitor);
        let imports = import_visitor.into_records();

        emit_module(&cm, &module, Some(&comments))
            .map(|code| (code, imports))
            .map_err(|message| TransformError::Emit {
                file: filename.to_string(),
                message,
            })
    })?;

    Ok(ModuleTransform {
        code: restore_empty_lines(&code),
        imports,
    })
}

/// 空行占位符
///
/// SWC 的 AST 不保留空行信息，parse → emit 后空行会被吞掉。
/// 解法：在解析前把空行替换为注释占位符（SWC 会保留注释），
/// 代码生成后再把占位符还原为空行。
const EMPTY_LINE_MARKER: &str = "// __CROSSWIND_EMPTY_LINE__";

/// 将源码中的空行替换为占位符注释，使 SWC 保留空行位置
fn preserve_empty_lines(source: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();

    // 找到最后一个非空行的索引，避免处理末尾空行
    let last_non_empty = lines.iter().rposition(|l| !l.trim().is_empty());

    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if line.trim().is_empty() && last_non_empty.is_some_and(|last| i < last) {
                EMPTY_LINE_MARKER
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 将占位符注释还原为空行
fn restore_empty_lines(code: &str) -> String {
    code.lines()
        .map(|line| {
            if line.trim() == EMPTY_LINE_MARKER {
                ""
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 使用 SWC codegen 输出 JS/TS 模块代码
fn emit_module(
    cm: &Lrc<SourceMap>,
    module: &Module,
    comments: Option<&SingleThreadedComments>,
) -> Result<String, String> {
    let mut buf = vec![];
    {
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: CodegenConfig::default().with_target(EsVersion::latest()),
            cm: cm.clone(),
            comments: comments.map(|c| c as &dyn Comments),
            wr: writer,
        };
        emitter.emit_module(module).map_err(|e| format!("{:?}", e))?;
    }
    String::from_utf8(buf).map_err(|e| format!("{:?}", e))
}

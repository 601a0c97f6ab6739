use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

/// import 的形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    /// `import x from "a"`
    Static,
    /// `import "a"`
    SideEffect,
    /// `export { x } from "a"` / `export * from "a"`
    ReExport,
    /// `import("a")`
    Dynamic,
}

impl ImportKind {
    /// 静态边：决定 chunk 归属
    pub fn is_static(&self) -> bool {
        !matches!(self, ImportKind::Dynamic)
    }
}

/// 源码中的一条 import（原始说明符）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRecord {
    pub specifier: String,
    pub kind: ImportKind,
}

/// 收集 import 说明符，并按映射表改写
///
/// 类型导入（`import type`）不产生运行时依赖，直接跳过。
pub struct ImportVisitor<'a> {
    records: Vec<ImportRecord>,
    rewrites: Option<&'a IndexMap<String, String>>,
}

impl<'a> ImportVisitor<'a> {
    pub fn new(rewrites: Option<&'a IndexMap<String, String>>) -> Self {
        Self {
            records: Vec::new(),
            rewrites,
        }
    }

    pub fn into_records(self) -> Vec<ImportRecord> {
        self.records
    }

    fn record(&mut self, src: &mut Str, kind: ImportKind) {
        let Some(specifier) = src.value.as_str().map(str::to_string) else {
            return;
        };
        if let Some(replacement) = self.rewrites.and_then(|map| map.get(&specifier)) {
            *src = Str {
                span: src.span,
                value: replacement.as_str().into(),
                raw: None,
            };
        }
        self.records.push(ImportRecord { specifier, kind });
    }
}

impl VisitMut for ImportVisitor<'_> {
    fn visit_mut_module_decl(&mut self, decl: &mut ModuleDecl) {
        match decl {
            ModuleDecl::Import(import) if !import.type_only => {
                let kind = if import.specifiers.is_empty() {
                    ImportKind::SideEffect
                } else {
                    ImportKind::Static
                };
                self.record(&mut import.src, kind);
            }
            ModuleDecl::ExportNamed(NamedExport {
                src: Some(src),
                type_only: false,
                ..
            }) => self.record(src, ImportKind::ReExport),
            ModuleDecl::ExportAll(export) if !export.type_only => {
                self.record(&mut export.src, ImportKind::ReExport)
            }
            _ => {}
        }
        decl.visit_mut_children_with(self);
    }

    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        if let Callee::Import(_) = call.callee {
            // 只处理字面量参数：import("./page")
            if let Some(ExprOrSpread { spread: None, expr }) = call.args.first_mut() {
                if let Expr::Lit(Lit::Str(src)) = &mut **expr {
                    self.record(src, ImportKind::Dynamic);
                }
            }
        }
        call.visit_mut_children_with(self);
    }
}

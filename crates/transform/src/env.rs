//! `import.meta.env` 替换
//!
//! - `import.meta.env.VITE_API` → 快照中的字符串，不存在时为 `undefined`
//! - `import.meta.env.DEV` / `PROD` → 布尔字面量
//! - `import.meta.env` → 只含已暴露变量的对象字面量
//!
//! 未暴露的变量不会以任何形式出现在输出中。

use crosswind_core::EnvSnapshot;
use swc_core::common::Span;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

pub struct EnvVisitor<'a> {
    env: &'a EnvSnapshot,
    replaced: usize,
}

impl<'a> EnvVisitor<'a> {
    pub fn new(env: &'a EnvSnapshot) -> Self {
        Self { env, replaced: 0 }
    }

    /// 替换次数
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    fn replacement(&self, expr: &Expr) -> Option<Expr> {
        let Expr::Member(member) = expr else {
            return None;
        };
        if is_import_meta_env(&member.obj) {
            let name = prop_name(&member.prop)?;
            return Some(self.value_expr(&name, member.span));
        }
        if is_import_meta(&member.obj) && prop_name(&member.prop).as_deref() == Some("env") {
            return Some(self.object_expr(member.span));
        }
        None
    }

    fn value_expr(&self, name: &str, span: Span) -> Expr {
        match self.env.get(name) {
            Some(value) if EnvSnapshot::is_flag(name) => Expr::Lit(Lit::Bool(Bool {
                span,
                value: value == "true",
            })),
            Some(value) => string_lit(value, span),
            None => Expr::Ident(Ident {
                span,
                ctxt: Default::default(),
                sym: "undefined".into(),
                optional: false,
            }),
        }
    }

    fn object_expr(&self, span: Span) -> Expr {
        let props = self
            .env
            .iter()
            .map(|(name, _)| {
                PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                    key: PropName::Str(Str {
                        span,
                        value: name.into(),
                        raw: None,
                    }),
                    value: Box::new(self.value_expr(name, span)),
                })))
            })
            .collect();
        Expr::Object(ObjectLit { span, props })
    }
}

impl VisitMut for EnvVisitor<'_> {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if let Some(replacement) = self.replacement(expr) {
            *expr = replacement;
            self.replaced += 1;
            return;
        }
        expr.visit_mut_children_with(self);
    }
}

fn string_lit(value: &str, span: Span) -> Expr {
    Expr::Lit(Lit::Str(Str {
        span,
        value: value.into(),
        raw: None,
    }))
}

fn is_import_meta(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::MetaProp(MetaPropExpr {
            kind: MetaPropKind::ImportMeta,
            ..
        })
    )
}

fn is_import_meta_env(expr: &Expr) -> bool {
    match expr {
        Expr::Member(member) => {
            is_import_meta(&member.obj) && prop_name(&member.prop).as_deref() == Some("env")
        }
        _ => false,
    }
}

/// `.NAME` 或 `["NAME"]`
fn prop_name(prop: &MemberProp) -> Option<String> {
    match prop {
        MemberProp::Ident(ident) => Some(ident.sym.to_string()),
        MemberProp::Computed(ComputedPropName { expr, .. }) => match &**expr {
            Expr::Lit(Lit::Str(s)) => s.value.as_str().map(str::to_string),
            _ => None,
        },
        _ => None,
    }
}

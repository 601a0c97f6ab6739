//! GeneratedRule 集合 → 分层样式表
//!
//! 输出只依赖 token 集合本身：同一组 token 得到逐字节相同的 CSS。

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crosswind_core::Declaration;

use crate::resolver::{GeneratedRule, Layer};
use crate::theme::Theme;

const INDENT: &str = "  ";

/// 基础重置样式
pub const PREFLIGHT: &str = "\
*, ::before, ::after {
  box-sizing: border-box;
  border-width: 0;
  border-style: solid;
  border-color: currentColor;
}

html {
  line-height: 1.5;
  -webkit-text-size-adjust: 100%;
  tab-size: 4;
  font-family: ui-sans-serif, system-ui, sans-serif;
}

body {
  margin: 0;
  line-height: inherit;
}

h1, h2, h3, h4, h5, h6, p, blockquote, figure, pre, ol, ul {
  margin: 0;
}

h1, h2, h3, h4, h5, h6 {
  font-size: inherit;
  font-weight: inherit;
}

ol, ul {
  list-style: none;
  padding: 0;
}

a {
  color: inherit;
  text-decoration: inherit;
}

button, input, select, textarea {
  font: inherit;
  color: inherit;
  margin: 0;
  padding: 0;
}

button, [role=\"button\"] {
  cursor: pointer;
}

img, svg, video, canvas {
  display: block;
  vertical-align: middle;
  max-width: 100%;
}

[hidden] {
  display: none;
}
";

/// 分层样式表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub base: String,
    pub components: String,
    pub utilities: String,
}

impl Stylesheet {
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.components.is_empty() && self.utilities.is_empty()
    }

    /// 三层依次拼接，层之间空一行
    pub fn to_css(&self) -> String {
        [&self.base, &self.components, &self.utilities]
            .into_iter()
            .filter(|layer| !layer.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 将入口样式表中的 `@tailwind base;` 等指令替换为对应层
    ///
    /// 模板中没有指令的非空层追加到末尾。
    pub fn inject_into(&self, template: &str) -> String {
        let mut injected = [false; 3];
        let mut lines = Vec::new();

        for line in template.lines() {
            let layer = match line.trim() {
                "@tailwind base;" => Some(0),
                "@tailwind components;" => Some(1),
                "@tailwind utilities;" => Some(2),
                _ => None,
            };
            match layer {
                Some(i) => {
                    injected[i] = true;
                    lines.push(self.layer(i).trim_end().to_string());
                }
                None => lines.push(line.to_string()),
            }
        }

        let mut css = lines.join("\n");
        if template.ends_with('\n') || template.is_empty() {
            css.push('\n');
        }

        for (i, done) in injected.iter().enumerate() {
            let layer = self.layer(i);
            if !done && !layer.is_empty() {
                if !css.trim().is_empty() {
                    css.push('\n');
                }
                css.push_str(layer);
            }
        }
        css
    }

    fn layer(&self, index: usize) -> &str {
        match index {
            0 => &self.base,
            1 => &self.components,
            _ => &self.utilities,
        }
    }
}

/// 样式表组装器
pub struct Assembler<'a> {
    theme: &'a Theme,
    preflight: bool,
}

impl<'a> Assembler<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            preflight: true,
        }
    }

    pub fn with_preflight(mut self, preflight: bool) -> Self {
        self.preflight = preflight;
        self
    }

    pub fn assemble(&self, rules: &[Arc<GeneratedRule>]) -> Stylesheet {
        let mut sorted: Vec<&GeneratedRule> = rules.iter().map(Arc::as_ref).collect();
        sorted.sort_by(|a, b| {
            (a.layer, a.sort_key, &a.token).cmp(&(b.layer, b.sort_key, &b.token))
        });

        let mut seen = HashSet::new();
        let mut components = Vec::new();
        let mut utilities = Vec::new();
        let mut keyframes = BTreeSet::new();

        for rule in sorted {
            let css = render_rule(rule);
            if !seen.insert(css.clone()) {
                continue;
            }
            if let Some(name) = &rule.keyframes {
                keyframes.insert(name.as_str());
            }
            match rule.layer {
                Layer::Components => components.push(css),
                Layer::Base | Layer::Utilities => utilities.push(css),
            }
        }

        for name in keyframes {
            if let Some(steps) = self.theme.keyframes(name) {
                utilities.push(render_keyframes(name, steps));
            }
        }

        tracing::info!(
            "assembled {} component and {} utility blocks",
            components.len(),
            utilities.len()
        );

        Stylesheet {
            base: if self.preflight {
                PREFLIGHT.to_string()
            } else {
                String::new()
            },
            components: components.join("\n"),
            utilities: utilities.join("\n"),
        }
    }
}

fn render_block(selector: &str, declarations: &[Declaration]) -> String {
    let mut css = format!("{} {{\n", selector);
    for decl in declarations {
        css.push_str(&format!("{}{}: {};\n", INDENT, decl.property, decl.value));
    }
    css.push_str("}\n");
    css
}

fn wrap(at_rule: &str, inner: &str) -> String {
    let mut css = format!("{} {{\n", at_rule);
    for line in inner.lines() {
        if !line.is_empty() {
            css.push_str(INDENT);
        }
        css.push_str(line);
        css.push('\n');
    }
    css.push_str("}\n");
    css
}

fn render_rule(rule: &GeneratedRule) -> String {
    let mut css = render_block(&rule.selector, &rule.declarations);
    for nested in &rule.nested {
        css.push('\n');
        css.push_str(&wrap(
            &nested.at_rule,
            &render_block(&rule.selector, &nested.declarations),
        ));
    }
    for at_rule in rule.at_rules.iter().rev() {
        css = wrap(at_rule, &css);
    }
    css
}

fn render_keyframes(name: &str, steps: &[(String, Vec<Declaration>)]) -> String {
    let mut ordered: Vec<_> = steps.iter().collect();
    ordered.sort_by(|a, b| step_offset(&a.0).total_cmp(&step_offset(&b.0)));

    let inner: String = ordered
        .into_iter()
        .map(|(step, decls)| render_block(step, decls))
        .collect();
    wrap(&format!("@keyframes {}", name), &inner)
}

/// `from` → 0，`to` → 100，`75%, 100%` → 75
fn step_offset(step: &str) -> f64 {
    let first = step.split(',').next().unwrap_or(step).trim();
    match first {
        "from" => 0.0,
        "to" => 100.0,
        _ => first.trim_end_matches('%').parse().unwrap_or(0.0),
    }
}

//! Token → GeneratedRule
//!
//! 同一 token 总是得到同一结果，结果按 token 文本缓存，可在线程间共享。

use std::collections::HashMap;
use std::sync::Arc;

use crosswind_core::{ConfigError, CrosswindConfig, DarkMode, Declaration};
use crosswind_parse::{parse_candidate, Candidate, Utility};
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::escape::escape_class;
use crate::rules::{ParamInput, RuleKind, RuleTable, UtilityRule};
use crate::theme::{Theme, ThemeTable};
use crate::value::{alpha_factor, apply_alpha, apply_important, looks_like_color, negate};
use crate::variant::{media_order, resolve_variant, MediaOrder, VariantResolution};

/// 输出层
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Base,
    Components,
    Utilities,
}

/// 层内排序键
///
/// 无变体 < 仅选择器变体 < 带 at-rule；at-rule 之间见 [`MediaOrder`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    pub variant_rank: u8,
    pub media: MediaOrder,
    pub rule_index: usize,
}

/// 规则内部按断点嵌套的块（container 的 max-width）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedBlock {
    pub at_rule: String,
    pub declarations: Vec<Declaration>,
}

/// 一个 token 生成的 CSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRule {
    pub token: String,
    /// 已转义的完整选择器
    pub selector: String,
    /// 外层 at-rule，从外到内
    pub at_rules: Vec<String>,
    pub declarations: Vec<Declaration>,
    pub nested: Vec<NestedBlock>,
    pub layer: Layer,
    pub sort_key: SortKey,
    /// 引用的 @keyframes 名称
    pub keyframes: Option<String>,
}

pub struct Resolver {
    theme: Theme,
    rules: RuleTable,
    dark_mode: DarkMode,
    cache: RwLock<HashMap<String, Option<Arc<GeneratedRule>>>>,
}

impl Resolver {
    pub fn new(theme: Theme, rules: RuleTable, dark_mode: DarkMode) -> Self {
        Self {
            theme,
            rules,
            dark_mode,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CrosswindConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Theme::from_config(&config.theme),
            RuleTable::from_config(&config.rules)?,
            config.dark_mode,
        ))
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// 解析单个 token；无法匹配时返回 None（静默丢弃）
    pub fn resolve(&self, token: &str) -> Option<Arc<GeneratedRule>> {
        if let Some(cached) = self.cache.read().get(token) {
            return cached.clone();
        }

        let resolved = self.generate(token).map(Arc::new);
        if resolved.is_none() {
            tracing::trace!("no utility matches `{}`", token);
        }

        self.cache
            .write()
            .entry(token.to_string())
            .or_insert(resolved)
            .clone()
    }

    /// 并行解析，结果顺序与输入顺序一致
    pub fn resolve_all<'a, I>(&self, tokens: I) -> Vec<Arc<GeneratedRule>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let tokens: Vec<&String> = tokens.into_iter().collect();
        tokens
            .par_iter()
            .filter_map(|token| self.resolve(token))
            .collect()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }

    fn generate(&self, token: &str) -> Option<GeneratedRule> {
        let candidate = parse_candidate(token).ok()?;

        let mut template = "&".to_string();
        let mut at_rules = Vec::new();
        for variant in &candidate.variants {
            match resolve_variant(variant, &self.theme, self.dark_mode)? {
                VariantResolution::Selector(t) => template = t.replace('&', &template),
                VariantResolution::AtRule(rule) => at_rules.push(rule),
            }
        }

        let body = self.generate_body(&candidate)?;

        let class = format!(".{}", escape_class(token));
        let mut selector = template.replace('&', &class);
        if let Some(child) = &body.child_selector {
            selector.push_str(child);
        }

        let variant_rank = if !at_rules.is_empty() {
            2
        } else if !candidate.variants.is_empty() {
            1
        } else {
            0
        };
        let media = at_rules
            .iter()
            .map(|rule| media_order(rule))
            .max()
            .unwrap_or_default();

        Some(GeneratedRule {
            token: token.to_string(),
            selector,
            at_rules,
            declarations: apply_important(body.declarations, candidate.important),
            nested: body.nested,
            layer: body.layer,
            sort_key: SortKey {
                variant_rank,
                media,
                rule_index: body.rule_index,
            },
            keyframes: body.keyframes,
        })
    }

    fn generate_body(&self, candidate: &Candidate) -> Option<Body> {
        match &candidate.utility {
            Utility::Property { property, value } => {
                if candidate.negative {
                    return None;
                }
                Some(Body {
                    declarations: vec![Declaration::new(property.as_str(), value.as_str())],
                    rule_index: self.rules.len(),
                    ..Body::default()
                })
            }
            Utility::Named {
                body,
                arbitrary,
                alpha,
            } => {
                let arbitrary = arbitrary.as_ref().map(|a| a.content.as_str());

                // `w-1/2` 先按分数整体匹配，再按 `w-1` + 透明度匹配
                if let Some(fraction) = candidate.utility.fraction() {
                    if let Some(found) = self.match_rules(candidate, &fraction, None, None, true) {
                        return Some(found);
                    }
                }
                self.match_rules(candidate, body, arbitrary, alpha.as_deref(), false)
            }
        }
    }

    fn match_rules(
        &self,
        candidate: &Candidate,
        body: &str,
        arbitrary: Option<&str>,
        alpha: Option<&str>,
        fraction: bool,
    ) -> Option<Body> {
        self.rules
            .candidates(body, arbitrary)
            .into_iter()
            .find_map(|(index, rule, input)| {
                if fraction && rule.param.as_ref().is_some_and(|p| p.table.is_none()) {
                    return None;
                }
                self.apply_rule(index, rule, input, candidate.negative, alpha)
            })
    }

    fn apply_rule(
        &self,
        index: usize,
        rule: &UtilityRule,
        input: ParamInput<'_>,
        negative: bool,
        alpha: Option<&str>,
    ) -> Option<Body> {
        if negative && !rule.negatable {
            return None;
        }

        if rule.kind == RuleKind::Container {
            if alpha.is_some() || negative {
                return None;
            }
            return Some(self.container_body(index));
        }

        let value = match (input, &rule.param) {
            (ParamInput::Literal, _) => {
                if alpha.is_some() || negative {
                    return None;
                }
                None
            }
            (ParamInput::Key(key), Some(param)) => {
                let value = match param.table {
                    Some(table) => self.theme.lookup(table, key)?.to_string(),
                    None => key.to_string(),
                };
                let is_color = param.table == Some(ThemeTable::Colors);
                Some(self.adjust(value, is_color, negative, alpha)?)
            }
            (ParamInput::Arbitrary(value), Some(param)) => {
                let is_color = param.table == Some(ThemeTable::Colors)
                    || (param.table.is_none() && looks_like_color(value));
                Some(self.adjust(value.to_string(), is_color, negative, alpha)?)
            }
            (_, None) => return None,
        };

        let declarations = rule
            .declarations
            .iter()
            .map(|template| match (&rule.param, &value) {
                (Some(param), Some(value)) => {
                    let placeholder = format!("{{{}}}", param.name);
                    Declaration::new(
                        template.property.replace(&placeholder, value),
                        template.value.replace(&placeholder, value),
                    )
                }
                _ => Declaration::new(template.property.as_str(), template.value.as_str()),
            })
            .collect();

        let keyframes = match (rule.kind, &value) {
            (RuleKind::Animation, Some(value)) => value
                .split_whitespace()
                .next()
                .filter(|name| self.theme.has_keyframes(name))
                .map(str::to_string),
            _ => None,
        };

        Some(Body {
            declarations,
            rule_index: index,
            child_selector: rule.child_selector.clone(),
            keyframes,
            ..Body::default()
        })
    }

    /// 透明度和负值
    fn adjust(
        &self,
        value: String,
        is_color: bool,
        negative: bool,
        alpha: Option<&str>,
    ) -> Option<String> {
        let value = match alpha {
            Some(alpha) if is_color => apply_alpha(&value, &alpha_factor(alpha)?),
            Some(_) => return None,
            None => value,
        };
        Some(if negative { negate(&value) } else { value })
    }

    fn container_body(&self, index: usize) -> Body {
        let container = self.theme.container();
        let mut declarations = vec![Declaration::new("width", "100%")];
        if container.center {
            declarations.push(Declaration::new("margin-left", "auto"));
            declarations.push(Declaration::new("margin-right", "auto"));
        }
        if let Some(padding) = &container.padding {
            declarations.push(Declaration::new("padding-left", padding.as_str()));
            declarations.push(Declaration::new("padding-right", padding.as_str()));
        }

        let nested = self
            .theme
            .container_screens()
            .into_iter()
            .map(|(_, width)| NestedBlock {
                at_rule: format!("@media (min-width: {})", width),
                declarations: vec![Declaration::new("max-width", width)],
            })
            .collect();

        Body {
            declarations,
            nested,
            layer: Layer::Components,
            rule_index: index,
            ..Body::default()
        }
    }
}

struct Body {
    declarations: Vec<Declaration>,
    nested: Vec<NestedBlock>,
    layer: Layer,
    rule_index: usize,
    child_selector: Option<String>,
    keyframes: Option<String>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            declarations: Vec::new(),
            nested: Vec::new(),
            layer: Layer::Utilities,
            rule_index: 0,
            child_selector: None,
            keyframes: None,
        }
    }
}

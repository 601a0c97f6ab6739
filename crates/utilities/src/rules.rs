//! 工具类规则表
//!
//! 规则按声明顺序存放：配置中的用户规则在前，内置规则在后。
//! 匹配时先按字面量前缀长度降序、再按声明顺序尝试，第一个参数能解析的规则胜出。

use crosswind_core::{config::placeholders, ConfigError, RuleConfig, RulePattern, PARAM_TABLES};

use crate::theme::ThemeTable;

/// 规则来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrigin {
    User,
    Builtin,
}

/// 生成方式不同于普通声明的规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Utility,
    /// `animate-*`：额外引用同名 @keyframes
    Animation,
    /// `container` 组件：按断点嵌套 max-width
    Container,
}

/// 规则参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    /// None 表示接受任意文本
    pub table: Option<ThemeTable>,
}

/// 声明模板，`{name}` 占位符在属性名和值中都可出现
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationTemplate {
    pub property: String,
    pub value: String,
}

impl DeclarationTemplate {
    pub fn parse(template: &str) -> Option<Self> {
        let (property, value) = template.split_once(':')?;
        let (property, value) = (property.trim(), value.trim());
        if property.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            property: property.to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityRule {
    pub pattern: String,
    pub prefix: String,
    pub param: Option<Param>,
    pub declarations: Vec<DeclarationTemplate>,
    pub negatable: bool,
    pub origin: RuleOrigin,
    pub kind: RuleKind,
    /// 追加在类选择器之后的子选择器（`space-x-*`）
    pub child_selector: Option<String>,
}

/// 规则对 token 主体的匹配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamInput<'a> {
    Literal,
    Key(&'a str),
    Arbitrary(&'a str),
}

impl UtilityRule {
    /// `body` 为去掉变体、`!`、`-`、任意值和透明度之后的部分
    pub fn matches<'a>(&self, body: &'a str, arbitrary: Option<&'a str>) -> Option<ParamInput<'a>> {
        let Some(param) = &self.param else {
            return (arbitrary.is_none() && body == self.prefix).then_some(ParamInput::Literal);
        };

        if let Some(value) = arbitrary {
            // `w-[3px]`：主体 "w" 对应前缀 "w-"
            let same_prefix = self.prefix.strip_suffix('-') == Some(body);
            let accepted = param.table.map_or(true, |t| t.accepts_arbitrary(value));
            return (same_prefix && accepted).then_some(ParamInput::Arbitrary(value));
        }

        body.strip_prefix(self.prefix.as_str())
            .filter(|rest| !rest.is_empty())
            .map(ParamInput::Key)
    }
}

/// 有序规则表
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<UtilityRule>,
}

impl RuleTable {
    /// 只含内置规则
    pub fn builtin() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    /// 用户规则 + 内置规则；错误指向出错的配置项
    pub fn from_config(user_rules: &[RuleConfig]) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(user_rules.len() + BUILTINS.len());
        for (index, config) in user_rules.iter().enumerate() {
            rules.push(user_rule(index, config)?);
        }
        rules.extend(builtin_rules());
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&UtilityRule> {
        self.rules.get(index)
    }

    /// 可能匹配 `body` 的规则，按尝试顺序返回 (声明序号, 规则, 参数)
    pub fn candidates<'a>(
        &'a self,
        body: &'a str,
        arbitrary: Option<&'a str>,
    ) -> Vec<(usize, &'a UtilityRule, ParamInput<'a>)> {
        let mut matched: Vec<_> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(i, rule)| rule.matches(body, arbitrary).map(|input| (i, rule, input)))
            .collect();
        matched.sort_by(|a, b| b.1.prefix.len().cmp(&a.1.prefix.len()).then(a.0.cmp(&b.0)));
        matched
    }
}

fn user_rule(index: usize, config: &RuleConfig) -> Result<UtilityRule, ConfigError> {
    let pattern_key = format!("rules[{}].pattern", index);
    let parsed =
        RulePattern::parse(&config.pattern).map_err(|msg| ConfigError::new(&pattern_key, msg))?;

    let param = match parsed.param {
        Some(param) => {
            let table = match param.table.as_deref() {
                Some(name) => {
                    let table = PARAM_TABLES
                        .contains(&name)
                        .then(|| ThemeTable::from_name(name))
                        .flatten()
                        .ok_or_else(|| {
                            ConfigError::new(&pattern_key, format!("unknown table `{}`", name))
                        })?;
                    Some(table)
                }
                None => None,
            };
            Some(Param {
                name: param.name,
                table,
            })
        }
        None => None,
    };

    if config.declarations.is_empty() {
        return Err(ConfigError::new(
            format!("rules[{}].declarations", index),
            "at least one declaration is required",
        ));
    }

    let mut declarations = Vec::with_capacity(config.declarations.len());
    for (j, template) in config.declarations.iter().enumerate() {
        let key = format!("rules[{}].declarations[{}]", index, j);
        let names = placeholders(template).map_err(|msg| ConfigError::new(&key, msg))?;
        if let Some(unknown) = names
            .iter()
            .find(|n| param.as_ref().map_or(true, |p| p.name != **n))
        {
            return Err(ConfigError::new(
                key,
                format!("unknown placeholder `{{{}}}`", unknown),
            ));
        }
        let decl = DeclarationTemplate::parse(template)
            .ok_or_else(|| ConfigError::new(&key, "expected `property: value`"))?;
        declarations.push(decl);
    }

    Ok(UtilityRule {
        pattern: config.pattern.clone(),
        prefix: parsed.prefix,
        param,
        declarations,
        negatable: config.negatable,
        origin: RuleOrigin::User,
        kind: RuleKind::Utility,
        child_selector: None,
    })
}

// ── Built-in rules ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Builtin {
    pattern: &'static str,
    declarations: &'static [&'static str],
    negatable: bool,
    kind: RuleKind,
    child: Option<&'static str>,
}

const fn r(pattern: &'static str, declarations: &'static [&'static str]) -> Builtin {
    Builtin {
        pattern,
        declarations,
        negatable: false,
        kind: RuleKind::Utility,
        child: None,
    }
}

/// 可取负值的规则（`-mt-2`）
const fn neg(pattern: &'static str, declarations: &'static [&'static str]) -> Builtin {
    Builtin {
        negatable: true,
        ..r(pattern, declarations)
    }
}

const SPACE_CHILD: &str = " > :not([hidden]) ~ :not([hidden])";

static BUILTINS: &[Builtin] = &[
    // Layout
    Builtin {
        kind: RuleKind::Container,
        ..r("container", &[])
    },
    r("block", &["display: block"]),
    r("inline-block", &["display: inline-block"]),
    r("inline", &["display: inline"]),
    r("flex", &["display: flex"]),
    r("inline-flex", &["display: inline-flex"]),
    r("grid", &["display: grid"]),
    r("inline-grid", &["display: inline-grid"]),
    r("table", &["display: table"]),
    r("contents", &["display: contents"]),
    r("hidden", &["display: none"]),
    r("static", &["position: static"]),
    r("fixed", &["position: fixed"]),
    r("absolute", &["position: absolute"]),
    r("relative", &["position: relative"]),
    r("sticky", &["position: sticky"]),
    neg("inset-{v:size}", &["inset: {v}"]),
    neg("inset-x-{v:size}", &["left: {v}", "right: {v}"]),
    neg("inset-y-{v:size}", &["top: {v}", "bottom: {v}"]),
    neg("top-{v:size}", &["top: {v}"]),
    neg("right-{v:size}", &["right: {v}"]),
    neg("bottom-{v:size}", &["bottom: {v}"]),
    neg("left-{v:size}", &["left: {v}"]),
    neg("z-{v:z-index}", &["z-index: {v}"]),
    r("overflow-hidden", &["overflow: hidden"]),
    r("overflow-auto", &["overflow: auto"]),
    r("overflow-scroll", &["overflow: scroll"]),
    r("overflow-visible", &["overflow: visible"]),
    r("overflow-x-auto", &["overflow-x: auto"]),
    r("overflow-y-auto", &["overflow-y: auto"]),
    r("overflow-x-hidden", &["overflow-x: hidden"]),
    r("overflow-y-hidden", &["overflow-y: hidden"]),
    r("aspect-square", &["aspect-ratio: 1 / 1"]),
    r("aspect-video", &["aspect-ratio: 16 / 9"]),
    r("object-cover", &["object-fit: cover"]),
    r("object-contain", &["object-fit: contain"]),
    r(
        "sr-only",
        &[
            "position: absolute",
            "width: 1px",
            "height: 1px",
            "padding: 0",
            "margin: -1px",
            "overflow: hidden",
            "clip: rect(0, 0, 0, 0)",
            "white-space: nowrap",
            "border-width: 0",
        ],
    ),
    // Flexbox & Grid
    r("flex-row", &["flex-direction: row"]),
    r("flex-row-reverse", &["flex-direction: row-reverse"]),
    r("flex-col", &["flex-direction: column"]),
    r("flex-col-reverse", &["flex-direction: column-reverse"]),
    r("flex-wrap", &["flex-wrap: wrap"]),
    r("flex-nowrap", &["flex-wrap: nowrap"]),
    r("flex-1", &["flex: 1 1 0%"]),
    r("flex-auto", &["flex: 1 1 auto"]),
    r("flex-initial", &["flex: 0 1 auto"]),
    r("flex-none", &["flex: none"]),
    r("grow", &["flex-grow: 1"]),
    r("grow-0", &["flex-grow: 0"]),
    r("shrink", &["flex-shrink: 1"]),
    r("shrink-0", &["flex-shrink: 0"]),
    r("basis-{v:size}", &["flex-basis: {v}"]),
    r("items-start", &["align-items: flex-start"]),
    r("items-end", &["align-items: flex-end"]),
    r("items-center", &["align-items: center"]),
    r("items-baseline", &["align-items: baseline"]),
    r("items-stretch", &["align-items: stretch"]),
    r("justify-start", &["justify-content: flex-start"]),
    r("justify-end", &["justify-content: flex-end"]),
    r("justify-center", &["justify-content: center"]),
    r("justify-between", &["justify-content: space-between"]),
    r("justify-around", &["justify-content: space-around"]),
    r("justify-evenly", &["justify-content: space-evenly"]),
    r("self-auto", &["align-self: auto"]),
    r("self-start", &["align-self: flex-start"]),
    r("self-end", &["align-self: flex-end"]),
    r("self-center", &["align-self: center"]),
    r("self-stretch", &["align-self: stretch"]),
    r("gap-{v:spacing}", &["gap: {v}"]),
    r("gap-x-{v:spacing}", &["column-gap: {v}"]),
    r("gap-y-{v:spacing}", &["row-gap: {v}"]),
    r("grid-cols-{v:grid-columns}", &["grid-template-columns: {v}"]),
    r("col-span-{v:grid-span}", &["grid-column: {v}"]),
    Builtin {
        child: Some(SPACE_CHILD),
        ..neg("space-x-{v:spacing}", &["margin-left: {v}"])
    },
    Builtin {
        child: Some(SPACE_CHILD),
        ..neg("space-y-{v:spacing}", &["margin-top: {v}"])
    },
    // Spacing
    r("p-{v:spacing}", &["padding: {v}"]),
    r("px-{v:spacing}", &["padding-left: {v}", "padding-right: {v}"]),
    r("py-{v:spacing}", &["padding-top: {v}", "padding-bottom: {v}"]),
    r("pt-{v:spacing}", &["padding-top: {v}"]),
    r("pr-{v:spacing}", &["padding-right: {v}"]),
    r("pb-{v:spacing}", &["padding-bottom: {v}"]),
    r("pl-{v:spacing}", &["padding-left: {v}"]),
    r("ps-{v:spacing}", &["padding-inline-start: {v}"]),
    r("pe-{v:spacing}", &["padding-inline-end: {v}"]),
    r("m-auto", &["margin: auto"]),
    r("mx-auto", &["margin-left: auto", "margin-right: auto"]),
    r("my-auto", &["margin-top: auto", "margin-bottom: auto"]),
    r("mt-auto", &["margin-top: auto"]),
    r("mr-auto", &["margin-right: auto"]),
    r("mb-auto", &["margin-bottom: auto"]),
    r("ml-auto", &["margin-left: auto"]),
    neg("m-{v:spacing}", &["margin: {v}"]),
    neg("mx-{v:spacing}", &["margin-left: {v}", "margin-right: {v}"]),
    neg("my-{v:spacing}", &["margin-top: {v}", "margin-bottom: {v}"]),
    neg("mt-{v:spacing}", &["margin-top: {v}"]),
    neg("mr-{v:spacing}", &["margin-right: {v}"]),
    neg("mb-{v:spacing}", &["margin-bottom: {v}"]),
    neg("ml-{v:spacing}", &["margin-left: {v}"]),
    // Sizing
    r("w-screen", &["width: 100vw"]),
    r("h-screen", &["height: 100vh"]),
    r("h-svh", &["height: 100svh"]),
    r("min-h-screen", &["min-height: 100vh"]),
    r("min-h-svh", &["min-height: 100svh"]),
    r("w-{v:size}", &["width: {v}"]),
    r("h-{v:size}", &["height: {v}"]),
    r("size-{v:size}", &["width: {v}", "height: {v}"]),
    r("min-w-{v:size}", &["min-width: {v}"]),
    r("min-h-{v:size}", &["min-height: {v}"]),
    r("max-w-{v:max-width}", &["max-width: {v}"]),
    r("max-h-{v:size}", &["max-height: {v}"]),
    // Typography
    r("font-sans", &["font-family: ui-sans-serif, system-ui, sans-serif"]),
    r("font-mono", &["font-family: ui-monospace, SFMono-Regular, Menlo, monospace"]),
    r("font-{v:font-weight}", &["font-weight: {v}"]),
    r("text-left", &["text-align: left"]),
    r("text-center", &["text-align: center"]),
    r("text-right", &["text-align: right"]),
    r("text-justify", &["text-align: justify"]),
    r("text-{c:colors}", &["color: {c}"]),
    r("text-{s:font-size}", &["font-size: {s}"]),
    r("leading-{v:line-height}", &["line-height: {v}"]),
    neg("tracking-{v:letter-spacing}", &["letter-spacing: {v}"]),
    r("uppercase", &["text-transform: uppercase"]),
    r("lowercase", &["text-transform: lowercase"]),
    r("capitalize", &["text-transform: capitalize"]),
    r("normal-case", &["text-transform: none"]),
    r("italic", &["font-style: italic"]),
    r("not-italic", &["font-style: normal"]),
    r("underline", &["text-decoration-line: underline"]),
    r("line-through", &["text-decoration-line: line-through"]),
    r("no-underline", &["text-decoration-line: none"]),
    r("underline-offset-4", &["text-underline-offset: 4px"]),
    r(
        "truncate",
        &[
            "overflow: hidden",
            "text-overflow: ellipsis",
            "white-space: nowrap",
        ],
    ),
    r("whitespace-nowrap", &["white-space: nowrap"]),
    r("whitespace-normal", &["white-space: normal"]),
    r("break-words", &["overflow-wrap: break-word"]),
    r(
        "antialiased",
        &[
            "-webkit-font-smoothing: antialiased",
            "-moz-osx-font-smoothing: grayscale",
        ],
    ),
    r("list-none", &["list-style-type: none"]),
    r("list-disc", &["list-style-type: disc"]),
    // Backgrounds
    r("bg-{c:colors}", &["background-color: {c}"]),
    r("fill-{c:colors}", &["fill: {c}"]),
    // Borders
    r("border", &["border-width: 1px"]),
    r("border-t", &["border-top-width: 1px"]),
    r("border-r", &["border-right-width: 1px"]),
    r("border-b", &["border-bottom-width: 1px"]),
    r("border-l", &["border-left-width: 1px"]),
    r("border-{w:border-width}", &["border-width: {w}"]),
    r("border-t-{w:border-width}", &["border-top-width: {w}"]),
    r("border-r-{w:border-width}", &["border-right-width: {w}"]),
    r("border-b-{w:border-width}", &["border-bottom-width: {w}"]),
    r("border-l-{w:border-width}", &["border-left-width: {w}"]),
    r("border-solid", &["border-style: solid"]),
    r("border-dashed", &["border-style: dashed"]),
    r("border-none", &["border-style: none"]),
    r("border-{c:colors}", &["border-color: {c}"]),
    r("rounded", &["border-radius: 0.25rem"]),
    r("rounded-{r:radius}", &["border-radius: {r}"]),
    r(
        "rounded-t-{r:radius}",
        &["border-top-left-radius: {r}", "border-top-right-radius: {r}"],
    ),
    r(
        "rounded-b-{r:radius}",
        &[
            "border-bottom-right-radius: {r}",
            "border-bottom-left-radius: {r}",
        ],
    ),
    r(
        "rounded-l-{r:radius}",
        &["border-top-left-radius: {r}", "border-bottom-left-radius: {r}"],
    ),
    r(
        "rounded-r-{r:radius}",
        &[
            "border-top-right-radius: {r}",
            "border-bottom-right-radius: {r}",
        ],
    ),
    // Effects
    r(
        "shadow",
        &["box-shadow: 0 1px 3px 0 rgb(0 0 0 / 0.1), 0 1px 2px -1px rgb(0 0 0 / 0.1)"],
    ),
    r("shadow-{v:shadow}", &["box-shadow: {v}"]),
    r("opacity-{v:opacity}", &["opacity: {v}"]),
    r(
        "outline-none",
        &["outline: 2px solid transparent", "outline-offset: 2px"],
    ),
    r(
        "ring",
        &["box-shadow: 0 0 0 3px var(--tw-ring-color, rgb(59 130 246 / 0.5))"],
    ),
    r(
        "ring-{w:border-width}",
        &["box-shadow: 0 0 0 {w} var(--tw-ring-color, rgb(59 130 246 / 0.5))"],
    ),
    r("ring-{c:colors}", &["--tw-ring-color: {c}"]),
    r("ring-offset-{w:border-width}", &["--tw-ring-offset-width: {w}"]),
    r("ring-offset-{c:colors}", &["--tw-ring-offset-color: {c}"]),
    // Interactivity
    r("cursor-pointer", &["cursor: pointer"]),
    r("cursor-default", &["cursor: default"]),
    r("cursor-not-allowed", &["cursor: not-allowed"]),
    r("pointer-events-none", &["pointer-events: none"]),
    r("pointer-events-auto", &["pointer-events: auto"]),
    r("select-none", &["user-select: none"]),
    // Transitions & Animation
    r(
        "transition",
        &[
            "transition-property: color, background-color, border-color, text-decoration-color, fill, stroke, opacity, box-shadow, transform, filter, backdrop-filter",
            "transition-timing-function: cubic-bezier(0.4, 0, 0.2, 1)",
            "transition-duration: 150ms",
        ],
    ),
    r(
        "transition-all",
        &[
            "transition-property: all",
            "transition-timing-function: cubic-bezier(0.4, 0, 0.2, 1)",
            "transition-duration: 150ms",
        ],
    ),
    r(
        "transition-colors",
        &[
            "transition-property: color, background-color, border-color, text-decoration-color, fill, stroke",
            "transition-timing-function: cubic-bezier(0.4, 0, 0.2, 1)",
            "transition-duration: 150ms",
        ],
    ),
    r(
        "transition-opacity",
        &[
            "transition-property: opacity",
            "transition-timing-function: cubic-bezier(0.4, 0, 0.2, 1)",
            "transition-duration: 150ms",
        ],
    ),
    r(
        "transition-transform",
        &[
            "transition-property: transform",
            "transition-timing-function: cubic-bezier(0.4, 0, 0.2, 1)",
            "transition-duration: 150ms",
        ],
    ),
    r("transition-none", &["transition-property: none"]),
    r("duration-{v:duration}", &["transition-duration: {v}"]),
    r("ease-linear", &["transition-timing-function: linear"]),
    r("ease-in", &["transition-timing-function: cubic-bezier(0.4, 0, 1, 1)"]),
    r("ease-out", &["transition-timing-function: cubic-bezier(0, 0, 0.2, 1)"]),
    r(
        "ease-in-out",
        &["transition-timing-function: cubic-bezier(0.4, 0, 0.2, 1)"],
    ),
    Builtin {
        kind: RuleKind::Animation,
        ..r("animate-{v:animation}", &["animation: {v}"])
    },
    // Transforms
    neg("translate-x-{v:size}", &["transform: translateX({v})"]),
    neg("translate-y-{v:size}", &["transform: translateY({v})"]),
];

fn builtin_rules() -> Vec<UtilityRule> {
    BUILTINS
        .iter()
        .filter_map(|builtin| {
            let parsed = RulePattern::parse(builtin.pattern).ok()?;
            let param = match parsed.param {
                Some(param) => Some(Param {
                    table: match param.table {
                        Some(name) => Some(ThemeTable::from_name(&name)?),
                        None => None,
                    },
                    name: param.name,
                }),
                None => None,
            };
            Some(UtilityRule {
                pattern: builtin.pattern.to_string(),
                prefix: parsed.prefix,
                param,
                declarations: builtin
                    .declarations
                    .iter()
                    .filter_map(|d| DeclarationTemplate::parse(d))
                    .collect(),
                negatable: builtin.negatable,
                origin: RuleOrigin::Builtin,
                kind: builtin.kind,
                child_selector: builtin.child.map(str::to_string),
            })
        })
        .collect()
}

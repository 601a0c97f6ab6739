use serde::{Deserialize, Serialize};
use std::fmt;

/// 解析后的候选工具类
///
/// `md:hover:!-mt-[3px]` → variants `[md, hover]`, important, negative,
/// utility `Named { body: "mt", arbitrary: Some("[3px]"), alpha: None }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// 原始 token 文本
    pub raw: String,

    /// 变体前缀，按书写顺序（从左到右应用）
    pub variants: Vec<Variant>,

    /// 重要性标记（前导或结尾的 `!`）
    pub important: bool,

    /// 负值（如 -m-4）
    pub negative: bool,

    pub utility: Utility,
}

/// 变体前缀
///
/// `hover` → name "hover"；`data-[state=open]` → name "data", arbitrary "state=open"；
/// `[&>*]` → name ""，arbitrary "&>*"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variant {
    pub raw: String,
    pub name: String,
    pub arbitrary: Option<ArbitraryValue>,
}

/// 基础工具类部分
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Utility {
    /// 普通工具类：`flex`、`bg-primary/50`、`w-[3px]`
    Named {
        /// 任意值和透明度之前的部分（如 "bg-primary"、"w"）
        body: String,
        /// 任意值（如 "[3px]"）
        arbitrary: Option<ArbitraryValue>,
        /// `/` 之后的部分（如 "50"）；`w-1/2` 中同样是 "2"，由解析器决定是否视为分数
        alpha: Option<String>,
    },

    /// 任意属性：`[mask-type:luminance]`
    Property { property: String, value: String },
}

/// 任意值表示
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArbitraryValue {
    /// 原始值（包含方括号）
    pub raw: String,

    /// 解析后的内容（去除方括号）
    pub content: String,
}

impl Candidate {
    pub fn is_arbitrary(&self) -> bool {
        match &self.utility {
            Utility::Named { arbitrary, .. } => arbitrary.is_some(),
            Utility::Property { .. } => true,
        }
    }

    /// 变体部分的原始文本（如 "md:hover:"）
    pub fn raw_variants(&self) -> String {
        self.variants
            .iter()
            .map(|v| format!("{}:", v.raw))
            .collect()
    }
}

impl Utility {
    /// `w-1/2` 这类写法视为分数值时的完整文本
    pub fn fraction(&self) -> Option<String> {
        match self {
            Utility::Named {
                body,
                arbitrary: None,
                alpha: Some(alpha),
            } if alpha.chars().all(|c| c.is_ascii_digit()) => Some(format!("{}/{}", body, alpha)),
            _ => None,
        }
    }
}

impl Variant {
    pub fn named(name: &str) -> Self {
        Self {
            raw: name.to_string(),
            name: name.to_string(),
            arbitrary: None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl ArbitraryValue {
    /// 创建新的任意值
    ///
    /// 按照 Tailwind 规范，任意值中的 `_` 会转换为空格，
    /// `\_` 会保留为字面下划线。
    pub fn new(raw: String) -> Self {
        let stripped = raw
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(&raw);

        let content = convert_underscores(stripped);

        Self { raw, content }
    }
}

/// 将任意值中的下划线转换为空格
///
/// 规则：
/// - `_` → 空格
/// - `\_` → 字面下划线 `_`
pub(crate) fn convert_underscores(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'_') {
            chars.next();
            result.push('_');
        } else if ch == '_' {
            result.push(' ');
        } else {
            result.push(ch);
        }
    }

    result
}

use thiserror::Error;

use crate::types::{convert_underscores, ArbitraryValue, Candidate, Utility, Variant};

/// 解析候选 token
///
/// 支持的格式：
/// - 简单类：`p-4`, `flex`, `bg-primary`
/// - 变体：`hover:bg-secondary`, `md:p-4`, `dark:text-white`
/// - 多变体：`md:hover:bg-primary`（从左到右应用）
/// - 参数化变体：`data-[state=open]:flex`, `min-[900px]:p-2`, `[&>*]:p-2`
/// - 负值：`-m-4`, `md:-top-1`
/// - 任意值：`w-[13px]`, `grid-cols-[repeat(3,1fr)]`
/// - 任意属性：`[mask-type:luminance]`
/// - 透明度：`bg-primary/50`, `bg-primary/[.35]`
/// - 重要性：`!p-4`, `p-4!`
///
/// # 示例
///
/// ```
/// use crosswind_parse::{parse_candidate, Utility};
///
/// let parsed = parse_candidate("md:hover:bg-primary/50!").unwrap();
/// assert_eq!(parsed.variants.len(), 2);
/// assert!(parsed.important);
/// assert!(matches!(
///     parsed.utility,
///     Utility::Named { ref body, ref alpha, .. } if body == "bg-primary" && alpha.as_deref() == Some("50")
/// ));
/// ```
pub fn parse_candidate(input: &str) -> Result<Candidate, ParseError> {
    if input.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let segments = split_variants(input)?;
    let Some((base, variant_segments)) = segments.split_last() else {
        return Err(ParseError::EmptyInput);
    };

    let variants = variant_segments
        .iter()
        .map(|segment| parse_variant(segment))
        .collect::<Result<Vec<_>, _>>()?;

    let mut parser = Parser::new(base);
    let (important, negative, utility) = parser.parse()?;

    Ok(Candidate {
        raw: input.to_string(),
        variants,
        important,
        negative,
        utility,
    })
}

/// 解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    EmptyInput,

    #[error("empty variant segment")]
    EmptySegment,

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("unmatched bracket")]
    UnmatchedBracket,

    #[error("missing utility name")]
    MissingUtility,
}

/// 在顶层 `:` 处切分；`[...]` 和 `(...)` 内的冒号不切分
///
/// `supports-[display:grid]:grid` → `["supports-[display:grid]", "grid"]`
pub fn split_variants(input: &str) -> Result<Vec<&str>, ParseError> {
    let mut segments = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;

    for (i, ch) in input.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ParseError::UnmatchedBracket);
                }
            }
            ':' if depth == 0 => {
                if i == start {
                    return Err(ParseError::EmptySegment);
                }
                segments.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ParseError::UnmatchedBracket);
    }
    if start == input.len() {
        return Err(ParseError::EmptySegment);
    }
    segments.push(&input[start..]);
    Ok(segments)
}

/// 解析单个变体段
fn parse_variant(segment: &str) -> Result<Variant, ParseError> {
    if segment.starts_with('[') {
        if !segment.ends_with(']') {
            return Err(ParseError::InvalidFormat(format!(
                "arbitrary variant `{}` must end with `]`",
                segment
            )));
        }
        return Ok(Variant {
            raw: segment.to_string(),
            name: String::new(),
            arbitrary: Some(ArbitraryValue::new(segment.to_string())),
        });
    }

    if let Some(open) = segment.find("-[") {
        if !segment.ends_with(']') {
            return Err(ParseError::InvalidFormat(format!(
                "variant `{}` has trailing characters after `]`",
                segment
            )));
        }
        return Ok(Variant {
            raw: segment.to_string(),
            name: segment[..open].to_string(),
            arbitrary: Some(ArbitraryValue::new(segment[open + 1..].to_string())),
        });
    }

    if segment.contains(['[', ']']) {
        return Err(ParseError::InvalidFormat(format!(
            "unexpected bracket in variant `{}`",
            segment
        )));
    }

    Ok(Variant::named(segment))
}

/// 内部解析器（只处理最后一段：基础工具类）
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(&mut self) -> Result<(bool, bool, Utility), ParseError> {
        // 1. 前导重要性标记
        let mut important = self.consume_if('!');

        // 2. 负值标记
        let negative = self.consume_if('-');

        // 3. 任意属性或普通工具类
        let utility = if self.peek() == Some('[') {
            if negative {
                return Err(ParseError::InvalidFormat(
                    "arbitrary properties cannot be negative".to_string(),
                ));
            }
            self.parse_property()?
        } else {
            self.parse_named()?
        };

        // 4. 结尾重要性标记
        if self.consume_if('!') {
            important = true;
        }

        // 确保已解析完整个字符串
        if self.pos < self.input.len() {
            return Err(ParseError::InvalidFormat(format!(
                "unexpected characters at position {}: '{}'",
                self.pos,
                &self.input[self.pos..]
            )));
        }

        Ok((important, negative, utility))
    }

    /// `[mask-type:luminance]`
    fn parse_property(&mut self) -> Result<Utility, ParseError> {
        let arbitrary = self.parse_arbitrary_value()?;
        let inner = &arbitrary.raw[1..arbitrary.raw.len() - 1];

        let Some((property, value)) = inner.split_once(':') else {
            return Err(ParseError::InvalidFormat(format!(
                "arbitrary property `{}` needs `property:value`",
                arbitrary.raw
            )));
        };

        let valid_name = property.starts_with("--")
            || (!property.is_empty()
                && property
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c == '-'));
        if !valid_name || value.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "invalid arbitrary property `{}`",
                arbitrary.raw
            )));
        }

        Ok(Utility::Property {
            property: property.to_string(),
            value: convert_underscores(value),
        })
    }

    /// 解析插件部分、任意值和透明度
    ///
    /// 策略：存在 `-[` 时，其之前的部分为 body；否则 body 到 `/` 或 `!` 为止
    fn parse_named(&mut self) -> Result<Utility, ParseError> {
        let start = self.pos;
        let rest = &self.input[start..];

        let arbitrary = if let Some(offset) = rest.find("-[") {
            self.pos = start + offset;
            let body_end = self.pos;
            // 跳过 '-'
            self.pos += 1;
            let value = self.parse_arbitrary_value()?;
            Some((body_end, value))
        } else {
            while let Some(ch) = self.peek() {
                if ch == '/' || ch == '!' {
                    break;
                }
                if ch == '[' || ch == ']' {
                    return Err(ParseError::InvalidFormat(format!(
                        "unexpected `{}` in `{}`",
                        ch, self.input
                    )));
                }
                self.pos += 1;
            }
            None
        };

        let (body, arbitrary) = match arbitrary {
            Some((body_end, value)) => (self.input[start..body_end].to_string(), Some(value)),
            None => (self.input[start..self.pos].to_string(), None),
        };

        if body.is_empty() {
            return Err(ParseError::MissingUtility);
        }

        let alpha = self.parse_alpha()?;

        Ok(Utility::Named {
            body,
            arbitrary,
            alpha,
        })
    }

    /// 解析任意值（方括号内容），支持嵌套
    fn parse_arbitrary_value(&mut self) -> Result<ArbitraryValue, ParseError> {
        if self.peek() != Some('[') {
            return Err(ParseError::InvalidFormat(
                "arbitrary value must start with '['".to_string(),
            ));
        }

        let start = self.pos;

        // 跳过 '['
        self.pos += 1;

        // 找到匹配的 ']'
        let mut depth = 1;
        while let Some(ch) = self.peek() {
            match ch {
                '[' => depth += 1,
                ']' => depth -= 1,
                _ => {}
            }
            self.pos += ch.len_utf8();
            if depth == 0 {
                break;
            }
        }

        if depth != 0 {
            return Err(ParseError::UnmatchedBracket);
        }

        let raw = &self.input[start..self.pos];
        if raw.len() == 2 {
            return Err(ParseError::InvalidFormat("empty arbitrary value".to_string()));
        }
        Ok(ArbitraryValue::new(raw.to_string()))
    }

    /// 解析透明度修饰符（`/50`、`/[.35]`）
    fn parse_alpha(&mut self) -> Result<Option<String>, ParseError> {
        if !self.consume_if('/') {
            return Ok(None);
        }

        if self.peek() == Some('[') {
            let value = self.parse_arbitrary_value()?;
            return Ok(Some(value.raw));
        }

        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '!' || !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_')) {
                break;
            }
            self.pos += ch.len_utf8();
        }

        if self.pos == start {
            return Err(ParseError::InvalidFormat("empty modifier after `/`".to_string()));
        }
        Ok(Some(self.input[start..self.pos].to_string()))
    }

    /// 消费指定字符（如果存在）
    fn consume_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(candidate: &Candidate) -> (&str, Option<&str>, Option<&str>) {
        match &candidate.utility {
            Utility::Named {
                body,
                arbitrary,
                alpha,
            } => (
                body.as_str(),
                arbitrary.as_ref().map(|a| a.content.as_str()),
                alpha.as_deref(),
            ),
            Utility::Property { .. } => panic!("Expected named utility"),
        }
    }

    #[test]
    fn test_simple_class() {
        let parsed = parse_candidate("p-4").unwrap();
        assert_eq!(named(&parsed), ("p-4", None, None));
        assert!(!parsed.negative);
        assert!(!parsed.important);
        assert!(parsed.variants.is_empty());
    }

    #[test]
    fn test_multiple_variants() {
        let parsed = parse_candidate("md:hover:bg-primary").unwrap();
        let names: Vec<_> = parsed.variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["md", "hover"]);
        assert_eq!(parsed.raw_variants(), "md:hover:");
        assert_eq!(named(&parsed).0, "bg-primary");
    }

    #[test]
    fn test_negative_with_variant() {
        let parsed = parse_candidate("md:-top-1").unwrap();
        assert!(parsed.negative);
        assert_eq!(named(&parsed).0, "top-1");
    }

    #[test]
    fn test_arbitrary_value() {
        let parsed = parse_candidate("w-[13px]").unwrap();
        assert_eq!(named(&parsed), ("w", Some("13px"), None));
        assert!(parsed.is_arbitrary());
    }

    #[test]
    fn test_nested_brackets() {
        let parsed = parse_candidate("grid-cols-[repeat(3,minmax(0,1fr))]").unwrap();
        assert_eq!(
            named(&parsed),
            ("grid-cols", Some("repeat(3,minmax(0,1fr))"), None)
        );
    }

    #[test]
    fn test_alpha_and_fraction() {
        let parsed = parse_candidate("bg-primary/50").unwrap();
        assert_eq!(named(&parsed), ("bg-primary", None, Some("50")));

        let parsed = parse_candidate("w-1/2").unwrap();
        assert_eq!(parsed.utility.fraction(), Some("w-1/2".to_string()));

        let parsed = parse_candidate("bg-[#ff0000]/[.35]").unwrap();
        assert_eq!(named(&parsed), ("bg", Some("#ff0000"), Some("[.35]")));
    }

    #[test]
    fn test_important_both_positions() {
        assert!(parse_candidate("!p-4").unwrap().important);
        assert!(parse_candidate("p-4!").unwrap().important);
        assert!(parse_candidate("md:!-mt-2").unwrap().negative);
    }

    #[test]
    fn test_arbitrary_property() {
        let parsed = parse_candidate("[mask-type:luminance]").unwrap();
        assert_eq!(
            parsed.utility,
            Utility::Property {
                property: "mask-type".to_string(),
                value: "luminance".to_string(),
            }
        );

        let parsed = parse_candidate("hover:[--gap:1rem_2rem]").unwrap();
        assert_eq!(
            parsed.utility,
            Utility::Property {
                property: "--gap".to_string(),
                value: "1rem 2rem".to_string(),
            }
        );
    }

    #[test]
    fn test_bracketed_variants_split_first() {
        let parsed = parse_candidate("supports-[display:grid]:grid").unwrap();
        assert_eq!(parsed.variants.len(), 1);
        assert_eq!(parsed.variants[0].name, "supports");
        assert_eq!(
            parsed.variants[0].arbitrary.as_ref().unwrap().content,
            "display:grid"
        );

        let parsed = parse_candidate("data-[state=open]:animate-fade-in").unwrap();
        assert_eq!(parsed.variants[0].name, "data");
        assert_eq!(named(&parsed).0, "animate-fade-in");

        let parsed = parse_candidate("[&>*]:p-2").unwrap();
        assert_eq!(parsed.variants[0].name, "");
        assert_eq!(parsed.variants[0].arbitrary.as_ref().unwrap().content, "&>*");
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_candidate(""), Err(ParseError::EmptyInput));
        assert_eq!(parse_candidate("hover:"), Err(ParseError::EmptySegment));
        assert_eq!(parse_candidate("hover::p-4"), Err(ParseError::EmptySegment));
        assert_eq!(parse_candidate("w-[3px"), Err(ParseError::UnmatchedBracket));
        assert_eq!(parse_candidate("-"), Err(ParseError::MissingUtility));
        assert!(parse_candidate("[notaproperty]").is_err());
    }
}

//! 内容无关的候选 token 切分
//!
//! 不区分 HTML / JSX / 字符串字面量：任何看起来像工具类的片段都会被收集，
//! 无法匹配规则的 token 由解析器静默丢弃。

/// 从文本中提取候选 token（按出现顺序，可能重复）
///
/// ```
/// use crosswind_scanner::extract_tokens;
///
/// let tokens = extract_tokens(r#"<div className={cn("p-4", "w-[3px]")}>"#);
/// assert!(tokens.contains(&"p-4"));
/// assert!(tokens.contains(&"w-[3px]"));
/// ```
pub fn extract_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut bracket_depth: usize = 0;

    for (idx, ch) in text.char_indices() {
        let boundary = if ch.is_whitespace() {
            bracket_depth = 0;
            true
        } else {
            match ch {
                '[' => {
                    bracket_depth += 1;
                    false
                }
                ']' => {
                    bracket_depth = bracket_depth.saturating_sub(1);
                    false
                }
                _ => bracket_depth == 0 && is_boundary(ch),
            }
        };

        if boundary {
            push_token(&mut tokens, &text[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    push_token(&mut tokens, &text[start..]);

    tokens
}

/// 引号和标记符号仅在方括号外切分；空白总是切分
fn is_boundary(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | '`' | '<' | '>' | '{' | '}' | '(' | ')' | '=' | ',' | ';'
    )
}

fn push_token<'a>(tokens: &mut Vec<&'a str>, raw: &'a str) {
    let token = raw.trim_end_matches(['.', ':']);
    if is_valid_candidate(token) {
        tokens.push(token);
    }
}

fn is_valid_candidate(token: &str) -> bool {
    if token.is_empty() || !token.bytes().any(|b| b.is_ascii_alphanumeric()) {
        return false;
    }
    is_balanced(token)
}

fn is_balanced(token: &str) -> bool {
    let mut square: i32 = 0;
    let mut paren: i32 = 0;
    for ch in token.chars() {
        match ch {
            '[' => square += 1,
            ']' => square -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            _ => {}
        }
        if square < 0 || paren < 0 {
            return false;
        }
    }
    square == 0 && paren == 0
}

/// 将 token 转义为合法的 CSS 类选择器（不含前导 `.`）
///
/// 与浏览器 `CSS.escape` 行为一致：
/// - `hover:bg-primary` → `hover\:bg-primary`
/// - `w-1/2` → `w-1\/2`
/// - `2xl:p-4` → `\32 xl\:p-4`
pub fn escape_class(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 8);
    let first_is_dash = token.starts_with('-');

    for (i, ch) in token.chars().enumerate() {
        let leading_digit = ch.is_ascii_digit() && (i == 0 || (i == 1 && first_is_dash));
        if leading_digit {
            out.push_str(&format!("\\{:x} ", ch as u32));
        } else if i == 0 && ch == '-' && token.len() == 1 {
            out.push_str("\\-");
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }

    out
}

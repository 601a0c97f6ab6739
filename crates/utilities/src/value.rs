//! 值处理：任意值形态判断、负值、透明度、!important

use crosswind_core::Declaration;

const COLOR_FUNCTIONS: [&str; 8] = [
    "rgb(", "rgba(", "hsl(", "hsla(", "hwb(", "lab(", "oklch(", "color-mix(",
];

/// 任意值是否像颜色（`#fff`、`rgb(...)`、`hsl(var(--x))`、`var(--x)`）
pub fn looks_like_color(value: &str) -> bool {
    value.starts_with('#')
        || value.starts_with("var(")
        || COLOR_FUNCTIONS.iter().any(|f| value.starts_with(f))
        || matches!(value, "transparent" | "currentColor" | "inherit")
}

/// 任意值是否像长度（`3px`、`1.5rem`、`50%`、`calc(...)`）
pub fn looks_like_length(value: &str) -> bool {
    let starts_numeric = value
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == '-');
    starts_numeric
        || ["calc(", "min(", "max(", "clamp(", "var("]
            .iter()
            .any(|f| value.starts_with(f))
}

/// 将 `640px` / `40rem` / `40em` 换算为像素，用于断点排序
pub fn length_to_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let (number, factor) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, 16.0)
    } else {
        return None;
    };
    let n: f64 = number.trim().parse().ok()?;
    if n < 0.0 {
        return None;
    }
    Some((n * factor).round() as u32)
}

/// 取负值：纯长度加 `-` 前缀，其余使用 `calc(v * -1)`
///
/// - `1rem` → `-1rem`
/// - `0px` → `0px`
/// - `var(--x)` → `calc(var(--x) * -1)`
pub fn negate(value: &str) -> String {
    let is_zero = value
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%')
        .parse::<f64>()
        .is_ok_and(|n| n == 0.0);
    if is_zero {
        return value.to_string();
    }
    let is_plain_length = value.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '%');
    if is_plain_length {
        format!("-{}", value)
    } else {
        format!("calc({} * -1)", value)
    }
}

/// 透明度修饰符 → 0..=1 的系数文本
///
/// - `50` → `0.5`
/// - `[.35]` → `.35`
/// - `[35%]` → `0.35`
pub fn alpha_factor(alpha: &str) -> Option<String> {
    if let Some(inner) = alpha.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if let Some(percent) = inner.strip_suffix('%') {
            let n: f64 = percent.parse().ok()?;
            return in_range(n / 100.0);
        }
        let n: f64 = inner.parse().ok()?;
        return (0.0..=1.0).contains(&n).then(|| inner.to_string());
    }

    if !alpha.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n: f64 = alpha.parse().ok()?;
    in_range(n / 100.0)
}

fn in_range(n: f64) -> Option<String> {
    (0.0..=1.0).contains(&n).then(|| format!("{}", n))
}

/// 为颜色值应用透明度
///
/// - `hsl(var(--primary))` → `hsl(var(--primary) / 0.5)`
/// - 其他颜色 → `color-mix(in srgb, v 50%, transparent)`
pub fn apply_alpha(value: &str, factor: &str) -> String {
    let is_function = ["rgb(", "hsl(", "hwb(", "lab(", "oklch("]
        .iter()
        .any(|f| value.starts_with(f));
    if is_function && value.ends_with(')') && !value.contains(" / ") {
        let close = value.len() - 1;
        return format!("{} / {})", &value[..close], factor);
    }

    let percent = factor
        .parse::<f64>()
        .map(|n| format!("{}%", (n * 100_000.0).round() / 1000.0))
        .unwrap_or_else(|_| factor.to_string());
    format!("color-mix(in srgb, {} {}, transparent)", value, percent)
}

/// 应用 !important 标记
pub fn apply_important(declarations: Vec<Declaration>, important: bool) -> Vec<Declaration> {
    if !important {
        return declarations;
    }
    declarations
        .into_iter()
        .map(|mut decl| {
            if !decl.value.ends_with("!important") {
                decl.value = format!("{} !important", decl.value);
            }
            decl
        })
        .collect()
}

//! Variant → CSS selector/at-rule resolver
//!
//! Tailwind variant names often differ from their CSS equivalents.
//! This module is the single source of truth for the mapping. Selector
//! variants return a template where `&` stands for the selector built so far.

use std::cmp::Reverse;

use crosswind_core::DarkMode;
use crosswind_parse::Variant;

use crate::escape::escape_class;
use crate::theme::Theme;
use crate::value::length_to_px;

/// Output of resolving one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantResolution {
    /// A selector template, e.g. `&:hover` or `.dark &`
    Selector(String),
    /// An at-rule wrapper, e.g. `@media (min-width: 768px)`
    AtRule(String),
}

/// Resolves a variant; `None` means the variant is unknown and the whole token
/// is dropped.
pub fn resolve_variant(
    variant: &Variant,
    theme: &Theme,
    dark_mode: DarkMode,
) -> Option<VariantResolution> {
    let name = variant.name.as_str();
    let arg = variant.arbitrary.as_ref().map(|a| a.content.as_str());

    match (name, arg) {
        // [&>*]: / [@media(print)]:
        ("", Some(arg)) => return arbitrary_variant(arg),
        ("dark", None) => {
            return Some(match dark_mode {
                DarkMode::Class => VariantResolution::Selector(".dark &".to_string()),
                DarkMode::Media => VariantResolution::AtRule(
                    "@media (prefers-color-scheme: dark)".to_string(),
                ),
            })
        }
        ("min", Some(width)) => {
            return Some(VariantResolution::AtRule(format!(
                "@media (min-width: {})",
                width
            )))
        }
        ("max", Some(width)) => {
            return Some(VariantResolution::AtRule(format!(
                "@media (max-width: {})",
                width
            )))
        }
        ("supports", Some(arg)) => return Some(VariantResolution::AtRule(supports_at_rule(arg))),
        ("*", None) => return Some(VariantResolution::Selector("& > *".to_string())),
        _ => {}
    }

    if arg.is_none() {
        if let Some(rule) = responsive_at_rule(name, theme) {
            return Some(VariantResolution::AtRule(rule));
        }
    }

    if let Some(resolution) = resolve_state(name, arg) {
        return Some(resolution);
    }

    if let Some(fragment) = parameterized_selector(name, arg) {
        return Some(VariantResolution::Selector(format!("&{}", fragment)));
    }

    if arg.is_some() {
        return None;
    }

    if is_pseudo_element(name) {
        if name == "marker" {
            return Some(VariantResolution::Selector(
                "&::marker, & *::marker".to_string(),
            ));
        }
        return Some(VariantResolution::Selector(format!(
            "&::{}",
            pseudo_element_selector(name)
        )));
    }

    if is_pseudo_class(name) {
        return Some(VariantResolution::Selector(format!(
            "&:{}",
            pseudo_class_selector(name)
        )));
    }

    None
}

/// Resolves a pseudo-class variant name to its CSS selector fragment (without leading colon).
///
/// # Examples
/// - `"hover"` → `"hover"`
/// - `"first"` → `"first-child"`
/// - `"odd"` → `"nth-child(odd)"`
pub fn pseudo_class_selector(name: &str) -> String {
    match name {
        // Shorthand → full CSS pseudo-class
        "first" => "first-child".to_string(),
        "last" => "last-child".to_string(),
        "only" => "only-child".to_string(),
        "odd" => "nth-child(odd)".to_string(),
        "even" => "nth-child(even)".to_string(),

        "open" => "is([open], :popover-open)".to_string(),

        // Direct 1:1 mappings (name == CSS pseudo-class)
        _ => name.to_string(),
    }
}

fn is_pseudo_class(name: &str) -> bool {
    matches!(
        name,
        "hover"
            | "focus"
            | "active"
            | "visited"
            | "target"
            | "focus-within"
            | "focus-visible"
            | "disabled"
            | "enabled"
            | "checked"
            | "indeterminate"
            | "default"
            | "optional"
            | "required"
            | "valid"
            | "invalid"
            | "in-range"
            | "out-of-range"
            | "placeholder-shown"
            | "autofill"
            | "read-only"
            | "empty"
            | "first"
            | "last"
            | "only"
            | "odd"
            | "even"
            | "first-of-type"
            | "last-of-type"
            | "only-of-type"
            | "open"
    )
}

/// Resolves a pseudo-element variant name to its CSS selector fragment (without leading `::`)
///
/// # Examples
/// - `"before"` → `"before"`
/// - `"file"` → `"file-selector-button"`
pub fn pseudo_element_selector(name: &str) -> String {
    match name {
        "file" => "file-selector-button".to_string(),
        _ => name.to_string(),
    }
}

fn is_pseudo_element(name: &str) -> bool {
    matches!(
        name,
        "before"
            | "after"
            | "placeholder"
            | "file"
            | "marker"
            | "selection"
            | "first-line"
            | "first-letter"
            | "backdrop"
    )
}

// ── Responsive breakpoints ──────────────────────────────────────────────────

/// Generates an at-rule for a responsive breakpoint from the theme.
///
/// - `"sm"` → `"@media (min-width: 640px)"`
/// - `"max-sm"` → `"@media (max-width: 640px)"`
pub fn responsive_at_rule(name: &str, theme: &Theme) -> Option<String> {
    if let Some(rest) = name.strip_prefix("max-") {
        let width = theme.screen(rest)?;
        return Some(format!("@media (max-width: {})", width));
    }
    let width = theme.screen(name)?;
    Some(format!("@media (min-width: {})", width))
}

/// Cascade position of a breakpoint at-rule.
///
/// Non-breakpoint at-rules come first, then `min-width` rules from narrow to
/// wide, then `max-width` rules from wide to narrow, so the narrower query of
/// either kind is emitted later and wins where both match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MediaOrder {
    #[default]
    Other,
    Min(u32),
    Max(Reverse<u32>),
}

pub fn media_order(at_rule: &str) -> MediaOrder {
    if at_rule.contains("(min-width:") {
        MediaOrder::Min(breakpoint_width(at_rule))
    } else if at_rule.contains("(max-width:") {
        MediaOrder::Max(Reverse(breakpoint_width(at_rule)))
    } else {
        MediaOrder::Other
    }
}

/// Width of a breakpoint at-rule in px. Non-breakpoint at-rules give 0.
pub fn breakpoint_width(at_rule: &str) -> u32 {
    let Some(start) = at_rule
        .find("(min-width:")
        .or_else(|| at_rule.find("(max-width:"))
    else {
        return 0;
    };
    let rest = &at_rule[start + "(min-width:".len()..];
    rest.split(')')
        .next()
        .and_then(length_to_px)
        .unwrap_or(0)
}

// ── Parameterized variants ───────────────────────────────────────────────────

/// Resolves a parameterized pseudo-class variant.
///
/// - `("has", ".active")` → `":has(.active)"`
/// - `("nth", "2n+1")` → `":nth-child(2n+1)"`
/// - `("aria", "sort=ascending")` → `"[aria-sort=ascending]"`
/// - `("aria-expanded", -)` → `"[aria-expanded=\"true\"]"`
/// - `("data", "state=open")` → `"[data-state=open]"`
pub fn parameterized_selector(name: &str, arg: Option<&str>) -> Option<String> {
    match (name, arg) {
        ("has", Some(arg)) => Some(format!(":has({})", arg)),
        ("not", Some(arg)) => Some(format!(":not({})", arg)),
        ("nth", Some(arg)) => Some(format!(":nth-child({})", arg)),
        ("nth-last", Some(arg)) => Some(format!(":nth-last-child({})", arg)),
        ("nth-of-type", Some(arg)) => Some(format!(":nth-of-type({})", arg)),
        ("nth-last-of-type", Some(arg)) => Some(format!(":nth-last-of-type({})", arg)),
        ("aria", Some(arg)) => Some(format!("[aria-{}]", arg)),
        ("data", Some(arg)) => Some(format!("[data-{}]", arg)),
        (name, None) => {
            let state = name.strip_prefix("aria-")?;
            Some(format!("[aria-{}=\"true\"]", state))
        }
        _ => None,
    }
}

/// Resolves a `supports-[...]` argument to an @supports at-rule.
pub fn supports_at_rule(arg: &str) -> String {
    if arg.contains(':') || arg.starts_with('(') {
        format!("@supports ({})", arg.trim_matches(|c| c == '(' || c == ')'))
    } else {
        format!("@supports ({}: var(--tw))", arg)
    }
}

fn arbitrary_variant(arg: &str) -> Option<VariantResolution> {
    if arg.starts_with('@') {
        return Some(VariantResolution::AtRule(arg.to_string()));
    }
    if arg.contains('&') {
        return Some(VariantResolution::Selector(arg.to_string()));
    }
    None
}

/// Resolves state variants: media features, direction, group and peer.
fn resolve_state(name: &str, arg: Option<&str>) -> Option<VariantResolution> {
    let at_rule = |rule: &str| Some(VariantResolution::AtRule(rule.to_string()));

    match (name, arg) {
        // ── Motion ──
        ("motion-safe", None) => at_rule("@media (prefers-reduced-motion: no-preference)"),
        ("motion-reduce", None) => at_rule("@media (prefers-reduced-motion: reduce)"),

        // ── Contrast ──
        ("contrast-more", None) => at_rule("@media (prefers-contrast: more)"),
        ("contrast-less", None) => at_rule("@media (prefers-contrast: less)"),

        // ── Media features ──
        ("portrait", None) => at_rule("@media (orientation: portrait)"),
        ("landscape", None) => at_rule("@media (orientation: landscape)"),
        ("print", None) => at_rule("@media print"),
        ("forced-colors", None) => at_rule("@media (forced-colors: active)"),

        // ── Direction ──
        ("rtl", None) => Some(VariantResolution::Selector(
            "[dir=\"rtl\"] &".to_string(),
        )),
        ("ltr", None) => Some(VariantResolution::Selector(
            "[dir=\"ltr\"] &".to_string(),
        )),

        // ── Group / Peer ──
        (name, arg) if name == "group" || name.starts_with("group-") => {
            let (marker, inner) = relation_parts(name, "group")?;
            let fragment = relation_fragment(inner, arg)?;
            Some(VariantResolution::Selector(format!("{}{} &", marker, fragment)))
        }
        (name, arg) if name == "peer" || name.starts_with("peer-") => {
            let (marker, inner) = relation_parts(name, "peer")?;
            let fragment = relation_fragment(inner, arg)?;
            Some(VariantResolution::Selector(format!("{}{} ~ &", marker, fragment)))
        }

        _ => None,
    }
}

/// `group-hover/item` → (`.group\/item`, `hover`)
fn relation_parts<'a>(name: &'a str, kind: &str) -> Option<(String, &'a str)> {
    let (name, label) = match name.split_once('/') {
        Some((name, label)) if !label.is_empty() => (name, Some(label)),
        Some(_) => return None,
        None => (name, None),
    };
    let inner = name
        .strip_prefix(kind)
        .map(|rest| rest.strip_prefix('-').unwrap_or(rest))?;
    let marker = match label {
        Some(label) => format!(".{}", escape_class(&format!("{}/{}", kind, label))),
        None => format!(".{}", kind),
    };
    Some((marker, inner))
}

fn relation_fragment(inner: &str, arg: Option<&str>) -> Option<String> {
    match (inner, arg) {
        // group-[.is-open]
        ("", Some(arg)) => Some(arg.to_string()),
        ("", None) => None,
        (inner, arg) => {
            if let Some(fragment) = parameterized_selector(inner, arg) {
                return Some(fragment);
            }
            if arg.is_none() && is_pseudo_class(inner) {
                return Some(format!(":{}", pseudo_class_selector(inner)));
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswind_parse::parse_candidate;

    fn resolve(token_variant: &str) -> Option<VariantResolution> {
        resolve_with(token_variant, DarkMode::Class)
    }

    fn resolve_with(token_variant: &str, dark_mode: DarkMode) -> Option<VariantResolution> {
        let candidate = parse_candidate(&format!("{}:flex", token_variant)).unwrap();
        resolve_variant(&candidate.variants[0], &Theme::default(), dark_mode)
    }

    fn selector(s: &str) -> Option<VariantResolution> {
        Some(VariantResolution::Selector(s.to_string()))
    }

    fn at_rule(s: &str) -> Option<VariantResolution> {
        Some(VariantResolution::AtRule(s.to_string()))
    }

    #[test]
    fn test_pseudo_class_shorthand() {
        assert_eq!(pseudo_class_selector("first"), "first-child");
        assert_eq!(pseudo_class_selector("odd"), "nth-child(odd)");
        assert_eq!(resolve("hover"), selector("&:hover"));
        assert_eq!(resolve("last"), selector("&:last-child"));
    }

    #[test]
    fn test_pseudo_element() {
        assert_eq!(resolve("before"), selector("&::before"));
        assert_eq!(resolve("file"), selector("&::file-selector-button"));
        assert_eq!(resolve("marker"), selector("&::marker, & *::marker"));
    }

    #[test]
    fn test_dark_mode_strategies() {
        assert_eq!(resolve("dark"), selector(".dark &"));
        assert_eq!(
            resolve_with("dark", DarkMode::Media),
            at_rule("@media (prefers-color-scheme: dark)")
        );
    }

    #[test]
    fn test_responsive() {
        assert_eq!(resolve("md"), at_rule("@media (min-width: 768px)"));
        assert_eq!(resolve("max-sm"), at_rule("@media (max-width: 640px)"));
        assert_eq!(resolve("min-[900px]"), at_rule("@media (min-width: 900px)"));
        assert_eq!(resolve("3xl"), None);
    }

    #[test]
    fn test_breakpoint_width() {
        assert_eq!(breakpoint_width("@media (min-width: 768px)"), 768);
        assert_eq!(breakpoint_width("@media (max-width: 40rem)"), 640);
        assert_eq!(breakpoint_width("@media print"), 0);
    }

    #[test]
    fn test_media_order() {
        let md = media_order("@media (min-width: 768px)");
        let lg = media_order("@media (min-width: 1024px)");
        let max_md = media_order("@media (max-width: 768px)");
        let max_lg = media_order("@media (max-width: 1024px)");
        let print = media_order("@media print");

        assert!(print < md);
        assert!(md < lg);
        assert!(lg < max_lg);
        assert!(max_lg < max_md);
    }

    #[test]
    fn test_group_peer() {
        assert_eq!(resolve("group-hover"), selector(".group:hover &"));
        assert_eq!(resolve("peer-focus"), selector(".peer:focus ~ &"));
        assert_eq!(
            resolve("group-data-[collapsible=icon]"),
            selector(".group[data-collapsible=icon] &")
        );
        assert_eq!(
            resolve("peer-disabled"),
            selector(".peer:disabled ~ &")
        );
        assert_eq!(
            resolve("group-hover/item"),
            selector(".group\\/item:hover &")
        );
        assert_eq!(resolve("group-bogus"), None);
    }

    #[test]
    fn test_parameterized() {
        assert_eq!(resolve("data-[state=open]"), selector("&[data-state=open]"));
        assert_eq!(resolve("aria-expanded"), selector("&[aria-expanded=\"true\"]"));
        assert_eq!(resolve("has-[.active]"), selector("&:has(.active)"));
        assert_eq!(resolve("nth-[2n+1]"), selector("&:nth-child(2n+1)"));
    }

    #[test]
    fn test_at_rule_states() {
        assert_eq!(
            resolve("motion-safe"),
            at_rule("@media (prefers-reduced-motion: no-preference)")
        );
        assert_eq!(resolve("print"), at_rule("@media print"));
        assert_eq!(
            resolve("supports-[display:grid]"),
            at_rule("@supports (display:grid)")
        );
    }

    #[test]
    fn test_arbitrary_variants() {
        assert_eq!(resolve("[&>*]"), selector("&>*"));
        assert_eq!(resolve("[&_svg]"), selector("& svg"));
        assert_eq!(resolve("[.foo]"), None);
    }

    #[test]
    fn test_unknown_variant() {
        assert_eq!(resolve("wat"), None);
        assert_eq!(resolve("data"), None);
    }
}

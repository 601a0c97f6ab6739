//! 主题扩展配置
//!
//! 这里只保存项目层面的扩展（颜色、圆角、动画……）。内置的默认刻度表
//! （间距、断点、字号等）由 `crosswind-utilities` 提供，加载主题时两者合并，
//! 扩展项覆盖同名默认项。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 颜色值：单个值，或带 `DEFAULT` 的嵌套色板
///
/// ```toml
/// [theme.colors]
/// border = "hsl(var(--border))"
/// primary = { DEFAULT = "hsl(var(--primary))", foreground = "hsl(var(--primary-foreground))" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    Single(String),
    Palette(IndexMap<String, String>),
}

/// `container` 组件配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub center: bool,
    pub padding: Option<String>,
    /// 覆盖默认断点（如 `2xl = "1400px"`）
    pub screens: IndexMap<String, String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            center: true,
            padding: Some("2rem".to_string()),
            screens: IndexMap::from([("2xl".to_string(), "1400px".to_string())]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub spacing: IndexMap<String, String>,
    pub colors: IndexMap<String, ColorValue>,
    pub screens: IndexMap<String, String>,
    pub border_radius: IndexMap<String, String>,
    pub font_size: IndexMap<String, String>,
    pub font_weight: IndexMap<String, String>,
    pub opacity: IndexMap<String, String>,
    /// name → step（`from` / `to` / `50%`）→ property → value
    pub keyframes: IndexMap<String, IndexMap<String, IndexMap<String, String>>>,
    pub animation: IndexMap<String, String>,
    pub container: ContainerConfig,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            spacing: IndexMap::new(),
            colors: default_colors(),
            screens: IndexMap::new(),
            border_radius: pairs(&[
                ("lg", "var(--radius)"),
                ("md", "calc(var(--radius) - 2px)"),
                ("sm", "calc(var(--radius) - 4px)"),
            ]),
            font_size: IndexMap::new(),
            font_weight: IndexMap::new(),
            opacity: IndexMap::new(),
            keyframes: default_keyframes(),
            animation: pairs(&[
                ("accordion-down", "accordion-down 0.2s ease-out"),
                ("accordion-up", "accordion-up 0.2s ease-out"),
                ("fade-in", "fade-in 0.2s ease-out"),
                ("fade-out", "fade-out 0.2s ease-out"),
                ("slide-in-from-top", "slide-in-from-top 0.3s ease-out"),
                ("slide-in-from-bottom", "slide-in-from-bottom 0.3s ease-out"),
            ]),
            container: ContainerConfig::default(),
        }
    }
}

impl ThemeConfig {
    /// 将嵌套色板展开为扁平名称
    ///
    /// `primary.DEFAULT` → `primary`，`primary.foreground` → `primary-foreground`
    pub fn flat_colors(&self) -> IndexMap<String, String> {
        let mut flat = IndexMap::new();
        for (name, value) in &self.colors {
            match value {
                ColorValue::Single(v) => {
                    flat.insert(name.clone(), v.clone());
                }
                ColorValue::Palette(shades) => {
                    for (shade, v) in shades {
                        let key = if shade == "DEFAULT" {
                            name.clone()
                        } else {
                            format!("{}-{}", name, shade)
                        };
                        flat.insert(key, v.clone());
                    }
                }
            }
        }
        flat
    }
}

fn pairs(items: &[(&str, &str)]) -> IndexMap<String, String> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 语义色：全部指向 CSS 自定义属性，切换主题只需改变变量值
fn default_colors() -> IndexMap<String, ColorValue> {
    let mut colors = IndexMap::new();
    for name in ["border", "input", "ring", "background", "foreground"] {
        colors.insert(
            name.to_string(),
            ColorValue::Single(format!("hsl(var(--{}))", name)),
        );
    }
    for name in [
        "primary",
        "secondary",
        "destructive",
        "muted",
        "accent",
        "popover",
        "card",
    ] {
        colors.insert(
            name.to_string(),
            ColorValue::Palette(pairs(&[
                ("DEFAULT", &format!("hsl(var(--{}))", name)),
                ("foreground", &format!("hsl(var(--{}-foreground))", name)),
            ])),
        );
    }
    colors.insert(
        "sidebar".to_string(),
        ColorValue::Palette(pairs(&[
            ("DEFAULT", "hsl(var(--sidebar-background))"),
            ("foreground", "hsl(var(--sidebar-foreground))"),
            ("primary", "hsl(var(--sidebar-primary))"),
            ("primary-foreground", "hsl(var(--sidebar-primary-foreground))"),
            ("accent", "hsl(var(--sidebar-accent))"),
            ("accent-foreground", "hsl(var(--sidebar-accent-foreground))"),
            ("border", "hsl(var(--sidebar-border))"),
            ("ring", "hsl(var(--sidebar-ring))"),
        ])),
    );
    colors
}

fn default_keyframes() -> IndexMap<String, IndexMap<String, IndexMap<String, String>>> {
    let frame = |from: &[(&str, &str)], to: &[(&str, &str)]| {
        IndexMap::from([("from".to_string(), pairs(from)), ("to".to_string(), pairs(to))])
    };
    IndexMap::from([
        (
            "accordion-down".to_string(),
            frame(
                &[("height", "0")],
                &[("height", "var(--radix-accordion-content-height)")],
            ),
        ),
        (
            "accordion-up".to_string(),
            frame(
                &[("height", "var(--radix-accordion-content-height)")],
                &[("height", "0")],
            ),
        ),
        (
            "fade-in".to_string(),
            frame(&[("opacity", "0")], &[("opacity", "1")]),
        ),
        (
            "fade-out".to_string(),
            frame(&[("opacity", "1")], &[("opacity", "0")]),
        ),
        (
            "slide-in-from-top".to_string(),
            frame(
                &[("transform", "translateY(-100%)")],
                &[("transform", "translateY(0)")],
            ),
        ),
        (
            "slide-in-from-bottom".to_string(),
            frame(
                &[("transform", "translateY(100%)")],
                &[("transform", "translateY(0)")],
            ),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_colors_expands_palettes() {
        let theme = ThemeConfig::default();
        let flat = theme.flat_colors();

        assert_eq!(flat.get("primary").unwrap(), "hsl(var(--primary))");
        assert_eq!(
            flat.get("primary-foreground").unwrap(),
            "hsl(var(--primary-foreground))"
        );
        assert_eq!(
            flat.get("sidebar").unwrap(),
            "hsl(var(--sidebar-background))"
        );
        assert_eq!(flat.get("border").unwrap(), "hsl(var(--border))");
    }

    #[test]
    fn test_color_value_deserializes_untagged() {
        let json = r##"{ "ring": "hsl(var(--ring))", "brand": { "DEFAULT": "#0ea5e9", "50": "#f0f9ff" } }"##;
        let colors: IndexMap<String, ColorValue> = serde_json::from_str(json).unwrap();

        assert_eq!(
            colors.get("ring"),
            Some(&ColorValue::Single("hsl(var(--ring))".to_string()))
        );
        assert!(matches!(colors.get("brand"), Some(ColorValue::Palette(_))));
    }
}

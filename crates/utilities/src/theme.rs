use std::collections::BTreeMap;

use crosswind_core::{ContainerConfig, Declaration, ThemeConfig};
use indexmap::IndexMap;

use crate::theme_values;

/// 规则参数可引用的主题表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeTable {
    Colors,
    Spacing,
    /// 间距 + 分数 + 关键字（w / h / inset / basis）
    Size,
    Radius,
    Opacity,
    FontSize,
    FontWeight,
    Animation,
    Screens,
    LineHeight,
    LetterSpacing,
    ZIndex,
    BorderWidth,
    Shadow,
    Duration,
    MaxWidth,
    GridColumns,
    GridSpan,
}

impl ThemeTable {
    pub fn from_name(name: &str) -> Option<Self> {
        let table = match name {
            "colors" => ThemeTable::Colors,
            "spacing" => ThemeTable::Spacing,
            "size" => ThemeTable::Size,
            "radius" => ThemeTable::Radius,
            "opacity" => ThemeTable::Opacity,
            "font-size" => ThemeTable::FontSize,
            "font-weight" => ThemeTable::FontWeight,
            "animation" => ThemeTable::Animation,
            "screens" => ThemeTable::Screens,
            "line-height" => ThemeTable::LineHeight,
            "letter-spacing" => ThemeTable::LetterSpacing,
            "z-index" => ThemeTable::ZIndex,
            "border-width" => ThemeTable::BorderWidth,
            "shadow" => ThemeTable::Shadow,
            "duration" => ThemeTable::Duration,
            "max-width" => ThemeTable::MaxWidth,
            "grid-columns" => ThemeTable::GridColumns,
            "grid-span" => ThemeTable::GridSpan,
            _ => return None,
        };
        Some(table)
    }

    /// 任意值是否可以分派到该表对应的规则
    ///
    /// 同一前缀有多条规则时（`text-` 颜色 / 字号），靠值的形态区分。
    pub fn accepts_arbitrary(&self, value: &str) -> bool {
        match self {
            ThemeTable::Colors => crate::value::looks_like_color(value),
            ThemeTable::Spacing
            | ThemeTable::Size
            | ThemeTable::Radius
            | ThemeTable::FontSize
            | ThemeTable::LineHeight
            | ThemeTable::LetterSpacing
            | ThemeTable::BorderWidth
            | ThemeTable::MaxWidth
            | ThemeTable::Screens => crate::value::looks_like_length(value),
            _ => true,
        }
    }
}

/// 关键帧：name → 按书写顺序的 (step, 声明)
pub type Keyframes = Vec<(String, Vec<Declaration>)>;

/// 合并后的主题：内置默认值 + 配置扩展
#[derive(Debug, Clone)]
pub struct Theme {
    colors: IndexMap<String, String>,
    spacing: IndexMap<String, String>,
    screens: IndexMap<String, String>,
    radius: IndexMap<String, String>,
    font_size: IndexMap<String, String>,
    font_weight: IndexMap<String, String>,
    opacity: IndexMap<String, String>,
    animation: IndexMap<String, String>,
    keyframes: BTreeMap<String, Keyframes>,
    container: ContainerConfig,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut keyframes: BTreeMap<String, Keyframes> = theme_values::KEYFRAMES
            .iter()
            .map(|(name, steps)| {
                let steps = steps
                    .iter()
                    .map(|(step, decls)| {
                        let decls = decls
                            .iter()
                            .map(|(p, v)| Declaration::new(*p, *v))
                            .collect();
                        (step.to_string(), decls)
                    })
                    .collect();
                (name.to_string(), steps)
            })
            .collect();
        for (name, steps) in &config.keyframes {
            let steps = steps
                .iter()
                .map(|(step, decls)| {
                    let decls = decls
                        .iter()
                        .map(|(p, v)| Declaration::new(p.as_str(), v.as_str()))
                        .collect();
                    (step.clone(), decls)
                })
                .collect();
            keyframes.insert(name.clone(), steps);
        }

        Self {
            colors: merge(&theme_values::COLORS, &config.flat_colors()),
            spacing: merge(&theme_values::SPACING, &config.spacing),
            screens: merge_screens(&config.screens),
            radius: merge(&theme_values::RADIUS, &config.border_radius),
            font_size: merge(&theme_values::FONT_SIZE, &config.font_size),
            font_weight: merge(&theme_values::FONT_WEIGHT, &config.font_weight),
            opacity: merge(&theme_values::OPACITY, &config.opacity),
            animation: merge(&theme_values::ANIMATION, &config.animation),
            keyframes,
            container: config.container.clone(),
        }
    }

    /// 查表；配置表中找不到时回退到内置表
    pub fn lookup(&self, table: ThemeTable, key: &str) -> Option<&str> {
        let static_lookup = |map: &'static phf::Map<&'static str, &'static str>| map.get(key).copied();
        match table {
            ThemeTable::Colors => self.colors.get(key).map(String::as_str),
            ThemeTable::Spacing => self.spacing.get(key).map(String::as_str),
            ThemeTable::Size => self
                .spacing
                .get(key)
                .map(String::as_str)
                .or_else(|| static_lookup(&theme_values::SIZE_EXTRA)),
            ThemeTable::Radius => self.radius.get(key).map(String::as_str),
            ThemeTable::Opacity => self.opacity.get(key).map(String::as_str),
            ThemeTable::FontSize => self.font_size.get(key).map(String::as_str),
            ThemeTable::FontWeight => self.font_weight.get(key).map(String::as_str),
            ThemeTable::Animation => self.animation.get(key).map(String::as_str),
            ThemeTable::Screens => self.screens.get(key).map(String::as_str),
            ThemeTable::LineHeight => static_lookup(&theme_values::LINE_HEIGHT),
            ThemeTable::LetterSpacing => static_lookup(&theme_values::LETTER_SPACING),
            ThemeTable::ZIndex => static_lookup(&theme_values::Z_INDEX),
            ThemeTable::BorderWidth => static_lookup(&theme_values::BORDER_WIDTH),
            ThemeTable::Shadow => static_lookup(&theme_values::SHADOW),
            ThemeTable::Duration => static_lookup(&theme_values::DURATION),
            ThemeTable::MaxWidth => static_lookup(&theme_values::MAX_WIDTH),
            ThemeTable::GridColumns => static_lookup(&theme_values::GRID_COLUMNS),
            ThemeTable::GridSpan => static_lookup(&theme_values::GRID_SPAN),
        }
    }

    /// 断点（按宽度升序）
    pub fn screens(&self) -> &IndexMap<String, String> {
        &self.screens
    }

    pub fn screen(&self, name: &str) -> Option<&str> {
        self.screens.get(name).map(String::as_str)
    }

    pub fn keyframes(&self, name: &str) -> Option<&Keyframes> {
        self.keyframes.get(name)
    }

    pub fn has_keyframes(&self, name: &str) -> bool {
        self.keyframes.contains_key(name)
    }

    pub fn container(&self) -> &ContainerConfig {
        &self.container
    }

    /// container 组件使用的断点：配置了 `container.screens` 时只用这些
    pub fn container_screens(&self) -> Vec<(String, String)> {
        if self.container.screens.is_empty() {
            self.screens
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        } else {
            self.container
                .screens
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
    }
}

/// phf 表顺序不固定，先按 key 排序再叠加配置，保证迭代顺序确定
fn merge(
    defaults: &'static phf::Map<&'static str, &'static str>,
    extend: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut entries: Vec<(&str, &str)> = defaults.entries().map(|(k, v)| (*k, *v)).collect();
    entries.sort_unstable();
    let mut merged: IndexMap<String, String> = entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    for (k, v) in extend {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

fn merge_screens(extend: &IndexMap<String, String>) -> IndexMap<String, String> {
    let mut screens = merge(&theme_values::SCREENS, extend);
    screens.sort_by(|_, a, _, b| {
        crate::value::length_to_px(a)
            .unwrap_or(u32::MAX)
            .cmp(&crate::value::length_to_px(b).unwrap_or(u32::MAX))
    });
    screens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_extends_defaults() {
        let theme = Theme::default();

        assert_eq!(theme.lookup(ThemeTable::Spacing, "4"), Some("1rem"));
        assert_eq!(
            theme.lookup(ThemeTable::Colors, "primary"),
            Some("hsl(var(--primary))")
        );
        assert_eq!(theme.lookup(ThemeTable::Colors, "white"), Some("rgb(255 255 255)"));
        // 配置覆盖默认圆角
        assert_eq!(theme.lookup(ThemeTable::Radius, "lg"), Some("var(--radius)"));
        assert_eq!(theme.lookup(ThemeTable::Radius, "full"), Some("9999px"));
    }

    #[test]
    fn test_spacing_is_fixed_table() {
        let theme = Theme::default();
        assert_eq!(theme.lookup(ThemeTable::Spacing, "13"), None);
        assert_eq!(theme.lookup(ThemeTable::Spacing, "full"), None);
        assert_eq!(theme.lookup(ThemeTable::Size, "full"), Some("100%"));
        assert_eq!(theme.lookup(ThemeTable::Size, "1/2"), Some("50%"));
    }

    #[test]
    fn test_screens_sorted_by_width() {
        let mut config = ThemeConfig::default();
        config.screens.insert("xs".to_string(), "480px".to_string());
        let theme = Theme::from_config(&config);

        let names: Vec<_> = theme.screens().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["xs", "sm", "md", "lg", "xl", "2xl"]);
    }

    #[test]
    fn test_keyframes_from_config_and_builtin() {
        let theme = Theme::default();
        assert!(theme.has_keyframes("accordion-down"));
        assert!(theme.has_keyframes("spin"));
        assert_eq!(theme.container_screens(), vec![("2xl".to_string(), "1400px".to_string())]);
    }
}

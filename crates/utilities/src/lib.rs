pub mod assembler;
pub mod escape;
pub mod resolver;
pub mod rules;
pub mod theme;
pub mod theme_values;
pub mod value;
pub mod variant;

// Re-export main types
pub use assembler::{Assembler, Stylesheet, PREFLIGHT};
pub use escape::escape_class;
pub use resolver::{GeneratedRule, Layer, NestedBlock, Resolver, SortKey};
pub use rules::{RuleOrigin, RuleTable, UtilityRule};
pub use theme::{Theme, ThemeTable};
pub use variant::{resolve_variant, MediaOrder, VariantResolution};

use crosswind_core::{ConfigError, CrosswindConfig};

/// 根据配置解析 token 集合并组装样式表
pub fn generate_stylesheet<'a, I>(config: &CrosswindConfig, tokens: I) -> Result<Stylesheet, ConfigError>
where
    I: IntoIterator<Item = &'a String>,
{
    let resolver = Resolver::from_config(config)?;
    let rules = resolver.resolve_all(tokens);
    Ok(Assembler::new(resolver.theme())
        .with_preflight(config.build.preflight)
        .assemble(&rules))
}

pub mod config;
pub mod env;
pub mod error;
pub mod naming;
pub mod retry;
pub mod theme;
pub mod types;

// Re-export commonly used types
pub use config::{
    normalize_join, BuildConfig, CrosswindConfig, DarkMode, ManualChunk, ResolveConfig,
    RuleConfig, RuleParam, RulePattern, ServerConfig, CONFIG_FILE, PARAM_TABLES,
};
pub use env::EnvSnapshot;
pub use error::ConfigError;
pub use naming::{content_hash, create_naming_strategy, NamingStrategy};
pub use retry::{read_to_string_with_retry, RetryPolicy};
pub use theme::{ColorValue, ContainerConfig, ThemeConfig};
pub use types::{
    BuildMode, ContentSource, Declaration, Diagnostic, DiagnosticLevel, NamingMode, WatchEvent,
    WatchKind,
};

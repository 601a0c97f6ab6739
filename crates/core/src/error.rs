use thiserror::Error;

/// 配置错误（启动时致命）
///
/// `key` 指向出错的配置项，如 `resolve.alias.@` 或 `rules[2].pattern`。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid configuration at `{key}`: {message}")]
pub struct ConfigError {
    pub key: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        let key = if err.path.is_empty() {
            "<root>".to_string()
        } else {
            err.path.join(".")
        };
        Self {
            key,
            message: err.kind.to_string(),
        }
    }
}

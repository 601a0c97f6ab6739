use thiserror::Error;

/// 模块解析 / 代码生成错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("failed to emit {file}: {message}")]
    Emit { file: String, message: String },
}

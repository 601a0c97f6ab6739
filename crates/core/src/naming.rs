use crate::types::NamingMode;

/// 内容 hash 的十六进制长度
const HASH_LEN: usize = 8;

/// 基于内容计算稳定的短 hash
///
/// 相同内容总是得到相同结果，构建产物的文件名因此可以长期缓存。
pub fn content_hash(content: &[u8]) -> String {
    let hash = blake3::hash(content);
    let hex = hash.to_hex();
    hex[..HASH_LEN].to_string()
}

/// 产物文件命名策略
pub trait NamingStrategy: Send + Sync {
    /// `stem` 为 chunk 名（如 "main"、"shared~a~b"），`ext` 不带点
    fn file_name(&self, stem: &str, content: &[u8], ext: &str) -> String;
}

/// Hash 命名："main-3f2a9c1d.js"
pub struct HashNaming;

impl NamingStrategy for HashNaming {
    fn file_name(&self, stem: &str, content: &[u8], ext: &str) -> String {
        format!("{}-{}.{}", sanitize_stem(stem), content_hash(content), ext)
    }
}

/// Readable 命名："main.js"
pub struct ReadableNaming;

impl NamingStrategy for ReadableNaming {
    fn file_name(&self, stem: &str, _content: &[u8], ext: &str) -> String {
        format!("{}.{}", sanitize_stem(stem), ext)
    }
}

/// 文件名中只保留安全字符，其余替换为 `_`
///
/// `shared~main~admin` 保持不变，`@scope/pkg` → `_scope_pkg`
fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '~' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 根据 NamingMode 创建对应的策略
pub fn create_naming_strategy(mode: NamingMode) -> Box<dyn NamingStrategy> {
    match mode {
        NamingMode::Hash => Box::new(HashNaming),
        NamingMode::Readable => Box::new(ReadableNaming),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_stability() {
        let a = content_hash(b"console.log(1)");
        let b = content_hash(b"console.log(1)");

        assert_eq!(a, b, "Hash should be stable");
        assert_eq!(a.len(), 8);
        assert_ne!(a, content_hash(b"console.log(2)"));
    }

    #[test]
    fn test_hash_naming() {
        let naming = HashNaming;
        let name = naming.file_name("main", b"x", "js");

        assert!(name.starts_with("main-"));
        assert!(name.ends_with(".js"));
        assert_eq!(name.len(), "main-".len() + 8 + ".js".len());
    }

    #[test]
    fn test_readable_naming() {
        let naming = create_naming_strategy(NamingMode::Readable);
        assert_eq!(naming.file_name("shared~main~admin", b"x", "js"), "shared~main~admin.js");
        assert_eq!(naming.file_name("@scope/pkg", b"x", "js"), "_scope_pkg.js");
    }
}

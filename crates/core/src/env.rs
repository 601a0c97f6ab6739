use std::collections::BTreeMap;

use crate::types::BuildMode;

/// 布尔型内置变量，转换时输出 `true` / `false` 字面量
const FLAG_VARS: [&str; 2] = ["DEV", "PROD"];

/// 构建开始时捕获的环境变量快照
///
/// 只保留以前缀开头的变量和内置变量（`MODE`、`DEV`、`PROD`、`BASE_URL`），
/// 其余变量（如 `SECRET_KEY`）不会进入快照，也就不可能出现在产物中。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// 从当前进程环境捕获
    pub fn capture(prefix: &str, mode: BuildMode) -> Self {
        Self::from_vars(std::env::vars(), prefix, mode)
    }

    pub fn from_vars<I, K, V>(vars: I, prefix: &str, mode: BuildMode) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut snapshot: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| !prefix.is_empty() && k.starts_with(prefix))
            .collect();

        snapshot.insert("MODE".to_string(), mode.as_str().to_string());
        snapshot.insert("DEV".to_string(), (!mode.is_production()).to_string());
        snapshot.insert("PROD".to_string(), mode.is_production().to_string());
        snapshot
            .entry("BASE_URL".to_string())
            .or_insert_with(|| "/".to_string());

        tracing::debug!(count = snapshot.len(), prefix, "captured env snapshot");
        Self { vars: snapshot }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// 是否为布尔型内置变量
    pub fn is_flag(name: &str) -> bool {
        FLAG_VARS.contains(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

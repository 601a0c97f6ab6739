use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::split::ChunkKind;

/// 构建清单（`manifest.json`）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// chunk 名 → 产物信息，顺序与 chunk 顺序一致
    pub chunks: IndexMap<String, ManifestChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestChunk {
    pub file: String,
    pub kind: ChunkKind,
    /// 相对项目根目录的模块名
    pub modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_imports: Vec<String>,
}

impl Manifest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 入口 chunk 的产物文件
    pub fn entry_files(&self) -> impl Iterator<Item = &str> {
        self.chunks
            .values()
            .filter(|c| c.kind == ChunkKind::Entry)
            .map(|c| c.file.as_str())
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

pub const JAVASCRIPT: &str = "application/javascript; charset=utf-8";
pub const CSS: &str = "text/css; charset=utf-8";
pub const JSON: &str = "application/json; charset=utf-8";
pub const HTML: &str = "text/html; charset=utf-8";
pub const PLAIN: &str = "text/plain; charset=utf-8";

/// 一次请求的响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl DevResponse {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: PLAIN,
            body: b"module not found".to_vec(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            content_type: PLAIN,
            body: message.into().into_bytes(),
        }
    }

    pub fn status(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: PLAIN,
            body: message.as_bytes().to_vec(),
        }
    }

    /// 响应体按 UTF-8 解读（测试和日志用）
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }
}

/// 失效推送：`{"type":"reload","changed":["/src/App.tsx"]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "reload")]
pub struct ReloadNotice {
    pub changed: Vec<String>,
}

impl ReloadNotice {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// 按扩展名推断静态资源的 Content-Type
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => HTML,
        Some("css") => CSS,
        Some("json") => JSON,
        Some("js" | "mjs" | "jsx" | "ts" | "tsx") => JAVASCRIPT,
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => PLAIN,
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_notice_json() {
        let notice = ReloadNotice {
            changed: vec!["/src/a.js".to_string()],
        };
        assert_eq!(notice.to_json(), r#"{"type":"reload","changed":["/src/a.js"]}"#);
        let back: ReloadNotice = serde_json::from_str(&notice.to_json()).unwrap();
        assert_eq!(back, notice);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("index.html")), HTML);
        assert_eq!(content_type_for(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }
}

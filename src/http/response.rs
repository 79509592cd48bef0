use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 规范化后的 HTTP 响应
///
/// header 名统一为小写，`data` 为解析后的 JSON；body 不是 JSON 时为字符串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

impl ResponseData {
    pub fn new(status: u16, headers: &HeaderMap, body: String) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: normalize_headers(headers),
            data: parse_body(body),
        }
    }

    /// 只有状态码的响应，测试断言时常用
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            headers: BTreeMap::new(),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// 响应体的序列化文本，`contains` 类断言基于它做子串匹配
    pub fn body_text(&self) -> String {
        serde_json::to_string(&self.data).unwrap_or_default()
    }
}

pub fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

fn normalize_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut normalized: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers.iter() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        normalized
            .entry(name.as_str().to_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    normalized
}

fn parse_body(body: String) -> Value {
    match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) => Value::String(body),
    }
}

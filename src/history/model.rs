use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::runner::ExecutionResult;
use crate::runner::processor::ResolvedRequest;

/// 这些 header 的值写入历史前会被遮盖
const REDACTED_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "x-api-key",
    "api-key",
    "x-auth-token",
];
const REDACTED: &str = "***";

/// 历史记录条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 唯一 ID (UUID)
    pub id: String,

    /// 请求时间
    pub timestamp: DateTime<Utc>,

    /// 请求耗时 (毫秒)
    pub duration_ms: u64,

    /// 请求快照
    pub request: RequestSnapshot,

    /// 执行结果摘要
    pub outcome: Outcome,
}

/// 请求快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub name: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// 结果摘要（不包含响应 Body，节省空间）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// 传输失败时为 0
    pub status: u16,
    pub success: bool,
    pub error: Option<String>,
}

impl HistoryEntry {
    /// 由一次执行构建历史条目；`resolved` 缺失时退回模板 URL
    pub fn from_execution(resolved: Option<&ResolvedRequest>, result: &ExecutionResult) -> Self {
        let request = match resolved {
            Some(resolved) => RequestSnapshot {
                name: result.name.clone(),
                method: resolved.method.to_string(),
                url: redact_query(&resolved.url, resolved.secret_param.as_deref()),
                headers: redact_headers(&resolved.headers),
                body: resolved.body.as_ref().map(|body| body.text().to_string()),
            },
            None => RequestSnapshot {
                name: result.name.clone(),
                method: result.method.to_string(),
                url: result.url.clone(),
                headers: BTreeMap::new(),
                body: None,
            },
        };

        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            duration_ms: result.duration,
            request,
            outcome: Outcome {
                status: result.status,
                success: result.success,
                error: result.error.clone(),
            },
        }
    }
}

fn redact_headers(headers: &[(String, String)]) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| {
            let key = key.to_lowercase();
            let value = if REDACTED_HEADERS.contains(&key.as_str()) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (key, value)
        })
        .collect()
}

/// 遮盖 URL 中携带 API Key 的查询参数
fn redact_query(url: &str, secret: Option<&str>) -> String {
    let Some(secret) = secret else {
        return url.to_string();
    };
    let Ok(mut parsed) = url::Url::parse(url) else {
        return url.to_string();
    };

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == secret { REDACTED.into() } else { v };
            (k.into_owned(), v.into_owned())
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

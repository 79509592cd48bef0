use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertion::Assertion;
use crate::auth::AuthConfig;
use crate::http::types::Method;

/// 请求模板
///
/// URL、header 值和 body 中可以包含 `{{var}}` 占位符，执行时由环境变量替换。
/// 模板本身在执行过程中不会被修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// 请求名称，用于报告
    pub name: String,

    pub method: Method,

    pub url: String,

    /// Header 列表，保持原始顺序；值为 null 的 header 在解析阶段被丢弃
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_type: Option<BodyType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// 期望的响应
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<Assertion>,
}

/// 请求体：字符串或结构化 JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Text(String),
    Json(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "form-data")]
    FormData,
    #[serde(rename = "x-www-form-urlencoded")]
    UrlEncoded,
    #[serde(rename = "raw")]
    Raw,
}

impl Request {
    pub fn new(name: impl Into<String>, method: Method, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            url: url.into(),
            headers: IndexMap::new(),
            body: None,
            body_type: None,
            auth: None,
            expect: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), Some(value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(text.into()));
        self
    }

    pub fn with_json(mut self, data: Value) -> Self {
        self.body = Some(RequestBody::Json(data));
        self.body_type = Some(BodyType::Json);
        self
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = Some(body_type);
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_expect(mut self, expect: Assertion) -> Self {
        self.expect = Some(expect);
        self
    }
}

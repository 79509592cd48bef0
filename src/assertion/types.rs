use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertion::json_path::JsonPath;

/// 断言错误类型（断言配置本身不合法）
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssertError {
    #[error("Invalid JSON path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid status range: {min} > {max}")]
    InvalidStatusRange { min: u16, max: u16 },
}

/// 单个字符串或字符串列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    pub fn items(&self) -> &[String] {
        match self {
            StringList::One(item) => std::slice::from_ref(item),
            StringList::Many(items) => items,
        }
    }
}

impl From<&str> for StringList {
    fn from(item: &str) -> Self {
        StringList::One(item.to_string())
    }
}

impl From<Vec<&str>> for StringList {
    fn from(items: Vec<&str>) -> Self {
        StringList::Many(items.into_iter().map(String::from).collect())
    }
}

/// 声明式的响应断言
///
/// 所有字段可选、互相独立；未配置的字段不产生任何结果。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// 闭区间 [min, max]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_range: Option<(u16, u16)>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<StringList>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_contains: Option<StringList>,

    /// 响应 header 精确匹配，保持声明顺序
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,

    /// JSON 路径 -> 期望值，保持声明顺序
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<IndexMap<String, Value>>,

    /// 最大允许响应时间（毫秒，含）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn status_range(mut self, min: u16, max: u16) -> Self {
        self.status_range = Some((min, max));
        self
    }

    pub fn contains(mut self, items: impl Into<StringList>) -> Self {
        self.contains = Some(items.into());
        self
    }

    pub fn not_contains(mut self, items: impl Into<StringList>) -> Self {
        self.not_contains = Some(items.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn json_path(mut self, path: impl Into<String>, expected: Value) -> Self {
        self.json_path
            .get_or_insert_with(IndexMap::new)
            .insert(path.into(), expected);
        self
    }

    pub fn response_time(mut self, max_ms: u64) -> Self {
        self.response_time = Some(max_ms);
        self
    }

    /// 在进入执行之前校验断言配置
    pub fn validate(&self) -> Result<(), AssertError> {
        if let Some((min, max)) = self.status_range
            && min > max
        {
            return Err(AssertError::InvalidStatusRange { min, max });
        }

        for path in self.json_path.iter().flat_map(IndexMap::keys) {
            JsonPath::parse(path)?;
        }

        Ok(())
    }
}

/// 单项断言的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    /// 可读的检查描述，如 `Status code is 200`
    pub name: String,

    /// 是否通过
    pub passed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    /// 失败消息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AssertionResult {
    pub fn check(name: String, passed: bool, expected: String, actual: Option<String>) -> Self {
        Self {
            name,
            passed,
            expected: Some(expected),
            actual,
            message: None,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }

    /// 创建错误的断言结果（断言配置不合法）
    pub fn error(name: String, error: AssertError) -> Self {
        Self {
            name,
            passed: false,
            expected: None,
            actual: None,
            message: Some(error.to_string()),
        }
    }
}

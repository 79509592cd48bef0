use std::fmt;
use std::str::FromStr;

use crate::{ReqcraftError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl FromStr for Method {
    type Err = ReqcraftError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(ReqcraftError::InvalidRequest(format!(
                "Invalid HTTP method: {}",
                s
            ))),
        }
    }
}

impl Method {
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 请求文件里大小写都可能出现，统一走 FromStr
impl<'de> Deserialize<'de> for Method {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Method {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// 默认 host，当命令行 URL 中未指定 host 时使用
const DEFAULT_HOST: &str = "localhost";
/// 默认 scheme，当命令行 URL 中未指定 scheme 时使用
const DEFAULT_SCHEME: &str = "http";

/// 展开命令行里的 URL 简写
///
/// - ":3000" -> "http://localhost:3000"
/// - "localhost:3000" -> "http://localhost:3000"
/// - "https://:8080" -> "https://localhost:8080"
///
/// 含有 `{{var}}` 开头的 URL 原样返回，交给变量替换处理。
pub fn expand_url_shorthand(input: &str) -> String {
    let input = input.trim();

    if input.starts_with("{{") {
        input.to_string()
    } else if input.starts_with(':') {
        format!("{}://{}{}", DEFAULT_SCHEME, DEFAULT_HOST, input)
    } else if let Some(pos) = input.find("://") {
        let after_scheme = &input[pos + 3..];
        if after_scheme.starts_with(':') {
            format!("{}://{}{}", &input[..pos], DEFAULT_HOST, after_scheme)
        } else {
            input.to_string()
        }
    } else {
        format!("{}://{}", DEFAULT_SCHEME, input)
    }
}

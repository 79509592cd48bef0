use crate::http::Request;
use crate::{ReqcraftError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// 一组按顺序声明的请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,

    #[serde(default)]
    pub requests: Vec<Request>,
}

impl TestSuite {
    /// 从 `.json` 或 `.toml` 文件加载，并校验每个请求的断言配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ReqcraftError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let suite = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&content)?,
            Some("toml") => Self::parse_toml(&content)?,
            _ => {
                return Err(ReqcraftError::Config(format!(
                    "unsupported suite format: {} (expected .json or .toml)",
                    path.display()
                )));
            }
        };

        debug!(
            path = %path.display(),
            name = %suite.name,
            requests = suite.requests.len(),
            "suite loaded"
        );
        Ok(suite)
    }

    pub fn parse_json(content: &str) -> Result<Self> {
        let suite: Self = serde_json::from_str(content)?;
        suite.validate()?;
        Ok(suite)
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        let suite: Self = toml::from_str(content)?;
        suite.validate()?;
        Ok(suite)
    }

    /// 断言配置错误在加载时就报告，而不是等到执行
    fn validate(&self) -> Result<()> {
        for request in &self.requests {
            if let Some(expect) = &request.expect {
                expect.validate().map_err(|e| {
                    ReqcraftError::InvalidAssertion(format!("{}: {}", request.name, e))
                })?;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_json_suite() {
        let suite = TestSuite::parse_json(
            r#"{
                "name": "users",
                "requests": [
                    {
                        "name": "List",
                        "method": "get",
                        "url": "{{base}}/users",
                        "headers": {"Accept": "application/json", "X-Skip": null},
                        "expect": {"status": 200, "jsonPath": {"data[0].id": 1}}
                    },
                    {
                        "name": "Create",
                        "method": "POST",
                        "url": "{{base}}/users",
                        "body": {"name": "{{name}}"},
                        "bodyType": "json",
                        "auth": {"type": "bearer-token", "token": "{{token}}"}
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(suite.name, "users");
        assert_eq!(suite.len(), 2);
        assert_eq!(suite.requests[0].method, Method::Get);
        assert_eq!(suite.requests[0].headers.get("X-Skip"), Some(&None));
        assert!(suite.requests[1].auth.is_some());
    }

    #[test]
    fn test_parse_toml_suite() {
        let suite = TestSuite::parse_toml(
            r#"
name = "smoke"

[[requests]]
name = "Health"
method = "GET"
url = "http://localhost:8080/health"

[requests.headers]
Accept = "text/plain"

[requests.expect]
status = 200
contains = "ok"
"#,
        )
        .unwrap();

        assert_eq!(suite.name, "smoke");
        let request = &suite.requests[0];
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers["Accept"].as_deref(), Some("text/plain"));
        let expect = request.expect.as_ref().unwrap();
        assert_eq!(expect.status, Some(200));
        assert_eq!(expect.contains.as_ref().unwrap().items(), ["ok".to_string()]);
    }

    #[test]
    fn test_invalid_assertion_rejected_on_load() {
        let err = TestSuite::parse_json(
            r#"{"name": "s", "requests": [
                {"name": "Bad", "method": "GET", "url": "http://x", "expect": {"jsonPath": {"a[": 1}}}
            ]}"#,
        )
        .unwrap_err();

        match err {
            ReqcraftError::InvalidAssertion(msg) => assert!(msg.starts_with("Bad: ")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_by_extension() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"{{"name": "file", "requests": []}}"#).unwrap();

        let suite = TestSuite::load(file.path()).unwrap();
        assert_eq!(suite.name, "file");
        assert!(suite.is_empty());
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = NamedTempFile::with_suffix(".yaml").unwrap();
        assert!(matches!(
            TestSuite::load(file.path()),
            Err(ReqcraftError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        assert!(matches!(
            TestSuite::load("/nonexistent/suite.json"),
            Err(ReqcraftError::Config(_))
        ));
    }
}

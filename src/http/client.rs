use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use serde_json::Value;
use tracing::debug;

use crate::http::request::BodyType;
use crate::http::response::ResponseData;
use crate::runner::processor::{ResolvedBody, ResolvedRequest};
use crate::{ReqcraftError, Result};

/// 默认请求超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest 的薄封装：把解析完成的请求转换为 HTTP 调用
///
/// 不根据状态码报错，任何收到的响应都会被返回。
#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner })
    }

    /// 构建 reqwest 请求（URL、header、body）
    ///
    /// URL 或 header 不合法时返回错误，此时请求尚未发出。
    pub fn build(&self, request: &ResolvedRequest) -> Result<reqwest::Request> {
        let url = reqwest::Url::parse(&request.url).map_err(|e| {
            ReqcraftError::InvalidRequest(format!("invalid URL '{}': {}", request.url, e))
        })?;
        let mut headers = build_headers(&request.headers)?;
        let is_multipart = request.body_type == Some(BodyType::FormData)
            && matches!(
                request.body,
                Some(ResolvedBody::Json {
                    value: Value::Object(_),
                    ..
                })
            );
        if is_multipart {
            // multipart 自带 boundary，用户给的 Content-Type 会冲突
            headers.remove(CONTENT_TYPE);
        }
        let has_content_type = headers.contains_key(CONTENT_TYPE);

        let mut builder = self
            .inner
            .request(request.method.to_reqwest(), url)
            .headers(headers);

        match (&request.body, request.body_type) {
            (None, _) => {}
            (
                Some(ResolvedBody::Json {
                    value: Value::Object(fields),
                    ..
                }),
                Some(BodyType::UrlEncoded),
            ) => {
                let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                for (key, value) in fields {
                    serializer.append_pair(key, &scalar_to_string(value));
                }
                builder = builder.body(serializer.finish());
                if !has_content_type {
                    builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                }
            }
            (
                Some(ResolvedBody::Json {
                    value: Value::Object(fields),
                    ..
                }),
                Some(BodyType::FormData),
            ) => {
                let mut form = Form::new();
                for (key, value) in fields {
                    form = form.text(key.clone(), scalar_to_string(value));
                }
                builder = builder.multipart(form);
            }
            // 发送替换后的原文，不重新序列化
            (Some(body), body_type) => {
                builder = builder.body(body.text().to_string());
                let implied = match (body, body_type) {
                    (_, Some(BodyType::Raw)) => None,
                    (ResolvedBody::Json { .. }, _) | (_, Some(BodyType::Json)) => {
                        Some("application/json")
                    }
                    (_, Some(BodyType::UrlEncoded)) => Some("application/x-www-form-urlencoded"),
                    _ => None,
                };
                if let (Some(content_type), false) = (implied, has_content_type) {
                    builder = builder.header(CONTENT_TYPE, content_type);
                }
            }
        }

        Ok(builder.build()?)
    }

    /// 发送请求并读取完整响应体
    pub async fn dispatch(&self, request: reqwest::Request) -> Result<ResponseData> {
        debug!(method = %request.method(), url = %request.url(), "dispatching request");
        let response = self.inner.execute(request).await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(ResponseData::new(status, &headers, body))
    }
}

fn build_headers(pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (key, value) in pairs {
        let name = HeaderName::from_bytes(key.trim().as_bytes()).map_err(|e| {
            ReqcraftError::InvalidRequest(format!("invalid header name '{}': {}", key, e))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ReqcraftError::InvalidRequest(format!("invalid value for header '{}': {}", key, e))
        })?;
        // 同名 header 全部保留
        headers.append(name, value);
    }
    Ok(headers)
}

/// 表单字段取值：字符串去掉引号，其余按 JSON 文本
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::types::Method;
    use serde_json::json;

    fn resolved(body: Option<ResolvedBody>, body_type: Option<BodyType>) -> ResolvedRequest {
        ResolvedRequest {
            method: Method::Post,
            url: "http://example.com/items".to_string(),
            headers: vec![("X-Trace".to_string(), "t-1".to_string())],
            body,
            body_type,
            secret_param: None,
        }
    }

    fn body_bytes(request: &reqwest::Request) -> Vec<u8> {
        request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| b.to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let client = Client::new().unwrap();
        let request = client
            .build(&resolved(Some(ResolvedBody::json(json!({"a": 1}))), None))
            .unwrap();

        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(request.headers()["x-trace"], "t-1");
        assert_eq!(body_bytes(&request), br#"{"a":1}"#.to_vec());
    }

    #[test]
    fn test_urlencoded_object_body() {
        let client = Client::new().unwrap();
        let request = client
            .build(&resolved(
                Some(ResolvedBody::json(json!({"q": "a b", "page": 2}))),
                Some(BodyType::UrlEncoded),
            ))
            .unwrap();

        assert_eq!(
            request.headers()[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let body = String::from_utf8(body_bytes(&request)).unwrap();
        assert!(body.contains("q=a+b"));
        assert!(body.contains("page=2"));
    }

    #[test]
    fn test_raw_text_body_has_no_implied_content_type() {
        let client = Client::new().unwrap();
        let request = client
            .build(&resolved(
                Some(ResolvedBody::Text("hello".to_string())),
                Some(BodyType::Raw),
            ))
            .unwrap();

        assert!(request.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(body_bytes(&request), b"hello".to_vec());
    }

    #[test]
    fn test_raw_json_text_sent_verbatim() {
        let client = Client::new().unwrap();
        let text = r#"{"b": 1, "a": 12345678901234567890123, "c": 1.50}"#;
        let request = client
            .build(&resolved(
                Some(ResolvedBody::Json {
                    value: serde_json::from_str(text).unwrap(),
                    text: text.to_string(),
                }),
                Some(BodyType::Raw),
            ))
            .unwrap();

        assert!(request.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(body_bytes(&request), text.as_bytes().to_vec());
    }

    #[test]
    fn test_repeated_headers_are_all_sent() {
        let client = Client::new().unwrap();
        let mut request = resolved(None, None);
        request.headers.push(("X-Trace".to_string(), "t-2".to_string()));

        let built = client.build(&request).unwrap();
        let values: Vec<_> = built
            .headers()
            .get_all("x-trace")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, ["t-1", "t-2"]);
    }

    #[test]
    fn test_form_data_replaces_user_content_type() {
        let client = Client::new().unwrap();
        let mut request = resolved(
            Some(ResolvedBody::json(json!({"name": "ann"}))),
            Some(BodyType::FormData),
        );
        request
            .headers
            .push(("Content-Type".to_string(), "application/json".to_string()));

        let built = client.build(&request).unwrap();
        let content_types: Vec<_> = built.headers().get_all(CONTENT_TYPE).iter().collect();
        assert_eq!(content_types.len(), 1);
        assert!(
            content_types[0]
                .to_str()
                .unwrap()
                .starts_with("multipart/form-data; boundary=")
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let client = Client::new().unwrap();
        let mut request = resolved(None, None);
        request.url = "{{base_url}}/users".to_string();

        let err = client.build(&request).unwrap_err();
        assert!(err.to_string().contains("{{base_url}}"));
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let client = Client::new().unwrap();
        let mut request = resolved(None, None);
        request.headers.push(("bad header".to_string(), "v".to_string()));

        assert!(client.build(&request).is_err());
    }
}

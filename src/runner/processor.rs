use serde_json::Value;
use tracing::debug;

use crate::auth::{self, AuthConfig};
use crate::http::{BodyType, Method, Request, RequestBody};
use crate::variable::{Environment, VariableResolver};

/// 解析完成、可以直接发送的请求
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<ResolvedBody>,
    pub body_type: Option<BodyType>,
    /// 认证注入的查询参数名（API Key）
    pub secret_param: Option<String>,
}

/// 解析后的 body
///
/// `Json` 同时保留发送用的原文：字符串模板按替换后的文本原样发送，
/// 不经过 `serde_json` 重新序列化。
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedBody {
    Json { value: Value, text: String },
    Text(String),
}

impl ResolvedBody {
    /// 由结构化值构建，原文即其序列化结果
    pub fn json(value: Value) -> Self {
        let text = serde_json::to_string(&value).unwrap_or_default();
        Self::Json { value, text }
    }

    /// 实际发送的文本
    pub fn text(&self) -> &str {
        match self {
            Self::Json { text, .. } => text,
            Self::Text(text) => text,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Json { value, .. } => Some(value),
            Self::Text(_) => None,
        }
    }
}

impl ResolvedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// 请求模板 + 环境 -> 可发送的请求
pub struct RequestProcessor;

impl RequestProcessor {
    /// 依次处理 URL、header、body，最后注入认证信息
    ///
    /// 不修改传入的模板。`env` 为空时跳过全部变量替换。
    pub fn resolve(request: &Request, env: Option<&Environment>) -> ResolvedRequest {
        let interpolate = |text: &str| match env {
            Some(env) => VariableResolver::interpolate(text, env),
            None => text.to_string(),
        };

        let url = interpolate(&request.url);

        let headers: Vec<(String, String)> = request
            .headers
            .iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.clone(), interpolate(v))))
            .collect();

        let body = request
            .body
            .as_ref()
            .map(|body| Self::resolve_body(body, env));

        let auth = match (request.auth.as_ref(), env) {
            (Some(auth), Some(env)) => Some(interpolate_auth(auth, env)),
            (auth, _) => auth.cloned(),
        };
        let injected = auth::inject(auth.as_ref(), &headers, &url);

        debug!(
            name = %request.name,
            method = %request.method,
            url = %injected.url,
            headers = injected.headers.len(),
            "request resolved"
        );

        ResolvedRequest {
            method: request.method,
            url: injected.url,
            headers: injected.headers,
            body,
            body_type: request.body_type,
            secret_param: injected.secret_param,
        }
    }

    fn resolve_body(body: &RequestBody, env: Option<&Environment>) -> ResolvedBody {
        let Some(env) = env else {
            return match body {
                RequestBody::Text(text) => ResolvedBody::Text(text.clone()),
                RequestBody::Json(value) => ResolvedBody::json(value.clone()),
            };
        };

        let text = match body {
            RequestBody::Text(text) => VariableResolver::interpolate(text, env),
            RequestBody::Json(value) => {
                let serialized = serde_json::to_string(value).unwrap_or_default();
                VariableResolver::interpolate(&serialized, env)
            }
        };

        // 解析失败时保留替换后的原始文本
        match serde_json::from_str(&text) {
            Ok(value) => ResolvedBody::Json { value, text },
            Err(_) => ResolvedBody::Text(text),
        }
    }
}

fn interpolate_auth(auth: &AuthConfig, env: &Environment) -> AuthConfig {
    let sub = |text: &String| VariableResolver::interpolate(text, env);
    match auth {
        AuthConfig::NoAuth => AuthConfig::NoAuth,
        AuthConfig::ApiKey {
            key,
            value,
            add_to,
            header_key,
        } => AuthConfig::ApiKey {
            key: sub(key),
            value: sub(value),
            add_to: *add_to,
            header_key: header_key.as_ref().map(sub),
        },
        AuthConfig::BearerToken { token } => AuthConfig::BearerToken { token: sub(token) },
        AuthConfig::BasicAuth { username, password } => AuthConfig::BasicAuth {
            username: sub(username),
            password: sub(password),
        },
        AuthConfig::OAuth2 {
            access_token,
            token_type,
        } => AuthConfig::OAuth2 {
            access_token: sub(access_token),
            token_type: token_type.as_ref().map(sub),
        },
    }
}

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::auth::types::{ApiKeyLocation, AuthConfig};

const AUTHORIZATION: &str = "Authorization";
const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// 常见的 API Key header 名（小写）
const KNOWN_API_KEY_HEADERS: &[&str] = &["x-api-key", "api-key", "apikey", "x-auth-token"];

/// 注入认证信息后的 header 与 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInjection {
    pub headers: Vec<(String, String)>,
    pub url: String,
    /// 携带 API Key 的查询参数名，写入历史前需要遮盖
    pub secret_param: Option<String>,
}

/// 根据认证配置生成新的 header 列表和 URL
///
/// 纯函数：调用方传入的 headers/url 不会被修改。
pub fn inject(auth: Option<&AuthConfig>, headers: &[(String, String)], url: &str) -> AuthInjection {
    let mut injection = AuthInjection {
        headers: headers.to_vec(),
        url: url.to_string(),
        secret_param: None,
    };

    let Some(auth) = auth else {
        return injection;
    };

    match auth {
        AuthConfig::NoAuth => {}
        AuthConfig::ApiKey {
            value,
            add_to: ApiKeyLocation::Header,
            header_key,
            ..
        } => {
            let name = header_key.as_deref().unwrap_or(DEFAULT_API_KEY_HEADER);
            set_header(&mut injection.headers, name, value.clone());
        }
        AuthConfig::ApiKey {
            key,
            value,
            add_to: ApiKeyLocation::QueryParams,
            ..
        } => {
            injection.url = set_query_param(url, key, value);
            injection.secret_param = Some(key.clone());
        }
        AuthConfig::BearerToken { token } => {
            set_header(&mut injection.headers, AUTHORIZATION, format!("Bearer {}", token));
        }
        AuthConfig::BasicAuth { username, password } => {
            let encoded = STANDARD.encode(format!("{}:{}", username, password));
            set_header(&mut injection.headers, AUTHORIZATION, format!("Basic {}", encoded));
        }
        AuthConfig::OAuth2 {
            access_token,
            token_type,
        } => {
            let token_type = token_type.as_deref().unwrap_or("Bearer");
            set_header(
                &mut injection.headers,
                AUTHORIZATION,
                format!("{} {}", token_type, access_token),
            );
        }
    }

    injection
}

/// 从 header 反推认证配置，仅用于展示和调试
///
/// 识别 `Authorization: Bearer/Basic` 以及常见的 API Key header；
/// 放在查询参数里的 API Key 无法还原。
pub fn extract_auth_from_headers(headers: &[(String, String)]) -> Option<AuthConfig> {
    let authorization = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(AUTHORIZATION))
        .map(|(_, v)| v.as_str());

    if let Some(value) = authorization {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(AuthConfig::bearer(token));
        }
        if let Some(encoded) = value.strip_prefix("Basic ") {
            let decoded = STANDARD
                .decode(encoded.trim())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok());
            return match decoded.as_deref().and_then(|s| s.split_once(':')) {
                Some((username, password)) => Some(AuthConfig::basic(username, password)),
                None => {
                    debug!("Authorization header carries undecodable basic credentials");
                    None
                }
            };
        }
    }

    headers
        .iter()
        .find(|(k, _)| KNOWN_API_KEY_HEADERS.contains(&k.to_lowercase().as_str()))
        .map(|(name, value)| AuthConfig::api_key_header(name.clone(), value.clone()))
}

/// 覆盖同名 header（不区分大小写），不存在则追加
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value));
}

/// 设置查询参数，已存在的同名参数会被替换而不是重复追加
fn set_query_param(url: &str, key: &str, value: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let retained: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(k, _)| k != key)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            {
                let mut pairs = parsed.query_pairs_mut();
                pairs.clear();
                pairs.extend_pairs(retained);
                pairs.append_pair(key, value);
            }
            parsed.to_string()
        }
        Err(_) => {
            // 仍含未解析占位符等非绝对 URL：退化为字符串拼接
            let encoded: String = url::form_urlencoded::Serializer::new(String::new())
                .append_pair(key, value)
                .finish();
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}{}", url, separator, encoded)
        }
    }
}

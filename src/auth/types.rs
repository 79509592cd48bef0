use serde::{Deserialize, Serialize};

/// 请求认证配置
///
/// 每个变体只携带自己需要的字段，字段值中可以包含 `{{var}}` 占位符。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthConfig {
    NoAuth,

    #[serde(rename_all = "camelCase")]
    ApiKey {
        /// 查询参数名
        key: String,
        value: String,
        #[serde(default)]
        add_to: ApiKeyLocation,
        /// header 名，缺省为 `X-API-Key`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header_key: Option<String>,
    },

    BearerToken {
        token: String,
    },

    BasicAuth {
        username: String,
        password: String,
    },

    #[serde(rename = "oauth2", rename_all = "camelCase")]
    OAuth2 {
        access_token: String,
        /// 缺省为 `Bearer`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_type: Option<String>,
    },
}

/// API Key 的放置位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiKeyLocation {
    #[default]
    #[serde(rename = "header")]
    Header,
    #[serde(rename = "query-params")]
    QueryParams,
}

impl AuthConfig {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::BearerToken {
            token: token.into(),
        }
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::BasicAuth {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn api_key_header(header_key: impl Into<String>, value: impl Into<String>) -> Self {
        let header_key = header_key.into();
        Self::ApiKey {
            key: header_key.clone(),
            value: value.into(),
            add_to: ApiKeyLocation::Header,
            header_key: Some(header_key),
        }
    }

    pub fn api_key_query(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ApiKey {
            key: key.into(),
            value: value.into(),
            add_to: ApiKeyLocation::QueryParams,
            header_key: None,
        }
    }

    pub fn oauth2(access_token: impl Into<String>, token_type: Option<String>) -> Self {
        Self::OAuth2 {
            access_token: access_token.into(),
            token_type,
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::NoAuth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_variants() {
        let none: AuthConfig = serde_json::from_value(json!({"type": "no-auth"})).unwrap();
        assert_eq!(none, AuthConfig::NoAuth);
        assert!(!none.is_configured());

        let api_key: AuthConfig = serde_json::from_value(json!({
            "type": "api-key",
            "key": "api_key",
            "value": "{{key}}",
            "addTo": "query-params"
        }))
        .unwrap();
        assert_eq!(api_key, AuthConfig::api_key_query("api_key", "{{key}}"));

        let oauth: AuthConfig = serde_json::from_value(json!({
            "type": "oauth2",
            "accessToken": "tok",
            "tokenType": "MAC"
        }))
        .unwrap();
        assert_eq!(oauth, AuthConfig::oauth2("tok", Some("MAC".to_string())));

        let basic: AuthConfig =
            serde_json::from_value(json!({"type": "basic-auth", "username": "u", "password": "p"}))
                .unwrap();
        assert_eq!(basic, AuthConfig::basic("u", "p"));
    }

    #[test]
    fn test_api_key_defaults_to_header() {
        let auth: AuthConfig =
            serde_json::from_value(json!({"type": "api-key", "key": "k", "value": "v"})).unwrap();
        match auth {
            AuthConfig::ApiKey {
                add_to, header_key, ..
            } => {
                assert_eq!(add_to, ApiKeyLocation::Header);
                assert_eq!(header_key, None);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = serde_json::from_value::<AuthConfig>(json!({"type": "digest"}));
        assert!(result.is_err());
    }
}

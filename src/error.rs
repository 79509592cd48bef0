use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReqcraftError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("无效的请求: {0}")]
    InvalidRequest(String),

    #[error("无效的断言: {0}")]
    InvalidAssertion(String),

    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML 解析错误: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for ReqcraftError {
    fn from(err: anyhow::Error) -> Self {
        ReqcraftError::Other(err.to_string())
    }
}

impl From<crate::assertion::AssertError> for ReqcraftError {
    fn from(err: crate::assertion::AssertError) -> Self {
        ReqcraftError::InvalidAssertion(err.to_string())
    }
}

/// Result type for reqcraft crate
pub type Result<T> = std::result::Result<T, ReqcraftError>;

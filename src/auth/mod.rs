//! 认证注入：把认证配置转换为 header/URL 的修改
mod injector;
mod types;

pub use injector::{AuthInjection, extract_auth_from_headers, inject};
pub use types::{ApiKeyLocation, AuthConfig};

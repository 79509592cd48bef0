pub mod client;
pub mod request;
pub mod response;
pub mod types;

// Re-export commonly used types for convenient access
pub use client::{Client, DEFAULT_TIMEOUT};
pub use request::{BodyType, Request, RequestBody};
pub use response::ResponseData;
pub use types::Method;

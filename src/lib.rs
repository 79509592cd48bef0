pub mod assertion;
pub mod auth;
pub mod error;
pub mod history;
pub mod http;
pub mod logger;
pub mod runner;
pub mod suite;
pub mod utils;
pub mod variable;

// Re-export commonly used types
pub use error::{ReqcraftError, Result};

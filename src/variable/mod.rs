pub mod config;
pub mod dotenv;
pub mod resolver;
pub mod types;

pub use config::{ConfigLoader, EnvironmentOptions, HistorySettings, ProjectConfig};
pub use dotenv::parse_dotenv;
pub use resolver::VariableResolver;
pub use types::Environment;

pub mod executor;
pub mod processor;
pub mod reporter;
pub mod types;

pub use executor::RequestExecutor;
pub use processor::{RequestProcessor, ResolvedBody, ResolvedRequest};
pub use reporter::TestReporter;
pub use types::{ExecutionResult, TestResult, TestSummary};

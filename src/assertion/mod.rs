/// 断言模块 - 对 API 响应执行声明式断言
mod evaluator;
mod json_path;
mod types;

pub use evaluator::evaluate;
pub use json_path::{JsonPath, Segment};
pub use types::{AssertError, Assertion, AssertionResult, StringList};

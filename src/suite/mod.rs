//! 请求集合：从文件加载一组请求并按声明顺序执行
mod loader;
mod runner;

pub use loader::TestSuite;
pub use runner::{RunMode, SuiteRunner};

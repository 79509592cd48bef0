use crate::assertion::AssertionResult;
use crate::http::{Method, ResponseData};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 单个请求的执行结果
///
/// 收到任何状态码的响应都算一次完成的执行；`status == 0` 只表示没有收到响应。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// 请求名称
    pub name: String,

    pub method: Method,

    /// 模板中的 URL（未替换变量）
    pub url: String,

    /// 实际发送的 URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_url: Option<String>,

    /// 响应状态码，传输失败时为 0
    pub status: u16,

    /// 耗时（毫秒）
    pub duration: u64,

    /// 状态码是否在 [200, 300) 内
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseData>,

    /// 错误消息（传输失败时）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn completed(
        name: String,
        method: Method,
        url: String,
        resolved_url: String,
        response: ResponseData,
        duration: Duration,
    ) -> Self {
        Self {
            name,
            method,
            url,
            resolved_url: Some(resolved_url),
            status: response.status,
            duration: duration.as_millis() as u64,
            success: response.is_success(),
            response: Some(response),
            error: None,
        }
    }

    pub fn failed(
        name: String,
        method: Method,
        url: String,
        resolved_url: Option<String>,
        error: String,
        duration: Duration,
    ) -> Self {
        Self {
            name,
            method,
            url,
            resolved_url,
            status: 0,
            duration: duration.as_millis() as u64,
            success: false,
            response: None,
            error: Some(error),
        }
    }

    /// 是否收到了响应（不论状态码）
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration)
    }
}

/// 执行结果 + 断言结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// 请求序号（从 1 开始）
    pub request_number: usize,

    pub execution: ExecutionResult,

    /// 断言结果列表
    pub assertions: Vec<AssertionResult>,
}

impl TestResult {
    pub fn new(
        request_number: usize,
        execution: ExecutionResult,
        assertions: Vec<AssertionResult>,
    ) -> Self {
        Self {
            request_number,
            execution,
            assertions,
        }
    }

    /// 有断言时以断言为准，没有断言时以状态码为准；传输失败一定不通过
    pub fn passed(&self) -> bool {
        if !self.execution.has_response() {
            return false;
        }
        if self.assertions.is_empty() {
            self.execution.success
        } else {
            self.assertions.iter().all(|a| a.passed)
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.execution.status == 0
    }
}

/// 测试摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub transport_failures: usize,
    pub total_duration: Duration,
    pub total_assertions: usize,
    pub passed_assertions: usize,
    pub failed_assertions: usize,
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let transport_failures = results.iter().filter(|r| r.is_transport_failure()).count();
        let total_duration = results.iter().map(|r| r.execution.duration()).sum();

        // 统计断言
        let total_assertions = results.iter().map(|r| r.assertions.len()).sum();
        let passed_assertions = results
            .iter()
            .flat_map(|r| &r.assertions)
            .filter(|a| a.passed)
            .count();

        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            transport_failures,
            total_duration,
            total_assertions,
            passed_assertions,
            failed_assertions: total_assertions - passed_assertions,
        }
    }
}

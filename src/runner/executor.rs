use crate::Result;
use crate::assertion;
use crate::history::{self, HistoryEntry, HistorySink, PendingWrites};
use crate::http::{Client, Request};
use crate::runner::processor::{RequestProcessor, ResolvedRequest};
use crate::runner::types::{ExecutionResult, TestResult};
use crate::variable::Environment;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 请求执行器
///
/// 每次 `execute` 相互独立，克隆后共享同一个连接池，可以并发使用。
#[derive(Clone)]
pub struct RequestExecutor {
    client: Client,
    history: Option<Arc<dyn HistorySink>>,
    pending: PendingWrites,
}

impl RequestExecutor {
    /// 使用默认 30 秒超时
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::new()?,
            history: None,
            pending: PendingWrites::default(),
        })
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::with_timeout(timeout)?,
            history: None,
            pending: PendingWrites::default(),
        })
    }

    /// 每次执行后把结果摘要投递给 `sink`
    pub fn with_history(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.history = Some(sink);
        self
    }

    /// 等待已发出的历史投递全部完成，退出进程前调用
    pub async fn flush_history(&self) {
        self.pending.flush().await;
    }

    /// 执行单个请求
    ///
    /// 任何状态码都算完成的执行；没有收到响应（连接失败、超时、URL 非法等）
    /// 时返回 `status == 0` 的结果，不会返回错误。
    pub async fn execute(
        &self,
        request: &Request,
        env: Option<&Environment>,
        verbose: bool,
    ) -> ExecutionResult {
        let resolved = RequestProcessor::resolve(request, env);

        let outgoing = match self.client.build(&resolved) {
            Ok(outgoing) => outgoing,
            Err(e) => {
                warn!(name = %request.name, "Failed to build request: {}", e);
                let result = ExecutionResult::failed(
                    request.name.clone(),
                    request.method,
                    request.url.clone(),
                    None,
                    format!("Failed to build request: {}", e),
                    Duration::ZERO,
                );
                self.record(&resolved, &result);
                return result;
            }
        };

        if verbose {
            info!(method = %resolved.method, url = %resolved.url, "→ request");
            for (key, value) in &resolved.headers {
                info!("  {}: {}", key, value);
            }
        }

        // 开始计时
        let start = Instant::now();
        let outcome = self.client.dispatch(outgoing).await;
        let elapsed = start.elapsed();

        let result = match outcome {
            Ok(response) => {
                if verbose {
                    info!(
                        status = response.status,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "← {}",
                        response.status_text
                    );
                    info!("  body: {}", response.body_text());
                } else {
                    debug!(
                        name = %request.name,
                        status = response.status,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "response received"
                    );
                }
                ExecutionResult::completed(
                    request.name.clone(),
                    request.method,
                    request.url.clone(),
                    resolved.url.clone(),
                    response,
                    elapsed,
                )
            }
            Err(e) => {
                let message = describe_error(&e);
                warn!(name = %request.name, url = %resolved.url, "Request failed: {}", message);
                ExecutionResult::failed(
                    request.name.clone(),
                    request.method,
                    request.url.clone(),
                    Some(resolved.url.clone()),
                    message,
                    elapsed,
                )
            }
        };

        self.record(&resolved, &result);
        result
    }

    /// 执行请求并对响应求值 `expect` 中的断言
    ///
    /// 没有收到响应时不求值断言。
    pub async fn run_test(
        &self,
        request: &Request,
        env: Option<&Environment>,
        verbose: bool,
        request_number: usize,
    ) -> TestResult {
        let execution = self.execute(request, env, verbose).await;

        let assertions = match (&execution.response, &request.expect) {
            (Some(response), Some(expect)) => {
                assertion::evaluate(response, expect, execution.duration)
            }
            _ => Vec::new(),
        };

        TestResult::new(request_number, execution, assertions)
    }

    fn record(&self, resolved: &ResolvedRequest, result: &ExecutionResult) {
        if let Some(sink) = &self.history {
            let entry = HistoryEntry::from_execution(Some(resolved), result);
            self.pending.push(history::notify(Arc::clone(sink), entry));
        }
    }
}

/// 把错误及其 source 链拼成一行，reqwest 的超时/连接原因在 source 里
fn describe_error(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

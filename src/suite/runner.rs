use crate::runner::{ExecutionResult, RequestExecutor, TestResult};
use crate::suite::TestSuite;
use crate::variable::Environment;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 集合的执行方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// 按声明顺序逐个执行
    #[default]
    Sequential,
    /// 同时发出所有请求，结果仍按声明顺序返回
    Concurrent,
}

pub struct SuiteRunner;

impl SuiteRunner {
    /// 执行整个集合，返回与 `suite.requests` 一一对应的结果
    pub async fn run(
        executor: &RequestExecutor,
        suite: &TestSuite,
        env: Option<&Environment>,
        mode: RunMode,
        verbose: bool,
    ) -> Vec<TestResult> {
        debug!(suite = %suite.name, requests = suite.len(), ?mode, "running suite");
        match mode {
            RunMode::Sequential => Self::run_sequential(executor, suite, env, verbose).await,
            RunMode::Concurrent => Self::run_concurrent(executor, suite, env, verbose).await,
        }
    }

    async fn run_sequential(
        executor: &RequestExecutor,
        suite: &TestSuite,
        env: Option<&Environment>,
        verbose: bool,
    ) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(suite.len());
        for (index, request) in suite.requests.iter().enumerate() {
            results.push(executor.run_test(request, env, verbose, index + 1).await);
        }
        results
    }

    async fn run_concurrent(
        executor: &RequestExecutor,
        suite: &TestSuite,
        env: Option<&Environment>,
        verbose: bool,
    ) -> Vec<TestResult> {
        let env = env.cloned().map(Arc::new);

        let handles: Vec<_> = suite
            .requests
            .iter()
            .enumerate()
            .map(|(index, request)| {
                let executor = executor.clone();
                let request = request.clone();
                let env = env.clone();
                tokio::spawn(async move {
                    executor
                        .run_test(&request, env.as_deref(), verbose, index + 1)
                        .await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        // 按声明顺序等待，保证输出顺序稳定
        for (index, (handle, request)) in handles.into_iter().zip(&suite.requests).enumerate() {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(name = %request.name, "request task failed: {}", e);
                    let execution = ExecutionResult::failed(
                        request.name.clone(),
                        request.method,
                        request.url.clone(),
                        None,
                        format!("request task failed: {}", e),
                        Duration::ZERO,
                    );
                    results.push(TestResult::new(index + 1, execution, Vec::new()));
                }
            }
        }
        results
    }
}

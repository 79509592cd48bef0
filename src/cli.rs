use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reqcraft::auth::AuthConfig;
use reqcraft::history::{HistoryStorage, list_history};
use reqcraft::http::types::expand_url_shorthand;
use reqcraft::http::{BodyType, Method, Request};
use reqcraft::runner::{RequestExecutor, TestReporter, TestResult, TestSummary};
use reqcraft::suite::{RunMode, SuiteRunner, TestSuite};
use reqcraft::variable::{ConfigLoader, Environment, EnvironmentOptions, ProjectConfig};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 打印请求/响应详情
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 执行一个请求集合（.json / .toml）
    Run {
        suite: PathBuf,

        #[command(flatten)]
        env: EnvArgs,

        /// 并发发出所有请求
        #[arg(long)]
        parallel: bool,

        /// 不写入历史记录
        #[arg(long)]
        no_history: bool,
    },

    /// 发送单个请求
    Send {
        method: String,
        url: String,

        /// Header，格式 'Key: Value'，可重复
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// 请求体；合法 JSON 按 JSON 发送，否则按原文发送
        #[arg(short = 'd', long = "data")]
        data: Option<String>,

        /// Bearer token
        #[arg(long)]
        bearer: Option<String>,

        #[command(flatten)]
        env: EnvArgs,

        #[arg(long)]
        no_history: bool,
    },

    /// 查看最近的请求历史
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Args)]
pub struct EnvArgs {
    /// reqcraft.toml 中的环境名
    #[arg(short, long = "env")]
    pub env_name: Option<String>,

    /// 额外的变量文件（.json / .toml / dotenv）
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// 覆盖变量，格式 KEY=VALUE，可重复
    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    ConfigLoader::parse_cli_var(s).ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

/// 执行命令，返回进程退出码
///
/// 配置错误以 `Err` 返回；有请求没收到响应时退出码为 2；断言失败不影响退出码。
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ConfigLoader::find_and_load()
        .context("failed to load reqcraft.toml")?
        .unwrap_or_default();

    match cli.command {
        Commands::Run {
            suite,
            env,
            parallel,
            no_history,
        } => {
            let suite = TestSuite::load(&suite)
                .with_context(|| format!("failed to load suite {}", suite.display()))?;
            let environment = build_environment(&config, env)?;
            let executor = build_executor(&config, no_history)?;
            let mode = if parallel {
                RunMode::Concurrent
            } else {
                RunMode::Sequential
            };

            let reporter = TestReporter::new(cli.verbose);
            reporter.print_header(&suite.name, suite.len());
            let results =
                SuiteRunner::run(&executor, &suite, Some(&environment), mode, cli.verbose).await;
            executor.flush_history().await;
            Ok(report(&reporter, &results))
        }
        Commands::Send {
            method,
            url,
            headers,
            data,
            bearer,
            env,
            no_history,
        } => {
            let request = build_send_request(&method, &url, &headers, data, bearer)?;
            let environment = build_environment(&config, env)?;
            let executor = build_executor(&config, no_history)?;

            let reporter = TestReporter::new(cli.verbose);
            let result = executor
                .run_test(&request, Some(&environment), cli.verbose, 1)
                .await;
            executor.flush_history().await;
            Ok(report(&reporter, std::slice::from_ref(&result)))
        }
        Commands::History { limit } => {
            let storage = HistoryStorage::from_settings(&config.history);
            list_history(&storage, limit)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_environment(config: &ProjectConfig, args: EnvArgs) -> Result<Environment> {
    let options = EnvironmentOptions {
        env_name: args.env_name,
        env_file: args.env_file,
        cli_vars: args.vars,
        ..EnvironmentOptions::default()
    };
    ConfigLoader::build_environment(config, &options).context("failed to build environment")
}

fn build_executor(config: &ProjectConfig, no_history: bool) -> Result<RequestExecutor> {
    let executor = RequestExecutor::new()?;
    if no_history || !config.history.enabled {
        return Ok(executor);
    }
    let storage = HistoryStorage::from_settings(&config.history);
    Ok(executor.with_history(Arc::new(storage)))
}

fn build_send_request(
    method: &str,
    url: &str,
    headers: &[String],
    data: Option<String>,
    bearer: Option<String>,
) -> Result<Request> {
    let method = Method::parse(method)?;
    let mut request = Request::new(format!("{} {}", method, url), method, expand_url_shorthand(url));

    for header in headers {
        let (key, value) = header
            .split_once(':')
            .with_context(|| format!("invalid header '{}', expected 'Key: Value'", header))?;
        request = request.with_header(key.trim(), value.trim());
    }

    // 原文发送；能解析为 JSON 时补上 json body 类型
    if let Some(data) = data {
        let is_json = serde_json::from_str::<serde_json::Value>(&data).is_ok();
        request = request.with_text(data);
        if is_json {
            request = request.with_body_type(BodyType::Json);
        }
    }

    if let Some(token) = bearer {
        request = request.with_auth(AuthConfig::bearer(token));
    }

    Ok(request)
}

fn report(reporter: &TestReporter, results: &[TestResult]) -> ExitCode {
    for result in results {
        reporter.print_result(result);
    }
    let summary = TestSummary::from_results(results);
    if results.len() > 1 {
        reporter.print_summary(&summary);
    }

    if summary.transport_failures > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqcraft::http::RequestBody;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("token=abc=def").unwrap(),
            ("token".to_string(), "abc=def".to_string())
        );
        assert!(parse_var("novalue").is_err());
    }

    #[test]
    fn test_send_request_json_body() {
        let request = build_send_request(
            "post",
            ":3000/users",
            &["Accept: application/json".to_string()],
            Some(r#"{"name": "{{name}}"}"#.to_string()),
            Some("{{token}}".to_string()),
        )
        .unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://localhost:3000/users");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.headers["Accept"].as_deref(), Some("application/json"));
        assert_eq!(
            request.body,
            Some(RequestBody::Text(r#"{"name": "{{name}}"}"#.to_string()))
        );
        assert_eq!(request.body_type, Some(BodyType::Json));
        assert_eq!(request.auth, Some(AuthConfig::bearer("{{token}}")));
    }

    #[test]
    fn test_send_request_text_body_and_bad_header() {
        let request =
            build_send_request("PUT", "example.com", &[], Some("a=b".to_string()), None).unwrap();
        assert_eq!(request.body, Some(RequestBody::Text("a=b".to_string())));

        assert!(build_send_request("GET", "example.com", &["broken".to_string()], None, None).is_err());
        assert!(build_send_request("FETCH", "example.com", &[], None, None).is_err());
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "reqcraft", "run", "suite.json", "--env", "dev", "--var", "id=7", "--parallel", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run { env, parallel, .. } => {
                assert!(parallel);
                assert_eq!(env.env_name.as_deref(), Some("dev"));
                assert_eq!(env.vars, vec![("id".to_string(), "7".to_string())]);
            }
            _ => panic!("expected run command"),
        }
    }
}

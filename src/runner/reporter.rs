use crate::runner::types::{TestResult, TestSummary};
use crate::utils::{ResponseFormat, ResponseFormatter};
use colored::Colorize;

pub struct TestReporter {
    verbose: bool,
    formatter: ResponseFormatter,
}

impl TestReporter {
    pub fn new(verbose: bool) -> Self {
        let format = if verbose {
            ResponseFormat::Verbose
        } else {
            ResponseFormat::Compact
        };

        Self {
            verbose,
            formatter: ResponseFormatter::new(format),
        }
    }

    /// 打印单个测试结果
    pub fn print_result(&self, result: &TestResult) {
        let passed = result.passed();
        let symbol = if passed { "✓".green() } else { "✗".red() };
        let execution = &result.execution;
        let url = execution.resolved_url.as_deref().unwrap_or(&execution.url);

        println!(
            " {} [{}] {} - {} {} ({}ms)",
            symbol,
            result.request_number,
            execution.name,
            execution.method.as_str().cyan(),
            url,
            execution.duration
        );

        // verbose 模式或失败时显示响应
        if (self.verbose || !passed)
            && let Some(response) = &execution.response
        {
            let formatted = self.formatter.format(response, execution.duration());
            for line in formatted.lines() {
                println!("   {}", line);
            }
            println!();
        }

        // 传输失败：没有响应，只有错误消息
        if let Some(error) = &execution.error {
            println!("   {}: {}", "Error".red().bold(), error);
            println!();
        }

        if !result.assertions.is_empty() {
            println!("   Assertions:");
            for assertion in &result.assertions {
                if assertion.passed {
                    println!("     {} {}", "✓".green(), assertion.name);
                    continue;
                }
                println!("     {} {}", "✗".red(), assertion.name);
                if let Some(msg) = &assertion.message {
                    println!("       {}", msg.red());
                } else if let Some(expected) = &assertion.expected {
                    let actual = assertion.actual.as_deref().unwrap_or("<none>");
                    println!(
                        "       expected {}, got {}",
                        expected.green(),
                        actual.red()
                    );
                }
            }
            println!();
        }
    }

    /// 打印测试开始
    pub fn print_header(&self, suite_name: &str, total: usize) {
        println!("\nRunning {} requests from {}...\n", total, suite_name.bold());
    }

    /// 打印测试摘要
    pub fn print_summary(&self, summary: &TestSummary) {
        println!("\n{}", "━".repeat(50));
        println!("{}", "Summary".bold());
        println!("{}", "━".repeat(50));

        if summary.failed == 0 {
            println!(
                "  {}: {} passed, {} total",
                "Tests".bold(),
                summary.passed.to_string().green(),
                summary.total
            );
        } else {
            println!(
                "  {}: {} passed, {} failed, {} total",
                "Tests".bold(),
                summary.passed.to_string().green(),
                summary.failed.to_string().red(),
                summary.total
            );
        }

        if summary.transport_failures > 0 {
            println!(
                "  {}: {} requests got no response",
                "Errors".bold(),
                summary.transport_failures.to_string().red()
            );
        }

        // 显示断言统计
        if summary.total_assertions > 0 {
            if summary.failed_assertions == 0 {
                println!(
                    "  {}: {} passed, {} total",
                    "Assertions".bold(),
                    summary.passed_assertions.to_string().green(),
                    summary.total_assertions
                );
            } else {
                println!(
                    "  {}: {} passed, {} failed, {} total",
                    "Assertions".bold(),
                    summary.passed_assertions.to_string().green(),
                    summary.failed_assertions.to_string().red(),
                    summary.total_assertions
                );
            }
        }

        println!(
            "  {}: {:.3}s",
            "Duration".bold(),
            summary.total_duration.as_secs_f64()
        );
        println!();
    }
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

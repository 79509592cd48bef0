use crate::http::ResponseData;
use colored::*;
use serde_json::Value;
use std::time::Duration;

pub enum ResponseFormat {
    Compact,
    Verbose,
}

pub struct ResponseFormatter {
    format: ResponseFormat,
    color: bool,
    show_body: bool,
    show_headers: bool,
    show_timing: bool,
}

// compact 模式下超过这个长度只显示字节数
const COMPACT_BODY_LIMIT: usize = 200;

impl ResponseFormatter {
    pub fn new(format: ResponseFormat) -> Self {
        Self {
            format,
            color: true,
            show_body: true,
            show_headers: true,
            show_timing: true,
        }
    }

    /// 关闭颜色输出（写入文件或测试时使用）
    pub fn without_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn format(&self, response: &ResponseData, duration: Duration) -> String {
        match self.format {
            ResponseFormat::Compact => self.format_compact(response, duration),
            ResponseFormat::Verbose => self.format_verbose(response, duration),
        }
    }

    fn format_compact(&self, response: &ResponseData, duration: Duration) -> String {
        let mut output = vec![self.status_line(response, false)];
        if self.show_timing {
            output.push(self.timing_line(duration));
        }

        if self.show_body {
            let body = render_body(&response.data);
            if !body.is_empty() && body.len() < COMPACT_BODY_LIMIT {
                output.push(body);
            } else if !body.is_empty() {
                output.push(format!("Body: {} bytes", body.len()));
            }
        }

        output.join("\n")
    }

    fn format_verbose(&self, response: &ResponseData, duration: Duration) -> String {
        let mut output = vec![self.status_line(response, true)];
        if self.show_timing {
            output.push(self.timing_line(duration));
        }
        if self.show_headers && !response.headers.is_empty() {
            output.push(String::new());
            output.push(self.section("Headers:"));
            for (key, value) in &response.headers {
                let line = format!("   {}: {}", key, value);
                if self.color {
                    output.push(line.blue().to_string());
                } else {
                    output.push(line);
                }
            }
        }

        if self.show_body {
            let body = render_body(&response.data);
            if !body.is_empty() {
                output.push(String::new());
                output.push(self.section("Body:"));
                output.push(body);
            }
        }

        output.join("\n")
    }

    fn status_line(&self, response: &ResponseData, bold: bool) -> String {
        let status_line = format!("HTTP {} {}", response.status, response.status_text);
        if !self.color {
            return status_line;
        }
        let colored = if response.is_success() {
            status_line.green()
        } else if response.is_client_error() {
            status_line.yellow()
        } else {
            status_line.red()
        };
        if bold {
            colored.bold().to_string()
        } else {
            colored.to_string()
        }
    }

    fn timing_line(&self, duration: Duration) -> String {
        let timing = format!("Time: {}ms", duration.as_millis());
        if self.color {
            timing.cyan().to_string()
        } else {
            timing
        }
    }

    fn section(&self, title: &str) -> String {
        if self.color {
            title.blue().bold().to_string()
        } else {
            title.to_string()
        }
    }
}

/// 文本 body 原样输出，结构化 body 美化为 JSON
fn render_body(data: &Value) -> String {
    match data {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

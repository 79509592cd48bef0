use serde_json::Value;

use crate::assertion::json_path::JsonPath;
use crate::assertion::types::{AssertError, Assertion, AssertionResult};
use crate::http::ResponseData;

/// 对响应执行断言
///
/// 顺序固定：status → statusRange → contains → notContains → headers → jsonPath → responseTime。
/// 每一项独立求值，某一项配置错误只影响它自己的结果。
pub fn evaluate(
    response: &ResponseData,
    assertion: &Assertion,
    response_time_ms: u64,
) -> Vec<AssertionResult> {
    let mut results = Vec::new();

    if let Some(expected) = assertion.status {
        results.push(check_status(response.status, expected));
    }

    if let Some((min, max)) = assertion.status_range {
        results.push(check_status_range(response.status, min, max));
    }

    // 子串匹配基于序列化后的 body，而不是原始字节
    let needs_body = assertion.contains.is_some() || assertion.not_contains.is_some();
    let body = if needs_body {
        response.body_text()
    } else {
        String::new()
    };

    for item in assertion.contains.iter().flat_map(|c| c.items()) {
        let passed = body.contains(item.as_str());
        results.push(
            AssertionResult::check(
                format!("Response contains \"{}\"", item),
                passed,
                item.clone(),
                None,
            )
            .with_failure_message(passed, || {
                format!("Expected response body to contain \"{}\"", item)
            }),
        );
    }

    for item in assertion.not_contains.iter().flat_map(|c| c.items()) {
        let passed = !body.contains(item.as_str());
        results.push(
            AssertionResult::check(
                format!("Response does not contain \"{}\"", item),
                passed,
                item.clone(),
                None,
            )
            .with_failure_message(passed, || {
                format!("Expected response body not to contain \"{}\"", item)
            }),
        );
    }

    for (name, expected) in assertion.headers.iter().flatten() {
        results.push(check_header(response, name, expected));
    }

    for (path, expected) in assertion.json_path.iter().flatten() {
        results.push(check_json_path(&response.data, path, expected));
    }

    if let Some(max_ms) = assertion.response_time {
        let passed = response_time_ms <= max_ms;
        results.push(
            AssertionResult::check(
                format!("Response time is less than {}ms", max_ms),
                passed,
                format!("<= {}ms", max_ms),
                Some(format!("{}ms", response_time_ms)),
            )
            .with_failure_message(passed, || {
                format!(
                    "Expected response time <= {}ms, but got {}ms",
                    max_ms, response_time_ms
                )
            }),
        );
    }

    results
}

fn check_status(actual: u16, expected: u16) -> AssertionResult {
    let passed = actual == expected;
    AssertionResult::check(
        format!("Status code is {}", expected),
        passed,
        expected.to_string(),
        Some(actual.to_string()),
    )
    .with_failure_message(passed, || {
        format!("Expected status {}, but got {}", expected, actual)
    })
}

fn check_status_range(actual: u16, min: u16, max: u16) -> AssertionResult {
    let name = format!("Status code is between {} and {}", min, max);
    if min > max {
        return AssertionResult::error(name, AssertError::InvalidStatusRange { min, max });
    }

    let passed = (min..=max).contains(&actual);
    AssertionResult::check(
        name,
        passed,
        format!("{}-{}", min, max),
        Some(actual.to_string()),
    )
    .with_failure_message(passed, || {
        format!("Expected status between {} and {}, but got {}", min, max, actual)
    })
}

fn check_header(response: &ResponseData, name: &str, expected: &str) -> AssertionResult {
    let actual = response.headers.get(&name.to_lowercase());
    let passed = actual.is_some_and(|value| value == expected);

    AssertionResult::check(
        format!("Header \"{}\" equals \"{}\"", name, expected),
        passed,
        expected.to_string(),
        actual.cloned(),
    )
    .with_failure_message(passed, || match actual {
        Some(value) => format!(
            "Expected header \"{}\" to be \"{}\", but got \"{}\"",
            name, expected, value
        ),
        None => format!("Header \"{}\" not found", name),
    })
}

fn check_json_path(data: &Value, path: &str, expected: &Value) -> AssertionResult {
    let expected_text = serialize(expected);
    let name = format!("JSON path \"{}\" equals {}", path, expected_text);

    let parsed = match JsonPath::parse(path) {
        Ok(parsed) => parsed,
        Err(e) => return AssertionResult::error(name, e),
    };

    let actual = parsed.resolve(data);
    let passed = actual.is_some_and(|actual| json_equal(expected, actual));
    let actual_text = actual.map(serialize);

    AssertionResult::check(name, passed, expected_text.clone(), actual_text.clone())
        .with_failure_message(passed, || match &actual_text {
            Some(actual) => format!(
                "Expected \"{}\" to equal {}, but got {}",
                path, expected_text, actual
            ),
            None => format!("Path \"{}\" is undefined", path),
        })
}

fn serialize(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// 深度比较：对象不看键顺序，数字按数值比较（`1.0 == 1`）
fn json_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => {
            a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => expected == actual,
    }
}

impl AssertionResult {
    fn with_failure_message(self, passed: bool, message: impl FnOnce() -> String) -> Self {
        if passed {
            self
        } else {
            self.with_message(message())
        }
    }
}

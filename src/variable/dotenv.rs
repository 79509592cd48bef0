use crate::variable::types::Environment;

/// 解析 dotenv 格式文本
///
/// 支持 `KEY=VALUE`、`#` 注释、`export ` 前缀以及单/双引号包裹的值。
/// 无法识别的行会被忽略。
pub fn parse_dotenv(content: &str) -> Environment {
    let mut env = Environment::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }

        env.insert(key, unquote(value.trim()));
    }

    env
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            let inner = &value[1..value.len() - 1];
            return if quote == '"' {
                inner.replace("\\n", "\n").replace("\\\"", "\"")
            } else {
                inner.to_string()
            };
        }
    }

    // 未加引号的值允许行尾注释
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end().to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_pairs() {
        let env = parse_dotenv("API_KEY=secret123\nBASE_URL=https://api.example.com\n");
        assert_eq!(env.get("API_KEY"), Some("secret123"));
        assert_eq!(env.get("BASE_URL"), Some("https://api.example.com"));
    }

    #[test]
    fn test_comments_export_and_quotes() {
        let content = r#"
# comment line
export TOKEN=abc
NAME="John Doe"
RAW='a\nb'
PORT=8080 # trailing comment
EQUALS=a=b
"#;
        let env = parse_dotenv(content);
        assert_eq!(env.get("TOKEN"), Some("abc"));
        assert_eq!(env.get("NAME"), Some("John Doe"));
        assert_eq!(env.get("RAW"), Some("a\\nb"));
        assert_eq!(env.get("PORT"), Some("8080"));
        assert_eq!(env.get("EQUALS"), Some("a=b"));
    }

    #[test]
    fn test_invalid_lines_are_ignored() {
        let env = parse_dotenv("no equals sign\n=value\nBAD KEY=1\nOK=1");
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("OK"), Some("1"));
    }
}

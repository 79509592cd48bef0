use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::assertion::types::AssertError;

/// 路径中的一段：`name`、`name[N]` 或 `[N]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

/// 点号分隔的 JSON 路径，如 `user.tags[1]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(path: &str) -> Result<Self, AssertError> {
        static INDEXED: OnceLock<Regex> = OnceLock::new();
        let indexed = INDEXED.get_or_init(|| {
            Regex::new(r"^([^\[\]]*)\[(\d+)\]$").expect("segment pattern is valid")
        });

        let invalid = |reason: &str| AssertError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for raw in path.split('.') {
            if raw.is_empty() {
                return Err(invalid("empty segment"));
            }

            if let Some(caps) = indexed.captures(raw) {
                let index = caps[2]
                    .parse::<usize>()
                    .map_err(|_| invalid("index out of range"))?;
                segments.push(Segment {
                    name: caps[1].to_string(),
                    index: Some(index),
                });
            } else if raw.contains('[') || raw.contains(']') {
                return Err(invalid(&format!("malformed segment '{}'", raw)));
            } else {
                segments.push(Segment {
                    name: raw.to_string(),
                    index: None,
                });
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 在 JSON 值上求路径
    ///
    /// 任一环节不存在或遇到 null 时返回 `None`，不会报错。
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            if current.is_null() {
                return None;
            }
            if !segment.name.is_empty() {
                current = lookup(current, &segment.name)?;
            }
            if let Some(index) = segment.index {
                if current.is_null() {
                    return None;
                }
                current = current.as_array()?.get(index)?;
            }
        }
        Some(current)
    }
}

fn lookup<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(name),
        // `items.0.id` 这种写法直接按下标取
        Value::Array(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

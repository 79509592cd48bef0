use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use super::model::HistoryEntry;
use super::recorder::HistorySink;
use crate::Result;
use crate::variable::HistorySettings;

const DEFAULT_DIR: &str = ".reqcraft";
const FILE_NAME: &str = "history.jsonl";
const DIR_ENV: &str = "REQCRAFT_HISTORY_DIR";

/// 历史文件的保留策略：超过 `max_bytes` 后只保留最新的 `keep` 条
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub max_bytes: u64,
    pub keep: usize,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
            keep: 10_000,
        }
    }
}

/// 每行一条 JSON 的历史文件
///
/// 写入持有 fs2 排他锁，读取持有共享锁，多个进程可以同时使用同一个文件。
pub struct HistoryStorage {
    path: PathBuf,
    retention: Retention,
}

impl HistoryStorage {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention: Retention::default(),
        }
    }

    /// `dir` 下的 `history.jsonl`
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(FILE_NAME))
    }

    /// 目录优先级：`REQCRAFT_HISTORY_DIR` > 配置文件 > `.reqcraft`
    pub fn from_settings(settings: &HistorySettings) -> Self {
        let dir = match std::env::var_os(DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => settings
                .dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR)),
        };
        Self::open(dir)
    }

    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条记录，必要时在同一把锁内裁剪旧记录
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let line = serde_json::to_string(entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        writeln!(file, "{}", line)?;

        if file.metadata()?.len() > self.retention.max_bytes {
            self.trim(&mut file)?;
        }
        // 锁随文件关闭释放
        Ok(())
    }

    /// 全部记录，旧的在前
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        self.recent(usize::MAX)
    }

    /// 最新的 `limit` 条记录，旧的在前；文件不存在时为空
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;

        let mut window = VecDeque::new();
        for line in BufReader::new(&file).lines() {
            let Some(entry) = parse_line(&line?) else {
                continue;
            };
            if window.len() == limit {
                window.pop_front();
            }
            if limit > 0 {
                window.push_back(entry);
            }
        }
        Ok(window.into())
    }

    /// 原样保留最新的 `keep` 行有效记录，无法解析的行被丢弃
    fn trim(&self, file: &mut File) -> Result<()> {
        file.seek(SeekFrom::Start(0))?;
        let mut kept = VecDeque::with_capacity(self.retention.keep.min(1024));
        for line in BufReader::new(&*file).lines() {
            let line = line?;
            if parse_line(&line).is_none() {
                continue;
            }
            if kept.len() == self.retention.keep {
                kept.pop_front();
            }
            if self.retention.keep > 0 {
                kept.push_back(line);
            }
        }

        file.set_len(0)?;
        let mut contents = String::new();
        for line in &kept {
            contents.push_str(line);
            contents.push('\n');
        }
        file.write_all(contents.as_bytes())?;
        debug!(kept = kept.len(), path = %self.path.display(), "history file trimmed");
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<HistoryEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}

impl HistorySink for HistoryStorage {
    fn record(&self, entry: &HistoryEntry) -> Result<()> {
        self.append(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::model::{Outcome, RequestSnapshot};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            timestamp: chrono::Utc::now(),
            duration_ms: 5,
            request: RequestSnapshot {
                name: format!("request {}", id),
                method: "GET".to_string(),
                url: "http://localhost/items".to_string(),
                headers: BTreeMap::new(),
                body: None,
            },
            outcome: Outcome {
                status: 200,
                success: true,
                error: None,
            },
        }
    }

    fn ids(entries: &[HistoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_append_creates_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let storage = HistoryStorage::open(temp_dir.path().join("a/b"));

        storage.append(&entry("1")).unwrap();
        storage.append(&entry("2")).unwrap();

        assert!(storage.path().ends_with("a/b/history.jsonl"));
        assert_eq!(ids(&storage.entries().unwrap()), ["1", "2"]);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = HistoryStorage::open(temp_dir.path());
        assert!(storage.recent(5).unwrap().is_empty());
    }

    #[test]
    fn test_recent_returns_newest_oldest_first() {
        let temp_dir = TempDir::new().unwrap();
        let storage = HistoryStorage::open(temp_dir.path());
        for i in 0..6 {
            storage.append(&entry(&i.to_string())).unwrap();
        }

        assert_eq!(ids(&storage.recent(2).unwrap()), ["4", "5"]);
        assert_eq!(storage.recent(100).unwrap().len(), 6);
        assert!(storage.recent(0).unwrap().is_empty());
    }

    #[test]
    fn test_unparseable_lines_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let storage = HistoryStorage::open(temp_dir.path());
        storage.append(&entry("x")).unwrap();
        fs::write(
            storage.path(),
            format!("{}garbage\n\n", fs::read_to_string(storage.path()).unwrap()),
        )
        .unwrap();
        storage.append(&entry("y")).unwrap();

        assert_eq!(ids(&storage.entries().unwrap()), ["x", "y"]);
    }

    #[test]
    fn test_append_trims_past_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let storage = HistoryStorage::open(temp_dir.path()).with_retention(Retention {
            max_bytes: 1024,
            keep: 3,
        });

        for i in 0..20 {
            storage.append(&entry(&i.to_string())).unwrap();
        }

        let entries = storage.entries().unwrap();
        assert!(entries.len() <= 6, "{} entries kept", entries.len());
        assert_eq!(entries.last().unwrap().id, "19");
        assert!(fs::metadata(storage.path()).unwrap().len() <= 1024 + 512);
    }

    #[test]
    fn test_from_settings_uses_configured_dir() {
        if std::env::var_os(DIR_ENV).is_some() {
            return;
        }
        let settings = HistorySettings {
            enabled: true,
            dir: Some(PathBuf::from("/tmp/reqcraft-history")),
        };
        let storage = HistoryStorage::from_settings(&settings);
        assert_eq!(storage.path(), Path::new("/tmp/reqcraft-history/history.jsonl"));
    }
}

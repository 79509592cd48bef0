use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::Result;
use crate::history::model::HistoryEntry;

/// 执行结果的接收方（历史记录、上报后端等）
///
/// 由执行器在请求完成后异步通知，投递失败不会影响执行结果。
pub trait HistorySink: Send + Sync {
    fn record(&self, entry: &HistoryEntry) -> Result<()>;
}

/// 记录请求历史
///
/// 这是一个 Best-effort 操作：在阻塞线程池中投递，失败只打印警告。
/// 必须在 tokio runtime 内调用；需要确认写入完成时 await 返回的句柄。
pub fn notify(sink: Arc<dyn HistorySink>, entry: HistoryEntry) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || match sink.record(&entry) {
        Ok(()) => debug!(id = %entry.id, "history entry recorded"),
        Err(e) => warn!("Failed to save request history: {}", e),
    })
}

/// 尚未完成的历史投递
///
/// 克隆后共享同一个列表，进程退出前 `flush` 一次。
#[derive(Clone, Default)]
pub struct PendingWrites {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl PendingWrites {
    pub fn push(&self, handle: JoinHandle<()>) {
        let mut handles = self.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// 等待目前登记的所有投递结束
    pub async fn flush(&self) {
        let handles = std::mem::take(&mut *self.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("History writer task failed: {}", e);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

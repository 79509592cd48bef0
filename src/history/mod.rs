pub mod model;
pub mod printer;
pub mod recorder;
pub mod storage;

pub use model::{HistoryEntry, Outcome, RequestSnapshot};
pub use printer::list_history;
pub use recorder::{HistorySink, PendingWrites, notify};
pub use storage::{HistoryStorage, Retention};

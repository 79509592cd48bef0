use super::storage::HistoryStorage;
use crate::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};

/// 以表格形式打印最近的 `limit` 条历史，最新的在前
pub fn list_history(storage: &HistoryStorage, limit: usize) -> Result<()> {
    let entries = storage.recent(limit)?;

    if entries.is_empty() {
        println!("No history yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Time", "Name", "Method", "URL", "Status", "Duration"]);

    for entry in entries.iter().rev() {
        let status = entry.outcome.status;
        let status_color = if status == 0 || status >= 400 {
            Color::Red
        } else {
            Color::Green
        };
        // 传输失败没有状态码
        let status_cell = if status == 0 {
            Cell::new("ERR").fg(status_color)
        } else {
            Cell::new(status).fg(status_color)
        };

        table.add_row(vec![
            Cell::new(entry.id.get(..8).unwrap_or(&entry.id)), // Short ID
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&entry.request.name),
            Cell::new(&entry.request.method),
            Cell::new(&entry.request.url).add_attribute(Attribute::Dim),
            status_cell,
            Cell::new(format!("{}ms", entry.duration_ms)),
        ]);
    }

    println!("{}", table);

    Ok(())
}

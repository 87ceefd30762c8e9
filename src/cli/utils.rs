//! Shared utilities for CLI commands

use tabled::{Table, settings::Style};

use crate::db::SyncState;

/// Truncate a string with ellipsis if it exceeds max length
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional value for display
pub fn format_optional(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// Short marker for the sync column: blank when clean.
pub fn format_sync_state(state: SyncState) -> String {
    match state {
        SyncState::Clean => String::new(),
        SyncState::Dirty => "pending".to_string(),
        SyncState::DeletedDirty | SyncState::DeletedClean => "deleted".to_string(),
    }
}

/// Apply consistent table styling
pub fn apply_table_style(table: &mut Table) {
    table.with(Style::rounded());
}

//! Helpers for callers that build records.
//!
//! The repositories never generate ids or timestamps themselves; these
//! helpers give callers the formats the rest of the application uses.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;

static ID_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Generate an 8-character hex ID for database entities.
pub fn generate_entity_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    // The sequence keeps ids distinct when several are minted within one tick.
    let sequence = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed).wrapping_mul(0x9E37_79B9);
    let timestamp = (duration.as_secs() as u32) ^ duration.subsec_nanos() ^ sequence;
    format!("{:08x}", timestamp)
}

/// Get current datetime as string in SQLite format.
pub fn current_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

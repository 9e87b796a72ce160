//! Human-readable watch-list rendering for the CLI and chat front-ends.

use pumpwatch_core::WatchedAddress;
use std::fmt::Write;

/// One line per entry (`🕵️ <label>: <address>`) followed by `total: N`.
pub fn format_watch_list(entries: &[WatchedAddress]) -> String {
    let mut out = String::new();
    for entry in entries {
        let label = if entry.label.is_empty() {
            "-"
        } else {
            entry.label.as_str()
        };
        // Writing into a String cannot fail.
        let _ = writeln!(out, "🕵️ {label}: {}", entry.address);
    }
    let _ = write!(out, "total: {}", entries.len());
    out
}

//! Human-readable byte counts.

/// Unit names indexed by power of 1024.
pub const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count as `"<n> Bytes"` or `"<x.xx> <unit>"`.
///
/// Sizes of 1024^5 bytes and above stay in TB.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return format!("0 {}", UNITS[0]);
    }

    let magnitude = (bytes.ilog(1024) as usize).min(UNITS.len() - 1);
    if magnitude == 0 {
        return format!("{} {}", bytes, UNITS[0]);
    }

    let scaled = bytes as f64 / 1024f64.powi(magnitude as i32);
    format!("{:.2} {}", scaled, UNITS[magnitude])
}

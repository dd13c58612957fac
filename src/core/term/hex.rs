//! Hex dump rendering for hex output mode

/// Bytes per row
pub const ROW_LEN: usize = 16;

/// Format one row: hex pairs, padding for missing bytes, then ` | ` and the
/// printable column. No trailing newline.
pub fn format_row(bytes: &[u8]) -> String {
    debug_assert!(bytes.len() <= ROW_LEN);

    let hex = bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ");
    let padding = " ".repeat(3 * ROW_LEN.saturating_sub(bytes.len()));
    let ascii: String = bytes
        .iter()
        .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' })
        .collect();

    format!("{}{} | {}", hex, padding, ascii)
}

/// Rows for a whole chunk; the last one may be short
pub fn format_rows(bytes: &[u8]) -> Vec<String> {
    bytes.chunks(ROW_LEN).map(format_row).collect()
}

/// The dump as it lands on the display, one newline per row
pub fn dump(bytes: &[u8]) -> String {
    format_rows(bytes)
        .into_iter()
        .map(|row| row + "\n")
        .collect()
}

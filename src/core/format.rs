/*!
 * Size Formatting
 * Human-readable byte counts for log output
 */

use super::types::Size;

/// Format a byte count as a human-readable string
pub fn format_size(size: Size) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1_048_576.0;
    const GB: f64 = 1_073_741_824.0;

    if size <= 1024 {
        format!("{} bytes", size)
    } else if size <= 1_048_576 {
        format!("{:.2} KB", size as f64 / KB)
    } else if size <= 1_073_741_824 {
        format!("{:.2} MB", size as f64 / MB)
    } else {
        format!("{:.2} GB", size as f64 / GB)
    }
}

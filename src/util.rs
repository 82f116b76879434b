use owo_colors::OwoColorize;
use std::path::Path;

/// Convert a byte count into a human readable string using IEC units (KiB/MiB/GiB).
pub fn human_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GiB", b / GB)
    } else if b >= MB {
        format!("{:.2} MiB", b / MB)
    } else if b >= KB {
        format!("{:.2} KiB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Stdout notice for a night that waits for a human decision.
pub fn print_to_be_confirmed(night_dir: &Path, detections: u32) {
    println!(
        "{} {} ({} detections)",
        "To be confirmed:".yellow(),
        night_dir.display(),
        detections.bold()
    );
}

/// End-of-month summary line.
pub fn print_month_summary(station: &str, year: i32, month: u32, uploaded: usize, pending: usize) {
    let head = format!("{} {}-{:02}", station, year, month);
    println!(
        "{}    {}    {}",
        head.cyan(),
        format!("uploaded:{}", uploaded).green(),
        format!("pending:{}", pending).magenta()
    );
}

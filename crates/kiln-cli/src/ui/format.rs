//! Formatting utilities for sizes, durations, and build summaries.

use std::time::Duration;

use console::Term;
use owo_colors::Style;

use super::messages::paint;

/// Format a byte count in the most appropriate unit (B, KB, MB, GB).
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format a duration as `ms`, seconds, or `m s`.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print the written artifacts with their sizes, then the totals.
///
/// `entries` are `(display name, size in bytes)` pairs in write order.
pub fn print_build_summary(entries: &[(String, u64)], duration: Duration) {
    let width = (Term::stderr().size().1 as usize).clamp(20, 80);

    eprintln!("\n{}", paint("Build Summary", Style::new().bold().underline()));
    eprintln!("{}", "─".repeat(width));

    let name_width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, size) in entries {
        eprintln!(
            "  {} {}  {}",
            paint("▸", Style::new().blue()),
            paint(&format!("{name:<name_width$}"), Style::new().bright_white().bold()),
            paint(&format_size(*size), Style::new().dimmed()),
        );
    }

    eprintln!("{}", "─".repeat(width));

    let total_size: u64 = entries.iter().map(|(_, size)| size).sum();
    eprintln!(
        "  {} {} in {}",
        paint("Total:", Style::new().bold()),
        paint(&format_size(total_size), Style::new().green()),
        paint(&format_duration(duration), Style::new().green())
    );
}

// crates/core/src/format.rs
//! Text formatting helpers for tiles and overlay lines.

/// Format a byte count with binary (1024) units and at most two decimals.
/// Values under 1 KB print as whole bytes.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KB", "MB", "GB", "TB", "PB", "EB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", format_decimal(value), UNITS[unit])
}

/// Format with at most two decimal places, trimming trailing zeros and a
/// bare trailing dot.
pub fn format_decimal(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Ten-cell bar, one filled cell per 10%.
pub fn progress_bar(pct: f64) -> String {
    let filled = ((pct / 10.0) as usize).min(10);
    let mut bar = String::with_capacity(10 * '■'.len_utf8());
    for cell in 0..10 {
        bar.push(if cell < filled { '■' } else { '□' });
    }
    bar
}

/// Uptime as "Xh Ym". Hours do not roll over into days.
pub fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    format!("{hours}h {minutes}m")
}

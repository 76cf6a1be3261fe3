use chrono::{DateTime, Utc};
use std::time::Duration;

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Stamp used in bundle names, e.g. `20240131_235959`
pub fn archive_stamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%d_%H%M%S").to_string()
}

pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes = bytes as f64;
    let base = 1024_f64;
    let i = (bytes.ln() / base.ln()).floor() as usize;
    let size = bytes / base.powi(i as i32);

    if i < UNITS.len() {
        format!("{:.1} {}", size, UNITS[i])
    } else {
        format!("{} B", bytes as u64)
    }
}

/// Render a file age as whole days plus hours, e.g. `9d 3h`
pub fn human_readable_age(age: Duration) -> String {
    let secs = age.as_secs();
    let days = secs / SECONDS_PER_DAY;
    let hours = (secs % SECONDS_PER_DAY) / 3600;
    format!("{}d {}h", days, hours)
}

/// Percentage of `part` in `total`; zero when `total` is zero.
pub fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_human_readable_size() {
        assert_eq!(human_readable_size(0), "0 B");
        assert_eq!(human_readable_size(512), "512.0 B");
        assert_eq!(human_readable_size(2048), "2.0 KB");
        assert_eq!(human_readable_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_archive_stamp() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 58).unwrap();
        assert_eq!(archive_stamp(ts), "20240131_235958");
        assert_eq!(format_timestamp(ts), "2024-01-31 23:59:58 UTC");
    }

    #[test]
    fn test_human_readable_age() {
        let age = Duration::from_secs(9 * SECONDS_PER_DAY + 3 * 3600 + 59);
        assert_eq!(human_readable_age(age), "9d 3h");
    }

    #[test]
    fn test_percent_of_zero_total() {
        assert_eq!(percent_of(10, 0), 0.0);
        assert!((percent_of(1, 4) - 25.0).abs() < f64::EPSILON);
    }
}

//! Integration tests for logward-core
//!
//! Config resolution feeding the tools, end to end through the public API.

use logward_core::archive::{run_archive_at, ArchiveFormat};
use logward_core::config::ArchiveOverrides;
use logward_core::{aggregate_file, LogwardConfig, OutputFormat, OutputWriter};
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const DAY: Duration = Duration::from_secs(86_400);

fn write_aged(dir: &Path, name: &str, contents: &[u8], age: Duration, now: SystemTime) {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(now - age)
        .unwrap();
}

#[test]
fn test_utf16_access_log_aggregates_like_utf8() {
    let dir = TempDir::new().unwrap();
    let text = "10.0.0.1 - - [d +0000] \"GET /health HTTP/1.1\" 200 2\n\
                10.0.0.2 - - [d +0000] \"GET /health HTTP/1.1\" 503 2\n\
                10.0.0.1 - - [d +0000] \"GET /api HTTP/1.1\" 200 2\n";

    let mut utf16 = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        utf16.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(dir.path().join("utf8.log"), text).unwrap();
    fs::write(dir.path().join("utf16.log"), utf16).unwrap();

    let config = LogwardConfig::default();
    let plain = aggregate_file(&config.aggregate_settings(Some(dir.path().join("utf8.log")), None)).unwrap();
    let wide = aggregate_file(&config.aggregate_settings(Some(dir.path().join("utf16.log")), None)).unwrap();

    assert_eq!(plain.top_clients, wide.top_clients);
    assert_eq!(plain.top_paths, wide.top_paths);
    assert_eq!(
        wide.top_statuses,
        vec![("200".to_string(), 2), ("503".to_string(), 1)]
    );
}

#[test]
fn test_config_file_selection_rules_drive_archive() {
    let logs = TempDir::new().unwrap();
    let now = SystemTime::now();
    write_aged(logs.path(), "app.log", b"a", 3 * DAY, now);
    write_aged(logs.path(), "trace.out", b"b", 3 * DAY, now);
    write_aged(logs.path(), "debug.txt", b"c", 3 * DAY, now);

    let config = LogwardConfig::from_toml_str(
        r#"
[archive]
max_age_days = 2
format = "individual"
include_extensions = ["log", "out"]
"#,
    )
    .unwrap();
    let settings = config.archive_settings(
        logs.path().to_path_buf(),
        ArchiveOverrides {
            delete_originals: true,
            ..ArchiveOverrides::default()
        },
    );
    assert_eq!(settings.format, ArchiveFormat::Individual);

    let report = run_archive_at(&settings, now).unwrap();
    let names: Vec<&str> = report.candidates.iter().map(|c| c.file_name.as_str()).collect();
    assert_eq!(names, vec!["app.log", "trace.out"]);
    assert_eq!(report.artifacts.len(), 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.deleted.len(), 2);
    assert!(logs.path().join("archive").join("trace.out.gz").exists());
    assert!(logs.path().join("debug.txt").exists());
}

#[test]
fn test_dry_run_report_renders_plan() {
    colored::control::set_override(false);
    let logs = TempDir::new().unwrap();
    let now = SystemTime::now();
    write_aged(logs.path(), "old.log", &[b'x'; 2048], 9 * DAY, now);

    let mut settings = LogwardConfig::default().archive_settings(
        logs.path().to_path_buf(),
        ArchiveOverrides {
            format: Some(ArchiveFormat::Zip),
            dry_run: true,
            delete_originals: true,
            ..ArchiveOverrides::default()
        },
    );
    settings.archive_dir = logs.path().join("out");

    let report = run_archive_at(&settings, now).unwrap();
    assert!(report.artifacts.is_empty());
    assert_eq!(report.planned_artifacts.len(), 1);
    assert!(!settings.archive_dir.exists());

    let mut writer = OutputWriter::new(OutputFormat::Text, Vec::new());
    writer.write_archive_report(&report).unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();

    assert!(text.contains("dry run"));
    assert!(text.contains("old.log"));
    assert!(text.contains("2.0 KB"));
    assert!(text.contains("9d"));
    assert!(text.contains(".zip"));
    assert!(text.contains("Would delete 1 original file(s)"));
}

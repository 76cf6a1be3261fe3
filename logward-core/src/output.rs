use crate::aggregate::AccessSummary;
use crate::archive::ArchiveReport;
use crate::snapshot::{ProcessRow, SystemSnapshot};
use crate::utils::{format_timestamp, human_readable_age, human_readable_size};
use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}. Must be 'text' or 'json'", s)),
        }
    }
}

/// Renders reports to any writer, stdout in the CLI.
pub struct OutputWriter<W: Write> {
    format: OutputFormat,
    out: W,
}

impl OutputWriter<std::io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, std::io::stdout())
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_access_summary(&mut self, summary: &AccessSummary) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text_access_summary(summary),
            OutputFormat::Json => self.write_json(summary),
        }
    }

    pub fn write_archive_report(&mut self, report: &ArchiveReport) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text_archive_report(report),
            OutputFormat::Json => self.write_json(report),
        }
    }

    pub fn write_snapshot(&mut self, snapshot: &SystemSnapshot) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text_snapshot(snapshot),
            OutputFormat::Json => self.write_json(snapshot),
        }
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
        writeln!(self.out, "{}", json)?;
        Ok(())
    }

    fn write_ranking(&mut self, title: &str, rows: &[(String, usize)]) -> Result<()> {
        writeln!(self.out, "\n{}", title.bold())?;
        if rows.is_empty() {
            writeln!(self.out, "  (none)")?;
        }
        for (token, count) in rows {
            writeln!(self.out, "  {:>7}  {}", count, token)?;
        }
        Ok(())
    }

    fn write_text_access_summary(&mut self, summary: &AccessSummary) -> Result<()> {
        writeln!(self.out, "{}", "=== Access Log Summary ===".bold())?;
        writeln!(self.out, "Source: {}", summary.source)?;
        writeln!(
            self.out,
            "Lines: {} ({} with a request)",
            summary.total_lines, summary.request_lines
        )?;

        self.write_ranking("Top IP addresses:", &summary.top_clients)?;
        self.write_ranking("Top requested paths:", &summary.top_paths)?;
        self.write_ranking("Top status codes:", &summary.top_statuses)?;
        Ok(())
    }

    fn write_text_archive_report(&mut self, report: &ArchiveReport) -> Result<()> {
        let title = if report.dry_run {
            "=== Log Archive (dry run) ==="
        } else {
            "=== Log Archive ==="
        };
        writeln!(self.out, "{}", title.bold())?;
        writeln!(self.out, "Source:    {}", report.log_dir.display())?;
        writeln!(self.out, "Archive:   {}", report.archive_dir.display())?;
        writeln!(self.out, "Format:    {}", report.format)?;
        writeln!(self.out, "Older than {} day(s)", report.max_age_days)?;

        if report.nothing_to_do() {
            writeln!(self.out, "\n{}", "Nothing to archive.".green())?;
            return Ok(());
        }

        writeln!(
            self.out,
            "\n{} ({} file(s), {})",
            "Selected files:".bold(),
            report.candidates.len(),
            human_readable_size(report.total_bytes())
        )?;
        for candidate in &report.candidates {
            writeln!(
                self.out,
                "  {:<40} {:>10}  {:>8} old",
                candidate.file_name,
                human_readable_size(candidate.size),
                human_readable_age(candidate.age())
            )?;
        }

        if report.dry_run {
            writeln!(self.out, "\n{}", "Would create:".bold())?;
            for artifact in &report.planned_artifacts {
                writeln!(self.out, "  {}", artifact.display())?;
            }
            if report.delete_originals {
                writeln!(
                    self.out,
                    "{}",
                    format!("Would delete {} original file(s)", report.candidates.len()).yellow()
                )?;
            }
            writeln!(self.out, "{}", "No files were changed.".cyan())?;
            return Ok(());
        }

        writeln!(self.out, "\n{}", "Created:".bold())?;
        for artifact in &report.artifacts {
            writeln!(self.out, "  {}", artifact.display().to_string().green())?;
        }

        if !report.failures.is_empty() {
            writeln!(self.out, "\n{}", "Failed:".bold())?;
            for failure in &report.failures {
                writeln!(
                    self.out,
                    "  {} ({})",
                    failure.path.display().to_string().red(),
                    failure.reason
                )?;
            }
        }

        if report.delete_originals {
            writeln!(self.out, "\nDeleted {} original file(s)", report.deleted.len())?;
            for failure in &report.delete_failures {
                writeln!(
                    self.out,
                    "  {} could not be deleted ({})",
                    failure.path.display().to_string().yellow(),
                    failure.reason
                )?;
            }
        }
        Ok(())
    }

    fn write_process_table(&mut self, title: &str, rows: &[ProcessRow]) -> Result<()> {
        writeln!(self.out, "\n{}", title.bold())?;
        writeln!(self.out, "  {:>8}  {:>6}  {:>6}  {}", "PID", "%CPU", "%MEM", "COMMAND")?;
        for row in rows {
            writeln!(
                self.out,
                "  {:>8}  {:>6.1}  {:>6.1}  {}",
                row.pid, row.cpu_percent, row.mem_percent, row.command
            )?;
        }
        Ok(())
    }

    fn write_text_snapshot(&mut self, snapshot: &SystemSnapshot) -> Result<()> {
        writeln!(self.out, "{}", "=== System Snapshot ===".bold())?;
        writeln!(
            self.out,
            "Host: {}  Taken: {}",
            snapshot.host_name.as_deref().unwrap_or("unknown"),
            format_timestamp(snapshot.taken_at)
        )?;

        writeln!(self.out, "\nCPU Usage:    {:.2}%", snapshot.cpu_percent)?;
        writeln!(
            self.out,
            "Memory Usage: {:.2}% ({} / {})",
            snapshot.memory.percent,
            human_readable_size(snapshot.memory.used_bytes),
            human_readable_size(snapshot.memory.total_bytes)
        )?;
        match &snapshot.disk {
            Some(disk) => writeln!(
                self.out,
                "Disk Usage:   {:.0}% of {} ({} / {})",
                disk.percent,
                disk.mount_point.display(),
                human_readable_size(disk.used_bytes),
                human_readable_size(disk.total_bytes)
            )?,
            None => writeln!(
                self.out,
                "Disk Usage:   {}",
                format!("no filesystem mounted at {}", snapshot.mount_point.display()).yellow()
            )?,
        }

        self.write_process_table("Top processes by CPU:", &snapshot.top_cpu)?;
        self.write_process_table("Top processes by memory:", &snapshot.top_memory)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AccessAnalyzer;

    fn render_summary(format: OutputFormat) -> String {
        colored::control::set_override(false);
        let mut analyzer = AccessAnalyzer::new();
        for _ in 0..3 {
            analyzer.analyze_line(r#"1.2.3.4 - - [t +0000] "GET /a HTTP/1.1" 200 10"#);
        }
        analyzer.analyze_line(r#"5.6.7.8 - - [t +0000] "GET /b HTTP/1.1" 404 10"#);
        let summary = analyzer.into_summary("access.log", 5);

        let mut writer = OutputWriter::new(format, Vec::new());
        writer.write_access_summary(&summary).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_text_summary_orders_by_count() {
        let text = render_summary(OutputFormat::Text);
        let first = text.find("1.2.3.4").unwrap();
        let second = text.find("5.6.7.8").unwrap();
        assert!(first < second);
        assert!(text.contains("Top status codes:"));
        assert!(text.contains("      3  200"));
    }

    #[test]
    fn test_json_summary_is_valid() {
        let json = render_summary(OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["top_clients"][0][0], "1.2.3.4");
        assert_eq!(value["top_clients"][0][1], 3);
        assert_eq!(value["top_statuses"][1][0], "404");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}

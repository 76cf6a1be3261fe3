// Access-log aggregation: top clients, request paths and status codes

pub mod parser;

pub use parser::{parse_access_line, AccessRecord};

use crate::input::read_log_file;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_ACCESS_LOG: &str = "/var/log/nginx/access.log";

/// Resolved settings for one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSettings {
    pub log_file: PathBuf,
    pub top_n: usize,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_ACCESS_LOG),
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessSummary {
    pub source: String,
    pub total_lines: usize,
    pub request_lines: usize,
    pub top_clients: Vec<(String, usize)>,
    pub top_paths: Vec<(String, usize)>,
    pub top_statuses: Vec<(String, usize)>,
}

/// Frequency table for one extracted field.
#[derive(Debug, Default)]
struct TokenCounter {
    counts: HashMap<String, usize>,
}

impl TokenCounter {
    fn add(&mut self, token: &str) {
        match self.counts.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(token.to_string(), 1);
            }
        }
    }

    /// Highest counts first; equal counts ordered by key.
    fn ranked(self, top_n: usize) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self.counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top_n);
        ranked
    }
}

pub struct AccessAnalyzer {
    total_lines: usize,
    request_lines: usize,
    clients: TokenCounter,
    paths: TokenCounter,
    statuses: TokenCounter,
}

impl AccessAnalyzer {
    pub fn new() -> Self {
        Self {
            total_lines: 0,
            request_lines: 0,
            clients: TokenCounter::default(),
            paths: TokenCounter::default(),
            statuses: TokenCounter::default(),
        }
    }

    pub fn analyze_line(&mut self, line: &str) {
        self.total_lines += 1;

        let Some(record) = parse_access_line(line) else {
            return;
        };

        self.clients.add(&record.client);
        if let Some(status) = &record.status {
            self.statuses.add(status);
        }
        if let Some(path) = &record.path {
            self.request_lines += 1;
            self.paths.add(path);
        }
    }

    pub fn into_summary(self, source: impl Into<String>, top_n: usize) -> AccessSummary {
        AccessSummary {
            source: source.into(),
            total_lines: self.total_lines,
            request_lines: self.request_lines,
            top_clients: self.clients.ranked(top_n),
            top_paths: self.paths.ranked(top_n),
            top_statuses: self.statuses.ranked(top_n),
        }
    }
}

impl Default for AccessAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Summarise the access log named in `settings`.
pub fn aggregate_file(settings: &AggregateSettings) -> Result<AccessSummary> {
    info!("Aggregating {}", settings.log_file.display());
    let lines = read_log_file(&settings.log_file)?;

    let mut analyzer = AccessAnalyzer::new();
    for line in &lines {
        analyzer.analyze_line(line);
    }

    let summary = analyzer.into_summary(settings.log_file.display().to_string(), settings.top_n);
    debug!(
        "{} lines, {} with a request, {} distinct clients ranked",
        summary.total_lines,
        summary.request_lines,
        summary.top_clients.len()
    );
    Ok(summary)
}

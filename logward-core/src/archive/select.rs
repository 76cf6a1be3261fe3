// Candidate selection: which files in the log directory are due for archiving

use super::error::ArchiveError;
use crate::utils::SECONDS_PER_DAY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

pub const DEFAULT_MAX_AGE_DAYS: u64 = 7;

pub fn default_include_extensions() -> Vec<String> {
    vec!["log".to_string(), "txt".to_string()]
}

pub fn default_exclude_extensions() -> Vec<String> {
    vec!["gz".to_string(), "zip".to_string(), "bz2".to_string()]
}

/// Name and age rules a file must pass to be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionFilter {
    pub include_extensions: Vec<String>,
    pub exclude_extensions: Vec<String>,
    pub max_age_days: u64,
}

impl Default for SelectionFilter {
    fn default() -> Self {
        Self {
            include_extensions: default_include_extensions(),
            exclude_extensions: default_exclude_extensions(),
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

impl SelectionFilter {
    /// Excluded (already compressed) extensions win over the allow-list.
    pub fn matches_name(&self, file_name: &str) -> bool {
        if self
            .exclude_extensions
            .iter()
            .any(|ext| has_extension(file_name, ext))
        {
            return false;
        }
        self.include_extensions
            .iter()
            .any(|ext| has_extension(file_name, ext))
    }

    /// True only when `age` is strictly greater than the threshold.
    pub fn is_old_enough(&self, age: Duration) -> bool {
        age > self.threshold()
    }

    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.max_age_days.saturating_mul(SECONDS_PER_DAY))
    }
}

/// Case-sensitive suffix match on `.<ext>`; a leading dot in `ext` is ignored.
fn has_extension(file_name: &str, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        return false;
    }
    file_name
        .strip_suffix(ext)
        .map_or(false, |stem| stem.ends_with('.'))
}

/// A log file selected for archiving.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub file_name: String,
    pub modified: DateTime<Utc>,
    pub age_secs: u64,
    pub size: u64,
}

impl CandidateFile {
    pub fn age(&self) -> Duration {
        Duration::from_secs(self.age_secs)
    }
}

/// List the regular files directly inside `dir` that pass `filter`,
/// measured against `now`. Subdirectories and symlinks are never entered.
pub fn select_candidates(
    dir: &Path,
    filter: &SelectionFilter,
    now: SystemTime,
) -> Result<Vec<CandidateFile>, ArchiveError> {
    let entries = fs::read_dir(dir).map_err(|source| ArchiveError::SourceUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        if !file_type.is_file() {
            continue;
        }

        let file_name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                debug!("Skipping non UTF-8 file name {:?}", raw);
                continue;
            }
        };
        if !filter.matches_name(&file_name) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                warn!("No modification time for {}: {}", entry.path().display(), e);
                continue;
            }
        };

        // mtimes in the future count as brand new
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if !filter.is_old_enough(age) {
            debug!("{} is too recent ({}s old)", file_name, age.as_secs());
            continue;
        }

        candidates.push(CandidateFile {
            path: entry.path(),
            file_name,
            modified: DateTime::<Utc>::from(modified),
            age_secs: age.as_secs(),
            size: metadata.len(),
        });
    }

    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(candidates)
}

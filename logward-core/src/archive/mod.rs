// Log archiving: select aged log files and compress them into a bundle
// (tar.gz / zip) or one .gz per file, optionally deleting the originals.

pub mod error;
pub mod select;
mod writer;

pub use error::ArchiveError;
pub use select::{select_candidates, CandidateFile, SelectionFilter, DEFAULT_MAX_AGE_DAYS};

use crate::utils::{archive_stamp, human_readable_size};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Prefix of bundle names: `logs_<YYYYmmdd_HHMMSS>.tar.gz`
const BUNDLE_PREFIX: &str = "logs";
const DEFAULT_ARCHIVE_SUBDIR: &str = "archive";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArchiveFormat {
    #[default]
    #[serde(rename = "tar.gz", alias = "tar-gz", alias = "tgz")]
    TarGz,
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "individual", alias = "gzip", alias = "gz")]
    Individual,
}

impl std::str::FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tar.gz" | "tar-gz" | "targz" | "tgz" => Ok(ArchiveFormat::TarGz),
            "zip" => Ok(ArchiveFormat::Zip),
            "individual" | "gzip" | "gz" => Ok(ArchiveFormat::Individual),
            _ => Err(ArchiveError::InvalidFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveFormat::TarGz => write!(f, "tar.gz"),
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::Individual => write!(f, "individual"),
        }
    }
}

impl ArchiveFormat {
    /// File name of the single bundle, `None` for per-file gzip.
    pub fn bundle_name(&self, stamp: &str) -> Option<String> {
        match self {
            ArchiveFormat::TarGz => Some(format!("{}_{}.tar.gz", BUNDLE_PREFIX, stamp)),
            ArchiveFormat::Zip => Some(format!("{}_{}.zip", BUNDLE_PREFIX, stamp)),
            ArchiveFormat::Individual => None,
        }
    }
}

/// `<log_dir>/archive`, used when no archive directory is configured.
pub fn default_archive_dir(log_dir: &Path) -> PathBuf {
    log_dir.join(DEFAULT_ARCHIVE_SUBDIR)
}

/// Everything one archive run needs, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSettings {
    pub log_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub format: ArchiveFormat,
    pub filter: SelectionFilter,
    pub delete_originals: bool,
    pub dry_run: bool,
}

impl ArchiveSettings {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let log_dir = log_dir.into();
        Self {
            archive_dir: default_archive_dir(&log_dir),
            log_dir,
            format: ArchiveFormat::default(),
            filter: SelectionFilter::default(),
            delete_originals: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of an archive run. In dry-run mode only `candidates` and
/// `planned_artifacts` are filled in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveReport {
    pub log_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub format: ArchiveFormat,
    pub max_age_days: u64,
    pub dry_run: bool,
    pub delete_originals: bool,
    pub started_at: DateTime<Utc>,
    pub candidates: Vec<CandidateFile>,
    pub planned_artifacts: Vec<PathBuf>,
    pub artifacts: Vec<PathBuf>,
    pub failures: Vec<ArchiveFailure>,
    pub deleted: Vec<PathBuf>,
    pub delete_failures: Vec<ArchiveFailure>,
}

impl ArchiveReport {
    fn new(settings: &ArchiveSettings, started_at: DateTime<Utc>, candidates: Vec<CandidateFile>) -> Self {
        Self {
            log_dir: settings.log_dir.clone(),
            archive_dir: settings.archive_dir.clone(),
            format: settings.format,
            max_age_days: settings.filter.max_age_days,
            dry_run: settings.dry_run,
            delete_originals: settings.delete_originals,
            started_at,
            candidates,
            planned_artifacts: Vec::new(),
            artifacts: Vec::new(),
            failures: Vec::new(),
            deleted: Vec::new(),
            delete_failures: Vec::new(),
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.candidates.iter().map(|c| c.size).sum()
    }

    pub fn nothing_to_do(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Run the archiver against the current clock.
pub fn run_archive(settings: &ArchiveSettings) -> Result<ArchiveReport, ArchiveError> {
    run_archive_at(settings, SystemTime::now())
}

/// Run the archiver with `now` as the reference time for file ages and
/// bundle names.
pub fn run_archive_at(settings: &ArchiveSettings, now: SystemTime) -> Result<ArchiveReport, ArchiveError> {
    validate_source_dir(&settings.log_dir)?;
    debug!("Archive settings: {:?}", settings);

    let candidates = select_candidates(&settings.log_dir, &settings.filter, now)?;
    let started_at = DateTime::<Utc>::from(now);
    let mut report = ArchiveReport::new(settings, started_at, candidates);

    if report.nothing_to_do() {
        info!(
            "No log files older than {} day(s) in {}",
            settings.filter.max_age_days,
            settings.log_dir.display()
        );
        return Ok(report);
    }

    info!(
        "Found {} file(s) to archive ({})",
        report.candidates.len(),
        human_readable_size(report.total_bytes())
    );

    report.planned_artifacts = plan_artifacts(settings, &report.candidates, &archive_stamp(started_at));

    if settings.dry_run {
        for artifact in &report.planned_artifacts {
            info!("[DRY RUN] Would create {}", artifact.display());
        }
        if settings.delete_originals {
            info!("[DRY RUN] Would delete {} original file(s)", report.candidates.len());
        }
        return Ok(report);
    }

    ensure_archive_dir(&settings.archive_dir)?;

    match settings.format {
        ArchiveFormat::TarGz => archive_bundle(settings, &mut report, writer::write_tar_gz)?,
        ArchiveFormat::Zip => archive_bundle(settings, &mut report, writer::write_zip)?,
        ArchiveFormat::Individual => archive_individually(settings, &mut report),
    }

    Ok(report)
}

fn validate_source_dir(dir: &Path) -> Result<(), ArchiveError> {
    let metadata = match fs::metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ArchiveError::SourceMissing(dir.to_path_buf()))
        }
        Err(source) => {
            return Err(ArchiveError::SourceUnreadable {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_dir() {
        return Err(ArchiveError::NotADirectory(dir.to_path_buf()));
    }

    fs::read_dir(dir).map_err(|source| ArchiveError::SourceUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn ensure_archive_dir(dir: &Path) -> Result<(), ArchiveError> {
    if dir.is_dir() {
        return Ok(());
    }
    info!("Creating archive directory {}", dir.display());
    fs::create_dir_all(dir).map_err(|source| ArchiveError::ArchiveDirCreate {
        path: dir.to_path_buf(),
        source,
    })
}

fn plan_artifacts(settings: &ArchiveSettings, candidates: &[CandidateFile], stamp: &str) -> Vec<PathBuf> {
    match settings.format.bundle_name(stamp) {
        Some(name) => vec![settings.archive_dir.join(name)],
        None => candidates
            .iter()
            .map(|c| individual_artifact(&settings.archive_dir, c))
            .collect(),
    }
}

fn individual_artifact(archive_dir: &Path, candidate: &CandidateFile) -> PathBuf {
    archive_dir.join(format!("{}.gz", candidate.file_name))
}

type BundleWriter = fn(&Path, &[CandidateFile]) -> io::Result<()>;

/// Write the single tar.gz / zip bundle. Any failure aborts the run before
/// a single original is touched.
fn archive_bundle(
    settings: &ArchiveSettings,
    report: &mut ArchiveReport,
    write: BundleWriter,
) -> Result<(), ArchiveError> {
    let Some(artifact) = report.planned_artifacts.first().cloned() else {
        return Ok(());
    };
    info!("Writing {} archive {}", settings.format, artifact.display());

    write(&artifact, &report.candidates).map_err(|e| ArchiveError::compression(&artifact, e))?;
    confirm_written(&artifact).map_err(|e| ArchiveError::compression(&artifact, e))?;

    info!("Archived {} file(s) into {}", report.candidates.len(), artifact.display());
    report.artifacts.push(artifact);

    if settings.delete_originals {
        let originals: Vec<PathBuf> = report.candidates.iter().map(|c| c.path.clone()).collect();
        for original in originals {
            delete_original(report, original);
        }
    }
    Ok(())
}

/// Gzip every candidate on its own. A file that fails is reported and
/// skipped; the rest of the batch carries on.
fn archive_individually(settings: &ArchiveSettings, report: &mut ArchiveReport) {
    let candidates = report.candidates.clone();
    for candidate in &candidates {
        let artifact = individual_artifact(&settings.archive_dir, candidate);
        debug!("Compressing {} -> {}", candidate.path.display(), artifact.display());

        let result = writer::write_gzip(candidate, &artifact).and_then(|_| confirm_written(&artifact));
        if let Err(e) = result {
            warn!("Failed to compress {}: {}", candidate.path.display(), e);
            report.failures.push(ArchiveFailure {
                path: candidate.path.clone(),
                reason: e.to_string(),
            });
            continue;
        }

        info!("Compressed {} -> {}", candidate.file_name, artifact.display());
        report.artifacts.push(artifact);

        if settings.delete_originals {
            delete_original(report, candidate.path.clone());
        }
    }
}

fn confirm_written(artifact: &Path) -> io::Result<()> {
    let metadata = fs::metadata(artifact)?;
    if metadata.is_file() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} is not a regular file", artifact.display()),
        ))
    }
}

fn delete_original(report: &mut ArchiveReport, original: PathBuf) {
    match fs::remove_file(&original) {
        Ok(()) => {
            debug!("Deleted {}", original.display());
            report.deleted.push(original);
        }
        Err(e) => {
            warn!("Failed to delete {}: {}", original.display(), e);
            report.delete_failures.push(ArchiveFailure {
                path: original,
                reason: e.to_string(),
            });
        }
    }
}

// Archive writers: tar+gzip bundle, zip bundle, single-file gzip

use super::select::CandidateFile;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Create `dest` (never overwriting) and hand it to `write`. If `write`
/// fails the half-written file is removed again.
fn with_new_file<T>(dest: &Path, write: impl FnOnce(File) -> io::Result<T>) -> io::Result<T> {
    let file = OpenOptions::new().write(true).create_new(true).open(dest)?;
    match write(file) {
        Ok(value) => Ok(value),
        Err(e) => {
            if let Err(rm) = fs::remove_file(dest) {
                warn!("Could not remove partial archive {}: {}", dest.display(), rm);
            }
            Err(e)
        }
    }
}

pub(crate) fn write_tar_gz(dest: &Path, files: &[CandidateFile]) -> io::Result<()> {
    with_new_file(dest, |file| {
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for candidate in files {
            debug!("Adding {} to {}", candidate.file_name, dest.display());
            builder.append_path_with_name(&candidate.path, &candidate.file_name)?;
        }
        let encoder = builder.into_inner()?;
        let file = encoder.finish()?;
        file.sync_all()
    })
}

pub(crate) fn write_zip(dest: &Path, files: &[CandidateFile]) -> io::Result<()> {
    with_new_file(dest, |file| {
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);
        for candidate in files {
            debug!("Adding {} to {}", candidate.file_name, dest.display());
            zip.start_file(candidate.file_name.as_str(), options)?;
            let mut source = File::open(&candidate.path)?;
            io::copy(&mut source, &mut zip)?;
        }
        let file = zip.finish()?;
        file.sync_all()
    })
}

/// Compress one file to `dest`, keeping its name and mtime in the gzip header.
pub(crate) fn write_gzip(candidate: &CandidateFile, dest: &Path) -> io::Result<()> {
    // Open the source first so a vanished file never leaves an empty .gz behind
    let mut source = File::open(&candidate.path)?;
    with_new_file(dest, |file| {
        let mtime = u32::try_from(candidate.modified.timestamp()).unwrap_or(0);
        let mut encoder = GzBuilder::new()
            .filename(candidate.file_name.as_bytes())
            .mtime(mtime)
            .write(file, Compression::default());
        io::copy(&mut source, &mut encoder)?;
        let file = encoder.finish()?;
        file.sync_all()
    })
}

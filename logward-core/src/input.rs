use anyhow::{Context, Result};
use encoding_rs::Encoding;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Read a log file into lines, decoding it with a detected encoding.
///
/// Access logs are usually UTF-8, but logs copied off Windows hosts show up
/// as UTF-16 or Latin-1 often enough that plain `read_to_string` is not
/// good enough. Undecodable bytes become U+FFFD instead of aborting.
pub fn read_log_file(file_path: &Path) -> Result<Vec<String>> {
    info!("Reading log file: {}", file_path.display());

    let data = fs::read(file_path)
        .with_context(|| format!("Failed to read log file {}", file_path.display()))?;
    debug!("Read {} bytes from file {}", data.len(), file_path.display());

    let encoding = detect_encoding(&data);
    // `decode` sniffs a BOM first and strips it
    let (text, used, had_errors) = encoding.decode(&data);
    debug!(
        "Decoded {} as {} (replacement characters: {})",
        file_path.display(),
        used.name(),
        had_errors
    );

    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    debug!("Decoded {} lines from file {}", lines.len(), file_path.display());
    Ok(lines)
}

/// Pick an encoding for raw log bytes.
pub(crate) fn detect_encoding(data: &[u8]) -> &'static Encoding {
    use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

    if data.is_empty() {
        return UTF_8;
    }

    if let Some((encoding, _bom_len)) = Encoding::for_bom(data) {
        return encoding;
    }

    if let Some(utf16) = detect_utf16_pattern(data) {
        return if utf16 { UTF_16BE } else { UTF_16LE };
    }

    if std::str::from_utf8(data).is_ok() {
        UTF_8
    } else {
        // Windows-1252 is a superset of ISO-8859-1 and maps every byte
        WINDOWS_1252
    }
}

/// BOM-less UTF-16 shows up as a NUL in every other byte of ASCII text.
/// Returns `Some(true)` for big endian, `Some(false)` for little endian.
fn detect_utf16_pattern(data: &[u8]) -> Option<bool> {
    let sample = &data[..data.len().min(1024)];
    if sample.len() < 4 {
        return None;
    }

    let pairs = sample.len() / 2;
    let even_nuls = sample.iter().step_by(2).filter(|b| **b == 0).count();
    let odd_nuls = sample.iter().skip(1).step_by(2).filter(|b| **b == 0).count();

    if even_nuls * 10 >= pairs * 9 && odd_nuls == 0 {
        Some(true)
    } else if odd_nuls * 10 >= pairs * 9 && even_nuls == 0 {
        Some(false)
    } else {
        None
    }
}

use regex::Regex;
use std::sync::LazyLock;

// `"GET /index.html HTTP/1.1"` - the method is any upper-case verb so that
// PROPFIND and friends are counted too
static REQUEST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[A-Z]+ (\S+) HTTP"#).expect("Failed to compile request regex")
});

/// Zero-based index of the status code in a combined/common log line.
const STATUS_FIELD: usize = 8;

/// The fields of one access-log line the aggregator cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub client: String,
    pub path: Option<String>,
    pub status: Option<String>,
}

/// Split an access-log line into its positional fields.
///
/// Returns `None` for blank lines. Lines without a quoted request carry no
/// path, and lines with fewer than nine fields carry no status.
pub fn parse_access_line(line: &str) -> Option<AccessRecord> {
    let mut fields = line.split_whitespace();
    let client = fields.next()?.to_string();
    let status = fields.nth(STATUS_FIELD - 1).map(|s| s.to_string());

    let path = REQUEST_REGEX.captures(line).map(|caps| caps[1].to_string());

    Some(AccessRecord {
        client,
        path,
        status,
    })
}

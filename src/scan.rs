use crate::rule;
use crate::rule::matches::Source;
use crate::types::{FileKind, Severity, Violation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Minutes of remediation estimated per violation
const MINUTES_PER_VIOLATION: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Violation counts and effort estimate for one file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_violations: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    /// Minutes
    pub estimated_fix_time: usize,
}

impl Statistics {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let count = |severity| violations.iter().filter(|v| v.severity == severity).count();
        Self {
            total_violations: violations.len(),
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            info: count(Severity::Info),
            estimated_fix_time: (violations.len() * MINUTES_PER_VIOLATION).max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub line_count: usize,
    pub analyzed_at: DateTime<Utc>,
}

/// Outcome of scanning one file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub file_path: String,
    pub file_kind: FileKind,
    pub content: String,
    /// Detector execution order
    pub violations: Vec<Violation>,
    pub statistics: Statistics,
    pub metadata: Metadata,
}

impl ScanResult {
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Scan text that is already in memory
pub fn scan_source(path: &str, content: String) -> ScanResult {
    let file_kind = FileKind::classify(Path::new(path));
    debug!("Scanning {} as {}", path, file_kind);

    let violations = rule::run(&content, file_kind);
    trace!("{} violations in {}", violations.len(), path);

    let statistics = Statistics::from_violations(&violations);
    let metadata = Metadata {
        line_count: Source::new(&content).line_count(),
        analyzed_at: Utc::now(),
    };

    ScanResult {
        file_path: path.to_string(),
        file_kind,
        content,
        violations,
        statistics,
        metadata,
    }
}

/// Scan a batch of in-memory `(path, content)` pairs, preserving order
pub fn scan_sources<I>(files: I) -> Vec<ScanResult>
where
    I: IntoIterator<Item = (String, String)>,
{
    files
        .into_iter()
        .map(|(path, content)| scan_source(&path, content))
        .collect()
}

/// Read and scan a file from disk
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so
/// binary-like input only yields fewer matches.
pub fn scan_file(path: &Path) -> Result<ScanResult, ScanError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ScanError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ScanError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let content = String::from_utf8_lossy(&bytes).into_owned();
    Ok(scan_source(&path.to_string_lossy(), content))
}

//! FTPdetectinfo lookup and detection counting.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::AutocamsError;
use crate::night::files_matching;

/// Outcome of looking for the single report file a night should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLookup {
    Found(PathBuf),
    NotFound,
    Ambiguous(Vec<PathBuf>),
}

impl ReportLookup {
    fn from_candidates(mut candidates: Vec<PathBuf>) -> Self {
        match candidates.len() {
            0 => ReportLookup::NotFound,
            1 => ReportLookup::Found(candidates.remove(0)),
            _ => ReportLookup::Ambiguous(candidates),
        }
    }

    /// Turn anything but `Found` into a recoverable error for `night_dir`.
    pub fn into_result(self, night_dir: &Path) -> Result<PathBuf> {
        match self {
            ReportLookup::Found(p) => Ok(p),
            ReportLookup::NotFound => Err(AutocamsError::ReportNotFound(night_dir.into()).into()),
            ReportLookup::Ambiguous(ps) => {
                Err(AutocamsError::AmbiguousReport(night_dir.into(), ps.len()).into())
            }
        }
    }
}

/// The CAMS-numbered report: `FTPdetectinfo_<cams:06>[0-9_]*.txt`, keeping
/// only names where the digits run up to an optional `R` before the suffix.
/// This drops `_uncalibrated`, `_unfiltered` and similar variants.
pub fn resolve_report(night_dir: &Path, cams_id: u32) -> ReportLookup {
    let loose = Regex::new(&format!(r"^FTPdetectinfo_{:06}[0-9_].*\.txt$", cams_id))
        .expect("valid report pattern");
    let strict = Regex::new(&format!(r"^.*FTPdetectinfo_{:06}[0-9_]*R?.txt", cams_id))
        .expect("valid report pattern");
    let candidates = files_matching(night_dir, |n| loose.is_match(n) && strict.is_match(n));
    ReportLookup::from_candidates(candidates)
}

/// The station-named report the viewer takes via `--ftpdetectfile`:
/// `FTPdetectinfo_<station>_????????_??????_??????.txt`.
pub fn resolve_viewer_report(night_dir: &Path, station: &str) -> ReportLookup {
    let pattern = Regex::new(&format!(
        r"^FTPdetectinfo_{}_.{{8}}_.{{6}}_.{{6}}\.txt$",
        regex::escape(station)
    ))
    .expect("valid viewer report pattern");
    ReportLookup::from_candidates(files_matching(night_dir, |n| pattern.is_match(n)))
}

/// First `CAL_*` file of the night in name order.
pub fn find_calibration(night_dir: &Path) -> Option<PathBuf> {
    files_matching(night_dir, |n| n.starts_with("CAL_")).into_iter().next()
}

/// Detection count from the first line of the night's report, or `None`
/// when the report cannot be resolved to a single file.
pub fn count_detections(night_dir: &Path, cams_id: u32) -> Result<Option<u32>> {
    let report = match resolve_report(night_dir, cams_id) {
        ReportLookup::Found(p) => p,
        other => {
            tracing::warn!("could not find FTPdetectinfo file in {} ({:?})", night_dir.display(), other);
            return Ok(None);
        }
    };
    let file = std::fs::File::open(&report)
        .with_context(|| format!("cannot open {}", report.display()))?;
    let mut first_line = String::new();
    std::io::BufReader::new(file)
        .read_line(&mut first_line)
        .with_context(|| format!("cannot read {}", report.display()))?;
    let count = first_line
        .split_whitespace()
        .last()
        .and_then(|tok| tok.parse::<u32>().ok())
        .ok_or_else(|| AutocamsError::MalformedReport(report.clone(), first_line.trim().into()))?;
    Ok(Some(count))
}

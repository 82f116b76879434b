use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use walkdir::WalkDir;

/// One observation session directory, e.g.
/// `ArchivedFiles/AB1234_20240305_180012_123456`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightDir {
    pub path: PathBuf,
    pub name: String,
    pub start: NaiveDateTime,
}

impl NightDir {
    /// Fails when the directory name does not carry a start date and time.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("no directory name in {}", path.display()))?;
        let start = crate::parse::parse_night_start(&name)?;
        Ok(NightDir { path: path.to_path_buf(), name, start })
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn is_empty(&self) -> Result<bool> {
        let mut rd = std::fs::read_dir(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        Ok(rd.next().is_none())
    }
}

/// Names of the night directories under `root` for one station and month
/// (`<station>_<YYYYMM>*`), in lexicographic order. A missing `root` yields
/// an empty list.
pub fn list_month_dirs(root: &Path, station: &str, year: i32, month: u32) -> Vec<String> {
    let prefix = format!("{}_{}{:02}", station, year, month);
    let mut names: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with(&prefix))
        .collect();
    names.sort();
    names
}

/// Sorted plain files in `dir` whose names satisfy `pred`.
pub(crate) fn files_matching<F>(dir: &Path, pred: F) -> Vec<PathBuf>
where
    F: Fn(&str) -> bool,
{
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .filter(|e| pred(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();
    out.sort();
    out
}

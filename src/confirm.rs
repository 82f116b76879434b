//! Human-in-the-loop seams: the "confirm now?" question and the external
//! confirmation viewer (CMN_binviewer).

use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::AutocamsError;

pub trait Prompt {
    /// Ask a yes/no question; anything but an answer starting with `y` is no.
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Reads answers from stdin.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        print!("{} ", question);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer).context("cannot read answer from stdin")?;
        Ok(is_yes(&answer))
    }
}

pub fn is_yes(answer: &str) -> bool {
    answer.chars().next().is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

/// Launches the confirmation viewer. Calls block until the viewer exits.
pub trait Viewer {
    /// `--confirmation <night_dir> --ftpdetectfile <report>`
    fn confirm_night(&self, night_dir: &Path, report: &Path) -> Result<()>;
    /// `-c <night_dir>`, the manual launch
    fn open_night(&self, night_dir: &Path) -> Result<()>;
}

pub struct BinViewer {
    executable: PathBuf,
}

impl BinViewer {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self { executable: executable.into() }
    }

    /// Resolve the executable through `PATH` when it is a bare name.
    pub fn locate(&self) -> Result<PathBuf> {
        which::which(&self.executable).map_err(|_| -> anyhow::Error {
            AutocamsError::ViewerNotFound(self.executable.display().to_string()).into()
        })
    }

    fn run(&self, args: &[&OsStr]) -> Result<()> {
        let exe = self.locate()?;
        tracing::info!("starting {} {:?}", exe.display(), args);
        let status = Command::new(&exe)
            .args(args)
            .status()
            .with_context(|| format!("cannot run {}", exe.display()))?;
        // the viewer's exit status carries no meaning for the upload
        tracing::debug!("viewer exited with {}", status);
        Ok(())
    }
}

impl Viewer for BinViewer {
    fn confirm_night(&self, night_dir: &Path, report: &Path) -> Result<()> {
        self.run(&[
            OsStr::new("--confirmation"),
            night_dir.as_os_str(),
            OsStr::new("--ftpdetectfile"),
            report.as_os_str(),
        ])
    }

    fn open_night(&self, night_dir: &Path) -> Result<()> {
        self.run(&[OsStr::new("-c"), night_dir.as_os_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes("Yes"));
        assert!(!is_yes("  yep"));
        assert!(!is_yes(" y\n"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
        assert!(!is_yes("\n"));
    }

    #[test]
    fn missing_viewer_is_reported() {
        let viewer = BinViewer::new("/nonexistent/CMN_binviewer");
        let err = viewer.locate().unwrap_err();
        assert!(err.to_string().contains("CMN_binviewer"));
        assert!(viewer.open_night(Path::new("/tmp")).is_err());
    }
}

// transfer module: remote listing, upload and verification
mod ftp;
mod helpers;
mod remote_like;
mod session;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

use crate::AutocamsError;
use crate::config::RemoteConfig;
use crate::util::human_bytes;

pub use helpers::{date_dirs, join_remote, normalize_path};
pub use ftp::{FtpRemote, connect_ftp};
pub use remote_like::{RemoteStore, Ssh2Remote};
pub use session::{connect_remote, connect_sftp};

/// Written into a night directory once its archive is verified remotely.
pub const UPLOAD_MARKER: &str = "CamsFTPupload.txt";

/// Days of `year`/`month` that already have an archive for `cams_id` on the
/// server, looking in the base directory, `<year>/` and `<year>/<year>_<month>/`.
/// A missing subdirectory ends the search with what was found so far.
pub fn list_uploaded_days(
    remote: &mut dyn RemoteStore,
    base_dir: &str,
    cams_id: u32,
    year: i32,
    month: u32,
) -> Result<BTreeSet<u32>> {
    tracing::debug!("fetching already uploaded days in {}-{:02} for {:06}", year, month, cams_id);
    let pattern = Regex::new(&format!(r"^{}_?{:02}_?(\d\d)_{:06}_.*\.zip$", year, month, cams_id))
        .expect("valid upload pattern");
    let mut days = BTreeSet::new();

    enter_base_dir(remote, base_dir)?;
    collect_days(remote, &pattern, &mut days)?;

    for sub in [format!("{}", year), format!("{}_{:02}", year, month)] {
        let found = remote.change_dir(&sub).map_err(AutocamsError::RemoteIo)?;
        if !found {
            tracing::info!("remote directory {} missing under {}", sub, remote.current_dir());
            return Ok(days);
        }
        collect_days(remote, &pattern, &mut days)?;
    }
    Ok(days)
}

fn collect_days(
    remote: &mut dyn RemoteStore,
    pattern: &Regex,
    days: &mut BTreeSet<u32>,
) -> Result<()> {
    let names = remote.list_names().map_err(AutocamsError::RemoteIo)?;
    for name in names {
        if let Some(day) = pattern
            .captures(&name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            tracing::debug!("found day {} in {}: {}", day, remote.current_dir(), name);
            days.insert(day);
        }
    }
    Ok(())
}

/// A relative `base_dir` is taken from the login directory, never from
/// wherever the last listing left the session.
fn enter_base_dir(remote: &mut dyn RemoteStore, base_dir: &str) -> Result<()> {
    let base = join_remote(&remote.home_dir(), base_dir);
    if !remote.change_dir(&base).map_err(AutocamsError::RemoteIo)? {
        return Err(AutocamsError::RemoteDirMissing(base).into());
    }
    Ok(())
}

/// Result of one archive upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub remote_path: String,
    pub bytes: u64,
    /// Remote MD5 matched the local archive
    pub verified: bool,
}

/// Store `archive` in the configured remote directory and verify it by
/// reading it back. On a verified upload the night directory holding the
/// archive gets an upload marker.
pub fn upload_archive(
    remote: &mut dyn RemoteStore,
    config: &RemoteConfig,
    archive: &Path,
    start: &NaiveDateTime,
) -> Result<UploadReceipt> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("no file name in {}", archive.display()))?;

    enter_base_dir(remote, &config.base_dir)?;
    if config.create_date_dirs {
        let (year_dir, month_dir) = date_dirs(start);
        for dir in [year_dir, month_dir] {
            remote.make_dir(&dir).map_err(AutocamsError::RemoteIo)?;
            if !remote.change_dir(&dir).map_err(AutocamsError::RemoteIo)? {
                return Err(AutocamsError::RemoteDirMissing(dir).into());
            }
        }
    }

    let local_bytes =
        std::fs::read(archive).with_context(|| format!("cannot read {}", archive.display()))?;
    let md5_hash = format!("{:x}", md5::compute(&local_bytes));
    tracing::debug!("md5_hash: {}", md5_hash);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").expect("valid spinner template"));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("uploading {} ({})", name, human_bytes(local_bytes.len() as u64)));

    let mut reader = BufReader::new(
        File::open(archive).with_context(|| format!("cannot open {}", archive.display()))?,
    );
    let stored = remote.store(&name, &mut reader).map_err(AutocamsError::RemoteIo);
    let stored = match stored {
        Ok(n) => n,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    let remote_bytes = remote.retrieve(&name).map_err(AutocamsError::RemoteIo);
    spinner.finish_and_clear();
    let remote_md5_hash = format!("{:x}", md5::compute(&remote_bytes?));
    tracing::debug!("remote_md5_hash: {}", remote_md5_hash);

    let remote_path = join_remote(&remote.current_dir(), &name);
    let verified = md5_hash == remote_md5_hash;
    if verified {
        if let Some(night_dir) = archive.parent() {
            write_upload_marker(night_dir)?;
        }
        tracing::info!("uploaded {} ({})", remote_path, human_bytes(stored));
    } else {
        tracing::warn!("checksum mismatch after uploading {}", remote_path);
    }
    Ok(UploadReceipt { remote_path, bytes: stored, verified })
}

/// Record the upload time in `<night_dir>/CamsFTPupload.txt`.
pub fn write_upload_marker(night_dir: &Path) -> Result<()> {
    let marker = night_dir.join(UPLOAD_MARKER);
    std::fs::write(&marker, format!("UTC: {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S%.6f")))
        .with_context(|| format!("cannot write {}", marker.display()))
}

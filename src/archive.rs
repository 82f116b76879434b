use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::AutocamsError;
use crate::night::NightDir;
use crate::parse::archive_file_name;
use crate::report::{find_calibration, resolve_report};

/// Zip the night's calibration file and FTPdetectinfo report into
/// `<night>/<archive name>`, returning the archive path.
///
/// A missing calibration file or an unresolvable report is returned as a
/// recoverable `AutocamsError`; no archive is written in either case.
pub fn package(night: &NightDir, cams_id: u32, sequence_id: u32) -> Result<PathBuf> {
    let Some(calibration) = find_calibration(&night.path) else {
        println!("No calfile found in {}", night.path.display());
        return Err(AutocamsError::MissingCalibration(night.path.clone()).into());
    };
    let report = resolve_report(&night.path, cams_id).into_result(&night.path)?;

    let archive_path = night.path.join(archive_file_name(&night.start, cams_id, sequence_id));
    write_archive(&archive_path, &[&calibration, &report])?;
    tracing::debug!("packaged {}", archive_path.display());
    Ok(archive_path)
}

fn write_archive(archive_path: &Path, members: &[&Path]) -> Result<()> {
    let file = File::create(archive_path)
        .with_context(|| format!("cannot create {}", archive_path.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for member in members {
        let name = member
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("no file name in {}", member.display()))?;
        zip.start_file(name, options)
            .with_context(|| format!("cannot add {} to archive", member.display()))?;
        let mut src = BufReader::new(
            File::open(member).with_context(|| format!("cannot open {}", member.display()))?,
        );
        std::io::copy(&mut src, &mut zip)
            .with_context(|| format!("cannot write {} into archive", member.display()))?;
    }
    zip.finish().with_context(|| format!("cannot finish {}", archive_path.display()))?;
    Ok(())
}

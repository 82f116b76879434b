//! Station config lookup: maps an RMS station id to its CAMS camera id.
//!
//! RMS copies its `.config` into every archived night, so the newest
//! `ArchivedFiles/<station>_*/.config` reflects the current station setup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{File, FileFormat};
use walkdir::WalkDir;

use crate::AutocamsError;

const CONFIG_FILE_NAME: &str = ".config";

/// Read the CAMS id (`[System] cams_code`) of `station` from its most recent
/// archived config.
pub fn resolve_cams_id(rms_dir: &Path, station: &str) -> Result<u32> {
    let config_path = latest_station_config(rms_dir, station)?;
    let text = std::fs::read_to_string(&config_path)
        .with_context(|| format!("cannot read {}", config_path.display()))?;
    let raw = read_cams_code(&text)
        .map_err(|msg| AutocamsError::StationConfigInvalid(config_path.clone(), msg))?;
    let cams_id = raw.parse::<u32>().map_err(|_| {
        AutocamsError::StationConfigInvalid(config_path.clone(), format!("cams_code {:?}", raw))
    })?;
    tracing::debug!("station {} has CAMS id {:06} ({})", station, cams_id, config_path.display());
    Ok(cams_id)
}

/// Lexicographically last `ArchivedFiles/<station>_*/.config`.
pub fn latest_station_config(rms_dir: &Path, station: &str) -> Result<PathBuf> {
    let archived = rms_dir.join("ArchivedFiles");
    let prefix = format!("{}_", station);
    let mut candidates: Vec<PathBuf> = WalkDir::new(&archived)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
        .map(|e| e.path().join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
        .collect();
    candidates.sort();
    candidates.pop().ok_or_else(|| AutocamsError::StationConfigMissing(station.to_string()).into())
}

/// `[System] cams_code` from an RMS `.config`. Section and key names are
/// matched without regard to case, as RMS itself reads them.
fn read_cams_code(text: &str) -> std::result::Result<String, String> {
    let sections: HashMap<String, config::Value> = config::Config::builder()
        .add_source(File::from_str(text, FileFormat::Ini))
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| e.to_string())?;
    let system = sections
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("System"))
        .map(|(_, v)| v.into_table())
        .transpose()
        .map_err(|e| e.to_string())?
        .ok_or("missing [System] section")?;
    let raw = system
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("cams_code"))
        .map(|(_, v)| v.into_string())
        .transpose()
        .map_err(|e| e.to_string())?
        .ok_or("missing [System] cams_code")?;
    Ok(strip_inline_comment(&raw).trim().to_string())
}

// RMS writes `value ; note` lines, which the INI layer keeps verbatim
fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if (*b == b';' || *b == b'#') && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return &value[..i];
        }
    }
    value
}

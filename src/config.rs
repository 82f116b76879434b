use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::AutocamsError;
use crate::app::StorageObject;

/// Run-wide settings, loaded once in `main` and passed by reference to
/// every component.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// Root of the RMS data tree holding `ArchivedFiles/` and `ConfirmedFiles/`
    pub rms_dir: PathBuf,
    /// Comma-separated stations used when none are given on the command line
    #[serde(default)]
    pub stations: String,
    /// CAMS id for single-directory uploads; resolved from the station config when unset
    #[serde(default)]
    pub cams_id: Option<u32>,
    pub viewer_path: PathBuf,
    pub remote: RemoteConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Ftp,
    Sftp,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RemoteConfig {
    #[serde(default)]
    pub protocol: Protocol,
    pub host: String,
    /// Defaults to 21 for FTP and 22 for SFTP
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    pub base_dir: String,
    /// Store archives under `<year>/<year>_<month>/`, creating both as needed
    #[serde(default)]
    pub create_date_dirs: bool,
}

impl RemoteConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.protocol {
            Protocol::Ftp => 21,
            Protocol::Sftp => 22,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rms_dir: dirs::home_dir().unwrap_or_default().join("RMS_data"),
            stations: String::new(),
            cams_id: None,
            viewer_path: PathBuf::from("CMN_binviewer"),
            remote: RemoteConfig {
                protocol: Protocol::default(),
                host: "localhost".to_string(),
                port: None,
                username: "cams".to_string(),
                password: None,
                base_dir: "/".to_string(),
                create_date_dirs: false,
            },
        }
    }
}

impl Config {
    /// `~/.autocams/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("cannot find user's home dir")?;
        Ok(home.join(".".to_owned() + env!("CARGO_PKG_NAME")).join("config.json"))
    }

    /// Load the configuration at `path`. When the file does not exist a
    /// template is written there and an error asks the user to fill it in.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create {}", parent.display()))?;
            }
            Config::default().save_to(path)?;
            return Err(AutocamsError::ConfigInvalid(format!(
                "wrote a template to {}, edit it and run again",
                path.display()
            ))
            .into());
        }
        let config: Config = Config::read_from(path)?;
        config.validate()?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.remote.host.trim().is_empty() {
            return Err(AutocamsError::ConfigInvalid("remote.host is empty".into()).into());
        }
        if self.remote.username.trim().is_empty() {
            return Err(AutocamsError::ConfigInvalid("remote.username is empty".into()).into());
        }
        if self.remote.base_dir.trim().is_empty() {
            return Err(AutocamsError::ConfigInvalid("remote.base_dir is empty".into()).into());
        }
        Ok(())
    }

    pub fn default_stations(&self) -> Vec<String> {
        crate::parse::parse_station_list(&self.stations)
    }

    pub fn archived_dir(&self) -> PathBuf {
        self.rms_dir.join("ArchivedFiles")
    }

    pub fn confirmed_dir(&self) -> PathBuf {
        self.rms_dir.join("ConfirmedFiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("template"));
        assert!(path.exists());
    }

    #[test]
    fn optional_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "rms_dir": "/data/RMS_data",
                "stations": "AB1234, CD5678",
                "viewer_path": "/opt/cmn/CMN_binviewer",
                "remote": {"host": "cams.example.org", "username": "u", "base_dir": "/in"}
            }"#,
        )
        .unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.remote.protocol, Protocol::Ftp);
        assert_eq!(cfg.remote.port(), 21);
        assert!(cfg.remote.password.is_none());
        assert!(!cfg.remote.create_date_dirs);
        assert_eq!(cfg.cams_id, None);
        assert_eq!(cfg.default_stations(), vec!["AB1234", "CD5678"]);
        assert_eq!(cfg.archived_dir(), PathBuf::from("/data/RMS_data/ArchivedFiles"));
    }

    #[test]
    fn sftp_port_defaults_to_ssh() {
        let remote: RemoteConfig = serde_json::from_str(
            r#"{"protocol": "sftp", "host": "h", "username": "u", "base_dir": "incoming"}"#,
        )
        .unwrap();
        assert_eq!(remote.protocol, Protocol::Sftp);
        assert_eq!(remote.port(), 22);
        let remote: RemoteConfig = serde_json::from_str(
            r#"{"protocol": "ftp", "host": "h", "port": 2121, "username": "u", "base_dir": "/"}"#,
        )
        .unwrap();
        assert_eq!(remote.port(), 2121);
    }

    #[test]
    fn empty_host_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"rms_dir": "/d", "viewer_path": "v",
                "remote": {"host": " ", "username": "u", "base_dir": "/"}}"#,
        )
        .unwrap();
        assert!(Config::load(&path).is_err());
    }
}

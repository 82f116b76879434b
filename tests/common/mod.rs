#![allow(dead_code)]
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io::Read;
use std::path::{Path, PathBuf};

use autocams::config::{Config, Protocol, RemoteConfig};
use autocams::confirm::{Prompt, Viewer};
use autocams::transfer::{RemoteStore, join_remote, normalize_path};

pub const STATION: &str = "AB1234";
pub const CAMS_ID: u32 = 371;
pub const BASE_DIR: &str = "/incoming";

/// In-memory remote tree: directory path -> (file name -> bytes).
pub struct MemoryRemote {
    pub dirs: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    home: String,
    cwd: String,
    /// Flip a byte of every stored file, to exercise checksum mismatches
    pub tamper: bool,
    pub stores: Vec<String>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        let mut dirs = BTreeMap::new();
        dirs.insert("/".to_string(), BTreeMap::new());
        dirs.insert(BASE_DIR.to_string(), BTreeMap::new());
        Self { dirs, home: "/".to_string(), cwd: "/".to_string(), tamper: false, stores: Vec::new() }
    }

    /// Session that logs in to `home` instead of the root.
    pub fn with_home(home: &str) -> Self {
        let mut remote = Self::new();
        remote.add_dir(home);
        remote.home = normalize_path(home);
        remote.cwd = remote.home.clone();
        remote
    }

    pub fn add_dir(&mut self, path: &str) {
        self.dirs.entry(normalize_path(path)).or_default();
    }

    pub fn add_file(&mut self, dir: &str, name: &str) {
        self.dirs.entry(normalize_path(dir)).or_default().insert(name.to_string(), b"zip".to_vec());
    }

    pub fn files_in(&self, dir: &str) -> Vec<String> {
        self.dirs.get(&normalize_path(dir)).map(|f| f.keys().cloned().collect()).unwrap_or_default()
    }
}

impl RemoteStore for MemoryRemote {
    fn change_dir(&mut self, path: &str) -> Result<bool, String> {
        let target = join_remote(&self.cwd, path);
        if self.dirs.contains_key(&target) {
            self.cwd = target;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn current_dir(&self) -> String {
        self.cwd.clone()
    }

    fn home_dir(&self) -> String {
        self.home.clone()
    }

    fn list_names(&mut self) -> Result<Vec<String>, String> {
        let mut names: Vec<String> =
            self.dirs.get(&self.cwd).map(|f| f.keys().cloned().collect()).unwrap_or_default();
        let prefix = if self.cwd == "/" { "/".to_string() } else { format!("{}/", self.cwd) };
        for dir in self.dirs.keys() {
            if let Some(rest) = dir.strip_prefix(&prefix)
                && !rest.is_empty()
                && !rest.contains('/')
            {
                names.push(rest.to_string());
            }
        }
        Ok(names)
    }

    fn make_dir(&mut self, name: &str) -> Result<(), String> {
        let target = join_remote(&self.cwd, name);
        self.dirs.entry(target).or_default();
        Ok(())
    }

    fn store(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, String> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(|e| e.to_string())?;
        let n = buf.len() as u64;
        if self.tamper && !buf.is_empty() {
            buf[0] ^= 0xff;
        }
        self.stores.push(join_remote(&self.cwd, name));
        self.dirs.entry(self.cwd.clone()).or_default().insert(name.to_string(), buf);
        Ok(n)
    }

    fn retrieve(&mut self, name: &str) -> Result<Vec<u8>, String> {
        self.dirs
            .get(&self.cwd)
            .and_then(|f| f.get(name))
            .cloned()
            .ok_or_else(|| format!("no such file: {}", name))
    }
}

/// Answers questions from a script; an exhausted script answers no.
pub struct ScriptedPrompt {
    answers: VecDeque<bool>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[bool]) -> Self {
        Self { answers: answers.iter().copied().collect(), asked: Vec::new() }
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        self.asked.push(question.to_string());
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}

/// Records viewer launches. With `confirm_into` set, a confirmation copies
/// the night into that ConfirmedFiles root, as the real viewer does.
#[derive(Default)]
pub struct RecordingViewer {
    pub confirmed: RefCell<Vec<(PathBuf, PathBuf)>>,
    pub opened: RefCell<Vec<PathBuf>>,
    pub confirm_into: Option<PathBuf>,
}

impl Viewer for RecordingViewer {
    fn confirm_night(&self, night_dir: &Path, report: &Path) -> anyhow::Result<()> {
        self.confirmed.borrow_mut().push((night_dir.to_path_buf(), report.to_path_buf()));
        if let Some(root) = &self.confirm_into {
            let dest = root.join(night_dir.file_name().unwrap());
            std::fs::create_dir_all(&dest)?;
            for entry in std::fs::read_dir(night_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    std::fs::copy(entry.path(), dest.join(entry.file_name()))?;
                }
            }
        }
        Ok(())
    }

    fn open_night(&self, night_dir: &Path) -> anyhow::Result<()> {
        self.opened.borrow_mut().push(night_dir.to_path_buf());
        Ok(())
    }
}

pub fn test_config(rms_dir: &Path) -> Config {
    Config {
        rms_dir: rms_dir.to_path_buf(),
        stations: STATION.to_string(),
        cams_id: None,
        viewer_path: PathBuf::from("CMN_binviewer"),
        remote: RemoteConfig {
            protocol: Protocol::Sftp,
            host: "localhost".to_string(),
            port: None,
            username: "cams".to_string(),
            password: None,
            base_dir: BASE_DIR.to_string(),
            create_date_dirs: false,
        },
    }
}

/// RMS data root with the station config in a throwaway archived night.
pub fn rms_root() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    let cfg_dir = root.path().join("ArchivedFiles").join(format!("{}_20000101_000000_000000", STATION));
    std::fs::create_dir_all(&cfg_dir).unwrap();
    std::fs::write(cfg_dir.join(".config"), format!("[System]\ncams_code: {}\n", CAMS_ID)).unwrap();
    std::fs::create_dir_all(root.path().join("ConfirmedFiles")).unwrap();
    root
}

pub struct NightFixture<'a> {
    pub kind: &'a str,
    pub name: &'a str,
    pub detections: Option<u32>,
    pub calibration: bool,
    pub viewer_report: bool,
}

impl<'a> NightFixture<'a> {
    pub fn archived(name: &'a str, detections: u32) -> Self {
        Self { kind: "ArchivedFiles", name, detections: Some(detections), calibration: true, viewer_report: true }
    }

    pub fn confirmed(name: &'a str, detections: u32) -> Self {
        Self { kind: "ConfirmedFiles", ..Self::archived(name, detections) }
    }
}

/// Create a night directory with CAL file, CAMS report and the
/// station-named report the viewer takes.
pub fn make_night(root: &Path, night: NightFixture<'_>) -> PathBuf {
    let dir = root.join(night.kind).join(night.name);
    std::fs::create_dir_all(&dir).unwrap();
    let rest = night.name.split_once('_').map(|(_, r)| r).unwrap();
    if night.calibration {
        std::fs::write(dir.join(format!("CAL_{:06}_{}.txt", CAMS_ID, rest)), "calibration\n").unwrap();
    }
    if let Some(n) = night.detections {
        let body = format!("Meteor Count = {:06}\n-----------------------------------------------------\n", n);
        std::fs::write(dir.join(format!("FTPdetectinfo_{:06}_{}.txt", CAMS_ID, rest)), &body).unwrap();
        if night.viewer_report {
            std::fs::write(dir.join(format!("FTPdetectinfo_{}_{}.txt", STATION, rest)), &body).unwrap();
        }
    }
    dir
}

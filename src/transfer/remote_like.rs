use std::io::{Read, Write};
use std::path::Path;

use super::helpers::{join_remote, normalize_path};

/// Remote directory operations the listing and upload code needs. The
/// engine only talks to this trait so tests can swap in an in-memory store.
pub trait RemoteStore {
    /// Change the working directory. `Ok(false)` means the directory does
    /// not exist and the working directory is unchanged.
    fn change_dir(&mut self, path: &str) -> Result<bool, String>;
    fn current_dir(&self) -> String;
    /// Directory the session started in; relative paths in the
    /// configuration resolve against it.
    fn home_dir(&self) -> String;
    /// Names of the entries in the working directory.
    fn list_names(&mut self) -> Result<Vec<String>, String>;
    /// Create `name` in the working directory; an existing directory is fine.
    fn make_dir(&mut self, name: &str) -> Result<(), String>;
    /// Store `reader` as `name` in the working directory, returning the byte count.
    fn store(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, String>;
    fn retrieve(&mut self, name: &str) -> Result<Vec<u8>, String>;
}

// libssh2 SFTP status for a missing path
const SFTP_NO_SUCH_FILE: i32 = 2;

/// SFTP-backed store. Owns the session so the connection lives exactly as
/// long as the store; dropping it disconnects.
pub struct Ssh2Remote {
    sess: ssh2::Session,
    sftp: ssh2::Sftp,
    home: String,
    cwd: String,
}

impl Ssh2Remote {
    /// Starts in the login directory as reported by the server.
    pub fn new(sess: ssh2::Session, sftp: ssh2::Sftp) -> Result<Self, String> {
        let home = sftp
            .realpath(Path::new("."))
            .map(|p| normalize_path(&p.to_string_lossy()))
            .map_err(|e| format!("realpath .: {}", e))?;
        Ok(Self { sess, sftp, cwd: home.clone(), home })
    }

    fn resolve(&self, name: &str) -> String {
        join_remote(&self.cwd, name)
    }
}

impl RemoteStore for Ssh2Remote {
    fn change_dir(&mut self, path: &str) -> Result<bool, String> {
        let target = self.resolve(path);
        match self.sftp.stat(Path::new(&target)) {
            Ok(st) if st.is_dir() => {
                self.cwd = target;
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) if matches!(e.code(), ssh2::ErrorCode::SFTP(SFTP_NO_SUCH_FILE)) => Ok(false),
            Err(e) => Err(format!("stat {}: {}", target, e)),
        }
    }

    fn current_dir(&self) -> String {
        self.cwd.clone()
    }

    fn home_dir(&self) -> String {
        self.home.clone()
    }

    fn list_names(&mut self) -> Result<Vec<String>, String> {
        let entries = self
            .sftp
            .readdir(Path::new(&self.cwd))
            .map_err(|e| format!("list {}: {}", self.cwd, e))?;
        Ok(entries
            .into_iter()
            .filter_map(|(p, _)| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect())
    }

    fn make_dir(&mut self, name: &str) -> Result<(), String> {
        let target = self.resolve(name);
        if let Ok(st) = self.sftp.stat(Path::new(&target)) {
            if st.is_dir() {
                return Ok(());
            }
            return Err(format!("{} exists and is not a directory", target));
        }
        self.sftp.mkdir(Path::new(&target), 0o755).map_err(|e| format!("mkdir {}: {}", target, e))
    }

    fn store(&mut self, name: &str, reader: &mut dyn Read) -> Result<u64, String> {
        let target = self.resolve(name);
        let mut remote =
            self.sftp.create(Path::new(&target)).map_err(|e| format!("create {}: {}", target, e))?;
        let n = std::io::copy(reader, &mut remote).map_err(|e| format!("write {}: {}", target, e))?;
        remote.flush().map_err(|e| format!("flush {}: {}", target, e))?;
        Ok(n)
    }

    fn retrieve(&mut self, name: &str) -> Result<Vec<u8>, String> {
        let target = self.resolve(name);
        let mut remote =
            self.sftp.open(Path::new(&target)).map_err(|e| format!("open {}: {}", target, e))?;
        let mut buf = Vec::new();
        remote.read_to_end(&mut buf).map_err(|e| format!("read {}: {}", target, e))?;
        Ok(buf)
    }
}

impl Drop for Ssh2Remote {
    fn drop(&mut self) {
        let _ = self.sess.disconnect(None, "upload session finished", None);
    }
}

use std::io::Read;
use std::net::ToSocketAddrs;
use std::time::Duration;

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};

use crate::AutocamsError;
use crate::config::RemoteConfig;

use super::helpers::{join_remote, normalize_path};
use super::remote_like::RemoteStore;

/// Plain FTP store, the transport the CAMS collection server speaks.
/// Transfers are binary; the control connection is closed on drop.
pub struct FtpRemote {
    ftp: FtpStream,
    home: String,
    cwd: String,
}

/// Log in to the FTP server and switch to binary transfers.
pub fn connect_ftp(remote: &RemoteConfig) -> anyhow::Result<FtpRemote> {
    let addr = format!("{}:{}", remote.host, remote.port());
    let sock = addr.to_socket_addrs()?.next().ok_or_else(|| -> anyhow::Error {
        AutocamsError::SshNoAddress(addr.clone()).into()
    })?;
    let mut ftp = FtpStream::connect_timeout(sock, Duration::from_secs(10)).map_err(
        |e| -> anyhow::Error { AutocamsError::FtpConnectFailed(format!("{}: {}", addr, e)).into() },
    )?;
    ftp.login(remote.username.as_str(), remote.password.as_deref().unwrap_or_default()).map_err(
        |e| -> anyhow::Error { AutocamsError::FtpLoginFailed(format!("{}: {}", addr, e)).into() },
    )?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|e| -> anyhow::Error { AutocamsError::RemoteIo(format!("TYPE I: {}", e)).into() })?;
    let home = ftp
        .pwd()
        .map(|p| normalize_path(&p))
        .map_err(|e| -> anyhow::Error { AutocamsError::RemoteIo(format!("PWD: {}", e)).into() })?;
    tracing::info!("connected to {} as {} (ftp, home {})", addr, remote.username, home);
    Ok(FtpRemote { ftp, cwd: home.clone(), home })
}

fn is_unavailable(e: &FtpError) -> bool {
    matches!(e, FtpError::UnexpectedResponse(resp) if resp.status == Status::FileUnavailable)
}

/// Entry name of one MLSD line: `fact=value;fact=value; name`.
fn mlsd_name(line: &str) -> Option<&str> {
    line.split_once(' ').map(|(_, name)| name.trim_end_matches(['\r', '\n'])).filter(|n| !n.is_empty())
}

impl RemoteStore for FtpRemote {
    fn change_dir(&mut self, path: &str) -> Result<bool, String> {
        let target = join_remote(&self.cwd, path);
        match self.ftp.cwd(&target) {
            Ok(()) => {
                self.cwd = target;
                Ok(true)
            }
            Err(e) if is_unavailable(&e) => Ok(false),
            Err(e) => Err(format!("CWD {}: {}", target, e)),
        }
    }

    fn current_dir(&self) -> String {
        self.cwd.clone()
    }

    fn home_dir(&self) -> String {
        self.home.clone()
    }

    fn list_names(&mut self) -> Result<Vec<String>, String> {
        match self.ftp.mlsd(None) {
            Ok(lines) => Ok(lines.iter().filter_map(|l| mlsd_name(l)).map(str::to_string).collect()),
            Err(e) => {
                // servers without MLSD still answer NLST
                tracing::debug!("MLSD in {} failed ({}), falling back to NLST", self.cwd, e);
                self.ftp.nlst(None).map_err(|e| format!("NLST {}: {}", self.cwd, e))
            }
        }
    }

    fn make_dir(&mut self, name: &str) -> Result<(), String> {
        match self.ftp.mkdir(name) {
            Ok(()) => Ok(()),
            Err(e) => {
                if self.list_names()?.iter().any(|n| n == name) {
                    Ok(())
                } else {
                    Err(format!("MKD {}: {}", join_remote(&self.cwd, name), e))
                }
            }
        }
    }

    fn store(&mut self, name: &str, mut reader: &mut dyn Read) -> Result<u64, String> {
        self.ftp
            .put_file(name, &mut reader)
            .map_err(|e| format!("STOR {}: {}", join_remote(&self.cwd, name), e))
    }

    fn retrieve(&mut self, name: &str) -> Result<Vec<u8>, String> {
        self.ftp
            .retr_as_buffer(name)
            .map(|buf| buf.into_inner())
            .map_err(|e| format!("RETR {}: {}", join_remote(&self.cwd, name), e))
    }
}

impl Drop for FtpRemote {
    fn drop(&mut self) {
        let _ = self.ftp.quit();
    }
}

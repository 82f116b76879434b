use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::AutocamsError;
use crate::config::{Protocol, RemoteConfig};

use super::ftp::connect_ftp;
use super::remote_like::{RemoteStore, Ssh2Remote};

/// Key auth fallback over the usual private key files in `~/.ssh`.
fn try_key_authentication(sess: &mut ssh2::Session, username: &str) -> bool {
    if sess.authenticated() {
        return true;
    }
    if let Some(home_p) = dirs::home_dir() {
        for name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
            let p = home_p.join(".ssh").join(name);
            if p.exists() {
                let _ = sess.userauth_pubkey_file(username, None, &p, None);
                if sess.authenticated() {
                    return true;
                }
            }
        }
    }
    false
}

fn try_password_authentication(sess: &mut ssh2::Session, username: &str, password: &str) -> bool {
    if let Err(e) = sess.userauth_password(username, password) {
        tracing::debug!("password authentication failed: {}", e);
    }
    sess.authenticated()
}

fn create_tcp_connection(addr: &str) -> anyhow::Result<TcpStream> {
    let mut addrs = addr.to_socket_addrs()?;
    let sock = addrs.next().ok_or_else(|| -> anyhow::Error {
        AutocamsError::SshNoAddress(addr.to_string()).into()
    })?;
    let tcp = TcpStream::connect_timeout(&sock, Duration::from_secs(10))?;
    let _ = tcp.set_read_timeout(Some(Duration::from_secs(30)));
    let _ = tcp.set_write_timeout(Some(Duration::from_secs(30)));
    Ok(tcp)
}

/// Open a session to the collection server over the configured protocol.
pub fn connect_remote(remote: &RemoteConfig) -> anyhow::Result<Box<dyn RemoteStore>> {
    let store: Box<dyn RemoteStore> = match remote.protocol {
        Protocol::Ftp => Box::new(connect_ftp(remote)?),
        Protocol::Sftp => Box::new(connect_sftp(remote)?),
    };
    Ok(store)
}

/// Open an authenticated SFTP session. Password auth is tried first when
/// configured, then the user's key files.
pub fn connect_sftp(remote: &RemoteConfig) -> anyhow::Result<Ssh2Remote> {
    let addr = format!("{}:{}", remote.host, remote.port());
    let tcp = create_tcp_connection(&addr)?;
    let mut sess = ssh2::Session::new().map_err(|_| -> anyhow::Error {
        AutocamsError::SshSessionCreateFailed(addr.clone()).into()
    })?;
    sess.set_tcp_stream(tcp);
    sess.handshake().map_err(|_| -> anyhow::Error {
        AutocamsError::SshHandshakeFailed(addr.clone()).into()
    })?;

    let by_password = remote
        .password
        .as_deref()
        .is_some_and(|pw| try_password_authentication(&mut sess, &remote.username, pw));
    if !by_password && !try_key_authentication(&mut sess, &remote.username) {
        return Err(AutocamsError::SshAuthFailed(addr).into());
    }

    let sftp = sess
        .sftp()
        .map_err(|e| -> anyhow::Error { AutocamsError::RemoteIo(format!("SFTP: {}", e)).into() })?;
    let store = Ssh2Remote::new(sess, sftp)
        .map_err(|e| -> anyhow::Error { AutocamsError::RemoteIo(e).into() })?;
    tracing::info!("connected to {} as {} (sftp, home {})", addr, remote.username, store.home_dir());
    Ok(store)
}

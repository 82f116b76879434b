/// Domain errors raised while reconciling and uploading station nights.
///
/// They travel inside `anyhow::Error`; callers that need to tell a skippable
/// night apart from a failed station downcast and ask `is_recoverable`.
#[derive(Debug, Clone)]
pub enum AutocamsError {
    /// No `CAL_*` file in the night directory
    MissingCalibration(std::path::PathBuf),
    /// No FTPdetectinfo report resolved for the night directory
    ReportNotFound(std::path::PathBuf),
    /// More than one FTPdetectinfo report candidate
    AmbiguousReport(std::path::PathBuf, usize),
    MalformedReport(std::path::PathBuf, String),
    /// Directory name does not follow `<station>_<YYYYMMDD>_<HHMMSS>_...`
    BadNightName(String),
    StationConfigMissing(String),
    StationConfigInvalid(std::path::PathBuf, String),
    ConfigInvalid(String),
    RemoteDirMissing(String),
    RemoteIo(String),
    // connection related
    SshNoAddress(String),
    SshSessionCreateFailed(String),
    SshHandshakeFailed(String),
    SshAuthFailed(String),
    FtpConnectFailed(String),
    FtpLoginFailed(String),
    ViewerNotFound(String),
}

impl std::fmt::Display for AutocamsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use AutocamsError::*;
        match self {
            MissingCalibration(p) => write!(f, "no calibration file found in {}", p.display()),
            ReportNotFound(p) => write!(f, "no FTPdetectinfo file found in {}", p.display()),
            AmbiguousReport(p, n) => {
                write!(f, "{} FTPdetectinfo candidates in {}, expected exactly one", n, p.display())
            }
            MalformedReport(p, line) => {
                write!(f, "cannot read detection count from {}: {:?}", p.display(), line)
            }
            BadNightName(name) => write!(f, "not a night directory name: {}", name),
            StationConfigMissing(station) => {
                write!(f, "no ArchivedFiles/{}_*/.config found", station)
            }
            StationConfigInvalid(p, msg) => write!(f, "invalid station config {}: {}", p.display(), msg),
            ConfigInvalid(msg) => write!(f, "invalid configuration: {}", msg),
            RemoteDirMissing(dir) => write!(f, "remote directory does not exist: {}", dir),
            RemoteIo(msg) => write!(f, "remote I/O error: {}", msg),
            SshNoAddress(addr) => write!(f, "cannot resolve address: {}", addr),
            SshSessionCreateFailed(addr) => write!(f, "cannot create SSH session: {}", addr),
            SshHandshakeFailed(addr) => write!(f, "SSH handshake failed: {}", addr),
            SshAuthFailed(addr) => write!(f, "SSH authentication failed: {}", addr),
            FtpConnectFailed(msg) => write!(f, "cannot connect to FTP server {}", msg),
            FtpLoginFailed(msg) => write!(f, "FTP login failed at {}", msg),
            ViewerNotFound(exe) => write!(f, "confirmation viewer not found: {}", exe),
        }
    }
}

impl std::error::Error for AutocamsError {}

impl AutocamsError {
    /// Whether the error only concerns a single night, so the run should log
    /// it and move on to the next directory. Everything else fails the
    /// station.
    pub fn is_recoverable(&self) -> bool {
        use AutocamsError::*;
        match self {
            MissingCalibration(_) | ReportNotFound(_) | AmbiguousReport(_, _) => true,
            MalformedReport(_, _)
            | BadNightName(_)
            | StationConfigMissing(_)
            | StationConfigInvalid(_, _)
            | ConfigInvalid(_)
            | RemoteDirMissing(_)
            | RemoteIo(_)
            | SshNoAddress(_)
            | SshSessionCreateFailed(_)
            | SshHandshakeFailed(_)
            | SshAuthFailed(_)
            | FtpConnectFailed(_)
            | FtpLoginFailed(_)
            | ViewerNotFound(_) => false,
        }
    }
}

/// Convenience for `anyhow` chains: true when the root cause is a recoverable
/// `AutocamsError`.
pub fn is_recoverable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AutocamsError>().is_some_and(AutocamsError::is_recoverable)
}

/// Normalize a remote path:
/// - converts backslashes to forward slashes
/// - collapses repeated slashes
/// - strips a trailing slash, keeping root "/"
pub fn normalize_path(p: &str) -> String {
    if p.is_empty() {
        return String::new();
    }
    let mut s = p.replace('\\', "/");
    while s.contains("//") {
        s = s.replace("//", "/");
    }
    while s.len() > 1 && s.ends_with('/') {
        s.pop();
    }
    s
}

/// Resolve `path` against the remote working directory `cwd`. Absolute
/// paths replace `cwd`; `..` segments are not interpreted.
pub fn join_remote(cwd: &str, path: &str) -> String {
    if path.starts_with('/') {
        normalize_path(path)
    } else {
        normalize_path(&format!("{}/{}", cwd, path))
    }
}

/// Remote date directories for a start date: (`YYYY`, `YYYY_MM`).
pub fn date_dirs(start: &chrono::NaiveDateTime) -> (String, String) {
    (start.format("%Y").to_string(), start.format("%Y_%m").to_string())
}

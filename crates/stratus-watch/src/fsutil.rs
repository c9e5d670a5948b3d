//! Small filesystem observation helpers

use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Modification time of `path` in whole seconds since the epoch.
///
/// Seconds resolution is deliberate: the stored modtime must be comparable
/// across the durable store (integer column) and every filesystem the
/// daemon runs on.
pub fn modtime_secs(path: &Path) -> io::Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        .as_secs();
    Ok(secs as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modtime_of_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"x").unwrap();

        let modtime = modtime_secs(&path).unwrap();
        assert!(modtime > 0);
    }

    #[test]
    fn test_modtime_of_missing_file() {
        assert!(modtime_secs(Path::new("/nonexistent/file")).is_err());
    }
}

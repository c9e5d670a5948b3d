//! Content hasher
//!
//! Pure functions producing the two digests the index is built on:
//! a stable path-identifier hash (path bytes only, content-independent)
//! and a content hash over file bytes. Both are SHA-256, lowercase hex.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::domain::{ContentHash, PathHash};

/// Read buffer size for content hashing
const HASH_BUF_SIZE: usize = 64 * 1024;

fn to_hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Hash an absolute path into its stable identifier.
///
/// Deterministic across versions of the same path and across daemon
/// restarts; used as the remote object name for the path's uploads.
#[must_use]
pub fn hash_path(path: &Path) -> PathHash {
    let mut hasher = Sha256::new();
    hasher.update(path.as_os_str().as_encoded_bytes());
    let hex = to_hex(&hasher.finalize());
    PathHash::new(hex).expect("sha256 hex digest is always valid")
}

/// Hash a file's byte contents.
///
/// Streams the file through a fixed-size buffer so large files do not get
/// pulled into memory whole.
pub fn hash_contents(path: &Path) -> io::Result<ContentHash> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    let hex = to_hex(&hasher.finalize());
    Ok(ContentHash::new(hex).expect("sha256 hex digest is always valid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_path_hash_is_stable() {
        let a = hash_path(Path::new("/home/user/docs/a.txt"));
        let b = hash_path(Path::new("/home/user/docs/a.txt"));
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_path_hash_differs_per_path() {
        let a = hash_path(Path::new("/home/user/docs/a.txt"));
        let b = hash_path(Path::new("/home/user/docs/b.txt"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_hash_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");

        std::fs::write(&path, b"first").unwrap();
        let h1 = hash_contents(&path).unwrap();

        std::fs::write(&path, b"second").unwrap();
        let h2 = hash_contents(&path).unwrap();

        assert_ne!(h1, h2);

        std::fs::write(&path, b"first").unwrap();
        let h3 = hash_contents(&path).unwrap();
        assert_eq!(h1, h3);
    }

    #[test]
    fn test_content_hash_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        File::create(&path).unwrap().flush().unwrap();

        // SHA-256 of the empty string
        let h = hash_contents(&path).unwrap();
        assert_eq!(
            h.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_content_hash_missing_file() {
        assert!(hash_contents(Path::new("/nonexistent/file")).is_err());
    }
}

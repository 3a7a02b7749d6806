use sha2::{Digest, Sha256};
use statepack_schema::Sha256Digest;
use std::fs::File;
use std::io;
use std::path::Path;

/// Content hash and byte size of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub sha256: Sha256Digest,
    pub size_bytes: u64,
}

/// Stream a file through SHA-256, returning the hex digest and the number of
/// bytes read.
pub fn digest_file(path: &Path) -> io::Result<FileDigest> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let size_bytes = io::copy(&mut file, &mut hasher)?;
    Ok(FileDigest {
        sha256: Sha256Digest::new(format!("{:x}", hasher.finalize())),
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();
        let d = digest_file(&path).unwrap();
        assert_eq!(
            d.sha256.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(d.size_bytes, 3);
        assert!(d.sha256.is_well_formed());
    }

    #[test]
    fn digest_of_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        let d = digest_file(&path).unwrap();
        assert_eq!(
            d.sha256.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(d.size_bytes, 0);
    }

    #[test]
    fn digest_streams_large_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.bin");
        let data = vec![0xABu8; 1024 * 256 + 7];
        std::fs::write(&path, &data).unwrap();
        let d = digest_file(&path).unwrap();
        assert_eq!(d.size_bytes, data.len() as u64);
        assert_eq!(
            d.sha256.as_str(),
            format!("{:x}", Sha256::digest(&data))
        );
    }

    #[test]
    fn digest_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(digest_file(&dir.path().join("nope")).is_err());
    }
}

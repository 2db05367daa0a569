//! Streamed file checksums
//!
//! The payload file is hashed in fixed-size chunks so memory use does not depend
//! on its size. Digests are rendered as lowercase hex, the form imzML stores in
//! its `ibd MD5` / `ibd SHA-1` annotations.

use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;

use log::debug;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::ChecksumError;

/// Chunk size used when streaming a file through the hash
pub const CHECKSUM_CHUNK_SIZE: usize = 1024 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    /// MD5
    Md5,
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
}

impl ChecksumAlgorithm {
    /// Canonical algorithm name, e.g. `SHA-1`
    pub fn name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "MD5",
            ChecksumAlgorithm::Sha1 => "SHA-1",
            ChecksumAlgorithm::Sha256 => "SHA-256",
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MD5" => Ok(ChecksumAlgorithm::Md5),
            "SHA-1" | "SHA1" => Ok(ChecksumAlgorithm::Sha1),
            "SHA-256" | "SHA256" => Ok(ChecksumAlgorithm::Sha256),
            _ => Err(ChecksumError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hash the file at `path` with the algorithm named `algorithm`
///
/// ```rust,no_run
/// let digest = imzml::imzml::checksum("data.ibd", "SHA-1")?;
/// println!("{digest}");
/// # Ok::<(), imzml::imzml::ChecksumError>(())
/// ```
pub fn checksum<P: AsRef<Path>>(path: P, algorithm: &str) -> Result<String, ChecksumError> {
    checksum_with(path, algorithm.parse()?)
}

/// Hash the file at `path`
pub fn checksum_with<P: AsRef<Path>>(
    path: P,
    algorithm: ChecksumAlgorithm,
) -> Result<String, ChecksumError> {
    checksum_with_chunk_size(path, algorithm, CHECKSUM_CHUNK_SIZE)
}

/// Hash the file at `path`, reading `chunk_size` bytes at a time
pub fn checksum_with_chunk_size<P: AsRef<Path>>(
    path: P,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> Result<String, ChecksumError> {
    match algorithm {
        ChecksumAlgorithm::Md5 => hash_file::<Md5>(path.as_ref(), algorithm, chunk_size),
        ChecksumAlgorithm::Sha1 => hash_file::<Sha1>(path.as_ref(), algorithm, chunk_size),
        ChecksumAlgorithm::Sha256 => hash_file::<Sha256>(path.as_ref(), algorithm, chunk_size),
    }
}

fn hash_file<D: Digest>(
    path: &Path,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> Result<String, ChecksumError> {
    let mut file = File::open(path).map_err(|source| ChecksumError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut hasher = D::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;
    loop {
        let n = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(ChecksumError::Read {
                    path: path.to_path_buf(),
                    algorithm: algorithm.name().to_string(),
                    source,
                })
            }
        };
        hasher.update(&buffer[..n]);
        total += n as u64;
    }

    debug!("{} of {} ({} bytes) computed", algorithm, path.display(), total);
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(hex, "{byte:02x}");
    }
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn write_file(content: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.ibd");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_known_digests() {
        let (_dir, path) = write_file(b"abc");

        assert_eq!(
            checksum(&path, "MD5").unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            checksum(&path, "SHA-1").unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            checksum(&path, "sha-256").unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_empty_file() {
        let (_dir, path) = write_file(b"");
        assert_eq!(
            checksum(&path, "MD5").unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_unknown_algorithm() {
        let (_dir, path) = write_file(b"abc");
        match checksum(&path, "CRC32") {
            Err(ChecksumError::UnknownAlgorithm(name)) => assert_eq!(name, "CRC32"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ibd");
        match checksum(&path, "SHA-1") {
            Err(ChecksumError::Open { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!("sha1".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha1);
        assert_eq!(ChecksumAlgorithm::Md5.to_string(), "MD5");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_chunk_size_does_not_change_digest(
            content in proptest::collection::vec(any::<u8>(), 0..4096),
            chunk_size in 1usize..600,
        ) {
            let (_dir, path) = write_file(&content);
            for algorithm in [ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha1] {
                let reference = checksum_with(&path, algorithm).unwrap();
                let chunked = checksum_with_chunk_size(&path, algorithm, chunk_size).unwrap();
                prop_assert_eq!(reference, chunked);
            }
        }
    }
}

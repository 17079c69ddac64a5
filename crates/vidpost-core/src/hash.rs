//! Streaming content digests.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Block size used when reading files for hashing.
pub const HASH_CHUNK_SIZE: usize = 4096;

/// Computes hex-encoded SHA-256 digests without buffering whole files.
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    chunk_size: usize,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self {
            chunk_size: HASH_CHUNK_SIZE,
        }
    }
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest everything `reader` yields until EOF.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<String> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    pub fn digest_file(&self, path: &Path) -> io::Result<String> {
        let file = File::open(path)?;
        self.digest_reader(file)
    }
}

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// 128-bit digest of a file's full contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub u128);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// XXH3, 128-bit
    #[default]
    Xxh3,
    /// BLAKE3 truncated to 128 bits
    Blake3,
}

impl HashAlgorithm {
    pub fn hash_bytes(&self, data: &[u8]) -> ContentHash {
        match self {
            HashAlgorithm::Xxh3 => ContentHash(twox_hash::xxh3::hash128(data)),
            HashAlgorithm::Blake3 => {
                let digest = blake3::hash(data);
                let mut prefix = [0u8; 16];
                prefix.copy_from_slice(&digest.as_bytes()[..16]);
                ContentHash(u128::from_be_bytes(prefix))
            }
        }
    }

    pub fn hash_file(&self, file: &Path) -> io::Result<ContentHash> {
        let data = read_full_file(file)?;
        Ok(self.hash_bytes(&data))
    }
}

pub fn read_full_file(file: &Path) -> io::Result<Vec<u8>> {
    let mut f = File::open(file)?;
    let mut buffer = Vec::new();
    f.read_to_end(&mut buffer)?;
    Ok(buffer)
}

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::readers::create_reader;
use crate::types::{Dataset, FileFormat, Result};

/// Where a snapshot came from, recorded alongside every report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInfo {
    /// File name (without path)
    pub file_name: String,

    pub format: FileFormat,

    /// File hash (SHA-256)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
}

/// A loaded snapshot and its provenance
pub struct Snapshot {
    pub source: SourceInfo,
    pub dataset: Dataset,
}

/// Load a snapshot file, optionally fingerprinting it
pub fn load_snapshot(path: &Path, hash_file: bool) -> Result<Snapshot> {
    let format = FileFormat::from_path(path)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let file_hash = if hash_file {
        Some(compute_file_hash(path)?)
    } else {
        None
    };

    let mut reader = create_reader(path)?;
    let dataset = reader.load()?;

    Ok(Snapshot {
        source: SourceInfo {
            file_name,
            format,
            file_hash,
        },
        dataset,
    })
}

/// Compute SHA-256 hash of a file (streaming to handle large files)
fn compute_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hash = format!("{:x}", hasher.finalize());
    debug!(path = %path.display(), %hash, "fingerprinted snapshot");
    Ok(hash)
}

//! Scanning for a [`PatchSite`] and rewriting it in place.
//!
//! The scan and the write use separate file handles: the executable is closed after scanning and
//! reopened for writing. Nothing guards against the file changing between the two phases.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::{
    patches::{Direction, PatchSite},
    scanner,
};

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error(
        "Couldn't find bytes in {}. Already {}? Otherwise this game version is not supported.",
        path.display(),
        direction.target_state()
    )]
    PatternNotFound { direction: Direction, path: PathBuf },
    #[error("invalid pattern for {name}: {reason}")]
    InvalidPattern { name: String, reason: String },
    #[error("failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PatchError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

/// Offset of the bytes `direction` expects to replace.
pub fn locate(path: &Path, site: &PatchSite, direction: Direction) -> Result<u64, PatchError> {
    let pattern = site
        .pattern(direction)
        .map_err(|err| PatchError::InvalidPattern {
            name: site.name.to_string(),
            reason: err.to_string(),
        })?;

    scanner::scan_file(&pattern, path)
        .map_err(PatchError::io("scan", path))?
        .ok_or_else(|| PatchError::PatternNotFound {
            direction,
            path: path.to_path_buf(),
        })
}

/// Overwrite `bytes.len()` bytes at `offset`. No backup is made.
pub fn write_bytes(path: &Path, offset: u64, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(bytes)?;
    file.flush()
}

pub fn read_bytes(path: &Path, offset: u64, len: usize) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0; len];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn write_site(
    path: &Path,
    offset: u64,
    site: &PatchSite,
    direction: Direction,
) -> Result<(), PatchError> {
    tracing::info!(offset, "writing {} ({direction})", site.name);
    write_bytes(path, offset, site.replace(direction)).map_err(PatchError::io("write", path))
}

/// Find the site and rewrite it. Returns the offset that was written.
pub fn apply(path: &Path, site: &PatchSite, direction: Direction) -> Result<u64, PatchError> {
    let offset = locate(path, site, direction)?;
    write_site(path, offset, site, direction)?;
    Ok(offset)
}

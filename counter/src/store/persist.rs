//! Snapshot file I/O.
//!
//! The file is a JSON array of records, oldest first. Writes go to a sibling
//! `.tmp` file with owner-only permissions which is then renamed over the
//! target, so readers never see a half-written snapshot.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::PersistError;
use crate::record::Record;

/// Reads and decodes a snapshot. `Ok(None)` when the file does not exist.
/// A JSON `null` decodes as an empty snapshot.
pub(crate) async fn read_snapshot(path: &Path) -> Result<Option<Vec<Record>>, PersistError> {
    let bytes = match fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice::<Option<Vec<Record>>>(&bytes)
        .map(|records| Some(records.unwrap_or_default()))
        .map_err(|source| PersistError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Encodes `records` (expected oldest first) and replaces `path` with them.
pub(crate) async fn write_snapshot(path: &Path, records: &[Record]) -> Result<(), PersistError> {
    let data = serde_json::to_vec(records)?;
    let tmp = tmp_path(path);

    if let Err(source) = write_then_rename(&tmp, path, &data).await {
        // best effort; the tmp file may not exist
        let _ = fs::remove_file(&tmp).await;
        return Err(PersistError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

async fn write_then_rename(tmp: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(0o600);

    let mut file = opts.open(tmp).await?;

    // `mode` only applies on create; a stale tmp file keeps its old bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp, std::fs::Permissions::from_mode(0o600)).await?;
    }

    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(tmp, path).await
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}

//! JSON file helpers shared by the ledger and the result store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use webqueue_core::{Error, Result};

fn storage_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Storage(format!("{}: {}", path.display(), err))
}

/// Read and parse a JSON document. Returns `Ok(None)` if the file does not exist.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(storage_error(path, e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| storage_error(path, e))
}

/// Write a JSON document atomically (write to .tmp, sync, then rename).
pub(crate) async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value).map_err(|e| storage_error(path, e))?;
    let tmp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| storage_error(&tmp_path, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| storage_error(&tmp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| storage_error(&tmp_path, e))?;
    }

    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| storage_error(path, e))
}

//! File loading with directory rejection and content-type driven decoding

use crate::error::{WatchStoreError, WatchStoreResult};
use crate::mime;
use crate::store::FileData;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Read `path` as text or bytes depending on its content type
///
/// Missing or inaccessible files yield `WatchStoreError::Stat`, directories
/// yield `WatchStoreError::IsDirectory`. Files whose type carries an encoding
/// are decoded as UTF-8; when the bytes are not valid UTF-8 they are kept as
/// binary instead.
pub async fn read_file_correctly(path: &Path) -> WatchStoreResult<FileData> {
    let meta = fs::metadata(path).await.map_err(|e| WatchStoreError::Stat {
        path: path.to_path_buf(),
        source: e,
    })?;

    if meta.is_dir() {
        return Err(WatchStoreError::IsDirectory(path.to_path_buf()));
    }

    let content_type = mime::content_type_for(path);
    let bytes = fs::read(path).await.map_err(|e| WatchStoreError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    match mime::encoding_for(content_type) {
        Some(_) => match String::from_utf8(bytes) {
            Ok(text) => Ok(FileData::text(text)),
            Err(e) => {
                debug!("{} is not valid UTF-8, keeping bytes", path.display());
                Ok(FileData::binary(e.into_bytes()))
            }
        },
        None => Ok(FileData::binary(bytes)),
    }
}

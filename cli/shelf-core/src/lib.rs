pub mod auth;
pub mod session;

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use auth::{CredentialVerifier, Credentials, Registration, UncheckedVerifier};
pub use session::{
    FileStorage,
    MemoryStorage,
    SESSION_FILE_NAME,
    SessionError,
    SessionRecord,
    SessionStorage,
    SessionStore,
    StorageError,
};

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("file stored in an invalid location: {0}")]
    InvalidLocation(PathBuf),
    #[error("failed to create directory {0}")]
    CreateDir(PathBuf, #[source] std::io::Error),
    #[error("failed to open temporary file")]
    OpenTmpFile(#[source] std::io::Error),
    #[error("failed to rename temporary file")]
    RenameTmpFile(#[source] tempfile::PersistError),
    #[error("failed to write temporary file")]
    WriteTmpFile(#[source] serde_json::Error),
}

/// Serialize a value and write it to disk atomically.
///
/// First the value is written to a temporary file,
/// and then it is renamed so the write appears atomic.
/// `path` must have a parent directory, which is created if missing.
pub fn serialize_atomically<T>(value: &T, path: &impl AsRef<Path>) -> Result<(), SerializeError>
where
    T: ?Sized + Serialize,
{
    let parent = path.as_ref().parent().ok_or(
        // This error is thrown in the unlikely scenario that `path` is:
        // - An empty string
        // - `/`
        // - `.`
        SerializeError::InvalidLocation(path.as_ref().to_path_buf()),
    )?;
    std::fs::create_dir_all(parent)
        .map_err(|e| SerializeError::CreateDir(parent.to_path_buf(), e))?;
    let temp_file = tempfile::NamedTempFile::new_in(parent).map_err(SerializeError::OpenTmpFile)?;

    let writer = BufWriter::new(&temp_file);
    serde_json::to_writer_pretty(writer, value).map_err(SerializeError::WriteTmpFile)?;
    temp_file
        .persist(path.as_ref())
        .map_err(SerializeError::RenameTmpFile)?;
    Ok(())
}

/// Returns a `tracing`-compatible form of a [Path]
pub fn traceable_path(p: impl AsRef<Path>) -> impl tracing::Value {
    let path = p.as_ref();
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_atomically_creates_parent() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("nested").join("value.json");

        serialize_atomically(&vec![1, 2, 3], &path).unwrap();

        let written: Vec<u8> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[test]
    fn serialize_atomically_rejects_root() {
        let result = serialize_atomically(&1, &Path::new("/"));
        assert!(matches!(result, Err(SerializeError::InvalidLocation(_))));
    }
}

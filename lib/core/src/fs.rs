//! Crash-safe file replacement.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replaces the file at `path` with `contents`.
///
/// The bytes go to a temporary file in the same directory, are flushed to
/// disk, and the temporary file is renamed over `path`. Readers observe
/// either the previous contents or the new contents, never a partial write.
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or any write,
/// sync or rename step fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    // Make the rename itself durable. Not every platform allows opening a
    // directory, so a failure here is ignored.
    if let Ok(handle) = std::fs::File::open(dir) {
        let _ = handle.sync_all();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_new_file_and_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.json");

        write_atomic(&path, b"{}").expect("write");

        assert_eq!(std::fs::read(&path).expect("read"), b"{}");
    }

    #[test]
    fn replaces_existing_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"old contents that are longer").expect("seed");

        write_atomic(&path, b"new").expect("write");

        assert_eq!(std::fs::read(&path).expect("read"), b"new");
        let leftovers = std::fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(leftovers, 1);
    }
}

//! Scoped staging directories for tool invocations.
//!
//! Every invocation owns its temporary and output directories
//! exclusively. Directories are cleared and recreated at the start of a
//! run even when a prior run left stale contents, so re-invocation is
//! idempotent.

use std::fs;
use std::io;
use std::path::Path;

/// Removes `path` recursively if it exists, then creates it empty.
pub fn recreate_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)
}

/// Copies each file into `dest`, flat, keeping only the file name.
///
/// Entries without a file name (e.g. a bare root path) are skipped.
pub fn copy_into<'a, I>(files: I, dest: &Path) -> io::Result<()>
where
    I: IntoIterator<Item = &'a std::path::PathBuf>,
{
    for file in files {
        if let Some(name) = file.file_name() {
            fs::copy(file, dest.join(name))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recreate_dir_clears_stale_contents() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("input");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.jar"), b"old").unwrap();

        recreate_dir(&dir).unwrap();

        assert!(dir.exists());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_into_is_flat() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("libs").join("nested");
        fs::create_dir_all(&src).unwrap();
        let jar = src.join("dep.jar");
        fs::write(&jar, b"bytes").unwrap();

        let dest = root.path().join("input");
        fs::create_dir_all(&dest).unwrap();
        copy_into([&jar], &dest).unwrap();

        assert!(dest.join("dep.jar").exists());
    }
}

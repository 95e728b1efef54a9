//! Utilities pertaining to filesystem and other os-level settings
//!

use std::fs::File;
use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::NamedTempFile;

use crate::errors::ConfigureError;

/// Create a directory path if it does not exist already
///
/// If the directory already exists no operations are performed
///
pub fn ensure_dir(dir: &Utf8Path) -> Result<(), ConfigureError> {
    if !dir.is_dir() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigureError::DirectoryNotWritable {
            dir: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Replace the file at `target` without ever exposing a partially written file
///
/// Content is written to a temporary file in the target directory, which is then renamed over
/// the target.
///
/// * `write_content` - writes the complete file content
/// * `mode` - unix permission bits for the final file, if given
///
pub fn write_file_atomic<F>(target: &Utf8Path, mode: Option<u32>, write_content: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let parent = match target.parent() {
        Some(x) if !x.as_str().is_empty() => x.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    let tmp = NamedTempFile::new_in(&parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        write_content(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(mode))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

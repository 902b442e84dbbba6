//! fileio — запись файлов: атомарная (tmp + fsync + rename) или на месте.
//!
//! Atomic mode:
//! - a symlink at the destination is followed, so the link itself survives;
//! - bytes go to a sibling `.~<name>.<rand>` file which inherits the permission
//!   bits of the file being replaced (new files get the umask default);
//! - the temp file is fsync'ed and renamed over the destination, so readers see
//!   either the old or the new content, never a torn write;
//! - on any failure the temp file is removed and the destination is untouched.
//!
//! In-place mode (`use_atomic_writing = false`) truncates and writes the
//! destination directly; no atomicity guarantee.
//!
//! PermissionDenied → ContentsError::Forbidden (403), missing parent → 404,
//! everything else → Internal.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{ContentsError, Result};
use crate::metrics::{record_atomic_write, record_inplace_write};
use crate::util::is_writable;

#[derive(Debug, Clone, Copy)]
pub struct FileIo {
    atomic: bool,
}

impl FileIo {
    pub fn new(use_atomic_writing: bool) -> Self {
        Self {
            atomic: use_atomic_writing,
        }
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    /// Replace the content of `path` with `bytes`.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.write_with(path, |f| f.write_all(bytes))
    }

    /// Replace the content of `path` with whatever `fill` writes.
    ///
    /// If `fill` fails in atomic mode the destination keeps its old content.
    pub fn write_with<F>(&self, path: &Path, fill: F) -> Result<()>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        // An existing read-only file must not be replaced behind the OS's back.
        if target.exists() && !is_writable(&target) {
            return Err(ContentsError::forbidden(format!(
                "Permission denied: {}",
                path.display()
            )));
        }

        let res = if self.atomic {
            write_atomic(&target, fill)
        } else {
            write_in_place(&target, fill)
        };
        let written = res.map_err(|e| ContentsError::from_io(e, format!("write {}", path.display())))?;

        if self.atomic {
            record_atomic_write(written);
        } else {
            record_inplace_write(written);
        }
        debug!(
            "fileio: wrote {} B to {} (atomic={})",
            written,
            target.display(),
            self.atomic
        );
        Ok(())
    }

    /// Read the whole file.
    pub fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let mut f = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|e| ContentsError::from_io(e, format!("open {}", path.display())))?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)
            .map_err(|e| ContentsError::from_io(e, format!("read {}", path.display())))?;
        Ok(buf)
    }

    /// Copy `src` over `dst` through the writer; permission bits follow the source.
    pub fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        let bytes = self.read_bytes(src)?;
        self.write(dst, &bytes)?;
        match fs::metadata(src) {
            Ok(md) => {
                if let Err(e) = fs::set_permissions(dst, md.permissions()) {
                    warn!("fileio: copy permissions {} -> {}: {}", src.display(), dst.display(), e);
                }
            }
            Err(e) => warn!("fileio: stat {}: {}", src.display(), e),
        }
        Ok(())
    }
}

impl Default for FileIo {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Sibling temp name: `.~<name>.<16 hex>`.
fn temp_path_for(target: &Path) -> io::Result<PathBuf> {
    let dir = target.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent directory")
    })?;
    let name = target.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name")
    })?;
    Ok(dir.join(format!(".~{}.{:016x}", name.to_string_lossy(), rand::random::<u64>())))
}

fn write_atomic<F>(target: &Path, fill: F) -> io::Result<u64>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let tmp = temp_path_for(target)?;
    let perms = fs::metadata(target).ok().map(|m| m.permissions());

    let res = (|| -> io::Result<u64> {
        let mut f = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
        fill(&mut f)?;
        f.flush()?;
        if let Some(p) = perms {
            f.set_permissions(p)?;
        }
        f.sync_all()?;
        let len = f.metadata()?.len();
        drop(f);
        fs::rename(&tmp, target)?;
        Ok(len)
    })();

    if res.is_err() {
        // best-effort: the destination was never touched
        let _ = fs::remove_file(&tmp);
    }
    res
}

fn write_in_place<F>(target: &Path, fill: F) -> io::Result<u64>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(target)?;
    fill(&mut f)?;
    f.flush()?;
    f.sync_all()?;
    Ok(f.metadata()?.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_name_is_hidden_sibling() {
        let t = temp_path_for(Path::new("/a/b/penguin")).unwrap();
        assert_eq!(t.parent(), Some(Path::new("/a/b")));
        let name = t.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(".~penguin."), "got {name}");
        assert_eq!(name.len(), ".~penguin.".len() + 16);
    }
}

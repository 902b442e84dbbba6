//! manager/rename — update / rename; контрольные точки переезжают вместе с записью.

use std::fs;
use std::path::Path;

use log::info;

use crate::entry::{Entry, Model};
use crate::error::{ContentsError, Result};
use crate::metrics::record_rename;

use super::core::ContentsManager;

impl ContentsManager {
    /// Apply a model to `path`: if `model.path` names another location the
    /// entry is renamed there. Returns the entry at its final path, without content.
    pub fn update(&self, model: Model, path: &str) -> Result<Entry> {
        let r = self.sandbox.resolve(path)?;
        let new_api = match &model.path {
            Some(p) => self.sandbox.resolve(p)?.api,
            None => r.api.clone(),
        };
        if new_api != r.api {
            self.rename(&r.api, &new_api)?;
        }
        self.get(&new_api, false, None, None)
    }

    /// Move `old_path` to `new_path`. The destination must not exist unless
    /// it is the same file (case-only renames on case-insensitive filesystems).
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<()> {
        let old = self.sandbox.resolve(old_path)?;
        let new = self.sandbox.resolve(new_path)?;
        if old.api == new.api {
            return Ok(());
        }
        if self.sandbox.is_hidden(&old.api) || self.sandbox.is_hidden(&new.api) {
            return Err(ContentsError::bad_request(format!(
                "Cannot rename file or directory {:?}",
                old.api
            )));
        }
        if old.is_root() || new.is_root() {
            return Err(ContentsError::bad_request("Cannot rename the root directory"));
        }

        let old_md = fs::symlink_metadata(&old.os).map_err(|_| {
            ContentsError::not_found(format!("File or directory does not exist: {}", old.api))
        })?;
        if Self::occupied(&new.os) && !same_file(&old.os, &new.os) {
            return Err(ContentsError::conflict(format!("File already exists: {}", new.api)));
        }
        let is_dir = old_md.is_dir();
        if is_dir && new.api.starts_with(&format!("{}/", old.api)) {
            return Err(ContentsError::bad_request(format!(
                "Cannot move {} into itself",
                old.api
            )));
        }

        fs::rename(&old.os, &new.os).map_err(|e| {
            ContentsError::from_io(e, format!("rename {} -> {}", old.api, new.api))
        })?;
        record_rename();
        info!("contents: renamed {} -> {}", old.api, new.api);

        if is_dir {
            self.checkpoints.rename_directory(&old.api, &new.api)
        } else {
            self.checkpoints.rename_all_checkpoints(&old.api, &new.api)
        }
    }
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(x), Ok(y)) => x.dev() == y.dev() && x.ino() == y.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

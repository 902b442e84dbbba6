//! manager/delete — удаление (каталоги рекурсивно) вместе с контрольными точками.

use std::fs;

use log::info;

use crate::error::{ContentsError, Result};
use crate::metrics::record_delete;

use super::core::ContentsManager;

impl ContentsManager {
    pub fn delete(&self, path: &str) -> Result<()> {
        let r = self.sandbox.resolve(path)?;
        if r.is_root() {
            return Err(ContentsError::bad_request("Can't delete root"));
        }
        self.sandbox.deny_hidden_write(&r, "delete")?;

        let md = fs::symlink_metadata(&r.os).map_err(|_| {
            ContentsError::not_found(format!("File or directory does not exist: {}", r.api))
        })?;

        // a symlink is removed itself, never what it points to
        let is_dir = md.is_dir();
        let res = if is_dir {
            fs::remove_dir_all(&r.os)
        } else {
            fs::remove_file(&r.os)
        };
        res.map_err(|e| ContentsError::from_io(e, format!("delete {}", r.api)))?;
        record_delete();
        info!("contents: deleted {}{}", r.api, if is_dir { "/" } else { "" });

        if is_dir {
            self.checkpoints.delete_directory(&r.api)
        } else {
            self.checkpoints.delete_all_checkpoints(&r.api)
        }
    }
}

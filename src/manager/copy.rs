//! manager/copy — копирование файлов и ноутбуков (каталоги не копируются).
//!
//! Destination rules:
//! - `to` omitted → the source's directory;
//! - `to` an existing directory → `<to>/<name>-CopyN<ext>`, with earlier
//!   `-CopyN.` markers stripped from the source name first;
//! - otherwise `to` is the full target path and must not exist (409).

use log::info;

use crate::entry::{Entry, Model};
use crate::error::{ContentsError, Result};
use crate::metrics::record_copy;
use crate::naming::{increment_filename, strip_copy_suffix};
use crate::sandbox::{join_api_path, split_api_path};

use super::core::ContentsManager;

impl ContentsManager {
    pub fn copy(&self, from_path: &str, to_path: Option<&str>) -> Result<Entry> {
        let from = self.sandbox.resolve(from_path)?;
        let to = match to_path {
            Some(p) => Some(self.sandbox.resolve(p)?),
            None => None,
        };
        let to_hidden = to.as_ref().map_or(false, |t| self.sandbox.is_hidden(&t.api));
        if self.sandbox.is_hidden(&from.api) || to_hidden {
            return Err(ContentsError::bad_request(format!(
                "Cannot copy file or directory {:?}",
                from.api
            )));
        }

        let source = self.get(&from.api, true, None, None)?;
        if source.is_dir() {
            return Err(ContentsError::bad_request("Can't copy directories"));
        }

        let (from_dir, from_name) = split_api_path(&from.api);
        let to_api = match &to {
            Some(t) => t.api.clone(),
            None => from_dir.to_string(),
        };
        let target = if self.dir_exists(&to_api) {
            let dir_os = self.os_path(&to_api);
            let name = increment_filename(&strip_copy_suffix(from_name), "-Copy", |candidate| {
                Self::occupied(&dir_os.join(candidate))
            });
            join_api_path(&to_api, &name)
        } else {
            if Self::occupied(&self.os_path(&to_api)) {
                return Err(ContentsError::conflict(format!("File already exists: {to_api}")));
            }
            to_api
        };

        let model = Model {
            path: None,
            format: source.format,
            content: source.content,
        };
        let entry = self.save(model, &target)?;
        record_copy();
        info!("contents: copied {} -> {}", from.api, entry.path);
        Ok(entry)
    }
}

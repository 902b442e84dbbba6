//! manager/save — запись записей: save / new / new_untitled.
//!
//! Order of checks in `save`: escape (404) → hidden (400) → shape of the model
//! (400) → write. A notebook is signed if all its cells are trusted and gets
//! its first checkpoint on the first save.

use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use log::debug;

use crate::entry::{Content, Entry, EntryType, Format, Model};
use crate::error::{ContentsError, Result};
use crate::metrics::record_save;
use crate::naming::increment_filename;
use crate::notebook::{write_notebook, Notebook};
use crate::sandbox::{join_api_path, to_os_path, Resolved};

use super::core::ContentsManager;

impl ContentsManager {
    /// Persist `model` at `path` and return `get(path, content = false)`
    /// (plus the notebook validation message, if any).
    pub fn save(&self, model: Model, path: &str) -> Result<Entry> {
        record_save();
        let r = self.sandbox.resolve(path)?;
        self.sandbox.deny_hidden_write(&r, "create")?;

        let mut model = model;
        if model.content.is_empty() && !matches!(model.content, Content::Directory(_)) {
            return Err(ContentsError::bad_request("No file content provided"));
        }
        if r.is_root() && !matches!(model.content, Content::Directory(_)) {
            return Err(ContentsError::bad_request("Cannot overwrite the root directory"));
        }
        debug!("contents: saving {}", r.api);
        self.run_pre_save_hook(&mut model, &r.api);

        let mut validation_message = None;
        let os_path = match model.content {
            Content::Notebook(Some(mut nb)) => {
                validation_message = nb.validate();
                self.check_and_sign(&mut nb, &r.api);
                let target = self.file_target(&r)?;
                let bytes = write_notebook(&nb)?;
                self.io.write(&target, &bytes)?;
                if self.checkpoints.list_checkpoints(&r.api)?.is_empty() {
                    self.checkpoints.create_checkpoint(&r.api)?;
                }
                target
            }
            Content::File(Some(text)) => {
                let bytes = encode_file(text, model.format, &r.api)?;
                let target = self.file_target(&r)?;
                self.io.write(&target, &bytes)?;
                target
            }
            Content::Directory(_) => {
                self.save_directory(&r)?;
                r.os.clone()
            }
            Content::Notebook(None) | Content::File(None) => {
                return Err(ContentsError::bad_request("No file content provided"));
            }
        };

        let mut entry = self.entry_at(&r, false, None, None)?;
        entry.message = validation_message;
        self.run_post_save_hook(&os_path, &entry);
        Ok(entry)
    }

    /// Create `path` from `model`, filling in empty content: an empty notebook
    /// for `.ipynb`, an empty text file otherwise.
    pub fn new(&self, model: Option<Model>, path: &str) -> Result<Entry> {
        let r = self.sandbox.resolve(path)?;
        let (dir, _) = crate::sandbox::split_api_path(&r.api);
        if !self.dir_exists(dir) {
            return Err(ContentsError::not_found(format!("No such directory: {dir}")));
        }

        let is_nb = r.api.ends_with(".ipynb");
        let model = match model {
            Some(m) if !m.content.is_empty() => m,
            Some(Model {
                content: Content::Directory(_),
                ..
            }) => Model::directory(),
            Some(Model {
                content: Content::Notebook(None),
                ..
            }) => Model::notebook(Notebook::new()),
            Some(_) => Model::text(""),
            None if is_nb => Model::notebook(Notebook::new()),
            None => Model::text(""),
        };
        self.save(model, &r.api)
    }

    /// Create a fresh `Untitled*` entry in directory `path`.
    ///
    /// Type defaults to notebook when `ext == ".ipynb"`, file otherwise.
    /// `ext` is appended for files and directories; notebooks always end in `.ipynb`.
    pub fn new_untitled(&self, path: &str, type_: Option<EntryType>, ext: &str) -> Result<Entry> {
        let r = self.sandbox.resolve(path)?;
        if !self.dir_exists(&r.api) {
            return Err(ContentsError::not_found(format!("No such directory: {}", r.api)));
        }

        let type_ = type_.unwrap_or(if ext == ".ipynb" {
            EntryType::Notebook
        } else {
            EntryType::File
        });
        let (base, ext, insert, model) = match type_ {
            EntryType::Directory => (&self.cfg.untitled_directory, ext, " ", Model::directory()),
            EntryType::Notebook => (
                &self.cfg.untitled_notebook,
                ".ipynb",
                "",
                Model::notebook(Notebook::new()),
            ),
            EntryType::File => (&self.cfg.untitled_file, ext, "", Model::text("")),
        };

        let dir_os = r.os.clone();
        let name = increment_filename(&format!("{base}{ext}"), insert, |candidate| {
            Self::occupied(&dir_os.join(candidate))
        });
        self.save(model, &join_api_path(&r.api, &name))
    }

    /// Where the bytes of a file/notebook save land (symlinks followed).
    fn file_target(&self, r: &Resolved) -> Result<PathBuf> {
        if r.os.is_dir() {
            return Err(ContentsError::bad_request(format!("{} is a directory", r.api)));
        }
        self.sandbox.write_target(r)
    }

    fn save_directory(&self, r: &Resolved) -> Result<()> {
        match fs::symlink_metadata(&r.os) {
            Err(_) => fs::create_dir(&r.os)
                .map_err(|e| ContentsError::from_io(e, format!("mkdir {}", r.api))),
            Ok(_) if r.os.is_dir() => Ok(()),
            Ok(_) => Err(ContentsError::bad_request(format!("Not a directory: {}", r.api))),
        }
    }

    /// On-disk path of an API path (no checks).
    pub(crate) fn os_path(&self, api: &str) -> PathBuf {
        to_os_path(api, self.sandbox.root())
    }
}

fn encode_file(content: String, format: Option<Format>, what: &str) -> Result<Vec<u8>> {
    match format {
        Some(Format::Text) => Ok(content.into_bytes()),
        Some(Format::Base64) => {
            let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            B64.decode(compact.as_bytes())
                .map_err(|e| ContentsError::bad_request(format!("Encoding error saving {what}: {e}")))
        }
        _ => Err(ContentsError::bad_request(
            "Must specify format of file contents as 'text' or 'base64'",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_tolerates_line_breaks() {
        let bytes = encode_file("AAEC\n/w==\n".into(), Some(Format::Base64), "x").unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 255]);
    }

    #[test]
    fn bad_base64_and_missing_format_are_400() {
        assert_eq!(
            encode_file("!!".into(), Some(Format::Base64), "x").unwrap_err().status_code(),
            400
        );
        assert_eq!(encode_file("a".into(), None, "x").unwrap_err().status_code(), 400);
    }
}

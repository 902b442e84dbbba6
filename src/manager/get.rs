//! manager/get — чтение записей и листинг каталогов.
//!
//! Listing rules:
//! - children are exactly what `get(child, content = false)` returns;
//! - hidden names and hide globs are filtered out;
//! - dangling symlinks are listed (as files, typed by extension) unless
//!   their target would land outside the root;
//! - cyclic symlinks, symlinks to the listed directory or any of its ancestors
//!   and symlinks leading outside the root are skipped;
//! - sockets, FIFOs and devices are skipped.

use std::fs::{self, Metadata};

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use log::{debug, warn};

use crate::entry::{guess_mimetype, Content, Entry, EntryType, Format};
use crate::error::{ContentsError, Result};
use crate::metrics::{record_get, record_listing_skip};
use crate::notebook::read_notebook;
use crate::sandbox::{join_api_path, links, walk_link, LinkTarget, Resolved};
use crate::util::{created_utc, is_writable, modified_utc};

use super::core::ContentsManager;

impl ContentsManager {
    /// Fetch the entry at `path`.
    ///
    /// `type_` forces the interpretation (a `.ipynb` may be read as a plain
    /// file); `format` selects text/base64 for files.
    pub fn get(
        &self,
        path: &str,
        content: bool,
        type_: Option<EntryType>,
        format: Option<Format>,
    ) -> Result<Entry> {
        record_get();
        let r = self.sandbox.resolve(path)?;
        self.sandbox.deny_hidden_read(&r)?;
        self.entry_at(&r, content, type_, format)
    }

    pub(crate) fn entry_at(
        &self,
        r: &Resolved,
        content: bool,
        type_: Option<EntryType>,
        format: Option<Format>,
    ) -> Result<Entry> {
        let md = self.stat(r)?;

        if md.is_dir() {
            if let Some(t) = type_ {
                if t != EntryType::Directory {
                    return Err(ContentsError::bad_request(format!(
                        "{} is a directory, not a {}",
                        r.api,
                        type_name(t)
                    )));
                }
            }
            return self.dir_model(r, &md, content);
        }

        if type_ == Some(EntryType::Directory) {
            return Err(ContentsError::bad_request(format!("{} is not a directory", r.api)));
        }
        if !(md.is_file() || md.file_type().is_symlink()) {
            return Err(ContentsError::bad_request(format!("{} is not a regular file", r.api)));
        }
        if type_ == Some(EntryType::Notebook) || (type_.is_none() && r.api.ends_with(".ipynb")) {
            self.notebook_model(r, &md, content)
        } else {
            self.file_model(r, &md, content, format)
        }
    }

    /// Metadata of the target (symlinks followed), or of the link itself when
    /// it dangles. Cyclic links look missing.
    fn stat(&self, r: &Resolved) -> Result<Metadata> {
        let lmd = fs::symlink_metadata(&r.os)
            .map_err(|e| ContentsError::from_io(e, r.api.as_str()))?;
        if !lmd.file_type().is_symlink() {
            return Ok(lmd);
        }
        match walk_link(&r.os) {
            LinkTarget::Broken(_) => Ok(lmd),
            LinkTarget::Cycle => Err(ContentsError::not_found(format!(
                "{}: too many levels of symbolic links",
                r.api
            ))),
            LinkTarget::Resolved(_) | LinkTarget::NotALink => {
                fs::metadata(&r.os).map_err(|e| ContentsError::from_io(e, r.api.as_str()))
            }
        }
    }

    fn base_model(&self, r: &Resolved, md: &Metadata, content: Content) -> Entry {
        Entry {
            name: r.name().to_string(),
            path: r.api.clone(),
            content,
            format: None,
            mimetype: None,
            writable: is_writable(&r.os),
            created: created_utc(md, &r.os),
            last_modified: modified_utc(md, &r.os),
            size: if md.is_dir() { None } else { Some(md.len()) },
            message: None,
        }
    }

    fn dir_model(&self, r: &Resolved, md: &Metadata, content: bool) -> Result<Entry> {
        let mut entry = self.base_model(r, md, Content::Directory(None));
        if content {
            entry.content = Content::Directory(Some(self.list_dir(r)?));
            entry.format = Some(Format::Json);
        }
        Ok(entry)
    }

    fn list_dir(&self, r: &Resolved) -> Result<Vec<Entry>> {
        let here = fs::canonicalize(&r.os)
            .map_err(|e| ContentsError::from_io(e, format!("canonicalize {}", r.api)))?;
        let rd = fs::read_dir(&r.os).map_err(|e| ContentsError::from_io(e, format!("list {}", r.api)))?;

        let mut out = Vec::new();
        for ent in rd {
            let ent = match ent {
                Ok(e) => e,
                Err(e) => {
                    warn!("contents: error listing {}: {}", r.api, e);
                    continue;
                }
            };
            let name = match ent.file_name().into_string() {
                Ok(n) => n,
                Err(raw) => {
                    debug!("contents: skipping non-UTF-8 name {:?} in {}", raw, r.api);
                    record_listing_skip();
                    continue;
                }
            };
            if !self.sandbox.should_list(&name) {
                continue;
            }
            let child = Resolved {
                api: join_api_path(&r.api, &name),
                os: ent.path(),
            };
            if !self.listable(&child, &here) {
                record_listing_skip();
                continue;
            }
            match self.entry_at(&child, false, None, None) {
                Ok(e) => out.push(e),
                Err(e) => {
                    debug!("contents: skipping {}: {}", child.api, e);
                    record_listing_skip();
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Filter for one directory child; `here` is the canonical listed directory.
    fn listable(&self, child: &Resolved, here: &std::path::Path) -> bool {
        let lmd = match fs::symlink_metadata(&child.os) {
            Ok(md) => md,
            Err(_) => return false,
        };
        let ft = lmd.file_type();
        if ft.is_symlink() {
            return match walk_link(&child.os) {
                LinkTarget::Broken(target) => {
                    if !self.sandbox.contains(&target) {
                        debug!("contents: dangling {} leads outside the root", child.api);
                        return false;
                    }
                    true
                }
                LinkTarget::Cycle | LinkTarget::NotALink => false,
                LinkTarget::Resolved(target) => {
                    if !target.starts_with(self.sandbox.root()) {
                        debug!("contents: {} leads outside the root", child.api);
                        return false;
                    }
                    if links::loops_back(&target, here) {
                        debug!("contents: {} points back at an ancestor", child.api);
                        return false;
                    }
                    target.is_file() || target.is_dir()
                }
            };
        }
        ft.is_file() || ft.is_dir()
    }

    fn file_model(
        &self,
        r: &Resolved,
        md: &Metadata,
        content: bool,
        format: Option<Format>,
    ) -> Result<Entry> {
        let mut entry = self.base_model(r, md, Content::File(None));
        entry.mimetype = guess_mimetype(r.name()).map(str::to_string);
        if content {
            let bytes = self.io.read_bytes(&r.os)?;
            let (text, fmt) = decode_file(bytes, format, &r.api)?;
            if entry.mimetype.is_none() {
                entry.mimetype = Some(
                    match fmt {
                        Format::Text => "text/plain",
                        _ => "application/octet-stream",
                    }
                    .to_string(),
                );
            }
            entry.content = Content::File(Some(text));
            entry.format = Some(fmt);
        }
        Ok(entry)
    }

    fn notebook_model(&self, r: &Resolved, md: &Metadata, content: bool) -> Result<Entry> {
        let mut entry = self.base_model(r, md, Content::Notebook(None));
        if content {
            let bytes = self.io.read_bytes(&r.os)?;
            let mut nb = read_notebook(&bytes, &r.api)?;
            self.mark_trusted_cells(&mut nb, &r.api);
            entry.message = nb.validate();
            entry.content = Content::Notebook(Some(nb));
            entry.format = Some(Format::Json);
        }
        Ok(entry)
    }
}

/// Text if requested or if the bytes are UTF-8, base64 otherwise.
fn decode_file(bytes: Vec<u8>, format: Option<Format>, what: &str) -> Result<(String, Format)> {
    match format {
        Some(Format::Base64) => Ok((B64.encode(&bytes), Format::Base64)),
        Some(Format::Text) => String::from_utf8(bytes)
            .map(|s| (s, Format::Text))
            .map_err(|_| ContentsError::bad_request(format!("{what} is not UTF-8 encoded"))),
        // json has no meaning for plain files: same as "don't care"
        None | Some(Format::Json) => match String::from_utf8(bytes) {
            Ok(s) => Ok((s, Format::Text)),
            Err(e) => Ok((B64.encode(e.into_bytes()), Format::Base64)),
        },
    }
}

fn type_name(t: EntryType) -> &'static str {
    match t {
        EntryType::File => "file",
        EntryType::Notebook => "notebook",
        EntryType::Directory => "directory",
    }
}

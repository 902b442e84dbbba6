//! checkpoints/file — снимки в виде файлов рядом с деревом (или в отдельном корне).
//!
//! Layout: `<cp_root>/<dir>/.ipynb_checkpoints/<stem>-<id><ext>`, where
//! `<cp_root>` is the contents root unless a separate checkpoint root is
//! configured. Ids are `checkpoint`, `checkpoint-1`, `checkpoint-2`, ... and
//! only grow; once `max_checkpoints` snapshots exist the oldest is evicted.
//! With a cap of 1 the single `checkpoint` is overwritten in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::checkpoints::{CheckpointModel, Checkpoints, DEFAULT_CHECKPOINT_ID};
use crate::error::{ContentsError, Result};
use crate::fileio::FileIo;
use crate::metrics::{record_checkpoint_created, record_checkpoint_evicted, record_checkpoint_restored};
use crate::sandbox::{split_api_path, to_os_path};
use crate::util::modified_utc;

pub const CHECKPOINT_DIR: &str = ".ipynb_checkpoints";

#[derive(Debug, Clone)]
pub struct FileCheckpoints {
    contents_root: PathBuf,
    checkpoint_root: PathBuf,
    separate_root: bool,
    max_checkpoints: usize,
    io: FileIo,
}

impl FileCheckpoints {
    /// `contents_root` must already be canonical (the sandbox root). A separate
    /// `checkpoint_root` is created when missing.
    pub fn new(
        contents_root: &Path,
        checkpoint_root: Option<&Path>,
        max_checkpoints: usize,
        io: FileIo,
    ) -> Result<Self> {
        let (cp_root, separate) = match checkpoint_root {
            Some(p) => {
                fs::create_dir_all(p).map_err(|e| {
                    ContentsError::Config(format!("create checkpoint_root {}: {}", p.display(), e))
                })?;
                let real = fs::canonicalize(p).map_err(|e| {
                    ContentsError::Config(format!("canonicalize checkpoint_root {}: {}", p.display(), e))
                })?;
                let separate = real != contents_root;
                (real, separate)
            }
            None => (contents_root.to_path_buf(), false),
        };
        debug!(
            "checkpoints: root={}, separate={}, max={}",
            cp_root.display(),
            separate,
            max_checkpoints
        );
        Ok(Self {
            contents_root: contents_root.to_path_buf(),
            checkpoint_root: cp_root,
            separate_root: separate,
            max_checkpoints: max_checkpoints.max(1),
            io,
        })
    }

    pub fn checkpoint_root(&self) -> &Path {
        &self.checkpoint_root
    }

    pub fn max_checkpoints(&self) -> usize {
        self.max_checkpoints
    }

    /// On-disk location of checkpoint `checkpoint_id` of API path `path`.
    pub fn checkpoint_path(&self, checkpoint_id: &str, path: &str) -> PathBuf {
        let (dir, name) = split_api_path(path);
        let (stem, ext) = split_ext(name);
        to_os_path(dir, &self.checkpoint_root)
            .join(CHECKPOINT_DIR)
            .join(format!("{stem}-{checkpoint_id}{ext}"))
    }

    fn live_path(&self, path: &str) -> PathBuf {
        to_os_path(path, &self.contents_root)
    }

    fn model(&self, id: &str, cp: &Path) -> Result<CheckpointModel> {
        let md = fs::metadata(cp)
            .map_err(|e| ContentsError::from_io(e, format!("stat checkpoint {}", cp.display())))?;
        Ok(CheckpointModel {
            id: id.to_string(),
            last_modified: modified_utc(&md, cp),
        })
    }

    fn missing(checkpoint_id: &str, path: &str) -> ContentsError {
        ContentsError::not_found(format!("checkpoint {checkpoint_id} does not exist for {path}"))
    }
}

impl Checkpoints for FileCheckpoints {
    fn create_checkpoint(&self, path: &str) -> Result<CheckpointModel> {
        let src = self.live_path(path);
        if !src.is_file() {
            return Err(ContentsError::not_found(format!("{path}: no such file")));
        }

        let id = if self.max_checkpoints <= 1 {
            DEFAULT_CHECKPOINT_ID.to_string()
        } else {
            let mut existing = self.list_checkpoints(path)?;
            let next = next_checkpoint_id(existing.iter().map(|c| c.id.as_str()));
            while existing.len() >= self.max_checkpoints {
                let oldest = existing.remove(0);
                let p = self.checkpoint_path(&oldest.id, path);
                fs::remove_file(&p)
                    .map_err(|e| ContentsError::from_io(e, format!("evict {}", p.display())))?;
                record_checkpoint_evicted();
                debug!("checkpoints: evicted {} of {}", oldest.id, path);
            }
            next
        };

        let dest = self.checkpoint_path(&id, path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ContentsError::from_io(e, format!("create {}", parent.display())))?;
        }
        self.io.copy_file(&src, &dest)?;
        record_checkpoint_created();
        info!("checkpoint {} created for {}", id, path);
        self.model(&id, &dest)
    }

    fn list_checkpoints(&self, path: &str) -> Result<Vec<CheckpointModel>> {
        let probe = self.checkpoint_path(DEFAULT_CHECKPOINT_ID, path);
        let dir = match probe.parent() {
            Some(d) => d,
            None => return Ok(Vec::new()),
        };
        let rd = match fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ContentsError::from_io(e, format!("list {}", dir.display()))),
        };

        let (_, name) = split_api_path(path);
        let (stem, ext) = split_ext(name);
        let mut out = Vec::new();
        for ent in rd {
            let ent = ent.map_err(|e| ContentsError::from_io(e, format!("list {}", dir.display())))?;
            let fname = ent.file_name();
            let fname = match fname.to_str() {
                Some(s) => s,
                None => continue,
            };
            if let Some(id) = parse_checkpoint_id(fname, stem, ext) {
                out.push(self.model(id, &ent.path())?);
            }
        }
        out.sort_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| id_ordinal(&a.id).cmp(&id_ordinal(&b.id)))
        });
        Ok(out)
    }

    fn restore_checkpoint(&self, checkpoint_id: &str, path: &str) -> Result<()> {
        check_id(checkpoint_id, path)?;
        let cp = self.checkpoint_path(checkpoint_id, path);
        if !cp.is_file() {
            return Err(Self::missing(checkpoint_id, path));
        }
        let bytes = self.io.read_bytes(&cp)?;
        self.io.write(&self.live_path(path), &bytes)?;
        record_checkpoint_restored();
        info!("checkpoint {} restored over {}", checkpoint_id, path);
        Ok(())
    }

    fn delete_checkpoint(&self, checkpoint_id: &str, path: &str) -> Result<()> {
        check_id(checkpoint_id, path)?;
        let cp = self.checkpoint_path(checkpoint_id, path);
        match fs::remove_file(&cp) {
            Ok(()) => {
                debug!("checkpoints: deleted {} of {}", checkpoint_id, path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Self::missing(checkpoint_id, path)),
            Err(e) => Err(ContentsError::from_io(e, format!("delete {}", cp.display()))),
        }
    }

    fn rename_checkpoint(&self, checkpoint_id: &str, old_path: &str, new_path: &str) -> Result<()> {
        check_id(checkpoint_id, old_path)?;
        let old_cp = self.checkpoint_path(checkpoint_id, old_path);
        if !old_cp.is_file() {
            return Ok(());
        }
        let new_cp = self.checkpoint_path(checkpoint_id, new_path);
        if let Some(parent) = new_cp.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ContentsError::from_io(e, format!("create {}", parent.display())))?;
        }
        fs::rename(&old_cp, &new_cp).map_err(|e| {
            ContentsError::from_io(e, format!("rename {} -> {}", old_cp.display(), new_cp.display()))
        })?;
        debug!("checkpoints: moved {} {} -> {}", checkpoint_id, old_path, new_path);
        Ok(())
    }

    fn rename_directory(&self, old_path: &str, new_path: &str) -> Result<()> {
        if !self.separate_root {
            return Ok(());
        }
        let old_dir = to_os_path(old_path, &self.checkpoint_root);
        if !old_dir.is_dir() {
            return Ok(());
        }
        let new_dir = to_os_path(new_path, &self.checkpoint_root);
        if let Some(parent) = new_dir.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ContentsError::from_io(e, format!("create {}", parent.display())))?;
        }
        fs::rename(&old_dir, &new_dir).map_err(|e| {
            ContentsError::from_io(e, format!("rename {} -> {}", old_dir.display(), new_dir.display()))
        })
    }

    fn delete_directory(&self, path: &str) -> Result<()> {
        if !self.separate_root {
            return Ok(());
        }
        let dir = to_os_path(path, &self.checkpoint_root);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ContentsError::from_io(e, format!("delete {}", dir.display()))),
        }
    }
}

/// `os.path.splitext` semantics: the last dot, unless it starts the name.
fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && !name[..i].chars().all(|c| c == '.') => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}

fn check_id(checkpoint_id: &str, path: &str) -> Result<()> {
    let ok = !checkpoint_id.is_empty()
        && !checkpoint_id.starts_with('.')
        && !checkpoint_id.contains(['/', '\\', '\0']);
    if ok {
        Ok(())
    } else {
        Err(FileCheckpoints::missing(checkpoint_id, path))
    }
}

/// 0 for `checkpoint`, N for `checkpoint-N`, None for anything else.
fn id_ordinal(id: &str) -> Option<u64> {
    if id == DEFAULT_CHECKPOINT_ID {
        return Some(0);
    }
    let n = id.strip_prefix(DEFAULT_CHECKPOINT_ID)?.strip_prefix('-')?;
    if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    n.parse().ok()
}

fn parse_checkpoint_id<'a>(fname: &'a str, stem: &str, ext: &str) -> Option<&'a str> {
    let id = fname.strip_prefix(stem)?.strip_prefix('-')?.strip_suffix(ext)?;
    id_ordinal(id).map(|_| id)
}

fn next_checkpoint_id<'a, I>(ids: I) -> String
where
    I: Iterator<Item = &'a str>,
{
    match ids.filter_map(id_ordinal).max() {
        None => DEFAULT_CHECKPOINT_ID.to_string(),
        Some(n) => format!("{}-{}", DEFAULT_CHECKPOINT_ID, n + 1),
    }
}

//! manager/core — ContentsManager: поля, открытие, хуки, presence-хелперы.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{error, info};

use crate::checkpoints::{Checkpoints, FileCheckpoints};
use crate::config::{ContentsBuilder, ContentsConfig};
use crate::entry::{Entry, Model};
use crate::error::Result;
use crate::fileio::FileIo;
use crate::notary::NotebookNotary;
use crate::sandbox::Sandbox;

/// Runs before every save; may rewrite the model in place.
pub type PreSaveHook = Box<dyn Fn(&mut Model, &str) -> anyhow::Result<()> + Send + Sync>;
/// Runs after every successful save with the on-disk path and the saved entry.
pub type PostSaveHook = Box<dyn Fn(&Path, &Entry) -> anyhow::Result<()> + Send + Sync>;

pub struct ContentsManager {
    pub(crate) cfg: ContentsConfig,
    pub(crate) sandbox: Sandbox,
    pub(crate) io: FileIo,
    pub(crate) checkpoints: Box<dyn Checkpoints>,
    pub(crate) notary: NotebookNotary,
    pub(crate) pre_save_hook: Option<PreSaveHook>,
    pub(crate) post_save_hook: Option<PostSaveHook>,
}

impl ContentsManager {
    /// Open a store over `cfg.root_dir`. Fails with `ContentsError::Config`
    /// if the root is missing or not a directory, or a hide glob is malformed.
    pub fn open(cfg: ContentsConfig) -> Result<Self> {
        let sandbox = Sandbox::new(&cfg.root_dir, cfg.allow_hidden, &cfg.hide_globs)?;
        let io = FileIo::new(cfg.use_atomic_writing);
        let checkpoints = FileCheckpoints::new(
            sandbox.root(),
            cfg.checkpoint_root.as_deref(),
            cfg.max_checkpoints,
            io,
        )?;
        let notary = NotebookNotary::from_config(&cfg);
        info!("contents: opened {}", cfg);
        Ok(Self {
            cfg,
            sandbox,
            io,
            checkpoints: Box::new(checkpoints),
            notary,
            pre_save_hook: None,
            post_save_hook: None,
        })
    }

    /// Builder seeded from QC_* env vars; finish with `ContentsManager::open(b.build())`.
    pub fn builder() -> ContentsBuilder {
        ContentsBuilder::new()
    }

    /// Swap in another checkpoint backend.
    pub fn with_checkpoints(mut self, checkpoints: Box<dyn Checkpoints>) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn set_pre_save_hook(&mut self, hook: Option<PreSaveHook>) {
        self.pre_save_hook = hook;
    }

    pub fn set_post_save_hook(&mut self, hook: Option<PostSaveHook>) {
        self.post_save_hook = hook;
    }

    pub fn config(&self) -> &ContentsConfig {
        &self.cfg
    }

    /// Canonical root directory.
    pub fn root_dir(&self) -> &Path {
        self.sandbox.root()
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn notary(&self) -> &NotebookNotary {
        &self.notary
    }

    pub fn checkpoints(&self) -> &dyn Checkpoints {
        self.checkpoints.as_ref()
    }

    // ---------- presence ----------

    /// Regular file (symlinks followed) inside the sandbox.
    pub fn file_exists(&self, path: &str) -> bool {
        match self.sandbox.resolve(path) {
            Ok(r) => r.os.is_file(),
            Err(_) => false,
        }
    }

    /// Directory (symlinks followed) inside the sandbox.
    pub fn dir_exists(&self, path: &str) -> bool {
        match self.sandbox.resolve(path) {
            Ok(r) => r.os.is_dir(),
            Err(_) => false,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.file_exists(path) || self.dir_exists(path)
    }

    /// Whether `path` is hidden under the current policy. Escaping paths count as hidden.
    pub fn is_hidden(&self, path: &str) -> bool {
        match self.sandbox.resolve(path) {
            Ok(r) => self.sandbox.is_hidden(&r.api),
            Err(_) => true,
        }
    }

    /// Something (even a dangling symlink) already occupies `os`.
    pub(crate) fn occupied(os: &Path) -> bool {
        fs::symlink_metadata(os).is_ok()
    }

    // ---------- hooks ----------

    pub(crate) fn run_pre_save_hook(&self, model: &mut Model, path: &str) {
        if let Some(hook) = &self.pre_save_hook {
            if let Err(e) = hook(model, path) {
                error!("pre-save hook failed on {}: {:#}", path, e);
            }
        }
    }

    pub(crate) fn run_post_save_hook(&self, os_path: &Path, entry: &Entry) {
        if let Some(hook) = &self.post_save_hook {
            if let Err(e) = hook(os_path, entry) {
                error!("post-save hook failed on {}: {:#}", entry.path, e);
            }
        }
    }
}

impl fmt::Debug for ContentsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentsManager")
            .field("root", &self.sandbox.root())
            .field("atomic", &self.io.is_atomic())
            .field("pre_save_hook", &self.pre_save_hook.is_some())
            .field("post_save_hook", &self.post_save_hook.is_some())
            .finish()
    }
}

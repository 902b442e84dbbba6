//! Centralized configuration and builder for QuiverContents.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - ContentsConfig::from_env() reads QC_* variables; fluent `with_*` setters override them.
//! - ContentsBuilder returns a ContentsConfig which ContentsManager consumes.
//!
//! Recognized options:
//! - root_dir (QC_ROOT_DIR) — must exist and be a directory, checked by the sandbox.
//! - use_atomic_writing (QC_ATOMIC_WRITING, default true).
//! - allow_hidden (QC_ALLOW_HIDDEN, default false).
//! - hide_globs (QC_HIDE_GLOBS, comma separated) — names filtered out of listings.
//! - checkpoint_root (QC_CHECKPOINT_ROOT) — optional separate root for checkpoints.
//! - max_checkpoints (QC_MAX_CHECKPOINTS, default 1).
//! - data_dir / notary_secret_file (QC_DATA_DIR / QC_NOTARY_SECRET_FILE) — notary secret location.

use std::fmt;
use std::path::PathBuf;

/// Default names hidden from listings even when they do not start with a dot.
pub const DEFAULT_HIDE_GLOBS: &[&str] = &[
    "__pycache__",
    "*.pyc",
    "*.pyo",
    ".DS_Store",
    "*.so",
    "*.dylib",
    "*~",
];

/// Top-level configuration of a contents store.
#[derive(Clone)]
pub struct ContentsConfig {
    /// Root of the contents tree. Env: QC_ROOT_DIR (default ".").
    pub root_dir: PathBuf,

    /// Replace files via temp file + rename. Env: QC_ATOMIC_WRITING (default true).
    pub use_atomic_writing: bool,

    /// Serve and accept dot-prefixed names. Env: QC_ALLOW_HIDDEN (default false).
    pub allow_hidden: bool,

    /// Glob patterns of names excluded from directory listings.
    /// Env: QC_HIDE_GLOBS = "a,b,*.c" (default DEFAULT_HIDE_GLOBS).
    pub hide_globs: Vec<String>,

    /// Separate root for checkpoint files. None — same as root_dir.
    /// Env: QC_CHECKPOINT_ROOT
    pub checkpoint_root: Option<PathBuf>,

    /// How many checkpoints are kept per file (>= 1). Env: QC_MAX_CHECKPOINTS (default 1).
    pub max_checkpoints: usize,

    /// Directory holding the notary secret file. Env: QC_DATA_DIR
    /// (default $HOME/.local/share/quivercontents when HOME is set).
    pub data_dir: Option<PathBuf>,

    /// Explicit notary secret file (overrides data_dir). Env: QC_NOTARY_SECRET_FILE
    pub notary_secret_file: Option<PathBuf>,

    /// Explicit notary secret bytes (tests, embedding). Never read from env.
    pub notary_secret: Option<Vec<u8>>,

    /// Base names used by new_untitled().
    pub untitled_file: String,
    pub untitled_notebook: String,
    pub untitled_directory: String,
}

impl Default for ContentsConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            use_atomic_writing: true,
            allow_hidden: false,
            hide_globs: DEFAULT_HIDE_GLOBS.iter().map(|s| s.to_string()).collect(),
            checkpoint_root: None,
            max_checkpoints: 1,
            data_dir: None,
            notary_secret_file: None,
            notary_secret: None,
            untitled_file: "untitled".to_string(),
            untitled_notebook: "Untitled".to_string(),
            untitled_directory: "Untitled Folder".to_string(),
        }
    }
}

// Secret material must not leak through Debug output.
impl fmt::Debug for ContentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentsConfig")
            .field("root_dir", &self.root_dir)
            .field("use_atomic_writing", &self.use_atomic_writing)
            .field("allow_hidden", &self.allow_hidden)
            .field("hide_globs", &self.hide_globs)
            .field("checkpoint_root", &self.checkpoint_root)
            .field("max_checkpoints", &self.max_checkpoints)
            .field("data_dir", &self.data_dir)
            .field("notary_secret_file", &self.notary_secret_file)
            .field("notary_secret", &self.notary_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn env_flag(s: &str) -> bool {
    let s = s.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl ContentsConfig {
    /// Load configuration from QC_* environment variables on top of defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(p) = env_path("QC_ROOT_DIR") {
            cfg.root_dir = p;
        }

        if let Ok(v) = std::env::var("QC_ATOMIC_WRITING") {
            cfg.use_atomic_writing = env_flag(&v);
        }

        if let Ok(v) = std::env::var("QC_ALLOW_HIDDEN") {
            cfg.allow_hidden = env_flag(&v);
        }

        if let Ok(v) = std::env::var("QC_HIDE_GLOBS") {
            cfg.hide_globs = v
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
        }

        cfg.checkpoint_root = env_path("QC_CHECKPOINT_ROOT");

        if let Ok(v) = std::env::var("QC_MAX_CHECKPOINTS") {
            if let Ok(n) = v.trim().parse::<usize>() {
                cfg.max_checkpoints = n.max(1);
            }
        }

        cfg.data_dir = env_path("QC_DATA_DIR").or_else(default_data_dir);
        cfg.notary_secret_file = env_path("QC_NOTARY_SECRET_FILE");

        cfg
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_root_dir<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root_dir = root.into();
        self
    }

    pub fn with_atomic_writing(mut self, on: bool) -> Self {
        self.use_atomic_writing = on;
        self
    }

    pub fn with_allow_hidden(mut self, on: bool) -> Self {
        self.allow_hidden = on;
        self
    }

    pub fn with_hide_globs<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hide_globs = globs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_checkpoint_root<P: Into<PathBuf>>(mut self, root: Option<P>) -> Self {
        self.checkpoint_root = root.map(Into::into);
        self
    }

    pub fn with_max_checkpoints(mut self, n: usize) -> Self {
        self.max_checkpoints = n.max(1);
        self
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, dir: Option<P>) -> Self {
        self.data_dir = dir.map(Into::into);
        self
    }

    pub fn with_notary_secret_file<P: Into<PathBuf>>(mut self, file: Option<P>) -> Self {
        self.notary_secret_file = file.map(Into::into);
        self
    }

    pub fn with_notary_secret(mut self, secret: Option<Vec<u8>>) -> Self {
        self.notary_secret = secret;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }

    /// Where the notary secret lives, if anywhere on disk.
    pub fn secret_file_path(&self) -> Option<PathBuf> {
        self.notary_secret_file
            .clone()
            .or_else(|| self.data_dir.as_ref().map(|d| d.join("notebook_secret")))
    }
}

fn default_data_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(|h| PathBuf::from(h).join(".local/share/quivercontents"))
}

impl fmt::Display for ContentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContentsConfig {{ \
             root_dir: {}, \
             use_atomic_writing: {}, \
             allow_hidden: {}, \
             hide_globs: [{}], \
             checkpoint_root: {}, \
             max_checkpoints: {}, \
             notary_secret: {} \
             }}",
            self.root_dir.display(),
            self.use_atomic_writing,
            self.allow_hidden,
            self.hide_globs.join(","),
            self.checkpoint_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default(<root_dir>)".to_string()),
            self.max_checkpoints,
            if self.notary_secret.is_some() {
                "inline".to_string()
            } else {
                self.secret_file_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "ephemeral".to_string())
            },
        )
    }
}

/// Lightweight builder that produces a ContentsConfig.
/// ContentsManager exposes `ContentsManager::builder()` returning this builder.
#[derive(Clone, Debug)]
pub struct ContentsBuilder {
    cfg: ContentsConfig,
}

impl Default for ContentsBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: ContentsConfig::from_env(),
        }
    }
}

impl ContentsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: ContentsConfig::default(),
        }
    }

    pub fn root_dir<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.cfg.root_dir = root.into();
        self
    }

    pub fn use_atomic_writing(mut self, on: bool) -> Self {
        self.cfg.use_atomic_writing = on;
        self
    }

    pub fn allow_hidden(mut self, on: bool) -> Self {
        self.cfg.allow_hidden = on;
        self
    }

    pub fn checkpoint_root<P: Into<PathBuf>>(mut self, root: Option<P>) -> Self {
        self.cfg.checkpoint_root = root.map(Into::into);
        self
    }

    pub fn max_checkpoints(mut self, n: usize) -> Self {
        self.cfg.max_checkpoints = n.max(1);
        self
    }

    pub fn notary_secret(mut self, secret: Vec<u8>) -> Self {
        self.cfg.notary_secret = Some(secret);
        self
    }

    pub fn notary_secret_file<P: Into<PathBuf>>(mut self, file: P) -> Self {
        self.cfg.notary_secret_file = Some(file.into());
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> ContentsConfig {
        self.cfg
    }
}

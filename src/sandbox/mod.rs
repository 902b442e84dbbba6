//! sandbox — трансляция API-путей в пути ОС и единая точка проверок безопасности.
//!
//! API path: forward-slash separated, leading/trailing/duplicate slashes are
//! ignored, "" is the root. Rules enforced here:
//! - `..`, NUL and segments that would re-root the join are rejected as 404
//!   (escape looks exactly like "no such file");
//! - an existing path (symlinks followed) must canonicalize inside the root, else 404;
//! - dot-prefixed segments are hidden: callers map that to 404 on reads and
//!   400 on writes (see `deny_hidden_read` / `deny_hidden_write`);
//! - hide globs (`__pycache__`, `*.pyc`, ...) only filter listings;
//! - a dangling symlink counts as outside when its target would land outside;
//! - `.ipynb_checkpoints` is reserved: never listed, never a CRUD target,
//!   whatever `allow_hidden` says.
//!
//! Сам корень обязан существовать и быть каталогом — иначе ошибка конфигурации.

use std::fs;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};

use crate::checkpoints::CHECKPOINT_DIR;
use crate::error::{ContentsError, Result};

pub mod links;

pub use links::{walk_link, LinkTarget};

/// A validated API path together with its location on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Normalized API path ("" for the root).
    pub api: String,
    /// Path under the sandbox root (not canonicalized, symlinks kept).
    pub os: PathBuf,
}

impl Resolved {
    pub fn is_root(&self) -> bool {
        self.api.is_empty()
    }

    /// Last API segment ("" for the root).
    pub fn name(&self) -> &str {
        split_api_path(&self.api).1
    }
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    /// Canonical root directory.
    root: PathBuf,
    allow_hidden: bool,
    hide_globs: Vec<Pattern>,
}

impl Sandbox {
    /// Open a sandbox over `root`. The root must be an existing directory.
    pub fn new(root: &Path, allow_hidden: bool, hide_globs: &[String]) -> Result<Self> {
        let md = fs::metadata(root).map_err(|e| {
            ContentsError::Config(format!("root_dir {} is not accessible: {}", root.display(), e))
        })?;
        if !md.is_dir() {
            return Err(ContentsError::Config(format!(
                "root_dir {} is not a directory",
                root.display()
            )));
        }
        let root = fs::canonicalize(root).map_err(|e| {
            ContentsError::Config(format!("canonicalize root_dir {}: {}", root.display(), e))
        })?;

        let mut patterns = Vec::with_capacity(hide_globs.len());
        for g in hide_globs {
            match Pattern::new(g) {
                Ok(p) => patterns.push(p),
                Err(e) => {
                    return Err(ContentsError::Config(format!("bad hide glob '{}': {}", g, e)));
                }
            }
        }

        debug!("sandbox: root={}, allow_hidden={}", root.display(), allow_hidden);
        Ok(Self {
            root,
            allow_hidden,
            hide_globs: patterns,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn allow_hidden(&self) -> bool {
        self.allow_hidden
    }

    /// Normalize `api_path`, join it onto the root and run the escape checks.
    pub fn resolve(&self, api_path: &str) -> Result<Resolved> {
        let api = normalize_api_path(api_path)
            .ok_or_else(|| ContentsError::not_found(format!("{api_path}: no such file or directory")))?;
        let os = to_os_path(&api, &self.root);
        self.validate(&os)
            .map_err(|_| ContentsError::not_found(format!("{api}: no such file or directory")))?;
        Ok(Resolved { api, os })
    }

    /// Check that `os_path` stays inside the root once symlinks are followed.
    ///
    /// Paths that do not exist yet are judged by their nearest existing
    /// ancestor; a dangling symlink is judged by where its target would land.
    pub fn validate(&self, os_path: &Path) -> Result<PathBuf> {
        if os_path.starts_with(&self.root) && self.contains(os_path) {
            return Ok(os_path.to_path_buf());
        }
        debug!("sandbox: {} resolves outside root", os_path.display());
        Err(ContentsError::not_found(format!(
            "{} is outside the root contents directory",
            os_path.display()
        )))
    }

    /// True if `p` (existing or not) lands inside the root.
    pub fn contains(&self, p: &Path) -> bool {
        self.lands_inside(p, 0)
    }

    fn lands_inside(&self, p: &Path, depth: usize) -> bool {
        // dangling links whose targets hang off other dangling links
        if depth > links::MAX_HOPS {
            return false;
        }
        let mut probe: Option<&Path> = Some(p);
        while let Some(q) = probe {
            if let Ok(real) = fs::canonicalize(q) {
                return real.starts_with(&self.root);
            }
            if let LinkTarget::Broken(target) = walk_link(q) {
                if target != q {
                    return self.lands_inside(&target, depth + 1);
                }
            }
            probe = q.parent();
        }
        false
    }

    /// Final on-disk location a write to `r` would land on.
    ///
    /// A symlink at the destination is followed (the link survives the write)
    /// as long as its target stays inside the root; looping links are refused.
    pub fn write_target(&self, r: &Resolved) -> Result<PathBuf> {
        match walk_link(&r.os) {
            LinkTarget::NotALink => Ok(r.os.clone()),
            LinkTarget::Resolved(real) | LinkTarget::Broken(real) => {
                let inside = match real.parent() {
                    Some(parent) => fs::canonicalize(parent)
                        .map(|p| p.starts_with(&self.root))
                        .unwrap_or(false),
                    None => false,
                };
                if inside {
                    Ok(real)
                } else {
                    warn!("sandbox: refusing write through symlink {} leaving the root", r.api);
                    Err(ContentsError::not_found(format!("{}: no such file or directory", r.api)))
                }
            }
            LinkTarget::Cycle => Err(ContentsError::not_found(format!(
                "{}: too many levels of symbolic links",
                r.api
            ))),
        }
    }

    /// True if any segment of the API path is dot-prefixed (and hidden files
    /// are not allowed) or names the reserved checkpoint directory.
    pub fn is_hidden(&self, api: &str) -> bool {
        api.split('/').any(|seg| {
            seg == CHECKPOINT_DIR || (!self.allow_hidden && seg.starts_with('.'))
        })
    }

    /// Reads of hidden paths look like missing paths.
    pub fn deny_hidden_read(&self, r: &Resolved) -> Result<()> {
        if self.is_hidden(&r.api) {
            debug!("sandbox: refusing to serve hidden path {}", r.api);
            return Err(ContentsError::not_found(format!("{}: no such file or directory", r.api)));
        }
        Ok(())
    }

    /// Writes touching hidden names are rejected outright.
    pub fn deny_hidden_write(&self, r: &Resolved, action: &str) -> Result<()> {
        if self.is_hidden(&r.api) {
            return Err(ContentsError::bad_request(format!(
                "Cannot {} file or directory {:?}",
                action, r.api
            )));
        }
        Ok(())
    }

    /// Whether a directory entry named `name` shows up in listings.
    pub fn should_list(&self, name: &str) -> bool {
        if name == CHECKPOINT_DIR || (!self.allow_hidden && name.starts_with('.')) {
            return false;
        }
        !self.hide_globs.iter().any(|p| p.matches(name))
    }
}

/// Normalize an API path: drop empty segments and surrounding slashes.
///
/// Returns None for paths that try to leave the root: `..` segments, NUL
/// bytes, or segments the OS would treat as a root/prefix (e.g. `C:`).
pub fn normalize_api_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        if seg.is_empty() || seg == "." {
            continue;
        }
        if seg == ".." || seg.contains('\0') {
            return None;
        }
        let mut comps = Path::new(seg).components();
        match (comps.next(), comps.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return None,
        }
        parts.push(seg);
    }
    Some(parts.join("/"))
}

/// Join a normalized API path onto `root` using OS separators.
pub fn to_os_path(api: &str, root: &Path) -> PathBuf {
    let mut p = root.to_path_buf();
    for seg in api.split('/').filter(|s| !s.is_empty()) {
        p.push(seg);
    }
    p
}

/// Split a normalized API path into (parent, name). The root is ("", "").
pub fn split_api_path(api: &str) -> (&str, &str) {
    match api.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", api),
    }
}

/// Child path of `dir` (a normalized API path).
pub fn join_api_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_slashes() {
        assert_eq!(normalize_api_path("").as_deref(), Some(""));
        assert_eq!(normalize_api_path("/").as_deref(), Some(""));
        assert_eq!(normalize_api_path("////test.ipynb").as_deref(), Some("test.ipynb"));
        assert_eq!(
            normalize_api_path("/path/to//notebook/test.ipynb/").as_deref(),
            Some("path/to/notebook/test.ipynb")
        );
        assert_eq!(normalize_api_path("./a/./b").as_deref(), Some("a/b"));
    }

    #[test]
    fn normalize_rejects_escape() {
        assert_eq!(normalize_api_path(".."), None);
        assert_eq!(normalize_api_path("foo/../../../bar"), None);
        assert_eq!(normalize_api_path("../foo"), None);
        assert_eq!(normalize_api_path("a\0b"), None);
    }

    #[test]
    fn normalize_keeps_unicode_and_percent() {
        assert_eq!(
            normalize_api_path("å b/ç d%20x.ipynb").as_deref(),
            Some("å b/ç d%20x.ipynb")
        );
        assert_eq!(normalize_api_path("sub ∂ir").as_deref(), Some("sub ∂ir"));
    }

    #[test]
    fn split_and_join() {
        assert_eq!(split_api_path("a/b/c.txt"), ("a/b", "c.txt"));
        assert_eq!(split_api_path("c.txt"), ("", "c.txt"));
        assert_eq!(split_api_path(""), ("", ""));
        assert_eq!(join_api_path("", "x"), "x");
        assert_eq!(join_api_path("a/b", "x"), "a/b/x");
    }

    #[test]
    fn os_path_joins_segments() {
        let root = Path::new("/srv/root");
        assert_eq!(
            to_os_path("path/to/test.ipynb", root),
            Path::new("/srv/root").join("path").join("to").join("test.ipynb")
        );
        assert_eq!(to_os_path("", root), root.to_path_buf());
    }
}

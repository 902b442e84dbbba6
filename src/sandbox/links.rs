//! sandbox/links — обход цепочек symlink с явным множеством посещённых узлов.
//!
//! Depth limits alone cannot tell a long chain from a loop, so every hop is
//! canonicalized through its parent directory and recorded; revisiting a hop
//! means a cycle of any length.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Hard stop for pathological chains (mirrors the usual kernel MAXSYMLINKS).
pub(crate) const MAX_HOPS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// The path is not a symlink (or does not exist at all).
    NotALink,
    /// Chain ends at an existing object; canonical path.
    Resolved(PathBuf),
    /// Chain ends at a name that does not exist; last (dangling) target.
    Broken(PathBuf),
    /// Chain revisits one of its hops.
    Cycle,
}

/// Follow the symlink chain starting at `path`.
pub fn walk_link(path: &Path) -> LinkTarget {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {}
        _ => return LinkTarget::NotALink,
    }

    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut cur = match anchor(path) {
        Some(p) => p,
        None => return LinkTarget::Broken(path.to_path_buf()),
    };

    for _ in 0..MAX_HOPS {
        if !visited.insert(cur.clone()) {
            return LinkTarget::Cycle;
        }
        let md = match fs::symlink_metadata(&cur) {
            Ok(md) => md,
            Err(_) => return LinkTarget::Broken(cur),
        };
        if !md.file_type().is_symlink() {
            return match fs::canonicalize(&cur) {
                Ok(real) => LinkTarget::Resolved(real),
                // intermediate directories loop back on themselves
                Err(_) => LinkTarget::Cycle,
            };
        }
        let target = match fs::read_link(&cur) {
            Ok(t) => t,
            Err(_) => return LinkTarget::Broken(cur),
        };
        let next = match cur.parent() {
            Some(parent) if target.is_relative() => parent.join(&target),
            _ => target,
        };
        cur = match anchor(&next) {
            Some(p) => p,
            None => return LinkTarget::Broken(next),
        };
    }
    LinkTarget::Cycle
}

/// Canonicalize the parent and re-attach the file name, so two spellings of
/// the same hop compare equal without following the hop itself.
fn anchor(p: &Path) -> Option<PathBuf> {
    // "x/.." has no file name; `..` itself is never a link
    let name = match p.file_name() {
        Some(n) => n,
        None => return fs::canonicalize(p).ok(),
    };
    let parent = match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::canonicalize(parent).ok().map(|dir| dir.join(name))
}

/// True if `target` is `dir` itself or one of its ancestors, i.e. listing it
/// from inside `dir` would recurse forever.
pub fn loops_back(target: &Path, dir: &Path) -> bool {
    dir.starts_with(target)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    fn unique_dir(prefix: &str) -> PathBuf {
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let p = std::env::temp_dir().join(format!("qc-links-{}-{}-{}", prefix, std::process::id(), t));
        fs::create_dir_all(&p).unwrap();
        fs::canonicalize(&p).unwrap()
    }

    #[test]
    fn plain_file_is_not_a_link() {
        let d = unique_dir("plain");
        let f = d.join("f.txt");
        fs::write(&f, b"x").unwrap();
        assert_eq!(walk_link(&f), LinkTarget::NotALink);
        assert_eq!(walk_link(&d.join("missing")), LinkTarget::NotALink);
    }

    #[test]
    fn self_loop_is_cycle() {
        let d = unique_dir("self");
        symlink("recursive", d.join("recursive")).unwrap();
        assert_eq!(walk_link(&d.join("recursive")), LinkTarget::Cycle);
    }

    #[test]
    fn two_hop_loop_is_cycle() {
        let d = unique_dir("pair");
        symlink("b", d.join("a")).unwrap();
        symlink("a", d.join("b")).unwrap();
        assert_eq!(walk_link(&d.join("a")), LinkTarget::Cycle);
    }

    #[test]
    fn dangling_link_is_broken() {
        let d = unique_dir("broken");
        symlink("target", d.join("bad symlink")).unwrap();
        assert_eq!(walk_link(&d.join("bad symlink")), LinkTarget::Broken(d.join("target")));
    }

    #[test]
    fn chain_resolves_to_real_file() {
        let d = unique_dir("chain");
        fs::write(d.join("real.txt"), b"x").unwrap();
        symlink("real.txt", d.join("l1")).unwrap();
        symlink(d.join("l1"), d.join("l2")).unwrap();
        assert_eq!(walk_link(&d.join("l2")), LinkTarget::Resolved(d.join("real.txt")));
    }

    #[test]
    fn link_to_parent_loops_back() {
        let d = unique_dir("parent");
        let sub = d.join("sub");
        fs::create_dir_all(&sub).unwrap();
        symlink("..", sub.join("up")).unwrap();
        match walk_link(&sub.join("up")) {
            LinkTarget::Resolved(t) => {
                assert_eq!(t, d);
                assert!(loops_back(&t, &sub));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

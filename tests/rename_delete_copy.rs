use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use QuiverContents::{Cell, ContentsBuilder, ContentsManager, EntryType, Model, Notebook};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("qctest-rdc-{prefix}-{pid}-{t}-{id}"))
}

fn open(prefix: &str) -> Result<(PathBuf, ContentsManager)> {
    let root = unique_root(prefix);
    fs::create_dir_all(&root)?;
    let cfg = ContentsBuilder::from_default()
        .root_dir(root.clone())
        .notary_secret(b"rdc-secret".to_vec())
        .build();
    let cm = ContentsManager::open(cfg)?;
    Ok((root, cm))
}

#[test]
fn rename_file_keeps_content_and_mtime() -> Result<()> {
    let (root, cm) = open("rename")?;
    let before = cm.save(Model::text("payload"), "a.txt")?;
    cm.rename("a.txt", "b.txt")?;

    assert!(!root.join("a.txt").exists());
    let after = cm.get("b.txt", true, None, None)?;
    assert_eq!(after.file_content(), Some("payload"));
    assert_eq!(after.last_modified, before.last_modified);
    assert_eq!(cm.get("a.txt", false, None, None).unwrap_err().status_code(), 404);

    // same path is a no-op
    cm.rename("b.txt", "/b.txt/")?;
    assert!(root.join("b.txt").is_file());
    Ok(())
}

#[test]
fn rename_errors() -> Result<()> {
    let (root, cm) = open("rename-err")?;
    cm.save(Model::text("1"), "one.txt")?;
    cm.save(Model::text("2"), "two.txt")?;
    cm.save(Model::directory(), "dir")?;

    cm.save(Model::directory(), "other")?;

    // любая пара существующих путей — конфликт
    for (from, to) in [
        ("one.txt", "two.txt"),
        ("dir", "one.txt"),
        ("one.txt", "dir"),
        ("dir", "other"),
    ] {
        assert_eq!(cm.rename(from, to).unwrap_err().status_code(), 409, "{from} -> {to}");
    }
    assert_eq!(fs::read_to_string(root.join("two.txt"))?, "2");
    assert!(root.join("dir").is_dir() && root.join("other").is_dir());
    assert_eq!(cm.rename("missing.txt", "x.txt").unwrap_err().status_code(), 404);
    assert_eq!(cm.rename("dir", "dir/inner").unwrap_err().status_code(), 400);
    assert_eq!(cm.rename("", "elsewhere").unwrap_err().status_code(), 400);
    assert_eq!(cm.rename("one.txt", "nope/one.txt").unwrap_err().status_code(), 404);
    assert!(root.join("one.txt").is_file());
    Ok(())
}

#[test]
fn rename_directory_moves_the_tree() -> Result<()> {
    let (root, cm) = open("rename-dir")?;
    cm.new(Some(Model::directory()), "src")?;
    cm.new(None, "src/deep.ipynb")?;
    cm.rename("src", "dst")?;
    assert!(root.join("dst/deep.ipynb").is_file());
    assert_eq!(cm.list_checkpoints("dst/deep.ipynb")?.len(), 1);
    assert!(root.join("dst/.ipynb_checkpoints/deep-checkpoint.ipynb").is_file());
    Ok(())
}

#[test]
fn renamed_directory_is_served_from_the_new_path_only() -> Result<()> {
    let (_root, cm) = open("rename-subdir")?;
    for d in ["foo", "foo/bar", "foo/bar/inner", "bar"] {
        cm.new(Some(Model::directory()), d)?;
    }
    cm.save(Model::text("deep text"), "foo/bar/inner/a.txt")?;
    cm.save(Model::text("top"), "foo/bar/b.txt")?;
    cm.save(Model::text("sibling"), "foo/c.txt")?;
    cm.save(Model::text("other bar"), "bar/d.txt")?;

    let mut before: Vec<(String, Option<String>)> = Vec::new();
    for rel in ["inner/a.txt", "b.txt"] {
        let e = cm.get(&format!("foo/bar/{rel}"), true, None, None)?;
        before.push((rel.to_string(), e.file_content().map(str::to_string)));
    }

    cm.rename("foo/bar", "foo/bar_diff")?;

    for (rel, content) in &before {
        let old = format!("foo/bar/{rel}");
        assert_eq!(cm.get(&old, false, None, None).unwrap_err().status_code(), 404, "{old}");
        let moved = cm.get(&format!("foo/bar_diff/{rel}"), true, None, None)?;
        assert_eq!(moved.file_content().map(str::to_string), *content);
    }
    assert_eq!(cm.get("foo/bar", false, None, None).unwrap_err().status_code(), 404);
    assert!(cm.dir_exists("foo/bar_diff/inner"));

    // соседи не задеты
    assert_eq!(cm.get("foo/c.txt", true, None, None)?.file_content(), Some("sibling"));
    assert_eq!(cm.get("bar/d.txt", true, None, None)?.file_content(), Some("other bar"));
    let names: Vec<String> = cm
        .get("foo", true, None, None)?
        .children()
        .unwrap_or_default()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    assert_eq!(names, vec!["bar_diff".to_string(), "c.txt".to_string()]);
    Ok(())
}

#[test]
fn update_renames_via_model_path() -> Result<()> {
    let (_root, cm) = open("update")?;
    cm.save(Model::text("x"), "old.txt")?;
    let e = cm.update(Model::moved_to("new.txt"), "old.txt")?;
    assert_eq!(e.path, "new.txt");
    assert!(e.file_content().is_none());
    assert!(!cm.exists("old.txt"));
    assert!(cm.file_exists("new.txt"));

    // no path → nothing moves
    let e = cm.update(Model::text("ignored"), "new.txt")?;
    assert_eq!(e.path, "new.txt");
    Ok(())
}

#[test]
fn renamed_notebook_takes_its_checkpoints() -> Result<()> {
    let (root, cm) = open("rename-cp")?;
    cm.new(None, "a.ipynb")?;
    assert_eq!(cm.list_checkpoints("a.ipynb")?.len(), 1);

    cm.rename("a.ipynb", "b.ipynb")?;
    assert!(cm.list_checkpoints("a.ipynb")?.is_empty());
    assert_eq!(cm.list_checkpoints("b.ipynb")?.len(), 1);
    assert!(root.join(".ipynb_checkpoints/b-checkpoint.ipynb").is_file());
    Ok(())
}

#[test]
fn delete_file_and_its_checkpoints() -> Result<()> {
    let (root, cm) = open("delete")?;
    cm.new(None, "gone.ipynb")?;
    assert!(root.join(".ipynb_checkpoints/gone-checkpoint.ipynb").is_file());

    cm.delete("gone.ipynb")?;
    assert!(!root.join("gone.ipynb").exists());
    assert!(!root.join(".ipynb_checkpoints/gone-checkpoint.ipynb").exists());
    assert_eq!(cm.delete("gone.ipynb").unwrap_err().status_code(), 404);
    Ok(())
}

#[test]
fn delete_directory_is_recursive() -> Result<()> {
    let (root, cm) = open("delete-dir")?;
    cm.new(Some(Model::directory()), "tree")?;
    cm.new(Some(Model::directory()), "tree/branch")?;
    cm.new(None, "tree/branch/leaf.txt")?;

    cm.delete("tree")?;
    assert!(!root.join("tree").exists());
    assert!(!cm.dir_exists("tree"));
    Ok(())
}

#[test]
fn delete_root_is_refused() -> Result<()> {
    let (root, cm) = open("delete-root")?;
    for p in ["", "/", "//"] {
        assert_eq!(cm.delete(p).unwrap_err().status_code(), 400);
    }
    assert!(root.is_dir());
    Ok(())
}

#[cfg(unix)]
#[test]
fn delete_symlink_leaves_target() -> Result<()> {
    let (root, cm) = open("delete-link")?;
    cm.new(Some(Model::directory()), "real")?;
    cm.new(None, "real/keep.txt")?;
    std::os::unix::fs::symlink("real", root.join("alias"))?;
    std::os::unix::fs::symlink("void", root.join("dangling"))?;

    cm.delete("alias")?;
    cm.delete("dangling")?;
    assert!(fs::symlink_metadata(root.join("alias")).is_err());
    assert!(fs::symlink_metadata(root.join("dangling")).is_err());
    assert!(root.join("real/keep.txt").is_file());
    Ok(())
}

#[test]
fn copy_naming() -> Result<()> {
    let (_root, cm) = open("copy")?;
    let dir = "å b";
    let name = "nb √.ipynb";
    let src = format!("{dir}/{name}");
    cm.new(Some(Model::directory()), dir)?;
    cm.new(None, &src)?;

    let c1 = cm.copy(&src, None)?;
    assert_eq!(c1.name, "nb √-Copy1.ipynb");
    assert_eq!(c1.path, format!("{dir}/nb √-Copy1.ipynb"));

    // copying a copy does not stack suffixes
    let c2 = cm.copy(&c1.path, None)?;
    assert_eq!(c2.name, "nb √-Copy2.ipynb");

    let named = cm.copy(&src, Some(&format!("{dir}/copy 2.ipynb")))?;
    assert_eq!(named.name, "copy 2.ipynb");
    assert_eq!(named.path, format!("{dir}/copy 2.ipynb"));

    let to_root = cm.copy(&src, Some("/"))?;
    assert_eq!(to_root.name, name);
    assert_eq!(to_root.path, name);
    Ok(())
}

#[test]
fn copy_keeps_content() -> Result<()> {
    let (root, cm) = open("copy-content")?;
    let nb = Notebook::with_cells(vec![Cell::code("x = 1")]);
    cm.save(Model::notebook(nb), "orig.ipynb")?;
    fs::write(root.join("data.bin"), [0u8, 159, 146, 150])?;

    let c = cm.copy("orig.ipynb", None)?;
    assert_eq!(c.entry_type(), EntryType::Notebook);
    let copied = cm.get(&c.path, true, None, None)?;
    assert_eq!(copied.notebook().unwrap().cells.len(), 1);

    let c = cm.copy("data.bin", Some("data2.bin"))?;
    assert_eq!(fs::read(root.join(&c.path))?, vec![0u8, 159, 146, 150]);
    Ok(())
}

#[test]
fn copy_errors() -> Result<()> {
    let (root, cm) = open("copy-err")?;
    cm.new(Some(Model::directory()), "folder")?;
    cm.new(None, "a.txt")?;
    cm.new(None, "b.txt")?;
    fs::write(root.join(".secret"), b"x")?;

    assert_eq!(cm.copy("folder", None).unwrap_err().status_code(), 400);
    assert_eq!(cm.copy("a.txt", Some("b.txt")).unwrap_err().status_code(), 409);
    assert_eq!(cm.copy("missing.txt", None).unwrap_err().status_code(), 404);
    assert_eq!(cm.copy(".secret", None).unwrap_err().status_code(), 400);
    assert_eq!(cm.copy("a.txt", Some(".a.txt")).unwrap_err().status_code(), 400);
    assert!(!root.join(".a.txt").exists());
    assert!(!root.join(".secret-Copy1").exists());
    Ok(())
}

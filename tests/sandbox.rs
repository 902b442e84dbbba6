use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use QuiverContents::{ContentsBuilder, ContentsError, ContentsManager, Model};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("qctest-sandbox-{prefix}-{pid}-{t}-{id}"))
}

fn open(root: &PathBuf, allow_hidden: bool) -> Result<ContentsManager> {
    fs::create_dir_all(root)?;
    let cfg = ContentsBuilder::from_default()
        .root_dir(root.clone())
        .allow_hidden(allow_hidden)
        .notary_secret(b"sandbox-secret".to_vec())
        .build();
    Ok(ContentsManager::open(cfg)?)
}

fn status<T: std::fmt::Debug>(r: QuiverContents::Result<T>) -> u16 {
    match r {
        Ok(v) => panic!("expected an error, got {:?}", v),
        Err(e) => e.status_code(),
    }
}

#[test]
fn root_must_be_an_existing_directory() -> Result<()> {
    let root = unique_root("badroot");
    let cfg = ContentsBuilder::from_default().root_dir(root.join("missing")).build();
    assert!(matches!(ContentsManager::open(cfg), Err(ContentsError::Config(_))));

    fs::create_dir_all(&root)?;
    fs::write(root.join("file"), b"x")?;
    let cfg = ContentsBuilder::from_default().root_dir(root.join("file")).build();
    assert!(matches!(ContentsManager::open(cfg), Err(ContentsError::Config(_))));
    Ok(())
}

#[test]
fn dotdot_paths_are_not_found() -> Result<()> {
    let root = unique_root("dotdot");
    let cm = open(&root, false)?;
    cm.new(None, "inside.txt")?;

    for bad in ["..", "../x.txt", "foo/../../../bar", "/../inside.txt"] {
        assert_eq!(status(cm.get(bad, false, None, None)), 404, "get {bad}");
        assert_eq!(status(cm.save(Model::text("x"), bad)), 404, "save {bad}");
        assert_eq!(status(cm.delete(bad)), 404, "delete {bad}");
        assert_eq!(status(cm.rename("inside.txt", bad)), 404, "rename to {bad}");
    }
    // nothing escaped next to the root
    assert!(!root.parent().unwrap().join("x.txt").exists());
    Ok(())
}

#[test]
fn escape_is_checked_before_hidden() -> Result<()> {
    let root = unique_root("order");
    let cm = open(&root, false)?;
    assert_eq!(status(cm.save(Model::text("x"), "../.hidden")), 404);
    assert_eq!(status(cm.delete("../.hidden/x")), 404);
    Ok(())
}

#[test]
fn hidden_reads_404_writes_400() -> Result<()> {
    let root = unique_root("hidden");
    let cm = open(&root, false)?;
    fs::create_dir_all(root.join(".hidden"))?;
    fs::write(root.join(".hidden").join("visible.txt"), b"secret")?;
    fs::write(root.join(".dotfile"), b"secret")?;
    cm.new(None, "visible.txt")?;

    assert_eq!(status(cm.get(".dotfile", true, None, None)), 404);
    assert_eq!(status(cm.get(".hidden/visible.txt", true, None, None)), 404);
    assert_eq!(status(cm.get(".hidden", true, None, None)), 404);

    assert_eq!(status(cm.save(Model::text("x"), ".new")), 400);
    assert_eq!(status(cm.save(Model::text("x"), ".hidden/other.txt")), 400);
    assert_eq!(status(cm.delete(".hidden/visible.txt")), 400);
    assert_eq!(status(cm.delete(".dotfile")), 400);
    // hidden check happens before the existence check
    assert_eq!(status(cm.delete(".does-not-exist")), 400);
    assert_eq!(status(cm.rename("visible.txt", ".visible.txt")), 400);
    assert_eq!(status(cm.rename(".dotfile", "dotfile")), 400);

    assert!(root.join(".dotfile").exists());
    assert!(root.join("visible.txt").exists());

    let listing = cm.get("", true, None, None)?;
    let names: Vec<&str> = listing.children().unwrap().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["visible.txt"]);
    assert!(cm.is_hidden(".hidden/visible.txt"));
    assert!(!cm.is_hidden("visible.txt"));
    Ok(())
}

#[test]
fn allow_hidden_serves_dot_names() -> Result<()> {
    let root = unique_root("allow");
    let cm = open(&root, true)?;
    fs::write(root.join(".env"), b"A=1")?;
    let e = cm.get(".env", true, None, None)?;
    assert_eq!(e.file_content(), Some("A=1"));
    cm.save(Model::text("y"), ".other")?;
    let names: Vec<String> = cm
        .get("", true, None, None)?
        .children()
        .unwrap()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    assert!(names.contains(&".env".to_string()));
    assert!(names.contains(&".other".to_string()));
    Ok(())
}

#[test]
fn hide_globs_filter_listings_only() -> Result<()> {
    let root = unique_root("globs");
    let cm = open(&root, false)?;
    fs::create_dir_all(root.join("__pycache__"))?;
    fs::write(root.join("mod.pyc"), b"\x00")?;
    fs::write(root.join("mod.py"), b"pass\n")?;

    let names: Vec<String> = cm
        .get("", true, None, None)?
        .children()
        .unwrap()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    assert_eq!(names, vec!["mod.py".to_string()]);
    // still reachable directly
    assert!(cm.get("mod.pyc", false, None, None).is_ok());
    Ok(())
}

#[test]
fn unicode_and_percent_segments_pass_through() -> Result<()> {
    let root = unique_root("unicode");
    let cm = open(&root, false)?;
    cm.new(Some(Model::directory()), "å b")?;
    let e = cm.new(None, "å b/ç d%20x.txt")?;
    assert_eq!(e.path, "å b/ç d%20x.txt");
    assert_eq!(e.name, "ç d%20x.txt");
    assert!(root.join("å b").join("ç d%20x.txt").is_file());

    let e = cm.get("//å b///ç d%20x.txt/", false, None, None)?;
    assert_eq!(e.path, "å b/ç d%20x.txt");
    Ok(())
}

#[cfg(unix)]
#[test]
fn symlinks_leaving_the_root_are_invisible() -> Result<()> {
    use std::os::unix::fs::symlink;

    let base = unique_root("escape");
    let root = base.join("root");
    let outside = base.join("outside");
    fs::create_dir_all(&outside)?;
    fs::write(outside.join("secret.txt"), b"top secret")?;
    let cm = open(&root, false)?;

    symlink(&outside, root.join("out"))?;
    symlink(outside.join("secret.txt"), root.join("secret.txt"))?;

    assert_eq!(status(cm.get("out", true, None, None)), 404);
    assert_eq!(status(cm.get("out/secret.txt", true, None, None)), 404);
    assert_eq!(status(cm.get("secret.txt", true, None, None)), 404);
    assert_eq!(status(cm.save(Model::text("pwned"), "secret.txt")), 404);
    assert_eq!(status(cm.save(Model::text("pwned"), "out/new.txt")), 404);
    assert_eq!(fs::read(outside.join("secret.txt"))?, b"top secret");
    assert!(!outside.join("new.txt").exists());

    let listing = cm.get("", true, None, None)?;
    assert!(listing.children().unwrap().is_empty());
    Ok(())
}

#[cfg(unix)]
#[test]
fn every_operation_treats_escapes_as_missing() -> Result<()> {
    use std::os::unix::fs::symlink;

    let base = unique_root("escape-table");
    let root = base.join("root");
    let outside = base.join("outside");
    fs::create_dir_all(&outside)?;
    fs::write(outside.join("exists.txt"), b"outside")?;
    let cm = open(&root, false)?;
    cm.new(None, "inside.txt")?;

    symlink(outside.join("exists.txt"), root.join("l_exists"))?;
    symlink(outside.join("missing.txt"), root.join("l_missing"))?;
    symlink(outside.join("nodir/missing.txt"), root.join("l_nodir"))?;
    symlink("../outside/rel-missing.txt", root.join("l_relative"))?;
    symlink(&outside, root.join("l_dir"))?;

    let shapes = [
        "..",
        "../x.txt",
        "/../inside.txt",
        "a/../../x.txt",
        "l_exists",
        "l_missing",
        "l_nodir",
        "l_relative",
        "l_dir",
        "l_dir/exists.txt",
        "l_dir/new.txt",
    ];
    for bad in shapes {
        assert_eq!(status(cm.get(bad, false, None, None)), 404, "get {bad}");
        assert_eq!(status(cm.get(bad, true, None, None)), 404, "get content {bad}");
        assert_eq!(status(cm.save(Model::text("x"), bad)), 404, "save {bad}");
        assert_eq!(status(cm.delete(bad)), 404, "delete {bad}");
        assert_eq!(status(cm.rename(bad, "moved.txt")), 404, "rename from {bad}");
        assert_eq!(status(cm.rename("inside.txt", bad)), 404, "rename to {bad}");
        assert!(!cm.exists(bad), "exists {bad}");
    }

    // ничего не утекло наружу и ничего не сдвинулось внутри
    assert_eq!(fs::read(outside.join("exists.txt"))?, b"outside");
    for leaked in ["missing.txt", "rel-missing.txt", "new.txt", "x.txt", "nodir"] {
        assert!(!outside.join(leaked).exists(), "{leaked} leaked");
    }
    assert!(root.join("inside.txt").is_file());
    assert!(!root.join("moved.txt").exists());

    // листинг не отличает существующие внешние цели от отсутствующих
    let names: Vec<String> = cm
        .get("", true, None, None)?
        .children()
        .unwrap()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    assert_eq!(names, vec!["inside.txt".to_string()]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn dangling_link_inside_the_root_is_still_served() -> Result<()> {
    let root = unique_root("dangling-inside");
    let cm = open(&root, false)?;
    std::os::unix::fs::symlink("not-yet.txt", root.join("pending.txt"))?;

    let e = cm.get("pending.txt", false, None, None)?;
    assert_eq!(e.path, "pending.txt");
    let names: Vec<String> = cm
        .get("", true, None, None)?
        .children()
        .unwrap()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    assert_eq!(names, vec!["pending.txt".to_string()]);
    Ok(())
}

#[test]
fn checkpoint_dir_is_reserved_even_with_allow_hidden() -> Result<()> {
    let root = unique_root("reserved");
    let cm = open(&root, true)?;
    cm.new(None, "a.ipynb")?;
    assert!(root.join(".ipynb_checkpoints/a-checkpoint.ipynb").is_file());
    fs::write(root.join(".visible"), b"ok")?;

    let names: Vec<String> = cm
        .get("", true, None, None)?
        .children()
        .unwrap()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    assert_eq!(names, vec![".visible".to_string(), "a.ipynb".to_string()]);

    let cp = ".ipynb_checkpoints/a-checkpoint.ipynb";
    assert_eq!(status(cm.get(".ipynb_checkpoints", true, None, None)), 404);
    assert_eq!(status(cm.get(cp, true, None, None)), 404);
    assert_eq!(status(cm.save(Model::text("x"), cp)), 400);
    assert_eq!(status(cm.new(None, ".ipynb_checkpoints/b.txt")), 400);
    assert_eq!(status(cm.delete(cp)), 400);
    assert_eq!(status(cm.delete(".ipynb_checkpoints")), 400);
    assert_eq!(status(cm.rename(".ipynb_checkpoints", "cps")), 400);
    assert_eq!(status(cm.rename("a.ipynb", ".ipynb_checkpoints/a.ipynb")), 400);
    assert_eq!(status(cm.copy(cp, Some("stolen.ipynb"))), 400);
    assert_eq!(status(cm.copy("a.ipynb", Some(".ipynb_checkpoints"))), 400);
    assert_eq!(status(cm.new_untitled(".ipynb_checkpoints", None, ".txt")), 400);
    assert!(cm.is_hidden(".ipynb_checkpoints"));

    assert!(root.join(cp).is_file());
    assert_eq!(cm.list_checkpoints("a.ipynb")?.len(), 1);
    Ok(())
}

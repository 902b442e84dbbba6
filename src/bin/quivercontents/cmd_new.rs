use anyhow::Result;

use QuiverContents::{ContentsManager, Model};

use super::util::parse_type;

pub fn exec_untitled(cm: &ContentsManager, dir: &str, type_: Option<String>, ext: &str) -> Result<()> {
    let type_ = parse_type(type_)?;
    let entry = cm.new_untitled(dir, type_, ext)?;
    println!("CREATED '{}'", entry.path);
    Ok(())
}

pub fn exec_mkdir(cm: &ContentsManager, path: &str) -> Result<()> {
    let entry = cm.new(Some(Model::directory()), path)?;
    println!("CREATED '{}/'", entry.path);
    Ok(())
}

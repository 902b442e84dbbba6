use anyhow::Result;

use QuiverContents::ContentsManager;

use super::util::entry_line;

pub fn exec(cm: &ContentsManager, path: &str, json: bool) -> Result<()> {
    let entry = cm.get(path, true, None, None)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }
    match entry.children() {
        Some(children) => {
            println!("{}/ ({} entries)", entry.path, children.len());
            for child in children {
                println!("{}", entry_line(child));
            }
        }
        None => println!("{}", entry_line(&entry)),
    }
    Ok(())
}

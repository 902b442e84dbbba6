use anyhow::{anyhow, Result};

use QuiverContents::{ContentsManager, EntryType};

pub fn exec(cm: &ContentsManager, path: &str, check: bool) -> Result<()> {
    if check {
        let entry = cm.get(path, true, Some(EntryType::Notebook), None)?;
        let nb = entry
            .notebook()
            .ok_or_else(|| anyhow!("{} is not a notebook", path))?;
        let signed = cm.notary().check_signature(nb);
        println!("{}: {}", entry.path, if signed { "trusted" } else { "not trusted" });
        return Ok(());
    }
    let entry = cm.trust_notebook(path)?;
    println!("TRUSTED '{}'", entry.path);
    Ok(())
}

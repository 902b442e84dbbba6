use anyhow::{anyhow, Result};
use std::fs::OpenOptions;
use std::io::Read;
use std::path::PathBuf;

use QuiverContents::{Entry, EntryType, Format};

/// Value argument: literal, `@file`, `-` (stdin) or `hex:..`.
pub fn decode_value_arg(arg: &str) -> Result<(Vec<u8>, &'static str)> {
    if arg == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok((buf, "stdin"));
    }
    if let Some(p) = arg.strip_prefix('@') {
        let path = PathBuf::from(p);
        let mut f = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|e| anyhow!("open value file {}: {}", path.display(), e))?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        return Ok((buf, "file"));
    }
    if let Some(hx) = arg.strip_prefix("hex:") {
        let v = hex::decode(hx.trim()).map_err(|e| anyhow!("bad hex value: {}", e))?;
        return Ok((v, "hex"));
    }
    Ok((arg.as_bytes().to_vec(), "literal"))
}

pub fn parse_format(s: Option<String>) -> Result<Option<Format>> {
    s.map(|v| v.parse::<Format>().map_err(|e| anyhow!(e))).transpose()
}

pub fn parse_type(s: Option<String>) -> Result<Option<EntryType>> {
    s.map(|v| v.parse::<EntryType>().map_err(|e| anyhow!(e))).transpose()
}

/// One `ls`-style line: type marker, size, mtime, name.
pub fn entry_line(e: &Entry) -> String {
    let kind = match e.entry_type() {
        EntryType::Directory => 'd',
        EntryType::Notebook => 'n',
        EntryType::File => '-',
    };
    let size = e
        .size
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}{} {:>10} {} {}{}",
        kind,
        if e.writable { 'w' } else { '-' },
        size,
        e.last_modified.format("%Y-%m-%d %H:%M:%S"),
        e.name,
        if e.is_dir() { "/" } else { "" }
    )
}

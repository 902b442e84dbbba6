//! entry — модель записи (файл / ноутбук / каталог), как её видит вызывающая сторона.
//!
//! JSON shape (serde):
//! ```text
//! { "name", "path", "type", "format", "mimetype", "content",
//!   "writable", "created", "last_modified", "size", ["message"] }
//! ```
//! `type` + `content` come from the adjacently tagged [`Content`]; `content`,
//! `format` and `mimetype` serialize as `null` when absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notebook::Notebook;

pub mod mime;

pub use mime::guess_mimetype;

/// Encoding of `content` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Text,
    Base64,
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Base64 => "base64",
            Format::Json => "json",
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "base64" => Ok(Format::Base64),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format '{other}' (text|base64|json)")),
        }
    }
}

/// Requested/actual kind of an entry, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Notebook,
    Directory,
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "file" => Ok(EntryType::File),
            "notebook" => Ok(EntryType::Notebook),
            "directory" => Ok(EntryType::Directory),
            other => Err(format!("unknown type '{other}' (file|notebook|directory)")),
        }
    }
}

/// Payload of an entry; `None` means "content not requested".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Content {
    File(Option<String>),
    Notebook(Option<Notebook>),
    Directory(Option<Vec<Entry>>),
}

impl Content {
    pub fn entry_type(&self) -> EntryType {
        match self {
            Content::File(_) => EntryType::File,
            Content::Notebook(_) => EntryType::Notebook,
            Content::Directory(_) => EntryType::Directory,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Content::File(c) => c.is_none(),
            Content::Notebook(c) => c.is_none(),
            Content::Directory(c) => c.is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub content: Content,
    pub format: Option<Format>,
    pub mimetype: Option<String>,
    pub writable: bool,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Bytes on disk; None for directories.
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Entry {
    pub fn entry_type(&self) -> EntryType {
        self.content.entry_type()
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.content, Content::Directory(_))
    }

    /// Text or base64 payload of a file entry.
    pub fn file_content(&self) -> Option<&str> {
        match &self.content {
            Content::File(Some(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn notebook(&self) -> Option<&Notebook> {
        match &self.content {
            Content::Notebook(Some(nb)) => Some(nb),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[Entry]> {
        match &self.content {
            Content::Directory(Some(v)) => Some(v.as_slice()),
            _ => None,
        }
    }
}

/// Input of save/update: what to store and (for update) where to move it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub format: Option<Format>,
    #[serde(flatten)]
    pub content: Content,
}

impl Model {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            path: None,
            format: Some(Format::Text),
            content: Content::File(Some(s.into())),
        }
    }

    pub fn base64(s: impl Into<String>) -> Self {
        Self {
            path: None,
            format: Some(Format::Base64),
            content: Content::File(Some(s.into())),
        }
    }

    pub fn notebook(nb: Notebook) -> Self {
        Self {
            path: None,
            format: Some(Format::Json),
            content: Content::Notebook(Some(nb)),
        }
    }

    pub fn directory() -> Self {
        Self {
            path: None,
            format: None,
            content: Content::Directory(None),
        }
    }

    /// Model that only carries a destination path (for update/rename).
    pub fn moved_to(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            format: None,
            content: Content::File(None),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl From<Entry> for Model {
    fn from(e: Entry) -> Self {
        Self {
            path: Some(e.path),
            format: e.format,
            content: e.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(content: Content) -> Entry {
        Entry {
            name: "a.txt".into(),
            path: "d/a.txt".into(),
            content,
            format: None,
            mimetype: None,
            writable: true,
            created: DateTime::<Utc>::UNIX_EPOCH,
            last_modified: DateTime::<Utc>::UNIX_EPOCH,
            size: Some(3),
            message: None,
        }
    }

    #[test]
    fn json_shape_has_type_and_null_content() {
        let v = serde_json::to_value(sample(Content::File(None))).unwrap();
        assert_eq!(v["type"], "file");
        assert!(v["content"].is_null());
        assert!(v["format"].is_null());
        assert!(v["mimetype"].is_null());
        assert!(v.get("message").is_none());
        assert_eq!(v["path"], "d/a.txt");
    }

    #[test]
    fn directory_children_serialize_inline() {
        let dir = Entry {
            name: "d".into(),
            path: "d".into(),
            size: None,
            ..sample(Content::Directory(Some(vec![sample(Content::File(None))])))
        };
        let v = serde_json::to_value(&dir).unwrap();
        assert_eq!(v["type"], "directory");
        assert_eq!(v["content"][0]["name"], "a.txt");
        let back: Entry = serde_json::from_value(v).unwrap();
        assert_eq!(back, dir);
    }

    #[test]
    fn format_and_type_parse() {
        assert_eq!("base64".parse::<Format>(), Ok(Format::Base64));
        assert!("binary".parse::<Format>().is_err());
        assert_eq!("notebook".parse::<EntryType>(), Ok(EntryType::Notebook));
    }
}

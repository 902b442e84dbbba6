#![allow(non_snake_case)]

// Базовые модули
pub mod config;
pub mod error;
pub mod metrics;

// Песочница путей и запись на диск
pub mod sandbox; // src/sandbox/{mod,links}.rs
pub mod fileio;  // src/fileio/mod.rs

// Модель данных
pub mod entry;    // src/entry/{mod,mime}.rs
pub mod notebook; // src/notebook/mod.rs
pub mod naming;

// Контрольные точки и нотариус
pub mod checkpoints; // src/checkpoints/{mod,file}.rs
pub mod notary;      // src/notary/{mod,secret}.rs

// CRUD-движок
pub mod manager; // src/manager/{mod,core,get,save,rename,delete,copy,trust,checkpoint_ops}.rs

// Утилиты (время, права доступа)
pub mod util; // src/util/mod.rs

// Удобные реэкспорты
pub use checkpoints::{CheckpointModel, Checkpoints, FileCheckpoints};
pub use config::{ContentsBuilder, ContentsConfig};
pub use entry::{Content, Entry, EntryType, Format, Model};
pub use error::{ContentsError, Result};
pub use manager::ContentsManager;
pub use notary::NotebookNotary;
pub use notebook::{Cell, Notebook};
pub use sandbox::Sandbox;

//! manager — CRUD-движок поверх песочницы.
//!
//! Разделение по подмодулям:
//! - core.rs           — ContentsManager (поля, new(), хуки, exists-хелперы)
//! - get.rs            — get() и листинг каталогов
//! - save.rs           — save / new / new_untitled
//! - rename.rs         — update / rename (контрольные точки переезжают)
//! - delete.rs         — delete (каталоги рекурсивно)
//! - copy.rs           — copy с `-Copy` нумерацией
//! - trust.rs          — trust_notebook / mark_trusted_cells / check_and_sign
//! - checkpoint_ops.rs — create/list/restore/delete_checkpoint

pub mod checkpoint_ops;
pub mod copy;
pub mod core;
pub mod delete;
pub mod get;
pub mod rename;
pub mod save;
pub mod trust;

pub use self::core::{ContentsManager, PostSaveHook, PreSaveHook};

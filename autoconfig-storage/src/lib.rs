//! Backing-file storage for autoconfig profiles.
//!
//! Two concerns live here, both independent of any profile type:
//!
//! - [`DictionaryDocument`]: the default on-disk layout, an ordered list of
//!   (header, content) text pairs
//! - [`ProfileStore`]: the file-system capability the persistence engine
//!   needs: read (absent file is not an error), exists, recursive parent
//!   directory creation, delete, and detached writes
//!
//! # Detached writes
//!
//! [`ProfileStore::write_detached`] creates the parent directory on the
//! caller's thread (so failures surface) and hands the content to a single
//! background writer thread. Writes land in submission order and each one
//! replaces the whole file. A process that exits right after a mutation can
//! lose the last write unless it calls [`ProfileStore::flush`].

mod document;
mod error;
mod store;

pub use document::{DictionaryDocument, DictionaryEntry};
pub use error::{StorageError, StorageResult};
pub use store::ProfileStore;

//! # vfs-core
//!
//! Virtual file system building blocks shared by file providers.
//!
//! This crate provides:
//! - `FileName`: the immutable, URL-shaped identity of a file
//! - Path normalization and charset-aware percent-encoding
//! - `FileSystemOptions`: per-file-system settings loaded from TOML
//! - `FileOperations`: the capability contract a provider implements
//! - `FileObject`: the handle that checks preconditions and drives a provider
//!
//! ## Example
//!
//! ```ignore
//! use vfs_core::{FileName, FileObject, FileType};
//!
//! let name = FileName::parse("webdav://dav.example.com/docs/")?;
//! assert_eq!(name.file_type(), FileType::Folder);
//!
//! // `MyProvider` implements `FileOperations`
//! let file = FileObject::new(MyProvider::new(name));
//! for child in file.children_names()? {
//!     println!("{}", child);
//! }
//! ```

mod error;
mod name;
mod options;
mod provider;
pub mod uri;

pub use error::{Error, Result};
pub use name::{default_port_for_scheme, FileName, FileType};
pub use options::FileSystemOptions;
pub use provider::{FileObject, FileOperations, OutputStream};

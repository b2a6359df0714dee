//! WebDAV client collaborator.
//!
//! The file provider never speaks HTTP itself; it calls a [`WebdavClient`].
//! [`HttpWebdavClient`] is the blocking implementation used in production,
//! tests substitute their own.
//!
//! # Example
//!
//! ```ignore
//! use vfs_webdav::webdav::{HttpWebdavClient, WebdavClient};
//!
//! let client = HttpWebdavClient::builder().build()?;
//! for resource in client.list("http://localhost:8080/dav/", 1)? {
//!     println!("{} {}", resource.href(), resource.content_type());
//! }
//! ```

mod http;
pub mod multistatus;
mod resource;

pub use http::{HttpWebdavClient, HttpWebdavClientBuilder};
pub use resource::{DavResource, DEFAULT_CONTENT_TYPE, MIME_DIRECTORY};

use std::collections::BTreeMap;
use std::io::Read;
use vfs_core::Result;

/// Blocking access to a WebDAV server.
///
/// URLs are absolute and already percent-encoded; they may embed
/// credentials. Any failure is returned unchanged to the caller, there is
/// no retry.
pub trait WebdavClient: Send + Sync {
    /// Whether a resource exists at `url`.
    fn exists(&self, url: &str) -> Result<bool>;

    /// PROPFIND `url` with the given depth (0 or 1), in server order.
    fn list(&self, url: &str, depth: u32) -> Result<Vec<DavResource>>;

    /// Open the content of `url`.
    fn get(&self, url: &str) -> Result<Box<dyn Read + Send>>;

    /// Upload `content` to `url`, replacing what was there.
    fn put(&self, url: &str, content: Vec<u8>) -> Result<()>;

    /// Create a collection at `url`.
    fn create_directory(&self, url: &str) -> Result<()>;

    /// Delete the resource at `url`.
    fn delete(&self, url: &str) -> Result<()>;

    /// PROPPATCH custom properties of `url`.
    fn set_custom_props(
        &self,
        url: &str,
        set: Option<&BTreeMap<String, String>>,
        remove: Option<&[String]>,
    ) -> Result<()>;
}

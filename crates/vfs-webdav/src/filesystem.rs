//! The WebDAV file system: root name, options and client shared by every
//! file resolved from it.

use crate::config::WebdavFileSystemConfig;
use crate::object::WebdavFileObject;
use crate::webdav::WebdavClient;
use log::debug;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use url::Url;
use vfs_core::uri::{percent_decode_path, SEPARATOR};
use vfs_core::{Error, FileName, FileObject, FileSystemOptions, FileType, Result};

/// Schemes served by this provider.
pub const SCHEMES: [&str; 2] = ["webdav", "webdavs"];

/// A WebDAV collection mounted as a file system.
///
/// Cheap to clone; clones share the client.
#[derive(Clone)]
pub struct WebdavFileSystem {
    inner: Arc<WebdavFileSystemInner>,
}

struct WebdavFileSystemInner {
    root: FileName,
    options: FileSystemOptions,
    url_charset: Option<String>,
    client: Arc<dyn WebdavClient>,
}

impl WebdavFileSystem {
    /// Create a file system over an existing client.
    ///
    /// The URL charset is read from `options` here and never again.
    pub fn new(
        root: FileName,
        options: FileSystemOptions,
        client: Arc<dyn WebdavClient>,
    ) -> Result<Self> {
        let url_charset = WebdavFileSystemConfig::url_charset(&options)?;
        Ok(Self {
            inner: Arc::new(WebdavFileSystemInner {
                root: root.with_type(FileType::Folder).with_query(None),
                options,
                url_charset,
                client,
            }),
        })
    }

    /// Connect to `webdav://` or `webdavs://` `uri` over HTTP.
    pub fn connect(uri: &str, options: FileSystemOptions) -> Result<Self> {
        let root = FileName::parse(uri)?;
        if !SCHEMES.contains(&root.scheme().to_ascii_lowercase().as_str()) {
            return Err(Error::InvalidName(format!(
                "{}: unsupported scheme {}, expected webdav or webdavs",
                root,
                root.scheme()
            )));
        }
        let config = WebdavFileSystemConfig::from_options(&options)?;
        let client = config.client_builder().build()?;
        debug!("Connecting to {} (timeout {:?})", root, config.timeout);
        Self::new(root, options, Arc::new(client))
    }

    pub fn root_name(&self) -> &FileName {
        &self.inner.root
    }

    pub fn options(&self) -> &FileSystemOptions {
        &self.inner.options
    }

    /// Charset URLs are encoded in, `None` for UTF-8.
    pub fn url_charset(&self) -> Option<&str> {
        self.inner.url_charset.as_deref()
    }

    pub fn client(&self) -> Arc<dyn WebdavClient> {
        self.inner.client.clone()
    }

    /// Handle on the root collection.
    pub fn root(&self) -> FileObject<WebdavFileObject> {
        self.file(self.inner.root.clone())
    }

    /// Handle on the file named by `name`.
    pub fn file(&self, name: FileName) -> FileObject<WebdavFileObject> {
        FileObject::new(WebdavFileObject::new(name, self))
    }

    /// Resolve a path or URL into a file handle.
    ///
    /// Relative paths are plain text resolved against the root. Absolute
    /// paths and URLs are treated as hrefs: they are percent-decoded in the
    /// URL charset and must point at the root's server. A trailing `/` marks
    /// a folder.
    pub fn resolve_file(&self, path: &str) -> Result<FileObject<WebdavFileObject>> {
        let name = if path.contains("://") || path.starts_with(SEPARATOR) {
            let base = self.root().operations().collection_url()?;
            self.resolve_href(&base, path)?
        } else if path.is_empty() || path == "." {
            self.inner.root.clone()
        } else {
            self.inner.root.child(path, type_hint(path))?
        };
        Ok(self.file(name))
    }

    /// Handles on the children of `folder`, in server order.
    ///
    /// Relative hrefs resolve against the folder's collection URL.
    pub fn children(
        &self,
        folder: &FileObject<WebdavFileObject>,
    ) -> Result<Vec<FileObject<WebdavFileObject>>> {
        let base = folder.operations().collection_url()?;
        folder
            .children_names()?
            .iter()
            .map(|href| self.resolve_href(&base, href).map(|name| self.file(name)))
            .collect()
    }

    /// Name for a server href resolved against `base`, keeping the root's
    /// credentials.
    fn resolve_href(&self, base: &Url, href: &str) -> Result<FileName> {
        let root = &self.inner.root;
        let url = base
            .join(&wire_href(href))
            .map_err(|e| Error::InvalidName(format!("{}: {}", href, e)))?;
        if !same_server(&url, base) {
            return Err(Error::InvalidName(format!(
                "{} is not on {}",
                href,
                root.friendly_uri()
            )));
        }
        let raw_path = url.path();
        root.with_path(
            &percent_decode_path(raw_path, self.url_charset()),
            type_hint(raw_path),
        )
    }
}

impl fmt::Debug for WebdavFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebdavFileSystem")
            .field("root", &self.inner.root.friendly_uri())
            .field("url_charset", &self.inner.url_charset)
            .finish()
    }
}

fn same_server(url: &Url, base: &Url) -> bool {
    url.scheme() == base.scheme()
        && url
            .host_str()
            .unwrap_or_default()
            .eq_ignore_ascii_case(base.host_str().unwrap_or_default())
        && url.port_or_known_default() == base.port_or_known_default()
}

/// `webdav`/`webdavs` URLs in their `http`/`https` form.
fn wire_href(href: &str) -> Cow<'_, str> {
    match href.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("webdavs") => {
            Cow::Owned(format!("https://{}", rest))
        }
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("webdav") => {
            Cow::Owned(format!("http://{}", rest))
        }
        _ => Cow::Borrowed(href),
    }
}

fn type_hint(path: &str) -> FileType {
    if path.ends_with(SEPARATOR) {
        FileType::Folder
    } else {
        FileType::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_href() {
        let cases = [
            ("webdav://h/a", "http://h/a"),
            ("WebDAVs://h:8443/a", "https://h:8443/a"),
            ("http://h/a", "http://h/a"),
            ("/a/b", "/a/b"),
            ("b.txt", "b.txt"),
        ];
        for (href, expected) in cases {
            assert_eq!(wire_href(href), expected, "{href}");
        }
    }

    #[test]
    fn test_same_server() {
        let base = Url::parse("http://dav.example.com/root/").unwrap();
        let same = ["http://DAV.example.com:80/x", "http://dav.example.com/root/y/"];
        for url in same {
            assert!(same_server(&Url::parse(url).unwrap(), &base), "{url}");
        }
        let other = [
            "https://dav.example.com/x",
            "http://dav.example.com:8080/x",
            "http://other.example.com/x",
        ];
        for url in other {
            assert!(!same_server(&Url::parse(url).unwrap(), &base), "{url}");
        }
    }
}

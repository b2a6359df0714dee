use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use url::Url;
use vfs_core::uri::percent_decode_path;

/// Content type reported for collections.
pub const MIME_DIRECTORY: &str = "httpd/unix-directory";

/// Content type reported for resources that do not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Server-reported metadata for one resource of a PROPFIND listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResource {
    href: String,
    content_type: String,
    content_length: i64,
    modified: Option<DateTime<Utc>>,
    custom_props: BTreeMap<String, String>,
}

impl DavResource {
    /// A non-collection resource with default metadata.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            content_length: -1,
            modified: None,
            custom_props: BTreeMap::new(),
        }
    }

    /// A collection resource.
    pub fn directory(href: impl Into<String>) -> Self {
        Self::new(href).with_content_type(MIME_DIRECTORY)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_content_length(mut self, content_length: i64) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn with_custom_prop(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_props.insert(name.into(), value.into());
        self
    }

    /// The href exactly as the server returned it.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Path component of the href, decoded in `charset` (`None` means UTF-8).
    pub fn path(&self, charset: Option<&str>) -> String {
        let raw = match Url::parse(&self.href) {
            Ok(url) => url.path().to_string(),
            Err(_) => self
                .href
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        percent_decode_path(&raw, charset)
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Content length in bytes, `-1` when the server did not report one.
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Properties outside the `DAV:` namespace, keyed by local name.
    pub fn custom_props(&self) -> &BTreeMap<String, String> {
        &self.custom_props
    }

    pub fn into_custom_props(self) -> BTreeMap<String, String> {
        self.custom_props
    }

    /// Whether the server reported this resource as a collection.
    pub fn is_directory(&self) -> bool {
        self.content_type == MIME_DIRECTORY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_of_relative_href() {
        let res = DavResource::new("/dav/my%20file.txt");
        assert_eq!(res.path(None), "/dav/my file.txt");
    }

    #[test]
    fn test_path_in_charset() {
        let res = DavResource::new("/caf%E9.txt");
        assert_eq!(res.path(Some("ISO-8859-1")), "/caf\u{e9}.txt");
        assert_eq!(res.path(None), "/caf%E9.txt");
    }

    #[test]
    fn test_path_of_absolute_href() {
        let res = DavResource::new("https://dav.example.com/dav/sub/?x=1");
        assert_eq!(res.path(None), "/dav/sub/");
    }

    #[test]
    fn test_directory_content_type() {
        assert!(DavResource::directory("/a/").is_directory());
        assert!(!DavResource::new("/a/b").is_directory());
        assert_eq!(DavResource::new("/a/b").content_type(), DEFAULT_CONTENT_TYPE);
        assert_eq!(DavResource::new("/a/b").content_length(), -1);
    }
}

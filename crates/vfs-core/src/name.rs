use crate::uri::{self, SEPARATOR};
use crate::{Error, Result};
use std::fmt;
use url::Url;

/// The kind of object a file name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// A regular file with content.
    File,
    /// A folder that can hold children.
    Folder,
    /// A name with nothing behind it.
    Imaginary,
}

impl FileType {
    /// Whether files of this type can have content.
    pub fn has_content(self) -> bool {
        matches!(self, FileType::File)
    }

    /// Whether files of this type can have children.
    pub fn has_children(self) -> bool {
        matches!(self, FileType::Folder)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileType::File => "file",
            FileType::Folder => "folder",
            FileType::Imaginary => "imaginary",
        };
        f.write_str(label)
    }
}

/// Default port for a scheme, or 0 when the scheme has none.
pub fn default_port_for_scheme(scheme: &str) -> u16 {
    match scheme.to_ascii_lowercase().as_str() {
        "http" | "webdav" => 80,
        "https" | "webdavs" => 443,
        _ => 0,
    }
}

/// Immutable name of a file reachable through a URL.
///
/// The path is always absolute and normalized; it never carries a trailing
/// separator. Folder names get one back when rendered as a URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName {
    scheme: String,
    host: String,
    port: Option<u16>,
    default_port: u16,
    user: Option<String>,
    password: Option<String>,
    path: String,
    file_type: FileType,
    query: Option<String>,
}

impl FileName {
    /// Create a name from its parts. The path is normalized.
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        path: &str,
        file_type: FileType,
    ) -> Result<Self> {
        let scheme = scheme.into();
        let default_port = default_port_for_scheme(&scheme);
        Ok(Self {
            scheme,
            host: host.into(),
            port: None,
            default_port,
            user: None,
            password: None,
            path: uri::normalise_path(path)?,
            file_type,
            query: None,
        })
    }

    /// Parse `scheme://[user[:password]@]host[:port]/path[?query]`.
    ///
    /// The path and credentials are percent-decoded. A trailing separator
    /// marks the name as a folder.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)
            .map_err(|e| Error::InvalidName(format!("{}: {}", input, e)))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidName(format!("{}: missing host", input)))?;

        let raw_path = if url.path().is_empty() { "/" } else { url.path() };
        let file_type = if raw_path.ends_with(SEPARATOR) {
            FileType::Folder
        } else {
            FileType::File
        };
        let path = uri::percent_decode_path(raw_path, None);

        let user = Some(uri::percent_decode_path(url.username(), None)).filter(|u| !u.is_empty());
        let password = url.password().map(|p| uri::percent_decode_path(p, None));

        Ok(Self::new(url.scheme(), host, &path, file_type)?
            .with_port(url.port())
            .with_user_info(user, password)
            .with_query(url.query().map(str::to_string)))
    }

    /// Replace the explicit port.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Replace the credentials.
    pub fn with_user_info(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }

    /// Replace the query string.
    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    /// Replace the scheme, keeping the default port.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Replace the name type.
    pub fn with_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Absolute, normalized, decoded path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Last path segment, empty for the root.
    pub fn base_name(&self) -> &str {
        self.path
            .rsplit(SEPARATOR)
            .next()
            .unwrap_or_default()
    }

    /// Whether this name is the root of its host.
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Name of the parent folder, `None` for the root.
    pub fn parent(&self) -> Option<FileName> {
        if self.is_root() {
            return None;
        }
        let parent_path = match self.path.rfind(SEPARATOR) {
            Some(0) | None => "/".to_string(),
            Some(pos) => self.path[..pos].to_string(),
        };
        let mut parent = self.clone().with_type(FileType::Folder).with_query(None);
        parent.path = parent_path;
        Some(parent)
    }

    /// Name of a direct or nested child, resolved against this name's path.
    pub fn child(&self, name: &str, file_type: FileType) -> Result<FileName> {
        let joined = format!("{}/{}", self.path, name);
        let mut child = self.clone().with_type(file_type).with_query(None);
        child.path = uri::normalise_path(&joined)?;
        Ok(child)
    }

    /// Name with the same authority and a different absolute path.
    pub fn with_path(&self, path: &str, file_type: FileType) -> Result<FileName> {
        let mut resolved = self.clone().with_type(file_type).with_query(None);
        resolved.path = uri::normalise_path(path)?;
        Ok(resolved)
    }

    /// Un-encoded URI, credentials included.
    pub fn uri(&self) -> String {
        let mut out = self.root_uri(self.user.as_deref(), self.password.as_deref());
        out.push_str(&self.rendered_path());
        self.append_query(&mut out);
        out
    }

    /// Un-encoded URI with the password masked, for logs and messages.
    pub fn friendly_uri(&self) -> String {
        let masked = self.password.as_ref().map(|_| "***");
        let mut out = self.root_uri(self.user.as_deref(), masked);
        out.push_str(&self.rendered_path());
        self.append_query(&mut out);
        out
    }

    /// Percent-encoded URI in the given charset (`None` means UTF-8).
    pub fn uri_encoded(&self, charset: Option<&str>) -> Result<String> {
        let user = self
            .user
            .as_deref()
            .map(|u| uri::encode_userinfo(u, charset))
            .transpose()?;
        let password = self
            .password
            .as_deref()
            .map(|p| uri::encode_userinfo(p, charset))
            .transpose()?;

        let mut out = self.root_uri(user.as_deref(), password.as_deref());
        out.push_str(&uri::encode_path(&self.rendered_path(), charset)?);
        self.append_query(&mut out);
        Ok(out)
    }

    fn root_uri(&self, user: Option<&str>, password: Option<&str>) -> String {
        let mut out = format!("{}://", self.scheme);
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            out.push_str(user);
            if let Some(password) = password {
                out.push(':');
                out.push_str(password);
            }
            out.push('@');
        }
        out.push_str(&self.host);
        if let Some(port) = self.port.filter(|p| *p != self.default_port) {
            out.push(':');
            out.push_str(&port.to_string());
        }
        out
    }

    fn rendered_path(&self) -> String {
        if self.file_type == FileType::Folder && !self.is_root() {
            format!("{}/", self.path)
        } else {
            self.path.clone()
        }
    }

    fn append_query(&self, out: &mut String) {
        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.friendly_uri())
    }
}

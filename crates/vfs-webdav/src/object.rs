use crate::filesystem::WebdavFileSystem;
use crate::output::WebdavOutputStream;
use crate::url::url_string;
use crate::webdav::{DavResource, WebdavClient};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use url::Url;
use vfs_core::uri::{normalise_path, percent_decode_path, SEPARATOR};
use vfs_core::{Error, FileName, FileOperations, FileType, OutputStream, Result};

/// A file on a WebDAV server.
///
/// Holds no state besides its name: every operation asks the server again.
#[derive(Clone)]
pub struct WebdavFileObject {
    name: FileName,
    client: Arc<dyn WebdavClient>,
    url_charset: Option<String>,
}

impl WebdavFileObject {
    pub fn new(name: FileName, fs: &WebdavFileSystem) -> Self {
        Self {
            name,
            client: fs.client(),
            url_charset: fs.url_charset().map(str::to_string),
        }
    }

    /// Wire URL of this file, credentials included.
    pub fn url(&self) -> String {
        url_string(&self.name, true, self.url_charset.as_deref())
    }

    /// Wire URL without credentials, for logs and errors.
    fn display_url(&self) -> String {
        url_string(&self.name, false, self.url_charset.as_deref())
    }

    /// The listing entry describing this file, if the server reports one.
    fn server_side(&self) -> Result<Option<DavResource>> {
        trace!("Listing {} to describe {}", self.display_url(), self.name.path());
        let resources = self.client.list(&self.url(), 1)?;
        Ok(find_resource(&resources, self.name.path(), self.url_charset.as_deref()).cloned())
    }

    fn require_server_side(&self) -> Result<DavResource> {
        self.server_side()?
            .ok_or_else(|| Error::NotFound(self.display_url()))
    }

    /// URL of this file as a collection, always ending in a separator.
    ///
    /// Relative hrefs in a listing of this file resolve against it.
    pub(crate) fn collection_url(&self) -> Result<Url> {
        let mut base = Url::parse(&self.url())
            .map_err(|e| Error::InvalidName(format!("{}: {}", self.display_url(), e)))?;
        if !base.path().ends_with(SEPARATOR) {
            let path = format!("{}{}", base.path(), SEPARATOR);
            base.set_path(&path);
        }
        Ok(base)
    }
}

impl fmt::Debug for WebdavFileObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebdavFileObject")
            .field("name", &self.name.friendly_uri())
            .field("url_charset", &self.url_charset)
            .finish()
    }
}

/// First entry whose path, decoded in `charset`, is `path`, or `path` plus a
/// trailing separator when `path` has none.
fn find_resource<'a>(
    resources: &'a [DavResource],
    path: &str,
    charset: Option<&str>,
) -> Option<&'a DavResource> {
    let with_separator = if path.ends_with(SEPARATOR) {
        None
    } else {
        Some(format!("{}{}", path, SEPARATOR))
    };
    resources.iter().find(|res| {
        let res_path = res.path(charset);
        res_path == path || with_separator.as_deref() == Some(res_path.as_str())
    })
}

/// Scheme, authority and normalized decoded path of `href` resolved
/// against `base`. `None` when the href cannot be resolved.
fn normalized_location(base: &Url, href: &str, charset: Option<&str>) -> Option<String> {
    let url = base.join(href).ok()?;
    let path = normalise_path(&percent_decode_path(url.path(), charset)).ok()?;
    Some(format!(
        "{}://{}:{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default().to_ascii_lowercase(),
        url.port_or_known_default().unwrap_or_default(),
        path
    ))
}

impl FileOperations for WebdavFileObject {
    fn name(&self) -> &FileName {
        &self.name
    }

    fn do_get_type(&self) -> Result<FileType> {
        trace!("HEAD {}", self.display_url());
        if !self.client.exists(&self.url())? {
            return Ok(FileType::Imaginary);
        }
        let resource = self.server_side()?.ok_or_else(|| Error::NoMatchingResource {
            url: self.display_url(),
            path: self.name.path().to_string(),
        })?;
        Ok(if resource.is_directory() {
            FileType::Folder
        } else {
            FileType::File
        })
    }

    fn do_list_children(&self) -> Result<Option<Vec<String>>> {
        let display_url = self.display_url();
        let charset = self.url_charset.as_deref();
        trace!("PROPFIND {} depth 1", display_url);
        let resources = match self.client.list(&self.url(), 1) {
            Ok(resources) => resources,
            Err(Error::Status { status: 404, .. }) => {
                debug!("{} does not exist, no children", display_url);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match find_resource(&resources, self.name.path(), charset) {
            Some(own) if own.is_directory() => {}
            Some(_) => {
                debug!("{} is not a folder, no children", display_url);
                return Ok(None);
            }
            None => {
                debug!("{} is missing from its own listing, no children", display_url);
                return Ok(None);
            }
        }

        let base = self.collection_url()?;
        let own_location = normalized_location(&base, base.as_str(), charset);
        let children: Vec<String> = resources
            .into_iter()
            .filter(|res| {
                let location = normalized_location(&base, res.href(), charset);
                location.is_none() || location != own_location
            })
            .map(|res| res.href().to_string())
            .collect();

        debug!("{} has {} children", display_url, children.len());
        Ok(Some(children))
    }

    fn do_get_content_size(&self) -> Result<u64> {
        let resource = self.require_server_side()?;
        u64::try_from(resource.content_length()).map_err(|_| Error::MissingProperty {
            property: "getcontentlength",
            url: self.display_url(),
        })
    }

    fn do_get_last_modified_time(&self) -> Result<i64> {
        let resource = self.require_server_side()?;
        resource
            .modified()
            .map(|modified| modified.timestamp_millis())
            .ok_or_else(|| Error::MissingProperty {
                property: "getlastmodified",
                url: self.display_url(),
            })
    }

    fn do_get_input_stream(&self) -> Result<Box<dyn Read + Send>> {
        trace!("GET {}", self.display_url());
        self.client.get(&self.url())
    }

    fn do_get_output_stream(&self, append: bool) -> Result<Box<dyn OutputStream>> {
        if append {
            debug!("Append is not supported, {} will be replaced", self.display_url());
        }
        Ok(Box::new(WebdavOutputStream::new(
            self.client.clone(),
            self.url(),
            self.display_url(),
        )))
    }

    fn do_create_folder(&self) -> Result<()> {
        trace!("MKCOL {}", self.display_url());
        self.client.create_directory(&self.url())
    }

    fn do_delete(&self) -> Result<()> {
        trace!("DELETE {}", self.display_url());
        self.client.delete(&self.url())
    }

    fn do_is_same_file(&self, other: &FileName) -> Result<bool> {
        Ok(url_string(other, true, self.url_charset.as_deref()) == self.url())
    }

    fn do_get_attributes(&self) -> Result<BTreeMap<String, String>> {
        let display_url = self.display_url();
        trace!("PROPFIND {} depth 0", display_url);
        let mut resources = self.client.list(&self.url(), 0)?;
        if resources.len() != 1 {
            return Err(Error::AmbiguousAttributes {
                url: display_url,
                count: resources.len(),
            });
        }
        let props = resources.remove(0).into_custom_props();
        debug!("{} has {} custom properties", display_url, props.len());
        Ok(props)
    }

    fn do_set_attribute(&self, name: &str, value: &dyn fmt::Display) -> Result<()> {
        trace!("PROPPATCH {} set {}", self.display_url(), name);
        let set = BTreeMap::from([(name.to_string(), value.to_string())]);
        self.client.set_custom_props(&self.url(), Some(&set), None)
    }

    fn do_remove_attribute(&self, name: &str) -> Result<()> {
        trace!("PROPPATCH {} remove {}", self.display_url(), name);
        let remove = [name.to_string()];
        self.client.set_custom_props(&self.url(), None, Some(&remove[..]))
    }
}

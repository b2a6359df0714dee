use crate::webdav::multistatus::DEFAULT_CUSTOM_NAMESPACE;
use crate::webdav::{HttpWebdavClient, HttpWebdavClientBuilder};
use std::time::Duration;
use vfs_core::{FileSystemOptions, Result};

const URL_CHARSET: &str = "url_charset";
const USER_AGENT: &str = "user_agent";
const TIMEOUT_SECS: &str = "timeout_secs";
const CUSTOM_NAMESPACE: &str = "custom_namespace";

/// WebDAV file system configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebdavFileSystemConfig {
    /// Charset used to percent-encode URLs (None = UTF-8)
    pub url_charset: Option<String>,
    /// User-Agent header sent with every request
    pub user_agent: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// XML namespace for custom properties
    pub custom_namespace: String,
}

impl Default for WebdavFileSystemConfig {
    fn default() -> Self {
        Self {
            url_charset: None,
            user_agent: None,
            timeout: Duration::from_secs(30),
            custom_namespace: DEFAULT_CUSTOM_NAMESPACE.to_string(),
        }
    }
}

impl WebdavFileSystemConfig {
    /// Read the WebDAV settings from an option bag, defaulting what is absent.
    pub fn from_options(options: &FileSystemOptions) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            url_charset: options.get_string(URL_CHARSET)?,
            user_agent: options.get_string(USER_AGENT)?,
            timeout: options
                .get_u64(TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            custom_namespace: options
                .get_string(CUSTOM_NAMESPACE)?
                .unwrap_or(defaults.custom_namespace),
        })
    }

    /// Write these settings into an option bag.
    pub fn apply_to(&self, options: &mut FileSystemOptions) {
        match &self.url_charset {
            Some(charset) => options.set_string(URL_CHARSET, charset.clone()),
            None => options.remove(URL_CHARSET),
        }
        match &self.user_agent {
            Some(agent) => options.set_string(USER_AGENT, agent.clone()),
            None => options.remove(USER_AGENT),
        }
        options.set_u64(TIMEOUT_SECS, self.timeout.as_secs());
        options.set_string(CUSTOM_NAMESPACE, self.custom_namespace.clone());
    }

    /// The charset stored in `options`, if any.
    pub fn url_charset(options: &FileSystemOptions) -> Result<Option<String>> {
        options.get_string(URL_CHARSET)
    }

    pub fn set_url_charset(options: &mut FileSystemOptions, charset: impl Into<String>) {
        options.set_string(URL_CHARSET, charset);
    }

    pub(crate) fn client_builder(&self) -> HttpWebdavClientBuilder {
        let mut builder = HttpWebdavClient::builder()
            .timeout(self.timeout)
            .custom_namespace(self.custom_namespace.clone())
            .url_charset(self.url_charset.clone());
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder
    }
}

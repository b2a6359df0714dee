use super::multistatus::{build_proppatch, parse_multistatus, DEFAULT_CUSTOM_NAMESPACE, PROPFIND_REQUEST};
use super::{DavResource, WebdavClient};
use log::{debug, trace};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Read;
use std::time::Duration;
use url::Url;
use vfs_core::uri::percent_decode_path;
use vfs_core::{Error, Result};

/// The header to specify the depth of a PROPFIND.
///
/// - `0`: only the resource itself.
/// - `1`: the resource and its internal members.
///
/// reference: [RFC4918: 10.2. Depth Header](https://datatracker.ietf.org/doc/html/rfc4918#section-10.2)
static HEADER_DEPTH: &str = "Depth";

static XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

fn http_error(err: impl Display) -> Error {
    Error::Http(err.to_string())
}

fn dav_method(name: &str) -> Result<Method> {
    Method::from_bytes(name.as_bytes()).map_err(http_error)
}

/// Builder for [`HttpWebdavClient`].
#[derive(Debug, Clone)]
pub struct HttpWebdavClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    custom_namespace: String,
    url_charset: Option<String>,
}

impl Default for HttpWebdavClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            custom_namespace: DEFAULT_CUSTOM_NAMESPACE.to_string(),
            url_charset: None,
        }
    }
}

impl HttpWebdavClientBuilder {
    /// Transport timeout applied to every request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// XML namespace custom properties are written in.
    pub fn custom_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.custom_namespace = namespace.into();
        self
    }

    /// Charset the credentials of request URLs are percent-encoded in.
    pub fn url_charset(mut self, charset: Option<String>) -> Self {
        self.url_charset = charset;
        self
    }

    pub fn build(self) -> Result<HttpWebdavClient> {
        let mut builder = Client::builder().timeout(self.timeout);
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build().map_err(http_error)?;
        Ok(HttpWebdavClient {
            client,
            custom_namespace: self.custom_namespace,
            url_charset: self.url_charset,
        })
    }
}

/// Blocking WebDAV client over HTTP.
///
/// Credentials embedded in a URL are removed from the request line and sent
/// as HTTP Basic authorization instead.
#[derive(Debug, Clone)]
pub struct HttpWebdavClient {
    client: Client,
    custom_namespace: String,
    url_charset: Option<String>,
}

impl HttpWebdavClient {
    pub fn builder() -> HttpWebdavClientBuilder {
        HttpWebdavClientBuilder::default()
    }

    fn request(&self, method: Method, url: &str) -> Result<PreparedRequest> {
        let (target, credentials) = split_credentials(url, self.url_charset.as_deref())?;
        let display_url = target.to_string();
        let mut builder = self.client.request(method.clone(), target);
        if let Some((user, password)) = credentials {
            builder = builder.basic_auth(user, password);
        }
        Ok(PreparedRequest {
            method,
            url: display_url,
            builder,
        })
    }
}

struct PreparedRequest {
    method: Method,
    url: String,
    builder: RequestBuilder,
}

impl PreparedRequest {
    fn map(mut self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        self.builder = f(self.builder);
        self
    }

    fn send(self) -> Result<(Response, String, Method)> {
        trace!("{} {}", self.method, self.url);
        let response = self.builder.send().map_err(http_error)?;
        debug!("{} {} -> {}", self.method, self.url, response.status());
        Ok((response, self.url, self.method))
    }

    fn send_expecting_success(self) -> Result<Response> {
        let (response, url, method) = self.send()?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(&method, url, response.status()))
        }
    }
}

fn status_error(method: &Method, url: String, status: StatusCode) -> Error {
    Error::Status {
        method: method.to_string(),
        url,
        status: status.as_u16(),
    }
}

/// Strip user info from `url`, returning it decoded in `charset`.
fn split_credentials(
    url: &str,
    charset: Option<&str>,
) -> Result<(Url, Option<(String, Option<String>)>)> {
    let mut target =
        Url::parse(url).map_err(|e| Error::InvalidName(format!("invalid URL: {}", e)))?;
    let user = percent_decode_path(target.username(), charset);
    if user.is_empty() {
        return Ok((target, None));
    }
    let password = target
        .password()
        .map(|password| percent_decode_path(password, charset));
    if target.set_username("").is_err() || target.set_password(None).is_err() {
        return Err(Error::InvalidName(format!(
            "cannot strip credentials from {}",
            target.host_str().unwrap_or_default()
        )));
    }
    Ok((target, Some((user, password))))
}

impl WebdavClient for HttpWebdavClient {
    fn exists(&self, url: &str) -> Result<bool> {
        let (response, url, method) = self.request(Method::HEAD, url)?.send()?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(&method, url, status)),
        }
    }

    fn list(&self, url: &str, depth: u32) -> Result<Vec<DavResource>> {
        let response = self
            .request(dav_method("PROPFIND")?, url)?
            .map(|req| {
                req.header(HEADER_DEPTH, depth.to_string())
                    .header(CONTENT_TYPE, XML_CONTENT_TYPE)
                    .body(PROPFIND_REQUEST)
            })
            .send_expecting_success()?;
        let body = response.bytes().map_err(http_error)?;
        let resources = parse_multistatus(&body)?;
        debug!("PROPFIND depth {} returned {} resources", depth, resources.len());
        Ok(resources)
    }

    fn get(&self, url: &str) -> Result<Box<dyn Read + Send>> {
        let response = self.request(Method::GET, url)?.send_expecting_success()?;
        Ok(Box::new(response))
    }

    fn put(&self, url: &str, content: Vec<u8>) -> Result<()> {
        self.request(Method::PUT, url)?
            .map(|req| req.body(content))
            .send_expecting_success()?;
        Ok(())
    }

    fn create_directory(&self, url: &str) -> Result<()> {
        self.request(dav_method("MKCOL")?, url)?
            .send_expecting_success()?;
        Ok(())
    }

    fn delete(&self, url: &str) -> Result<()> {
        self.request(Method::DELETE, url)?.send_expecting_success()?;
        Ok(())
    }

    fn set_custom_props(
        &self,
        url: &str,
        set: Option<&BTreeMap<String, String>>,
        remove: Option<&[String]>,
    ) -> Result<()> {
        let body = build_proppatch(set, remove, &self.custom_namespace)?;
        self.request(dav_method("PROPPATCH")?, url)?
            .map(|req| req.header(CONTENT_TYPE, XML_CONTENT_TYPE).body(body))
            .send_expecting_success()?;
        Ok(())
    }
}

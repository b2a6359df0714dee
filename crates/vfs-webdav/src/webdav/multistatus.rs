//! PROPFIND and PROPPATCH bodies, and parsing of `207 Multi-Status` replies.

use super::resource::{DavResource, MIME_DIRECTORY};
use chrono::{DateTime, Utc};
use log::debug;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::collections::BTreeMap;
use std::fmt::Display;
use vfs_core::{Error, Result};

/// The request to query all properties of a resource.
///
/// rfc4918 9.1: retrieve all properties defined in the specification and
/// all dead properties set by clients.
pub static PROPFIND_REQUEST: &str = r#"<?xml version="1.0" encoding="utf-8" ?><D:propfind xmlns:D="DAV:"><D:allprop/></D:propfind>"#;

/// Namespace custom properties are written in unless configured otherwise.
pub const DEFAULT_CUSTOM_NAMESPACE: &str = "SAR:";

const DAV_NAMESPACE: &[u8] = b"DAV:";

pub(crate) fn xml_error(err: impl Display) -> Error {
    Error::Xml(err.to_string())
}

/// Parse a `multistatus` document into resources, in document order.
///
/// Properties from `propstat` blocks with a 4xx/5xx status are ignored.
/// Every property outside the `DAV:` namespace becomes a custom property.
pub fn parse_multistatus(bs: &[u8]) -> Result<Vec<DavResource>> {
    let mut reader = NsReader::from_reader(bs);
    reader.config_mut().trim_text(true);

    let mut parser = MultistatusParser::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_resolved_event_into(&mut buf).map_err(xml_error)? {
            (ns, Event::Start(e)) => {
                parser.start(is_dav(&ns), local_name(e.local_name().as_ref()));
            }
            (ns, Event::Empty(e)) => {
                parser.start(is_dav(&ns), local_name(e.local_name().as_ref()));
                parser.end();
            }
            (_, Event::End(_)) => parser.end(),
            (_, Event::Text(t)) => parser.text(&t.unescape().map_err(xml_error)?),
            (_, Event::CData(c)) => parser.text(&String::from_utf8_lossy(&c)),
            (_, Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.resources)
}

/// Build a PROPPATCH body setting and removing custom properties.
pub fn build_proppatch(
    set: Option<&BTreeMap<String, String>>,
    remove: Option<&[String]>,
    namespace: &str,
) -> Result<String> {
    let mut body = String::from(r#"<?xml version="1.0" encoding="utf-8" ?>"#);
    body.push_str(&format!(
        r#"<D:propertyupdate xmlns:D="DAV:" xmlns:S="{}">"#,
        escape(namespace)
    ));

    if let Some(set) = set.filter(|s| !s.is_empty()) {
        body.push_str("<D:set><D:prop>");
        for (name, value) in set {
            check_property_name(name)?;
            body.push_str(&format!("<S:{0}>{1}</S:{0}>", name, escape(value.as_str())));
        }
        body.push_str("</D:prop></D:set>");
    }

    if let Some(remove) = remove.filter(|r| !r.is_empty()) {
        body.push_str("<D:remove><D:prop>");
        for name in remove {
            check_property_name(name)?;
            body.push_str(&format!("<S:{}/>", name));
        }
        body.push_str("</D:prop></D:remove>");
    }

    body.push_str("</D:propertyupdate>");
    Ok(body)
}

/// Parse an HTTP date as used by `getlastmodified`.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    match DateTime::parse_from_rfc2822(value).or_else(|_| DateTime::parse_from_rfc3339(value)) {
        Ok(date) => Some(date.with_timezone(&Utc)),
        Err(e) => {
            debug!("ignoring unparseable getlastmodified {:?}: {}", value, e);
            None
        }
    }
}

fn check_property_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(format!(
            "{:?} is not a valid property name",
            name
        )))
    }
}

fn is_dav(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(n)) if *n == DAV_NAMESPACE)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn status_ok(status: Option<&str>) -> bool {
    // "HTTP/1.1 200 OK"
    status
        .and_then(|s| s.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .map_or(true, |code| code < 400)
}

#[derive(Debug, Default)]
struct PropValues {
    content_type: Option<String>,
    content_length: Option<String>,
    last_modified: Option<String>,
    collection: bool,
    custom: BTreeMap<String, String>,
}

impl PropValues {
    fn merge(&mut self, other: PropValues) {
        self.content_type = other.content_type.or(self.content_type.take());
        self.content_length = other.content_length.or(self.content_length.take());
        self.last_modified = other.last_modified.or(self.last_modified.take());
        self.collection |= other.collection;
        self.custom.extend(other.custom);
    }

    fn into_resource(self, href: String) -> DavResource {
        let mut resource = DavResource::new(href);
        if self.collection {
            resource = resource.with_content_type(MIME_DIRECTORY);
        } else if let Some(content_type) = self.content_type.filter(|c| !c.is_empty()) {
            resource = resource.with_content_type(content_type);
        }
        if let Some(length) = self
            .content_length
            .and_then(|v| v.trim().parse::<i64>().ok())
        {
            resource = resource.with_content_length(length);
        }
        if let Some(modified) = self.last_modified.as_deref().and_then(parse_http_date) {
            resource = resource.with_modified(modified);
        }
        for (name, value) in self.custom {
            resource = resource.with_custom_prop(name, value);
        }
        resource
    }
}

#[derive(Debug)]
struct Element {
    dav: bool,
    local: String,
}

impl Element {
    fn is(&self, local: &str) -> bool {
        self.dav && self.local == local
    }
}

#[derive(Debug, Default)]
struct MultistatusParser {
    stack: Vec<Element>,
    text: String,
    href: Option<String>,
    status: Option<String>,
    response_props: PropValues,
    propstat_props: PropValues,
    resources: Vec<DavResource>,
}

impl MultistatusParser {
    fn parent_is(&self, local: &str) -> bool {
        self.stack.last().is_some_and(|p| p.is(local))
    }

    fn start(&mut self, dav: bool, local: String) {
        let element = Element { dav, local };
        if element.is("response") {
            self.href = None;
            self.response_props = PropValues::default();
        } else if element.is("propstat") {
            self.status = None;
            self.propstat_props = PropValues::default();
        } else if element.is("collection") && self.parent_is("resourcetype") {
            self.propstat_props.collection = true;
        }

        if self.parent_is("prop") || element.is("href") || element.is("status") {
            self.text.clear();
        }
        self.stack.push(element);
    }

    fn text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn end(&mut self) {
        let Some(element) = self.stack.pop() else {
            return;
        };

        if self.parent_is("prop") {
            let value = std::mem::take(&mut self.text).trim().to_string();
            if !element.dav {
                self.propstat_props.custom.insert(element.local, value);
                return;
            }
            match element.local.as_str() {
                "getcontenttype" => self.propstat_props.content_type = Some(value),
                "getcontentlength" => self.propstat_props.content_length = Some(value),
                "getlastmodified" => self.propstat_props.last_modified = Some(value),
                _ => {}
            }
        } else if element.is("href") && self.parent_is("response") {
            self.href = Some(std::mem::take(&mut self.text).trim().to_string());
        } else if element.is("status") && self.parent_is("propstat") {
            self.status = Some(std::mem::take(&mut self.text).trim().to_string());
        } else if element.is("propstat") {
            let props = std::mem::take(&mut self.propstat_props);
            if status_ok(self.status.as_deref()) {
                self.response_props.merge(props);
            } else {
                debug!("skipping propstat with status {:?}", self.status);
            }
        } else if element.is("response") {
            let props = std::mem::take(&mut self.response_props);
            match self.href.take() {
                Some(href) => self.resources.push(props.into_resource(href)),
                None => debug!("skipping multistatus response without href"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
    <D:multistatus xmlns:D="DAV:" xmlns:S="SAR:">
      <D:response>
        <D:href>/dav/docs/</D:href>
        <D:propstat>
          <D:prop>
            <D:displayname>docs</D:displayname>
            <D:getlastmodified>Sat, 07 May 2022 06:39:47 GMT</D:getlastmodified>
            <D:resourcetype><D:collection/></D:resourcetype>
          </D:prop>
          <D:status>HTTP/1.1 200 OK</D:status>
        </D:propstat>
      </D:response>
      <D:response>
        <D:href>/dav/docs/report%20final.txt</D:href>
        <D:propstat>
          <D:prop>
            <D:getcontentlength>1024</D:getcontentlength>
            <D:getcontenttype>text/plain</D:getcontenttype>
            <D:getlastmodified>Sat, 07 May 2022 05:52:22 GMT</D:getlastmodified>
            <D:resourcetype/>
            <S:author>Ada &amp; Bob</S:author>
            <S:flag/>
          </D:prop>
          <D:status>HTTP/1.1 200 OK</D:status>
        </D:propstat>
        <D:propstat>
          <D:prop>
            <D:quota-used-bytes/>
          </D:prop>
          <D:status>HTTP/1.1 404 Not Found</D:status>
        </D:propstat>
      </D:response>
    </D:multistatus>"#;

    #[test]
    fn test_parse_listing() {
        let resources = parse_multistatus(LISTING.as_bytes()).unwrap();
        assert_eq!(resources.len(), 2);

        let dir = &resources[0];
        assert_eq!(dir.href(), "/dav/docs/");
        assert!(dir.is_directory());
        assert_eq!(dir.content_length(), -1);
        assert_eq!(
            dir.modified().unwrap().to_rfc3339(),
            "2022-05-07T06:39:47+00:00"
        );

        let file = &resources[1];
        assert_eq!(file.href(), "/dav/docs/report%20final.txt");
        assert_eq!(file.path(None), "/dav/docs/report final.txt");
        assert!(!file.is_directory());
        assert_eq!(file.content_type(), "text/plain");
        assert_eq!(file.content_length(), 1024);
        assert_eq!(file.custom_props().get("author").unwrap(), "Ada & Bob");
        assert_eq!(file.custom_props().get("flag").unwrap(), "");
        assert_eq!(file.custom_props().len(), 2);
    }

    #[test]
    fn test_parse_any_prefix() {
        let xml = r#"<multistatus xmlns="DAV:">
          <response>
            <href>/x</href>
            <propstat>
              <prop>
                <getcontentlength>3</getcontentlength>
                <z:color xmlns:z="urn:example">blue</z:color>
              </prop>
              <status>HTTP/1.1 200 OK</status>
            </propstat>
          </response>
        </multistatus>"#;

        let resources = parse_multistatus(xml.as_bytes()).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].content_length(), 3);
        assert_eq!(resources[0].custom_props().get("color").unwrap(), "blue");
    }

    #[test]
    fn test_failed_propstat_is_ignored() {
        let xml = r#"<D:multistatus xmlns:D="DAV:"><D:response><D:href>/x</D:href>
          <D:propstat><D:prop><D:getcontentlength>9</D:getcontentlength></D:prop>
          <D:status>HTTP/1.1 403 Forbidden</D:status></D:propstat></D:response></D:multistatus>"#;

        let resources = parse_multistatus(xml.as_bytes()).unwrap();
        assert_eq!(resources[0].content_length(), -1);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_multistatus(b"<D:multistatus xmlns:D=\"DAV:\"><D:response></D:multi>"),
            Err(Error::Xml(_))
        ));
    }

    #[test]
    fn test_build_proppatch_set() {
        let mut set = BTreeMap::new();
        set.insert("author".to_string(), "Ada <ada@example.com>".to_string());
        let body = build_proppatch(Some(&set), None, DEFAULT_CUSTOM_NAMESPACE).unwrap();
        assert_eq!(
            body,
            r#"<?xml version="1.0" encoding="utf-8" ?><D:propertyupdate xmlns:D="DAV:" xmlns:S="SAR:"><D:set><D:prop><S:author>Ada &lt;ada@example.com&gt;</S:author></D:prop></D:set></D:propertyupdate>"#
        );
    }

    #[test]
    fn test_build_proppatch_remove() {
        let remove = vec!["author".to_string()];
        let body = build_proppatch(None, Some(&remove), "urn:x").unwrap();
        assert!(body.contains(r#"xmlns:S="urn:x""#));
        assert!(body.contains("<D:remove><D:prop><S:author/></D:prop></D:remove>"));
        assert!(!body.contains("<D:set>"));
    }

    #[test]
    fn test_build_proppatch_rejects_bad_name() {
        let remove = vec!["not valid".to_string()];
        assert!(matches!(
            build_proppatch(None, Some(&remove), DEFAULT_CUSTOM_NAMESPACE),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn test_parse_http_date() {
        let date = parse_http_date("Fri, 17 Feb 2023 03:37:22 GMT").unwrap();
        assert_eq!(date.timestamp(), 1_676_605_042);
        assert!(parse_http_date("2023-02-17T03:37:22Z").is_some());
        assert!(parse_http_date("yesterday").is_none());
    }
}

//! Wire URLs for WebDAV file names.

use log::warn;
use vfs_core::FileName;

/// Render `name` as an `http`/`https` URL suitable for the WebDAV client.
///
/// `webdavs` (any case) maps to `https`, every other scheme to `http`.
/// Credentials are carried only when `include_user_info` is set. The path
/// and credentials are percent-encoded in `charset` (`None` means UTF-8).
///
/// Encoding is best-effort: when it fails the un-encoded URI of the wire
/// name is returned instead.
pub fn url_string(name: &FileName, include_user_info: bool, charset: Option<&str>) -> String {
    let scheme = if name.scheme().eq_ignore_ascii_case("webdavs") {
        "https"
    } else {
        "http"
    };

    let mut wire = name.clone().with_scheme(scheme);
    if !include_user_info {
        wire = wire.with_user_info(None, None);
    }

    match wire.uri_encoded(charset) {
        Ok(url) => url,
        Err(e) => {
            warn!(
                "Cannot encode {} with charset {}: {}; using the unencoded form",
                wire.friendly_uri(),
                charset.unwrap_or("UTF-8"),
                e
            );
            wire.uri()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfs_core::FileType;

    fn name(uri: &str) -> FileName {
        FileName::parse(uri).unwrap()
    }

    #[test]
    fn test_scheme_mapping() {
        let cases = [
            ("webdavs://h/a", "https://h/a"),
            ("WebDAVS://h/a", "https://h/a"),
            ("webdav://h/a", "http://h/a"),
            ("https://h/a", "http://h/a"),
            ("ftp://h/a", "http://h/a"),
        ];
        for (input, expected) in cases {
            assert_eq!(url_string(&name(input), true, None), expected, "{input}");
        }
    }

    #[test]
    fn test_user_info() {
        let n = name("webdav://bob:s%40cret@h:8080/docs/");
        assert_eq!(url_string(&n, true, None), "http://bob:s%40cret@h:8080/docs/");
        assert_eq!(url_string(&n, false, None), "http://h:8080/docs/");
    }

    #[test]
    fn test_default_port_follows_name_scheme() {
        // webdav keeps default port 80 after mapping to http
        let n = name("webdav://h:80/a");
        assert_eq!(url_string(&n, false, None), "http://h/a");
        let n = name("webdavs://h:443/a");
        assert_eq!(url_string(&n, false, None), "https://h/a");
    }

    #[test]
    fn test_query_and_type_carried() {
        let n = FileName::new("webdav", "h", "/a b", FileType::Folder)
            .unwrap()
            .with_query(Some("x=1".to_string()));
        assert_eq!(url_string(&n, false, None), "http://h/a%20b/?x=1");
    }

    #[test]
    fn test_charset() {
        let n = FileName::new("webdav", "h", "/caf\u{e9}", FileType::File).unwrap();
        assert_eq!(url_string(&n, false, Some("ISO-8859-1")), "http://h/caf%E9");
        assert_eq!(url_string(&n, false, None), "http://h/caf%C3%A9");
    }

    #[test]
    fn test_encoding_failure_falls_back_to_unencoded() {
        let n = FileName::new("webdavs", "h", "/\u{4f60} x", FileType::File).unwrap();
        assert_eq!(url_string(&n, false, Some("ISO-8859-1")), "https://h/\u{4f60} x");
        assert_eq!(url_string(&n, false, Some("no-such-charset")), "https://h/\u{4f60} x");

        let n = n.with_user_info(Some("bob".to_string()), Some("pw".to_string()));
        assert_eq!(url_string(&n, false, Some("no-such-charset")), "https://h/\u{4f60} x");
    }
}

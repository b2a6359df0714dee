//! Path normalization and charset-aware percent-encoding for file names.

use crate::{Error, Result};
use encoding_rs::{Encoding, UTF_8};
use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;

/// Encode set for URL paths.
///
/// Keeps `A-Z a-z 0-9 - _ . ! ~ * ' ( )` and the `/` separator.
static PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encode set for the user and password parts of the authority.
static USERINFO_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Path separator.
pub const SEPARATOR: char = '/';

/// Normalize an absolute path.
///
/// Repeated separators collapse, `.` segments vanish and `..` segments pop
/// their parent. The result always starts with `/` and never ends with one,
/// except for the root itself.
pub fn normalise_path(path: &str) -> Result<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(Error::InvalidPath(path.to_string()));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(format!("/{}", segments.join("/")))
}

/// Percent-decode a path and read the bytes in `charset` (`None` means UTF-8).
///
/// Returns the input untouched when the charset is unknown or the bytes are
/// not valid in it.
pub fn percent_decode_path(path: &str, charset: Option<&str>) -> String {
    let bytes: Cow<'_, [u8]> = percent_decode_str(path).into();
    encoding_for(charset)
        .ok()
        .and_then(|encoding| encoding.decode_without_bom_handling_and_without_replacement(&bytes))
        .map(Cow::into_owned)
        .unwrap_or_else(|| path.to_string())
}

/// Percent-encode a path in the given charset, keeping separators.
pub fn encode_path(path: &str, charset: Option<&str>) -> Result<String> {
    let bytes = charset_bytes(path, charset)?;
    Ok(percent_encode(&bytes, &PATH_ENCODE_SET).to_string())
}

/// Percent-encode a user name or password in the given charset.
pub fn encode_userinfo(value: &str, charset: Option<&str>) -> Result<String> {
    let bytes = charset_bytes(value, charset)?;
    Ok(percent_encode(&bytes, &USERINFO_ENCODE_SET).to_string())
}

/// The encoding registered for a charset label, UTF-8 for `None`.
pub fn encoding_for(charset: Option<&str>) -> Result<&'static Encoding> {
    match charset {
        None => Ok(UTF_8),
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| Error::Encoding(format!("unsupported charset: {}", label))),
    }
}

/// Convert a string into the byte representation of `charset`.
pub fn charset_bytes<'a>(input: &'a str, charset: Option<&str>) -> Result<Cow<'a, [u8]>> {
    let encoding = encoding_for(charset)?;
    let (bytes, used, had_errors) = encoding.encode(input);
    if had_errors {
        return Err(Error::Encoding(format!(
            "{:?} cannot be represented in {}",
            input,
            used.name()
        )));
    }
    Ok(bytes)
}

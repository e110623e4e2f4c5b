//! URI helpers
//!
//! Percent-decoding of user supplied names and locations, and conversion
//! between `file://` URIs and filesystem paths.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file://";

/// Characters escaped when rendering a path as a `file://` URI.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Bytes whose escapes `decode_uri` leaves in place.
const RESERVED: &[u8] = b";/?:@&=+$,#";

/// Percent-decodes `input` like a browser's `decodeURI`.
///
/// Escapes of reserved characters stay escaped so query strings and path
/// segments keep their meaning. Malformed escapes are kept literally and
/// invalid UTF-8 sequences are replaced.
pub fn decode_uri(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match escaped_byte(&bytes[i..]) {
            Some(byte) if !RESERVED.contains(&byte) => {
                decoded.push(byte);
                i += 3;
            }
            Some(_) => {
                decoded.extend_from_slice(&bytes[i..i + 3]);
                i += 3;
            }
            None => {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

/// Value of a `%XX` escape at the start of `bytes`
fn escaped_byte(bytes: &[u8]) -> Option<u8> {
    match bytes {
        [b'%', hi, lo, ..] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
            let hex = [*hi, *lo];
            u8::from_str_radix(std::str::from_utf8(&hex).ok()?, 16).ok()
        }
        _ => None,
    }
}

/// Converts a plain path or a `file://` URI into a filesystem path.
///
/// Every escape in a URI is decoded, reserved characters included.
pub fn to_local_path(location: &str) -> PathBuf {
    match location.strip_prefix(FILE_SCHEME) {
        Some(rest) => PathBuf::from(percent_decode_str(rest).decode_utf8_lossy().into_owned()),
        None => PathBuf::from(location),
    }
}

/// Renders `path` as a `file://` URI.
pub fn to_file_uri(path: &Path) -> String {
    let raw = path.to_string_lossy();
    format!("{}{}", FILE_SCHEME, utf8_percent_encode(&raw, PATH_ESCAPES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_sequences() {
        assert_eq!(decode_uri("who%20killed%20me.doc"), "who killed me.doc");
        assert_eq!(decode_uri("plain.txt"), "plain.txt");
        assert_eq!(decode_uri("caf%C3%A9.txt"), "café.txt");
    }

    #[test]
    fn reserved_escapes_stay_encoded() {
        assert_eq!(
            decode_uri("http://h/a?sig=ab%2Bcd%3D%26x&p=a%2Fb"),
            "http://h/a?sig=ab%2Bcd%3D%26x&p=a%2Fb"
        );
        assert_eq!(
            decode_uri("%3B%2F%3F%3A%40%26%3D%2B%24%2C%23"),
            "%3B%2F%3F%3A%40%26%3D%2B%24%2C%23"
        );
        assert_eq!(decode_uri("a%2fb%20c.txt"), "a%2fb c.txt");
    }

    #[test]
    fn malformed_escapes_are_kept() {
        assert_eq!(decode_uri("100%"), "100%");
        assert_eq!(decode_uri("50%zz off"), "50%zz off");
        assert_eq!(decode_uri("%+1"), "%+1");
    }

    #[test]
    fn file_uri_is_stripped_and_decoded() {
        assert_eq!(
            to_local_path("file:///storage/emulated/0/well%20done.txt"),
            PathBuf::from("/storage/emulated/0/well done.txt")
        );
        assert_eq!(to_local_path("/tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
    }

    #[test]
    fn file_uri_round_trips_spaces() {
        let uri = to_file_uri(Path::new("/data/my file.txt"));
        assert_eq!(uri, "file:///data/my%20file.txt");
        assert_eq!(to_local_path(&uri), PathBuf::from("/data/my file.txt"));

        let uri = to_file_uri(Path::new("/data/a#1?.txt"));
        assert_eq!(to_local_path(&uri), PathBuf::from("/data/a#1?.txt"));
    }
}

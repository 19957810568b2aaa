//! Percent-encoding helpers shared by the authorization URL builder, the
//! form-encoded token request and the OAuth1 signature base string.

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Unreserved characters of RFC 3986 are left as-is, everything else is escaped.
/// OAuth1 signing requires exactly this set, so one set serves both uses.
const UNRESERVED_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Encodes a string for URL safety and returns an owned `String`
///
/// # Example
/// ```
/// use starberry_oauth_client::oauth_core::url_encoding::encode_url_owned;
/// let encoded = encode_url_owned("Hello World!");
/// assert_eq!(encoded, "Hello%20World%21");
/// ```
pub fn encode_url_owned(input: &str) -> String {
    percent_encode(input.as_bytes(), UNRESERVED_SET).to_string()
}

/// Decodes a form value: `+` means space, then percent escapes are resolved.
pub fn decode_form_value(input: &str) -> String {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Joins key/value pairs into `k=v&k=v` with both sides encoded.
pub fn encode_pairs<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode_url_owned(k.as_ref()), encode_url_owned(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parses an `application/x-www-form-urlencoded` body or query string.
///
/// Empty segments are skipped and a key without `=` maps to an empty value.
pub fn parse_query(input: &str) -> Vec<(String, String)> {
    input
        .trim()
        .trim_start_matches('?')
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((k, v)) => (decode_form_value(k), decode_form_value(v)),
            None => (decode_form_value(segment), String::new()),
        })
        .collect()
}

/// Splits a URL into the part before `?` and its decoded query pairs.
pub fn split_url(url: &str) -> (&str, Vec<(String, String)>) {
    match url.split_once('?') {
        Some((base, query)) => (base, parse_query(query)),
        None => (url, Vec::new()),
    }
}

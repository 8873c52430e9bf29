//! Self-signed join URLs.
//!
//! The conferencing server authenticates API calls with a checksum:
//! `sha1(call_name + query_string + shared_secret)` appended as the last
//! query parameter.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::{Digest, Sha1};
use url::Url;

use crate::error::HandshakeError;

/// API call name used in the join checksum
pub const JOIN_CALL: &str = "join";

/// Path of the join API relative to the server host
pub const JOIN_API_PATH: &str = "/bigbluebutton/api/join";

/// Characters escaped in query values.
///
/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ( )`. `'` is escaped as well:
/// the URL parser rewrites a literal `'` in queries, which would invalidate
/// the checksum.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'(')
    .remove(b')');

/// Encode a query value, with spaces as `+` instead of `%20`.
pub fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE)
        .to_string()
        .replace("%20", "+")
}

/// Build the canonical query string: keys in lexicographic order, values
/// encoded with [`encode_value`], pairs joined with `&`.
pub fn build_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, encode_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lowercase hex SHA-1 of `call_name + query_string + secret` (40 characters).
pub fn checksum(call_name: &str, query_string: &str, secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(call_name.as_bytes());
    hasher.update(query_string.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse `"key1=value1,key2=value2"` into individual parameters.
///
/// Keys and values are trimmed; pairs with an empty key or value are
/// skipped. Only the first `=` of a pair separates key and value, anything
/// after a second `=` is dropped.
pub fn parse_extra_attributes(userdata: &str) -> BTreeMap<String, String> {
    userdata
        .split(',')
        .filter_map(|pair| {
            let mut parts = pair.split('=');
            let key = parts.next()?.trim();
            let value = parts.next()?.trim();
            (!key.is_empty() && !value.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Collect the parameters of a join call.
///
/// Fixed parameters first, then extra attributes on top (an attribute with
/// the same key replaces the fixed value).
pub fn join_params(
    full_name: &str,
    meeting_id: &str,
    password: &str,
    extra_attributes: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::from([
        ("fullName".to_string(), full_name.to_string()),
        ("meetingID".to_string(), meeting_id.to_string()),
        ("password".to_string(), password.to_string()),
        ("redirect".to_string(), "true".to_string()),
    ]);
    params.extend(
        extra_attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    params
}

/// Build a signed join URL: `{host}/bigbluebutton/api/join?{query}&checksum={sha1}`.
pub fn signed_join_url(
    host: &Url,
    params: &BTreeMap<String, String>,
    secret: &str,
) -> Result<Url, HandshakeError> {
    let query = build_query(params);
    let checksum = checksum(JOIN_CALL, &query, secret);
    let raw = format!(
        "{}{}?{}&checksum={}",
        host.as_str().trim_end_matches('/'),
        JOIN_API_PATH,
        query,
        checksum
    );
    Url::parse(&raw).map_err(|e| HandshakeError::InvalidJoinUrl(format!("{}: {}", raw, e)))
}

//! Concrete [`DataSource`](crate::source::DataSource) implementations and
//! the normalization helpers they share.

pub mod gcd;
pub mod goodreads;
pub mod isfdb;
pub mod librarything;
pub mod openlibrary;
pub mod rpggeek;
pub mod wikipedia;

pub use gcd::GcdSource;
pub use goodreads::GoodreadsSource;
pub use isfdb::IsfdbSource;
pub use librarything::LibraryThingSource;
pub use openlibrary::OpenLibrarySource;
pub use rpggeek::RpgGeekSource;
pub use wikipedia::WikipediaSource;

use serde_json::Value;

use crate::error::UpstreamError;
use crate::xml::XmlNode;

/// Strip separators from an ISBN and check it is 10 or 13 characters.
pub(crate) fn normalize_isbn(raw: &str) -> Result<String, UpstreamError> {
    let isbn: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let valid_chars = isbn
        .char_indices()
        .all(|(i, c)| c.is_ascii_digit() || (c == 'X' && i == isbn.len() - 1));
    if !valid_chars || !matches!(isbn.len(), 10 | 13) {
        return Err(UpstreamError::InvalidParameter(format!(
            "'{raw}' is not a valid ISBN-10 or ISBN-13"
        )));
    }
    Ok(isbn)
}

/// Parse an XML body, mapping failures to a protocol error.
pub(crate) fn parse_xml(source_name: &'static str, body: &str) -> Result<XmlNode, UpstreamError> {
    XmlNode::parse(body)
        .map_err(|e| UpstreamError::protocol(source_name, format!("malformed XML: {e}")))
}

/// Remove HTML tags and collapse whitespace.
pub(crate) fn strip_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A non-empty string field of a JSON object.
pub(crate) fn json_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Wrap an optional string as JSON, `null` when absent.
pub(crate) fn opt(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

/// Parse an optional integer out of XML text such as `1965` or `1965-08-00`.
pub(crate) fn leading_year(raw: Option<String>) -> Value {
    raw.and_then(|s| s.get(..4).and_then(|y| y.parse::<i64>().ok()))
        .filter(|y| *y > 0)
        .map(Value::from)
        .unwrap_or(Value::Null)
}

//! SOAP envelopes and the bits of XML we need to read back.

use std::fmt::Write as _;

use crate::SonosError;

/// Builds a SOAP request for `service#action`.
pub(crate) fn envelope(service: &str, action: &str, args: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in args {
        let _ = write!(body, "<{name}>{}</{name}>", escape_xml(value));
    }
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<s:Body><u:{action} xmlns:u="{service}">{body}</u:{action}></s:Body>"#,
            "</s:Envelope>"
        ),
        action = action,
        service = service,
        body = body,
    )
}

/// Escapes text for use inside an XML element.
pub(crate) fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Returns the unescaped text of the first `<tag>` element, ignoring namespace prefixes.
pub(crate) fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];
        let end = rest.find('>')?;
        let open = &rest[..end];
        rest = &rest[end + 1..];

        if open.starts_with('/') || open.ends_with('/') {
            continue;
        }
        let name = open.split_whitespace().next().unwrap_or_default();
        let local = name.rsplit(':').next().unwrap_or(name);
        if local != tag {
            continue;
        }

        let close = rest.find(&format!("</{name}>"))?;
        return Some(unescape_xml(&rest[..close]));
    }
    None
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Turns a UPnP fault body into an error.
pub(crate) fn parse_fault(action: &'static str, body: &str) -> Option<SonosError> {
    extract_tag(body, "errorCode").map(|code| SonosError::Fault { action, code })
}

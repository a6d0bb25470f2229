//! Device address normalization.
//!
//! Many cameras advertise their own service addresses as `localhost`,
//! `127.0.0.1` or with no host at all. Those placeholders are useless to a
//! remote client, so every address handed out by this crate is rewritten to
//! the device's real base address (`host[:port]`) first.
//!
//! Only `scheme://authority` is inspected and
//! the rest of the URI is carried through untouched. Anything that doesn't
//! have that shape is returned unchanged rather than failing the caller.

/// Components of an absolute `scheme://authority/rest` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UriParts<'a> {
    scheme: &'a str,
    /// `user[:password]@` including the trailing `@`, or empty.
    userinfo: &'a str,
    /// `host[:port]`.
    host_port: &'a str,
    /// Path, query and fragment (starts with `/`, `?`, `#`, or is empty).
    rest: &'a str,
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn split_uri(uri: &str) -> Option<UriParts<'_>> {
    let (scheme, after) = uri.split_once("://")?;
    if !is_valid_scheme(scheme) {
        return None;
    }

    let end = after.find(['/', '?', '#']).unwrap_or(after.len());
    let authority = &after[..end];
    if authority.chars().any(char::is_whitespace) {
        return None;
    }

    let (userinfo, host_port) = match authority.rfind('@') {
        Some(idx) => authority.split_at(idx + 1),
        None => ("", authority),
    };

    Some(UriParts {
        scheme,
        userinfo,
        host_port,
        rest: &after[end..],
    })
}

/// Strips an optional `:port` suffix. Bracketed IPv6 literals keep their brackets.
fn strip_port(host_port: &str) -> &str {
    if host_port.starts_with('[') {
        return match host_port.find(']') {
            Some(idx) => &host_port[..=idx],
            None => host_port,
        };
    }
    match host_port.split_once(':') {
        Some((host, _)) => host,
        None => host_port,
    }
}

/// Returns true if `host` does not identify a reachable device.
///
/// Empty, `localhost` and `127.0.0.1` (case-insensitive, with or without a
/// `:port` suffix) are placeholders.
#[must_use]
pub fn is_placeholder_host(host: &str) -> bool {
    let hostname = strip_port(host.trim());
    hostname.is_empty()
        || hostname.eq_ignore_ascii_case("localhost")
        || hostname == "127.0.0.1"
}

/// Rewrites a placeholder host in `uri` to `base_address`.
///
/// Host and port are both replaced, since the base address carries its own
/// port. Scheme, userinfo, path, query and fragment are preserved. Inputs
/// that don't parse as `scheme://authority...` are returned unchanged.
///
/// Idempotent: a URI whose host is already `base_address` is left alone.
#[must_use]
pub fn normalize(uri: &str, base_address: &str) -> String {
    match split_uri(uri) {
        Some(parts) if is_placeholder_host(parts.host_port) => format!(
            "{}://{}{}{}",
            parts.scheme, parts.userinfo, base_address, parts.rest
        ),
        _ => uri.to_string(),
    }
}

/// Applies [`normalize`] to every whitespace separated token of `text`.
///
/// Separators are preserved exactly, so `XAddrs` lists and indented element
/// text keep their original layout.
#[must_use]
pub fn normalize_list(text: &str, base_address: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        let ws_end = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        out.push_str(&rest[..ws_end]);
        rest = &rest[ws_end..];

        let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if token_end > 0 {
            out.push_str(&normalize(&rest[..token_end], base_address));
        }
        rest = &rest[token_end..];
    }

    out
}

/// Returns the `host[:port]` part of an absolute URI, without userinfo.
#[must_use]
pub fn authority_of(uri: &str) -> Option<&str> {
    split_uri(uri).map(|parts| parts.host_port)
}

/// Returns the host of an absolute URI, without port or userinfo.
#[must_use]
pub fn host_of(uri: &str) -> Option<&str> {
    authority_of(uri).map(strip_port)
}

/// Returns `Some(true)` if the URI parses and its host is a placeholder,
/// `None` if it doesn't parse at all.
#[must_use]
pub fn has_placeholder_host(uri: &str) -> Option<bool> {
    authority_of(uri).map(is_placeholder_host)
}

/// Errors from [`check_base_address`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BaseAddressError {
    #[error("base address is empty")]
    Empty,
    /// A URI was given where `host[:port]` was expected.
    #[error("expected host[:port], got a URI with a scheme")]
    ContainsScheme,
    #[error("expected host[:port], got a path")]
    ContainsPath,
    #[error("base address contains whitespace")]
    ContainsWhitespace,
}

/// Validates a device base address (`host[:port]`).
pub fn check_base_address(xaddr: &str) -> Result<(), BaseAddressError> {
    if xaddr.is_empty() {
        return Err(BaseAddressError::Empty);
    }
    if xaddr.contains("://") {
        return Err(BaseAddressError::ContainsScheme);
    }
    if xaddr.chars().any(char::is_whitespace) {
        return Err(BaseAddressError::ContainsWhitespace);
    }
    if xaddr.contains(['/', '?', '#']) {
        return Err(BaseAddressError::ContainsPath);
    }
    Ok(())
}

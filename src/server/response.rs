use crate::handler::HandlerResponse;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Lines written without allocation.
const STATIC_LINES: &[&str] = &[
    "Content-Type: application/json",
    "Content-Type: text/html; charset=utf-8",
    "Content-Type: text/plain; charset=utf-8",
    "Content-Type: text/css",
    "Content-Type: application/javascript",
    "Content-Type: application/octet-stream",
    "Content-Type: image/png",
    "Content-Type: image/svg+xml",
    "Content-Type: image/x-icon",
    "WWW-Authenticate: Basic",
    "WWW-Authenticate: Bearer",
];

/// Headers whose values come from a small closed set (media types, method
/// lists), so their lines may be interned.
const INTERNED_NAMES: &[&str] = &["Content-Type", "Allow", "WWW-Authenticate"];

/// Upper bound on distinct interned lines.
const MAX_INTERNED_LINES: usize = 256;

/// `may_minihttp` only accepts `&'static str` header lines. Each interned line
/// is leaked once; the set never grows past [`MAX_INTERNED_LINES`].
static HEADER_LINES: Lazy<Mutex<HashSet<&'static str>>> = Lazy::new(|| Mutex::new(HashSet::new()));

pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

fn static_line(name: &str, value: &str) -> Option<&'static str> {
    STATIC_LINES.iter().copied().find(|line| {
        line.split_once(": ")
            .is_some_and(|(n, v)| n.eq_ignore_ascii_case(name) && v == value)
    })
}

fn intern(lines: &mut HashSet<&'static str>, line: String) -> Option<&'static str> {
    if let Some(existing) = lines.get(line.as_str()).copied() {
        return Some(existing);
    }
    if lines.len() >= MAX_INTERNED_LINES {
        return None;
    }
    let leaked: &'static str = Box::leak(line.into_boxed_str());
    lines.insert(leaked);
    Some(leaked)
}

/// The wire line for a header, or `None` when it cannot be written.
///
/// Only [`INTERNED_NAMES`] are accepted. Values with CR or LF are refused.
fn header_line(name: &str, value: &str) -> Option<&'static str> {
    if value.contains(['\r', '\n']) || name.contains(['\r', '\n', ':']) {
        return None;
    }
    if let Some(line) = static_line(name, value) {
        return Some(line);
    }
    let name = INTERNED_NAMES
        .iter()
        .copied()
        .find(|n| n.eq_ignore_ascii_case(name))?;
    let mut lines = HEADER_LINES.lock().unwrap_or_else(PoisonError::into_inner);
    intern(&mut lines, format!("{name}: {value}"))
}

/// Write `hr` to the wire response.
///
/// Headers outside the interned set are dropped with a warning.
pub fn write_handler_response(res: &mut Response, hr: HandlerResponse) {
    res.status_code(usize::from(hr.status), status_reason(hr.status));
    for (name, value) in &hr.headers {
        match header_line(name, value) {
            Some(line) => {
                res.header(line);
            }
            None => warn!(header = %name, "Response header not written"),
        }
    }
    res.body_vec(hr.body);
}

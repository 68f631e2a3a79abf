use may_minihttp::Request;
use std::collections::HashMap;
use std::io::{self, Read};
use tracing::{debug, info};

/// Parsed HTTP request data used by `AppService` and the binder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Parsed cookies from Cookie header
    pub cookies: HashMap<String, String>,
    /// Query string pairs in arrival order; repeated keys are kept
    pub query: Vec<(String, String)>,
    /// Raw request body
    pub body: Vec<u8>,
}

impl ParsedRequest {
    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Last value of a query parameter
    #[must_use]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a repeated query parameter, in order
    #[must_use]
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Media type of the body without parameters, lowercased
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.get_header("content-type")
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
    }

    /// A parameter of the content type header, e.g. the multipart `boundary`
    #[must_use]
    pub fn content_type_param(&self, key: &str) -> Option<String> {
        let ct = self.get_header("content-type")?;
        ct.split(';').skip(1).find_map(|part| {
            let (k, v) = part.trim().split_once('=')?;
            k.trim()
                .eq_ignore_ascii_case(key)
                .then(|| v.trim().trim_matches('"').to_string())
        })
    }
}

/// Parse the `Cookie` header into a name/value map.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    if name.is_empty() {
                        return None;
                    }
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter names
/// and values. Repeated keys stay as separate pairs so array parameters can be
/// sent as `?tag=a&tag=b`.
///
/// # Arguments
///
/// * `path` - The full URL path (e.g., `/users?limit=10&offset=20`)
pub fn parse_query_params(path: &str) -> Vec<(String, String)> {
    match path.split_once('?') {
        Some((_, query_str)) => url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}

/// Read the whole request body.
pub(crate) fn read_body(mut reader: impl Read) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    reader.read_to_end(&mut body)?;
    Ok(body)
}

/// Parse an incoming HTTP request into a [`ParsedRequest`]
///
/// The body is kept as raw bytes; the binder decides how to read it from the
/// content type and the declared parameters.
///
/// # Errors
///
/// The I/O error when the body cannot be read to the end.
pub fn parse_request(req: Request) -> io::Result<ParsedRequest> {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();
    debug!(
        header_count = headers.len(),
        header_names = ?headers.keys().take(20).collect::<Vec<_>>(),
        "Headers extracted"
    );

    let cookies = parse_cookies(&headers);
    let query = parse_query_params(&raw_path);
    debug!(
        cookie_count = cookies.len(),
        param_count = query.len(),
        "Cookies and query params parsed"
    );

    let body = read_body(req.body())?;
    if !body.is_empty() {
        info!(
            body_size_bytes = body.len(),
            content_type = headers.get("content-type").map(String::as_str).unwrap_or(""),
            "Request body read"
        );
    }

    info!(method = %method, path = %path, "HTTP request parsed");

    Ok(ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query,
        body,
    })
}

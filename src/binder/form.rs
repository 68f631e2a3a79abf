//! Form bodies: `application/x-www-form-urlencoded` and `multipart/form-data`.

use crate::server::ParsedRequest;
use futures::{executor, future, stream};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// A file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Metadata exposed as the bound argument value.
    pub(crate) fn describe(&self) -> Value {
        json!({
            "filename": self.filename,
            "content_type": self.content_type,
            "size": self.data.len(),
        })
    }
}

/// Fields and files read from a form body.
#[derive(Debug, Default)]
pub(crate) struct FormData {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, UploadedFile)>,
}

impl FormData {
    pub fn field_values(&self, name: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn files(&self, name: &str) -> Vec<UploadedFile> {
        self.files
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, f)| f.clone())
            .collect()
    }
}

/// Read the form body of `req`, if its content type is a form type.
///
/// # Errors
///
/// The `multer` error for a multipart body without a boundary or with
/// malformed parts.
pub(crate) fn read_form(req: &ParsedRequest) -> Result<FormData, multer::Error> {
    match req.content_type().as_deref() {
        Some("application/x-www-form-urlencoded") => Ok(FormData {
            fields: url::form_urlencoded::parse(&req.body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            files: Vec::new(),
        }),
        Some("multipart/form-data") => {
            let content_type = req.get_header("content-type").unwrap_or_default();
            let boundary = multer::parse_boundary(content_type)?;
            parse_multipart(req.body.clone(), boundary)
        }
        _ => Ok(FormData::default()),
    }
}

/// Read every part of a multipart body.
///
/// The body is already in memory, so it is fed to `multer` as a one-item
/// stream and the parse is driven to completion on the current coroutine.
pub(crate) fn parse_multipart(
    body: Vec<u8>,
    boundary: String,
) -> Result<FormData, multer::Error> {
    let stream = stream::once(future::ready(Ok::<_, std::io::Error>(body)));
    let mut multipart = multer::Multipart::new(stream, boundary);
    let form = executor::block_on(async move {
        let mut form = FormData::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(ToString::to_string);
            let data = field.bytes().await?;
            match filename {
                Some(filename) => form.files.push((
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        data: data.to_vec(),
                    },
                )),
                None => form
                    .fields
                    .push((name, String::from_utf8_lossy(&data).into_owned())),
            }
        }
        Ok::<_, multer::Error>(form)
    })?;
    debug!(
        field_count = form.fields.len(),
        file_count = form.files.len(),
        "Multipart body parsed"
    );
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multipart_fields_and_files() {
        let body = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\r\n\
            hello\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            file body\r\n\
            --XyZ--\r\n";
        let form = parse_multipart(body.as_bytes().to_vec(), "XyZ".to_string()).unwrap();
        assert_eq!(form.field_values("title"), vec!["hello".to_string()]);
        let files = form.files("upload");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "a.txt");
        assert_eq!(files[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(files[0].data, b"file body");
    }

    #[test]
    fn test_boundary_text_inside_part_is_kept() {
        let body = "--XyZ\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"b.bin\"\r\n\r\n\
            a--XyZb\r\n\
            --XyZ--\r\n";
        let form = parse_multipart(body.as_bytes().to_vec(), "XyZ".to_string()).unwrap();
        let files = form.files("upload");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].data, b"a--XyZb");
        assert_eq!(files[0].content_type, None);
    }

    #[test]
    fn test_multipart_without_boundary() {
        let mut req = ParsedRequest::default();
        req.headers
            .insert("content-type".to_string(), "multipart/form-data".to_string());
        req.body = b"--x\r\n".to_vec();
        assert!(read_form(&req).is_err());
    }

    #[test]
    fn test_read_urlencoded() {
        let mut req = ParsedRequest::default();
        req.headers.insert(
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        req.body = b"name=Rex&tag=a+b".to_vec();
        let form = read_form(&req).unwrap();
        assert_eq!(form.field_values("tag"), vec!["a b".to_string()]);
        assert!(form.files.is_empty());
    }
}

//! Static asset directory, used for self-hosted Swagger UI bundles.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Files served from one base directory. Paths that would leave the base
/// directory are rejected.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    /// Media type by file extension.
    pub fn content_type(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "html" => "text/html; charset=utf-8",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" | "map" => "application/json",
            "png" => "image/png",
            "svg" => "image/svg+xml",
            "ico" => "image/x-icon",
            "txt" => "text/plain; charset=utf-8",
            _ => "application/octet-stream",
        }
    }

    /// Read `url_path` relative to the base directory.
    ///
    /// # Errors
    ///
    /// `NotFound` for traversal attempts, missing files and directories.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            debug!(path = %path.display(), "Static asset not found");
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_map_path_prevents_traversal() {
        let sf = StaticFiles::new("assets");
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("css/../../secret").is_none());
        assert_eq!(sf.map_path("/./app.js"), Some(PathBuf::from("assets/app.js")));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("swagger-ui.css"), "body{}").unwrap();
        let sf = StaticFiles::new(dir.path());
        let (bytes, ct) = sf.load("swagger-ui.css").unwrap();
        assert_eq!(ct, "text/css");
        assert_eq!(bytes, b"body{}");
        assert!(sf.load("missing.js").is_err());
        assert!(sf.load("").is_err());
    }
}

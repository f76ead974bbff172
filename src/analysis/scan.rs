use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unsupported file kind `{kind}` - please upload an image file (JPEG, PNG, DICOM)")]
    UnsupportedKind { kind: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// An uploaded scan, held as raw bytes plus the media kind derived from the
/// file name. The bytes stay opaque until the analysis worker decodes a
/// preview from them.
#[derive(Debug)]
pub struct ScanFile {
    pub name: String,
    pub kind: String,
    pub bytes: Vec<u8>,
}

impl ScanFile {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            bytes,
        }
    }

    pub fn load(path: &Path) -> Result<Self, UploadError> {
        let bytes = std::fs::read(path).map_err(|source| UploadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            kind: kind_for_path(path),
            name,
            bytes,
        })
    }

    pub fn is_image(&self) -> bool {
        self.kind.starts_with("image/")
    }
}

pub fn kind_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("dcm") | Some("dicom") => "application/dicom",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn kind_follows_extension() {
        assert_eq!(kind_for_path(Path::new("scan.png")), "image/png");
        assert_eq!(kind_for_path(Path::new("scan.JPG")), "image/jpeg");
        assert_eq!(kind_for_path(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(kind_for_path(Path::new("scan.tiff")), "image/tiff");
        assert_eq!(kind_for_path(Path::new("notes.txt")), "text/plain");
        assert_eq!(kind_for_path(Path::new("scan.dcm")), "application/dicom");
        assert_eq!(
            kind_for_path(Path::new("mystery")),
            "application/octet-stream"
        );
    }

    #[test]
    fn image_kinds_are_accepted_kinds() {
        assert!(ScanFile::new("a.png", "image/png", vec![]).is_image());
        assert!(ScanFile::new("a.jpg", "image/jpeg", vec![]).is_image());
        assert!(!ScanFile::new("a.txt", "text/plain", vec![]).is_image());
        assert!(!ScanFile::new("a.dcm", "application/dicom", vec![]).is_image());
    }

    #[test]
    fn load_reads_bytes_and_derives_kind() {
        let mut file = tempfile::Builder::new()
            .prefix("slice")
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        file.write_all(b"not really a png").expect("write");

        let scan = ScanFile::load(file.path()).expect("load");
        assert_eq!(scan.kind, "image/png");
        assert_eq!(scan.bytes, b"not really a png");
        assert!(scan.name.ends_with(".png"));
    }

    #[test]
    fn load_reports_missing_files() {
        let err = ScanFile::load(Path::new("/nonexistent/scan.png")).unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }
}

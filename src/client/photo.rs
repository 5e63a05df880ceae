//! Photo attachments for multipart uploads

use super::ClientError;
use reqwest::multipart::Part;
use std::io::Read;
use std::path::Path;

/// Fallback when the extension tells us nothing
const DEFAULT_MIME: &str = "image/jpeg";

/// Image file read into memory for a single request.
///
/// The file handle lives only inside [`PetPhoto::load`]; it is closed before
/// any request is sent.
#[derive(Debug, Clone)]
pub struct PetPhoto {
    file_name: String,
    mime: &'static str,
    data: Vec<u8>,
}

impl PetPhoto {
    /// Read a photo from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let photo_err = |source: std::io::Error| ClientError::Photo {
            path: path.to_path_buf(),
            source,
        };

        let data = {
            let mut file = std::fs::File::open(path).map_err(photo_err)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data).map_err(photo_err)?;
            data
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());

        Ok(Self {
            mime: guess_mime(path),
            file_name,
            data,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert into a multipart file part
    pub fn into_part(self) -> Result<Part, ClientError> {
        Part::bytes(self.data)
            .file_name(self.file_name)
            .mime_str(self.mime)
            .map_err(|e| ClientError::Build(format!("invalid photo MIME type: {}", e)))
    }
}

/// MIME type from file extension
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => DEFAULT_MIME,
    }
}

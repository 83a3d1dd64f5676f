//! Inline image payloads: `data:image/<ext>;base64,<payload>`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::error::DomainError;
use crate::storage::{AssetStore, StorageError};

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "gif", "webp"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image must be a data URI of the form data:image/<ext>;base64,<payload>")]
    Malformed,

    #[error("Unsupported image type {0:?}")]
    UnsupportedType(String),

    #[error("Image payload is not valid base64")]
    InvalidBase64,

    #[error("Image is empty")]
    Empty,
}

impl From<ImageError> for DomainError {
    fn from(e: ImageError) -> Self {
        DomainError::validation("image", e.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: String,
}

/// Maps a MIME type such as `image/png` onto an allowed file extension.
pub fn extension_for_mime(mime: &str) -> Result<String, ImageError> {
    let subtype = mime
        .trim()
        .strip_prefix("image/")
        .ok_or_else(|| ImageError::UnsupportedType(mime.to_string()))?
        .to_ascii_lowercase();
    if ALLOWED_EXTENSIONS.contains(&subtype.as_str()) {
        Ok(subtype)
    } else {
        Err(ImageError::UnsupportedType(subtype))
    }
}

pub fn decode_data_uri(uri: &str) -> Result<DecodedImage, ImageError> {
    let rest = uri.trim().strip_prefix("data:").ok_or(ImageError::Malformed)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::Malformed)?;
    let mime = header.strip_suffix(";base64").ok_or(ImageError::Malformed)?;
    let extension = extension_for_mime(mime)?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| ImageError::InvalidBase64)?;
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    Ok(DecodedImage { bytes, extension })
}

/// Writes the image to the asset store and returns its key as a string.
pub async fn save(store: &dyn AssetStore, image: &DecodedImage) -> Result<String, DomainError> {
    match store.put(&image.bytes, &image.extension).await {
        Ok(key) => Ok(key.to_string()),
        Err(StorageError::SizeLimitExceeded { limit, .. }) => Err(DomainError::validation(
            "image",
            format!("Image must not exceed {limit} bytes"),
        )),
        Err(e) => {
            tracing::error!(error = %e, "Failed to store image");
            Err(DomainError::Backend(e.to_string()))
        }
    }
}

// src/image.rs
use std::sync::Arc;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects the format from the leading magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }
        None
    }
}

/// Photo bytes shared between turns without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Arc<[u8]>,
    format: ImageFormat,
}

impl ImageData {
    /// Validates raw bytes as an uploadable photo.
    pub fn from_bytes(bytes: Vec<u8>, max_bytes: usize) -> Result<Self, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::InvalidImage("image is empty".into()));
        }
        if bytes.len() > max_bytes {
            return Err(ServiceError::InvalidImage(format!(
                "image is {} bytes, limit is {max_bytes}",
                bytes.len()
            )));
        }
        let format = ImageFormat::from_magic_bytes(&bytes).ok_or_else(|| {
            ServiceError::InvalidImage("unsupported or unreadable image format".into())
        })?;
        Ok(Self {
            bytes: bytes.into(),
            format,
        })
    }

    /// Decodes a base64 payload, with or without a `data:` URL prefix.
    pub fn from_base64(payload: &str, max_bytes: usize) -> Result<Self, ServiceError> {
        let encoded = match payload.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => payload,
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| ServiceError::InvalidImage(format!("bad base64: {e}")))?;
        Self::from_bytes(bytes, max_bytes)
    }

    /// Wraps bytes returned by a provider. The bytes must be a recognised
    /// format within `max_bytes`, otherwise the output is unusable as the
    /// source of a later edit.
    pub fn generated(
        bytes: Vec<u8>,
        declared: Option<ImageFormat>,
        max_bytes: usize,
    ) -> Result<Self, ServiceError> {
        if bytes.is_empty() {
            return Err(ServiceError::UpstreamUnavailable(
                "provider returned an empty image".into(),
            ));
        }
        if bytes.len() > max_bytes {
            return Err(ServiceError::UpstreamUnavailable(format!(
                "provider returned {} bytes, limit is {max_bytes}",
                bytes.len()
            )));
        }
        let format = ImageFormat::from_magic_bytes(&bytes).ok_or_else(|| {
            ServiceError::UpstreamUnavailable(format!(
                "provider returned unrecognised image data (declared {})",
                declared.map_or("nothing", |f| f.mime_type())
            ))
        })?;
        if declared.is_some_and(|d| d != format) {
            tracing::debug!(
                declared = declared.map(|d| d.mime_type()),
                detected = format.mime_type(),
                "provider mislabelled image"
            );
        }
        Ok(Self {
            bytes: bytes.into(),
            format,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.to_base64())
    }
}

//! Payment proof storage on top of `object_store`.

use std::sync::Arc;

use bytes::Bytes;
use image::ImageFormat;
use object_store::{ObjectStore, PutPayload, local::LocalFileSystem, memory::InMemory, path::Path};

use crate::error::ApiError;

const ALLOWED: [(&str, ImageFormat, &str); 4] = [
    ("image/jpeg", ImageFormat::Jpeg, "jpg"),
    ("image/jpg", ImageFormat::Jpeg, "jpg"),
    ("image/png", ImageFormat::Png, "png"),
    ("image/webp", ImageFormat::WebP, "webp"),
];

#[derive(Clone)]
pub struct ProofStore {
    inner: Arc<dyn ObjectStore>,
}

impl ProofStore {
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self { inner }
    }

    /// Stores proofs below `dir`, creating it when missing.
    pub fn local(dir: &str) -> Result<Self, ApiError> {
        std::fs::create_dir_all(dir)?;
        let fs = LocalFileSystem::new_with_prefix(dir)?;
        Ok(Self::new(Arc::new(fs)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    pub async fn put_proof(
        &self,
        payment_id: &str,
        extension: &str,
        data: Bytes,
    ) -> Result<String, ApiError> {
        let key = format!(
            "proofs/{}/{}.{}",
            payment_id,
            stringline_types::create_id(),
            extension
        );
        self.inner
            .put(&Path::from(key.as_str()), PutPayload::from(data))
            .await?;
        Ok(key)
    }

    pub async fn get(&self, key: &str) -> Result<Bytes, ApiError> {
        let result = self.inner.get(&Path::from(key)).await?;
        Ok(result.bytes().await?)
    }
}

/// Checks the declared content type against the allow-list and the sniffed
/// image format. Returns the file extension to store under.
pub fn validate_proof(
    content_type: Option<&str>,
    data: &[u8],
    max_bytes: usize,
) -> Result<&'static str, ApiError> {
    if data.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if data.len() > max_bytes {
        return Err(ApiError::payload_too_large(format!(
            "File exceeds the {} byte limit",
            max_bytes
        )));
    }

    let content_type = content_type
        .map(|c| c.to_ascii_lowercase())
        .ok_or_else(|| ApiError::bad_request("Missing content type"))?;
    let (_, expected, extension) = ALLOWED
        .iter()
        .find(|(mime, _, _)| *mime == content_type)
        .ok_or_else(|| {
            ApiError::unprocessable(format!(
                "Unsupported file type '{}', expected jpeg, png or webp",
                content_type
            ))
        })?;

    let sniffed = image::guess_format(data)
        .map_err(|_| ApiError::unprocessable("File is not a recognised image"))?;
    if sniffed != *expected {
        return Err(ApiError::unprocessable(
            "File content does not match its content type",
        ));
    }

    Ok(extension)
}

pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn accepts_matching_images() {
        assert_eq!(validate_proof(Some("image/png"), PNG, 1024).unwrap(), "png");
        assert_eq!(validate_proof(Some("IMAGE/JPEG"), JPEG, 1024).unwrap(), "jpg");
    }

    #[test]
    fn rejects_mismatched_content() {
        let err = validate_proof(Some("image/png"), JPEG, 1024).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn rejects_other_types_and_sizes() {
        let err = validate_proof(Some("application/pdf"), b"%PDF-1.7", 1024).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = validate_proof(Some("image/png"), PNG, 4).unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let err = validate_proof(Some("image/png"), &[], 1024).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stores_and_reads_back() {
        let store = ProofStore::in_memory();
        let key = store
            .put_proof("pay_1", "png", Bytes::from_static(PNG))
            .await
            .unwrap();
        assert!(key.starts_with("proofs/pay_1/"));
        assert_eq!(content_type_for(&key), "image/png");
        assert_eq!(store.get(&key).await.unwrap().as_ref(), PNG);
    }

    #[tokio::test]
    async fn local_store_creates_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        let store = ProofStore::local(root.to_str().unwrap()).unwrap();
        let key = store
            .put_proof("pay_2", "jpg", Bytes::from_static(JPEG))
            .await
            .unwrap();
        assert!(root.join(&key).exists());
    }
}

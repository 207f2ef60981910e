//! Signature and photo handling.
//!
//! Bytes go to the blob store, metadata to the relational store. The two are
//! not written atomically: an orphaned blob is harmless, and a metadata row
//! whose blob is missing reads back as the bare key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tracing::{info, warn};

use crate::db::DbPool;
use crate::entity::{service_order, service_photo};
use crate::error::{AppError, AppResult};
use crate::models::{PhotoCategory, PhotoView, SignatureRole, SignatureSaved};
use crate::services::storage::{SharedBlobStore, content_type_for_key};

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Mime types accepted for photos.
pub const ALLOWED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Decode a `data:image/png;base64,` signature payload.
pub fn decode_png_data_uri(payload: &str) -> AppResult<Vec<u8>> {
    let encoded = payload.strip_prefix(PNG_DATA_URI_PREFIX).ok_or_else(|| {
        AppError::InvalidInput("Signature must be a data:image/png;base64 URI".to_string())
    })?;

    let bytes = BASE64.decode(encoded.trim())?;
    if bytes.is_empty() {
        return Err(AppError::InvalidInput("Signature image is empty".to_string()));
    }
    Ok(bytes)
}

/// Embed stored bytes as a data URI. `.png` keys are PNG, everything else JPEG.
pub fn to_data_uri(key: &str, bytes: &[u8]) -> String {
    let mime = if key.to_lowercase().ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    };
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// File extension for an accepted photo, preferring the uploaded file name's.
pub fn photo_extension(mime: &str, original_name: Option<&str>) -> AppResult<String> {
    let mime = mime.trim().to_lowercase();
    if !ALLOWED_PHOTO_TYPES.contains(&mime.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "Unsupported image type '{}'; allowed: jpeg, png, webp",
            mime
        )));
    }

    let from_name = original_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "webp"));

    Ok(from_name.unwrap_or_else(|| {
        match mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
        .to_string()
    }))
}

fn nanos_now() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1_000)
}

pub fn photo_key(order_id: i32, ext: &str) -> String {
    format!("foto_{}_{}.{}", order_id, nanos_now(), ext)
}

fn png_key(prefix: &str, owner_id: i32) -> String {
    format!("{}_{}_{}.png", prefix, owner_id, Utc::now().timestamp_millis())
}

/// Key for a signature captured on an order.
pub fn signature_key(role: SignatureRole, order_id: i32) -> String {
    png_key(role.key_prefix(), order_id)
}

/// Key for a technician's profile signature; kept apart from order-level
/// technician signatures so ids of the two owners never share a namespace.
pub fn profile_signature_key(technician_id: i32) -> String {
    png_key("firma_perfil_tecnico", technician_id)
}

/// Validates, stores and retrieves order attachments.
#[derive(Clone)]
pub struct AttachmentManager {
    pool: DbPool,
    store: SharedBlobStore,
}

impl AttachmentManager {
    pub fn new(pool: DbPool, store: SharedBlobStore) -> Self {
        Self { pool, store }
    }

    /// Bytes stored under `key`, or `None` when absent or unreadable.
    pub async fn fetch(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "Attachment could not be read");
                None
            }
        }
    }

    /// Data URI for `key` when the file exists, else the key itself.
    pub async fn materialize(&self, key: &str) -> String {
        match self.fetch(key).await {
            Some(bytes) => to_data_uri(key, &bytes),
            None => key.to_string(),
        }
    }

    pub async fn photo_view(&self, photo: service_photo::Model) -> PhotoView {
        let image = self.materialize(&photo.file_key).await;
        PhotoView {
            id: photo.id,
            service_order_id: photo.service_order_id,
            category: PhotoCategory::parse_or_default(&photo.category),
            file_key: photo.file_key,
            image,
            created_at: photo.created_at,
        }
    }

    /// Store a photo for an order.
    pub async fn add_photo(
        &self,
        order_id: i32,
        bytes: Vec<u8>,
        mime: &str,
        original_name: Option<&str>,
        category: PhotoCategory,
    ) -> AppResult<PhotoView> {
        let ext = photo_extension(mime, original_name)?;
        if bytes.is_empty() {
            return Err(AppError::InvalidInput("Photo file is empty".to_string()));
        }

        self.pool.get_service_order(order_id).await?;

        let key = photo_key(order_id, &ext);
        self.store
            .put(&key, bytes, Some(content_type_for_key(&key)))
            .await?;

        let photo = match self.pool.insert_photo(order_id, key.clone(), category).await {
            Ok(photo) => photo,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&key).await {
                    warn!(key = %key, error = %cleanup, "Failed to remove photo after insert error");
                }
                return Err(e);
            }
        };

        info!(order_id, photo_id = photo.id, key = %key, "Photo attached");
        Ok(self.photo_view(photo).await)
    }

    /// Remove a photo's file (absence tolerated) and then its row.
    pub async fn delete_photo(&self, photo_id: i32) -> AppResult<()> {
        let photo = self
            .pool
            .find_photo(photo_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {}", photo_id)))?;

        self.store.delete(&photo.file_key).await?;
        self.pool.delete_photo_row(photo.id).await?;

        info!(photo_id, order_id = photo.service_order_id, "Photo deleted");
        Ok(())
    }

    /// Photos of an order, most recent first.
    pub async fn list_photos(&self, order_id: i32) -> AppResult<Vec<PhotoView>> {
        self.pool.get_service_order(order_id).await?;

        let photos = self.pool.list_photos(order_id).await?;
        let mut views = Vec::with_capacity(photos.len());
        for photo in photos {
            views.push(self.photo_view(photo).await);
        }
        Ok(views)
    }

    /// Capture a client or technician signature on an order.
    pub async fn save_order_signature(
        &self,
        order_id: i32,
        payload: &str,
        role: SignatureRole,
        acting_user_id: Option<i32>,
    ) -> AppResult<SignatureSaved> {
        let bytes = decode_png_data_uri(payload)?;
        let order = self.pool.get_service_order(order_id).await?;

        let key = signature_key(role, order_id);
        self.store.put(&key, bytes, Some("image/png")).await?;

        let previous = match role {
            SignatureRole::Client => order.client_signature.clone(),
            SignatureRole::Technician => order.technician_signature.clone(),
        };

        let mut model: service_order::ActiveModel = order.into();
        match role {
            SignatureRole::Client => model.client_signature = Set(Some(key.clone())),
            SignatureRole::Technician => model.technician_signature = Set(Some(key.clone())),
        }
        if acting_user_id.is_some() {
            model.last_modified_by = Set(acting_user_id);
        }
        model.updated_at = Set(Utc::now());
        model
            .update(self.pool.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to save signature: {}", e)))?;

        self.discard_replaced(previous, &key).await;

        info!(order_id, key = %key, ?role, "Signature saved");
        Ok(SignatureSaved {
            success: true,
            message: "Firma guardada correctamente".to_string(),
            filename: key,
        })
    }

    /// Store a technician's profile-level signature.
    pub async fn save_technician_signature(
        &self,
        technician_id: i32,
        payload: &str,
    ) -> AppResult<SignatureSaved> {
        let bytes = decode_png_data_uri(payload)?;
        let technician = self
            .pool
            .find_technician(technician_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Technician {}", technician_id)))?;

        let key = profile_signature_key(technician_id);
        self.store.put(&key, bytes, Some("image/png")).await?;
        self.pool
            .set_technician_signature(technician_id, Some(key.clone()))
            .await?;

        self.discard_replaced(technician.signature_key, &key).await;

        info!(technician_id, key = %key, "Technician signature saved");
        Ok(SignatureSaved {
            success: true,
            message: "Firma guardada correctamente".to_string(),
            filename: key,
        })
    }

    /// Technician profile signature as a data URI.
    pub async fn technician_signature(&self, technician_id: i32) -> AppResult<String> {
        let technician = self
            .pool
            .find_technician(technician_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Technician {}", technician_id)))?;

        let key = technician
            .signature_key
            .ok_or_else(|| AppError::NotFound(format!("Signature of technician {}", technician_id)))?;

        let bytes = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Signature file {}", key)))?;

        Ok(to_data_uri(&key, &bytes))
    }

    pub async fn delete_technician_signature(&self, technician_id: i32) -> AppResult<()> {
        let technician = self
            .pool
            .find_technician(technician_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Technician {}", technician_id)))?;

        if let Some(key) = technician.signature_key {
            self.store.delete(&key).await?;
        }
        self.pool.set_technician_signature(technician_id, None).await?;

        info!(technician_id, "Technician signature deleted");
        Ok(())
    }

    /// Best-effort removal of a blob after it was replaced.
    async fn discard_replaced(&self, previous: Option<String>, current: &str) {
        if let Some(old) = previous.filter(|old| old != current)
            && let Err(e) = self.store.delete(&old).await
        {
            warn!(key = %old, error = %e, "Failed to remove replaced signature");
        }
    }

    /// Best-effort removal of every blob in `keys`.
    pub async fn discard_all(&self, keys: impl IntoIterator<Item = String>) {
        for key in keys {
            if let Err(e) = self.store.delete(&key).await {
                warn!(key = %key, error = %e, "Failed to remove attachment");
            }
        }
    }
}

//! Signature and photo DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Photo category; defaults to `antes` when a submission omits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PhotoCategory {
    #[default]
    Antes,
    Despues,
}

impl PhotoCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Antes => "antes",
            Self::Despues => "despues",
        }
    }

    /// Unknown values fall back to `antes`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "despues" | "después" => Self::Despues,
            _ => Self::Antes,
        }
    }

    /// Caption printed under the photo on documents.
    pub fn caption(&self) -> &'static str {
        match self {
            Self::Antes => "Antes del servicio",
            Self::Despues => "Después del servicio",
        }
    }
}

/// Whose signature is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRole {
    Client,
    Technician,
}

impl SignatureRole {
    /// File name prefix for stored signature images.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Client => "firma",
            Self::Technician => "firma_tecnico",
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignatureRequest {
    /// `data:image/png;base64,<payload>`
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignatureSaved {
    pub success: bool,
    pub message: String,
    pub filename: String,
}

/// Photo as returned to callers. `image` is a data URI when the file exists,
/// otherwise the storage key.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhotoView {
    pub id: i32,
    pub service_order_id: i32,
    pub category: PhotoCategory,
    pub file_key: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

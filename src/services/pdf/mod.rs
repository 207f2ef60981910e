//! PDF documents: the per-order service sheet and the date-range report.
//!
//! Data is gathered asynchronously (relational rows, stored attachments, the
//! company logo), then decoding, layout and rendering run on the blocking
//! pool.

pub mod assets;
pub mod layout;
pub mod order;
pub mod render;
pub mod report;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::DocumentSettings;
use crate::error::{AppError, AppResult};
use crate::models::{PhotoCategory, ServiceOrderSummary};
use crate::services::orders::{HydratedOrder, OrderService};

use assets::ImageStore;
use order::{ClientInfo, EquipmentLine, OrderSheet, PhotoAsset, compose_order};
use report::{ReportRow, ReportSheet, compose_report};

const MAX_PHOTOS: usize = 6;

/// Raw bytes collected for one order sheet.
struct OrderAssets {
    logo: Option<Vec<u8>>,
    technician_signature: Option<Vec<u8>>,
    client_signature: Option<Vec<u8>>,
    photos: Vec<(PhotoCategory, Vec<u8>)>,
}

#[derive(Clone)]
pub struct DocumentComposer {
    orders: OrderService,
    settings: DocumentSettings,
}

impl DocumentComposer {
    pub fn new(orders: OrderService, settings: DocumentSettings) -> Self {
        Self { orders, settings }
    }

    async fn load_logo(&self) -> Option<Vec<u8>> {
        let path = self.settings.logo_path.as_ref()?;
        match tokio::fs::read(path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Logo not readable, rendering without it");
                None
            }
        }
    }

    /// Technician signature printed on the sheet: the one captured on the
    /// order, else the technician's profile signature.
    pub async fn technician_signature(&self, hydrated: &HydratedOrder) -> Option<Vec<u8>> {
        let attachments = self.orders.attachments();

        if let Some(key) = &hydrated.order.technician_signature
            && let Some(bytes) = attachments.fetch(key).await
        {
            return Some(bytes);
        }
        let key = hydrated.technician.as_ref()?.signature_key.as_ref()?;
        attachments.fetch(key).await
    }

    async fn collect_assets(&self, hydrated: &HydratedOrder) -> OrderAssets {
        let attachments = self.orders.attachments();
        let technician_signature = self.technician_signature(hydrated).await;

        let client_signature = match &hydrated.order.client_signature {
            Some(key) => attachments.fetch(key).await,
            None => None,
        };

        // Oldest first so "before" shots precede "after" shots.
        let mut photos = Vec::new();
        for photo in hydrated.photos.iter().rev() {
            if photos.len() == MAX_PHOTOS {
                break;
            }
            match attachments.fetch(&photo.file_key).await {
                Some(bytes) => photos.push((PhotoCategory::parse_or_default(&photo.category), bytes)),
                None => debug!(photo_id = photo.id, "Photo file missing, left out of PDF"),
            }
        }

        OrderAssets {
            logo: self.load_logo().await,
            technician_signature,
            client_signature,
            photos,
        }
    }

    /// Render the service sheet for one order.
    pub async fn render_order(&self, order_id: i32) -> AppResult<Vec<u8>> {
        let hydrated = self.orders.hydrate(order_id).await?;
        let assets = self.collect_assets(&hydrated).await;
        let settings = self.settings.clone();
        let generated_at = Local::now().format("%d/%m/%Y %H:%M").to_string();

        let bytes = tokio::task::spawn_blocking(move || {
            let mut images = ImageStore::default();
            let sheet = order_sheet(&hydrated, &settings, generated_at, &assets, &mut images);
            let pages = compose_order(&sheet);
            render::render_pdf(&format!("Orden {}", sheet.folio), order::PAGE, &pages, &images)
        })
        .await
        .map_err(|e| AppError::Render(format!("PDF task failed: {}", e)))??;

        info!(order_id, size = bytes.len(), "Service order PDF rendered");
        Ok(bytes)
    }

    /// Render the report of every order with a service date in `[start, end]`.
    pub async fn render_report(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<u8>> {
        let summaries = self.orders.list_in_range(start, end).await?;
        let count = summaries.len();
        let sheet = ReportSheet {
            company_name: self.settings.company_name.clone(),
            product_caption: self.settings.product_caption.clone(),
            generated_at: Local::now().format("%d/%m/%Y %H:%M").to_string(),
            start,
            end,
            rows: summaries.iter().map(report_row).collect(),
        };

        let bytes = tokio::task::spawn_blocking(move || {
            let pages = compose_report(&sheet);
            render::render_pdf("Reporte de servicios", report::PAGE, &pages, &ImageStore::default())
        })
        .await
        .map_err(|e| AppError::Render(format!("PDF task failed: {}", e)))??;

        info!(%start, %end, orders = count, size = bytes.len(), "Service report PDF rendered");
        Ok(bytes)
    }
}

fn order_sheet(
    hydrated: &HydratedOrder,
    settings: &DocumentSettings,
    generated_at: String,
    assets: &OrderAssets,
    images: &mut ImageStore,
) -> OrderSheet {
    let order = &hydrated.order;

    let photos = assets
        .photos
        .iter()
        .filter_map(|(category, bytes)| {
            images.add_encoded(bytes, "photo").map(|image| PhotoAsset {
                caption: category.caption().to_string(),
                image,
            })
        })
        .collect();

    OrderSheet {
        company_name: settings.company_name.clone(),
        product_caption: settings.product_caption.clone(),
        generated_at,
        folio: order.folio.clone(),
        status: order.status.clone(),
        service_date: order.service_date,
        service_type: hydrated.service_type.as_ref().map(|t| t.name.clone()),
        order_type: order.order_type.clone(),
        technician_name: hydrated.technician.as_ref().map(|t| t.name.clone()),
        client: hydrated.client.as_ref().map(|c| ClientInfo {
            name: c.name.clone(),
            company: c.company.clone(),
            phone: c.phone.clone(),
            email: c.email.clone(),
        }),
        branch_name: hydrated.branch.as_ref().map(|b| b.name.clone()),
        branch_address: hydrated.branch.as_ref().and_then(|b| b.address.clone()),
        equipment: hydrated
            .equipment
            .iter()
            .map(|item| EquipmentLine {
                name: item.equipment.name.clone(),
                brand: item.brand.as_ref().map(|b| b.name.clone()),
                model: item.equipment.model.clone(),
                serial: item.equipment.serial.clone(),
            })
            .collect(),
        description: order.description.clone(),
        work_performed: order.work_performed.clone(),
        logo: assets.logo.as_deref().and_then(|b| images.add_encoded(b, "logo")),
        technician_signature: assets
            .technician_signature
            .as_deref()
            .and_then(|b| images.add_encoded(b, "technician signature")),
        client_signature: assets
            .client_signature
            .as_deref()
            .and_then(|b| images.add_encoded(b, "client signature")),
        photos,
    }
}

fn report_row(summary: &ServiceOrderSummary) -> ReportRow {
    let client = summary
        .client
        .as_ref()
        .map(|c| c.company.clone().filter(|co| !co.trim().is_empty()).unwrap_or_else(|| c.name.clone()))
        .unwrap_or_else(|| "-".to_string());
    let equipment = if summary.equipment.is_empty() {
        "-".to_string()
    } else {
        summary
            .equipment
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    ReportRow {
        folio: summary.folio.clone(),
        date: summary.service_date.format("%d/%m/%Y").to_string(),
        client,
        equipment,
        technician: summary.technician_name.clone().unwrap_or_else(|| "-".to_string()),
        status: summary.status.clone(),
    }
}

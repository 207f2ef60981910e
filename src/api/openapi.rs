//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ICEMAS Field Service Server",
        version = "0.1.0",
        description = "Service orders, equipment assignments, signatures, photos and printable documents for refrigeration field service"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Service orders
        api::service_orders::list_service_orders,
        api::service_orders::create_service_order,
        api::service_orders::get_service_order,
        api::service_orders::update_service_order,
        api::service_orders::delete_service_order,
        api::service_orders::list_by_status,
        api::service_orders::check_folio,
        api::service_orders::autocomplete,
        api::service_orders::autocomplete_clients,
        // Attachments
        api::service_orders::save_signature,
        api::service_orders::list_photos,
        api::service_orders::upload_photo,
        api::service_orders::delete_photo,
        // Documents
        api::service_orders::service_order_pdf,
        api::reports::service_orders_report,
        // Equipment
        api::equipment::delete_equipment,
        api::equipment::equipment_dependents,
        api::equipment::equipment_history,
        // Technicians
        api::technicians::save_signature,
        api::technicians::get_signature,
        api::technicians::delete_signature,
        // Service types
        api::service_types::list_service_types,
        api::service_types::create_service_type,
        api::service_types::check_name,
        api::service_types::get_service_type,
        api::service_types::update_service_type,
        api::service_types::delete_service_type,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Service orders
            models::OrderStatus,
            models::CreateServiceOrder,
            models::UpdateServiceOrder,
            models::ServiceOrderDetail,
            models::ServiceOrderSummary,
            models::ClientRef,
            models::BranchRef,
            models::EquipmentRef,
            models::NamedRef,
            models::FolioCheck,
            models::AutocompleteItem,
            // Attachments
            models::PhotoCategory,
            models::PhotoView,
            models::SignatureRequest,
            models::SignatureSaved,
            api::technicians::TechnicianSignature,
            // Equipment
            models::EquipmentDeletion,
            models::DependentOrder,
            models::DependentOrders,
            // Service types
            models::ServiceType,
            models::CreateServiceType,
            models::UpdateServiceType,
            models::NameCheck,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Service Orders", description = "Service order lifecycle and lookups"),
        (name = "Attachments", description = "Signatures and photos"),
        (name = "Documents", description = "PDF service sheets and reports"),
        (name = "Equipment", description = "Equipment deletion and service history"),
        (name = "Technicians", description = "Technician profile signatures"),
        (name = "Service Types", description = "Service type catalog")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/service-orders"));
        assert!(doc.paths.paths.contains_key("/api/v1/equipment/{id}"));
        assert!(doc.paths.paths.contains_key("/api/v1/reports/service-orders/pdf"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ServiceOrderDetail"));
    }
}

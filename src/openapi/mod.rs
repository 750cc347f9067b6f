use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// Registers the bearer token scheme referenced by `security(("bearer_auth" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Pynnacle API",
        version = "0.1.0",
        description = r#"
# Pynnacle Property Management API

Back office API for lettings staff.

- **Properties**: property records, certificate expiry dates and document tabs
- **Folders & documents**: per-tab folder trees with uploads and cascading deletes
- **Tenants**: tenant records, photos and the property tenancy ledger
- **Tasks**: maintenance jobs, stage photos and the sortable logbook
- **Dashboard**: expired, due and expiring certificates with a month filter

## Authentication

Sign in at `POST /api/v1/auth/login` and send the returned token on every other call:

```
Authorization: Bearer <token>
```

Mutations answer with the usual `ApiResponse` envelope; `message` carries the
confirmation text to show the user.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Staff sign-in"),
        (name = "properties", description = "Property records and document sections"),
        (name = "folders", description = "Folder trees"),
        (name = "documents", description = "Stored documents"),
        (name = "tenancies", description = "Tenancy ledger"),
        (name = "tenants", description = "Tenant records and photos"),
        (name = "tasks", description = "Maintenance jobs and the logbook"),
        (name = "dashboard", description = "Certificate expiry dashboard"),
        (name = "autocomplete", description = "select2 lookups"),
        (name = "status", description = "Status and health checks")
    ),
    paths(
        crate::api_status,
        crate::health_check,

        // Auth
        crate::handlers::auth::login,
        crate::handlers::auth::logout,

        // Properties
        crate::handlers::properties::list_properties,
        crate::handlers::properties::get_property,
        crate::handlers::properties::create_property,
        crate::handlers::properties::update_property,
        crate::handlers::properties::delete_property,
        crate::handlers::properties::property_section,
        crate::handlers::properties::upload_documents,
        crate::handlers::properties::create_folder,
        crate::handlers::properties::add_tenancy,
        crate::handlers::properties::remove_tenancy,

        // Folders & documents
        crate::handlers::folders::get_folder,
        crate::handlers::folders::delete_folder,
        crate::handlers::folders::delete_document,

        // Tenants
        crate::handlers::tenants::list_tenants,
        crate::handlers::tenants::get_tenant,
        crate::handlers::tenants::create_tenant,
        crate::handlers::tenants::update_tenant,
        crate::handlers::tenants::delete_tenant,
        crate::handlers::tenants::upload_tenant_image,
        crate::handlers::tenants::delete_tenant_image,

        // Tasks
        crate::handlers::tasks::list_tasks,
        crate::handlers::tasks::get_task,
        crate::handlers::tasks::create_task,
        crate::handlers::tasks::update_task,
        crate::handlers::tasks::delete_task,
        crate::handlers::tasks::upload_task_image,
        crate::handlers::tasks::delete_task_image,

        // Dashboard & logbook
        crate::handlers::dashboard::dashboard,
        crate::handlers::dashboard::logbook,

        // Lookups
        crate::handlers::autocomplete::tenant_lookup,
        crate::handlers::autocomplete::property_lookup,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::services::NavigationTarget,
            crate::services::sections::DocumentTab,
            crate::entities::property::CertificateKind,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_routes_and_bearer_scheme() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Pynnacle API"));
        assert!(json.contains("/api/v1/properties/{id}/sections/{tab}"));
        assert!(json.contains("/api/v1/logbook"));
        assert!(json.contains("bearer_auth"));
    }
}

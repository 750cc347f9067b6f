pub mod auth;
pub mod autocomplete;
pub mod common;
pub mod dashboard;
pub mod folders;
pub mod properties;
pub mod tasks;
pub mod tenants;

use crate::{
    db::DbPool,
    logging::component_logger,
    services::{
        dashboard::DashboardService, documents::DocumentService, folders::FolderService,
        properties::PropertyService, sections::SectionService, tasks::TaskService,
        tenancies::TenancyService, tenants::TenantService,
    },
    storage::FileStorage,
};
use slog::Logger;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub properties: Arc<PropertyService>,
    pub folders: Arc<FolderService>,
    pub documents: Arc<DocumentService>,
    pub sections: Arc<SectionService>,
    pub tenancies: Arc<TenancyService>,
    pub tenants: Arc<TenantService>,
    pub tasks: Arc<TaskService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, storage: Arc<dyn FileStorage>, root_logger: &Logger) -> Self {
        let folders = Arc::new(FolderService::new(
            db_pool.clone(),
            storage.clone(),
            component_logger(root_logger, "folder_service"),
        ));
        let tenancies = Arc::new(TenancyService::new(db_pool.clone()));
        let sections = Arc::new(SectionService::new(
            db_pool.clone(),
            folders.clone(),
            tenancies.clone(),
        ));

        Self {
            properties: Arc::new(PropertyService::new(
                db_pool.clone(),
                storage.clone(),
                component_logger(root_logger, "property_service"),
            )),
            documents: Arc::new(DocumentService::new(
                db_pool.clone(),
                storage.clone(),
                component_logger(root_logger, "document_service"),
            )),
            tenants: Arc::new(TenantService::new(
                db_pool.clone(),
                storage.clone(),
                component_logger(root_logger, "tenant_service"),
            )),
            tasks: Arc::new(TaskService::new(
                db_pool.clone(),
                storage,
                component_logger(root_logger, "task_service"),
            )),
            dashboard: Arc::new(DashboardService::new(db_pool)),
            folders,
            sections,
            tenancies,
        }
    }
}

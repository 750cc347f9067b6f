pub mod document;
pub mod folder;
pub mod property;
pub mod task;
pub mod task_image;
pub mod tenancy;
pub mod tenant;
pub mod tenant_image;

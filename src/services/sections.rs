//! Sections of the property detail view.
//!
//! Every document section is backed by a root folder of the same name,
//! created on first use. `tenants-info` is the only section without one.

use crate::{
    db::DbPool,
    entities::{document, folder, property, tenancy, tenant},
    errors::ServiceError,
    services::{folders::FolderService, tenancies::TenancyService},
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use strum::{EnumString, IntoStaticStr};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

pub const TENANTS_INFO_SLUG: &str = "tenants-info";
pub const INVALID_FOLDER_NOTICE: &str = "Invalid folder access. Displaying root of current section.";

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
    ToSchema,
)]
pub enum DocumentTab {
    #[strum(serialize = "building-insurance")]
    #[serde(rename = "building-insurance")]
    BuildingInsurance,
    #[strum(serialize = "electrical-certificate")]
    #[serde(rename = "electrical-certificate")]
    ElectricalCertificate,
    #[strum(serialize = "epc-certificate")]
    #[serde(rename = "epc-certificate")]
    EpcCertificate,
    #[strum(serialize = "gas-certificate")]
    #[serde(rename = "gas-certificate")]
    GasCertificate,
    #[strum(serialize = "inspection-report")]
    #[serde(rename = "inspection-report")]
    InspectionReport,
    #[strum(serialize = "lease-agreement")]
    #[serde(rename = "lease-agreement")]
    LeaseAgreement,
    #[strum(serialize = "miscellaneous")]
    #[serde(rename = "miscellaneous")]
    Miscellaneous,
    #[strum(serialize = "pictures")]
    #[serde(rename = "pictures")]
    Pictures,
    #[strum(serialize = "property-booking-form")]
    #[serde(rename = "property-booking-form")]
    PropertyBookingForm,
    #[strum(serialize = "property-cancellation-form")]
    #[serde(rename = "property-cancellation-form")]
    PropertyCancellationForm,
    #[strum(serialize = "tenant-documents-docs")]
    #[serde(rename = "tenant-documents-docs")]
    TenantDocuments,
}

impl DocumentTab {
    pub const ALL: [DocumentTab; 11] = [
        DocumentTab::BuildingInsurance,
        DocumentTab::ElectricalCertificate,
        DocumentTab::EpcCertificate,
        DocumentTab::GasCertificate,
        DocumentTab::InspectionReport,
        DocumentTab::LeaseAgreement,
        DocumentTab::Miscellaneous,
        DocumentTab::Pictures,
        DocumentTab::PropertyBookingForm,
        DocumentTab::PropertyCancellationForm,
        DocumentTab::TenantDocuments,
    ];

    pub const DEFAULT: DocumentTab = DocumentTab::BuildingInsurance;

    pub fn slug(&self) -> &'static str {
        (*self).into()
    }

    /// Name of the root folder backing this tab
    pub fn folder_name(&self) -> &'static str {
        match self {
            DocumentTab::BuildingInsurance => "Building Insurance",
            DocumentTab::ElectricalCertificate => "Electric Certificate",
            DocumentTab::EpcCertificate => "EPC Certificate",
            DocumentTab::GasCertificate => "Gas Certificate",
            DocumentTab::InspectionReport => "Inspection Report",
            DocumentTab::LeaseAgreement => "Lease Agreement",
            DocumentTab::Miscellaneous => "Miscellaneous",
            DocumentTab::Pictures => "Pictures",
            DocumentTab::PropertyBookingForm => "Property Booking Form",
            DocumentTab::PropertyCancellationForm => "Property Cancellation Form",
            DocumentTab::TenantDocuments => "Tenant Documents",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        DocumentTab::from_str(slug).ok()
    }

    pub fn from_folder_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.folder_name() == name)
    }
}

/// A tab of the property detail view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Documents(DocumentTab),
    TenantsInfo,
}

impl Section {
    pub fn parse(slug: &str) -> Option<Self> {
        if slug == TENANTS_INFO_SLUG {
            return Some(Section::TenantsInfo);
        }
        DocumentTab::from_slug(slug).map(Section::Documents)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Section::Documents(tab) => tab.slug(),
            Section::TenantsInfo => TENANTS_INFO_SLUG,
        }
    }

    pub fn document_tab(&self) -> Option<DocumentTab> {
        match self {
            Section::Documents(tab) => Some(*tab),
            Section::TenantsInfo => None,
        }
    }
}

/// `"lease-agreement"` becomes `"Lease Agreement"`; letters after any non-letter are capitalised.
pub fn title_case(slug: &str) -> String {
    let mut titled = String::with_capacity(slug.len());
    let mut at_word_start = true;
    for ch in slug.replace('-', " ").chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                titled.extend(ch.to_uppercase());
            } else {
                titled.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            titled.push(ch);
            at_word_start = true;
        }
    }
    titled
}

pub fn invalid_section_notice(slug: &str) -> String {
    format!(
        "Invalid section selected: '{}'. Displaying default documents.",
        title_case(slug)
    )
}

/// Resolves a requested section, falling back to the default tab with a notice.
pub fn resolve_section(slug: &str) -> (Section, Option<String>) {
    match Section::parse(slug) {
        Some(section) => (section, None),
        None => (
            Section::Documents(DocumentTab::DEFAULT),
            Some(invalid_section_notice(slug)),
        ),
    }
}

#[derive(Debug, Clone)]
pub struct TabOverview {
    pub tab: DocumentTab,
    pub root: folder::Model,
    pub document_count: u64,
}

#[derive(Debug, Clone)]
pub struct TenancyEntry {
    pub tenancy: tenancy::Model,
    pub tenant: Option<tenant::Model>,
}

/// Everything the property detail page shows for one section.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub property: property::Model,
    pub active_section: Section,
    pub tabs: Vec<TabOverview>,
    pub active_folder: Option<folder::Model>,
    pub folder_path: Vec<String>,
    pub subfolders: Vec<folder::Model>,
    pub documents: Vec<document::Model>,
    pub current_tenants: Vec<TenancyEntry>,
    pub past_tenants: Vec<TenancyEntry>,
    pub notices: Vec<String>,
}

/// Assembles the property detail view.
#[derive(Clone)]
pub struct SectionService {
    db_pool: Arc<DbPool>,
    folders: Arc<FolderService>,
    tenancies: Arc<TenancyService>,
}

impl SectionService {
    pub fn new(
        db_pool: Arc<DbPool>,
        folders: Arc<FolderService>,
        tenancies: Arc<TenancyService>,
    ) -> Self {
        Self {
            db_pool,
            folders,
            tenancies,
        }
    }

    #[instrument(skip(self))]
    pub async fn view(
        &self,
        property_id: Uuid,
        section_slug: &str,
        folder_id: Option<&str>,
        today: NaiveDate,
    ) -> Result<SectionView, ServiceError> {
        let db = &*self.db_pool;
        let property = property::Entity::find_by_id(property_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Property {} not found", property_id)))?;

        let mut notices = Vec::new();
        let (section, notice) = resolve_section(section_slug);
        notices.extend(notice);

        let mut tabs = Vec::with_capacity(DocumentTab::ALL.len());
        for tab in DocumentTab::ALL {
            let root = self.folders.ensure_tab_root(property_id, tab).await?;
            let document_count = root.document_count(db).await?;
            tabs.push(TabOverview {
                tab,
                root,
                document_count,
            });
        }

        let active_folder = match section.document_tab() {
            Some(tab) => {
                let root = tabs
                    .iter()
                    .find(|overview| overview.tab == tab)
                    .map(|overview| overview.root.clone())
                    .ok_or_else(|| {
                        ServiceError::InternalError(format!("missing root folder for {}", tab.slug()))
                    })?;
                match folder_id.map(str::trim).filter(|raw| !raw.is_empty()) {
                    None => Some(root),
                    Some(raw) => match self.folder_in_tab(property_id, &root, raw).await? {
                        Some(folder) => Some(folder),
                        None => {
                            debug!(folder_id = %raw, "rejected folder for section");
                            notices.push(INVALID_FOLDER_NOTICE.to_string());
                            Some(root)
                        }
                    },
                }
            }
            None => None,
        };

        let (folder_path, subfolders, documents) = match &active_folder {
            Some(folder) => (
                folder.path_names(db).await?,
                folder.children(db).await?,
                document::Entity::find()
                    .filter(document::Column::FolderId.eq(folder.id))
                    .order_by_asc(document::Column::UploadedAt)
                    .all(db)
                    .await?,
            ),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        let ledger = self.tenancies.for_property(property_id, today).await?;

        Ok(SectionView {
            property,
            active_section: section,
            tabs,
            active_folder,
            folder_path,
            subfolders,
            documents,
            current_tenants: ledger.current,
            past_tenants: ledger.past,
            notices,
        })
    }

    /// Folder that uploads to `tab` land in: the requested sub-folder when it
    /// belongs to the tab, otherwise the tab root plus the invalid-folder notice.
    #[instrument(skip(self))]
    pub async fn upload_folder(
        &self,
        property_id: Uuid,
        tab: DocumentTab,
        folder_id: Option<&str>,
    ) -> Result<(folder::Model, Option<String>), ServiceError> {
        let root = self.folders.ensure_tab_root(property_id, tab).await?;
        match folder_id.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => Ok((root, None)),
            Some(raw) => match self.folder_in_tab(property_id, &root, raw).await? {
                Some(folder) => Ok((folder, None)),
                None => Ok((root, Some(INVALID_FOLDER_NOTICE.to_string()))),
            },
        }
    }

    /// The requested folder, if it exists on this property under `root`.
    async fn folder_in_tab(
        &self,
        property_id: Uuid,
        root: &folder::Model,
        raw_id: &str,
    ) -> Result<Option<folder::Model>, ServiceError> {
        let Ok(id) = Uuid::parse_str(raw_id) else {
            return Ok(None);
        };
        let Some(candidate) = folder::Entity::find_by_id(id)
            .filter(folder::Column::PropertyId.eq(property_id))
            .one(&*self.db_pool)
            .await?
        else {
            return Ok(None);
        };

        let candidate_root = candidate.root_folder(&*self.db_pool).await?;
        if candidate_root.id == root.id || candidate_root.name == root.name {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("lease-agreement", "Lease Agreement")]
    #[case("foo-BAR", "Foo Bar")]
    #[case("abc1def", "Abc1Def")]
    #[case("", "")]
    fn title_cases_slugs(#[case] slug: &str, #[case] expected: &str) {
        assert_eq!(title_case(slug), expected);
    }

    #[test]
    fn every_tab_round_trips_through_slug_and_folder_name() {
        for tab in DocumentTab::ALL {
            assert_eq!(DocumentTab::from_slug(tab.slug()), Some(tab));
            assert_eq!(DocumentTab::from_folder_name(tab.folder_name()), Some(tab));
        }
    }

    #[test]
    fn slugs_are_static_kebab_names() {
        let slug: &'static str = DocumentTab::GasCertificate.slug();
        assert_eq!(slug, "gas-certificate");
        assert_eq!(Section::Documents(DocumentTab::DEFAULT).slug(), "building-insurance");
    }

    #[test]
    fn electrical_tab_is_backed_by_electric_folder() {
        let tab = DocumentTab::from_slug("electrical-certificate").unwrap();
        assert_eq!(tab.folder_name(), "Electric Certificate");
    }

    #[test]
    fn unknown_section_falls_back_with_notice() {
        let (section, notice) = resolve_section("boiler-manuals");
        assert_eq!(section, Section::Documents(DocumentTab::BuildingInsurance));
        assert_eq!(
            notice.as_deref(),
            Some("Invalid section selected: 'Boiler Manuals'. Displaying default documents.")
        );
    }

    #[test]
    fn tenants_info_is_a_section_without_folder() {
        let (section, notice) = resolve_section("tenants-info");
        assert_eq!(section, Section::TenantsInfo);
        assert!(section.document_tab().is_none());
        assert!(notice.is_none());
    }
}

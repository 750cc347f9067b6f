use crate::{
    db::{icontains, DbPool},
    entities::{
        document,
        property::{self, CertificateKind, PropertyType},
        task, task_image,
    },
    errors::ServiceError,
    services::{not_blank, remove_stored_file, LookupOption, LookupPage, LOOKUP_LIMIT},
    storage::FileStorage,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::{Condition, NullOrdering, Order},
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, Set,
};
use serde::Deserialize;
use slog::Logger;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DUPLICATE_PROPERTY_MESSAGE: &str = "A property with this name already exists.";

fn default_units() -> i32 {
    1
}

fn validate_purchase_price(price: &Decimal) -> Result<(), ValidationError> {
    // numeric(10, 2)
    if price.is_sign_negative() || *price > dec!(99999999.99) || price.scale() > 2 {
        return Err(ValidationError::new("purchase_price"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PropertyInput {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub name: String,
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub address: String,
    #[validate(length(min = 1, max = 10), custom = "not_blank")]
    pub postcode: String,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub county: Option<String>,
    pub property_type: PropertyType,
    #[serde(default = "default_units")]
    #[validate(range(min = 1))]
    pub number_of_units: i32,
    pub purchase_date: Option<NaiveDate>,
    #[validate(custom = "validate_purchase_price")]
    #[schema(value_type = Option<String>, example = "185000.00")]
    pub purchase_price: Option<Decimal>,
    pub building_insurance_expiry_date: Option<NaiveDate>,
    pub gas_certificate_expiry_date: Option<NaiveDate>,
    pub electric_certificate_expiry_date: Option<NaiveDate>,
    pub epc_certificate_expiry_date: Option<NaiveDate>,
    pub fra_certificate_expiry_date: Option<NaiveDate>,
}

impl PropertyInput {
    fn apply(self, model: &mut property::ActiveModel) {
        model.name = Set(self.name.trim().to_string());
        model.address = Set(self.address.trim().to_string());
        model.postcode = Set(self.postcode.trim().to_string());
        model.city = Set(self.city);
        model.county = Set(self.county);
        model.property_type = Set(self.property_type);
        model.number_of_units = Set(self.number_of_units);
        model.purchase_date = Set(self.purchase_date);
        model.purchase_price = Set(self.purchase_price);
        model.building_insurance_expiry_date = Set(self.building_insurance_expiry_date);
        model.gas_certificate_expiry_date = Set(self.gas_certificate_expiry_date);
        model.electric_certificate_expiry_date = Set(self.electric_certificate_expiry_date);
        model.epc_certificate_expiry_date = Set(self.epc_certificate_expiry_date);
        model.fra_certificate_expiry_date = Set(self.fra_certificate_expiry_date);
    }
}

/// Ordering of the property list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertySort {
    NameAsc,
    NameDesc,
    Type,
    Recent,
    Oldest,
    OverallSoonest,
    OverallFurthest,
    Soonest(CertificateKind),
    Furthest(CertificateKind),
}

impl PropertySort {
    /// Unknown keys sort by name.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return PropertySort::NameAsc;
        };
        match raw {
            "name_desc" => PropertySort::NameDesc,
            "type" => PropertySort::Type,
            "recent" => PropertySort::Recent,
            "oldest" => PropertySort::Oldest,
            "overall_soonest" => PropertySort::OverallSoonest,
            "overall_furthest" => PropertySort::OverallFurthest,
            other => CertificateKind::ALL
                .into_iter()
                .find_map(|kind| {
                    let rest = other.strip_prefix(kind.sort_prefix())?;
                    match rest {
                        "_soonest" => Some(PropertySort::Soonest(kind)),
                        "_furthest" => Some(PropertySort::Furthest(kind)),
                        _ => None,
                    }
                })
                .unwrap_or(PropertySort::NameAsc),
        }
    }

    pub fn key(&self) -> String {
        match self {
            PropertySort::NameAsc => "name_asc".to_string(),
            PropertySort::NameDesc => "name_desc".to_string(),
            PropertySort::Type => "type".to_string(),
            PropertySort::Recent => "recent".to_string(),
            PropertySort::Oldest => "oldest".to_string(),
            PropertySort::OverallSoonest => "overall_soonest".to_string(),
            PropertySort::OverallFurthest => "overall_furthest".to_string(),
            PropertySort::Soonest(kind) => format!("{}_soonest", kind.sort_prefix()),
            PropertySort::Furthest(kind) => format!("{}_furthest", kind.sort_prefix()),
        }
    }
}

fn certificate_column(kind: CertificateKind) -> property::Column {
    match kind {
        CertificateKind::Gas => property::Column::GasCertificateExpiryDate,
        CertificateKind::Electric => property::Column::ElectricCertificateExpiryDate,
        CertificateKind::Epc => property::Column::EpcCertificateExpiryDate,
        CertificateKind::Fra => property::Column::FraCertificateExpiryDate,
        CertificateKind::BuildingInsurance => property::Column::BuildingInsuranceExpiryDate,
    }
}

fn ordered(query: Select<property::Entity>, sort: PropertySort) -> Select<property::Entity> {
    use property::Column;
    match sort {
        PropertySort::NameAsc | PropertySort::OverallSoonest | PropertySort::OverallFurthest => {
            query.order_by_asc(Column::Name)
        }
        PropertySort::NameDesc => query.order_by_desc(Column::Name),
        PropertySort::Type => query
            .order_by_asc(Column::PropertyType)
            .order_by_asc(Column::Name),
        PropertySort::Recent => query.order_by_desc(Column::UpdatedAt),
        PropertySort::Oldest => query.order_by_asc(Column::UpdatedAt),
        PropertySort::Soonest(kind) => query
            .order_by_with_nulls(certificate_column(kind), Order::Asc, NullOrdering::Last)
            .order_by_asc(Column::Name),
        PropertySort::Furthest(kind) => query
            .order_by_with_nulls(certificate_column(kind), Order::Desc, NullOrdering::First)
            .order_by_asc(Column::Name),
    }
}

/// Applies the overall-expiry orderings, which depend on all five dates.
///
/// Both place properties without any certificate date last; the sort is stable.
pub fn sort_by_overall_expiry(properties: &mut [property::Model], sort: PropertySort) {
    match sort {
        PropertySort::OverallSoonest => properties.sort_by_key(|p| {
            p.certificate_dates()
                .map(|(_, date)| date)
                .min()
                .unwrap_or(NaiveDate::MAX)
        }),
        PropertySort::OverallFurthest => properties.sort_by(|a, b| {
            let latest = |p: &property::Model| {
                p.certificate_dates()
                    .map(|(_, date)| date)
                    .max()
                    .unwrap_or(NaiveDate::MIN)
            };
            latest(b).cmp(&latest(a))
        }),
        _ => {}
    }
}

/// Service for property records
#[derive(Clone)]
pub struct PropertyService {
    db_pool: Arc<DbPool>,
    storage: Arc<dyn FileStorage>,
    logger: Logger,
}

impl PropertyService {
    pub fn new(db_pool: Arc<DbPool>, storage: Arc<dyn FileStorage>, logger: Logger) -> Self {
        Self {
            db_pool,
            storage,
            logger,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        search: Option<&str>,
        sort: PropertySort,
    ) -> Result<Vec<property::Model>, ServiceError> {
        let mut query = property::Entity::find();
        if let Some(needle) = search.map(str::trim).filter(|q| !q.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(icontains(property::Column::Name, needle))
                    .add(icontains(property::Column::Address, needle)),
            );
        }

        let mut properties = ordered(query, sort).all(&*self.db_pool).await?;
        sort_by_overall_expiry(&mut properties, sort);
        Ok(properties)
    }

    pub async fn get(&self, id: Uuid) -> Result<property::Model, ServiceError> {
        property::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Property {} not found", id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: PropertyInput) -> Result<property::Model, ServiceError> {
        input.validate()?;
        let mut model = property::ActiveModel {
            id: Set(Uuid::new_v4()),
            ..Default::default()
        };
        input.apply(&mut model);

        let created = model
            .insert(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_db_write(e, DUPLICATE_PROPERTY_MESSAGE))?;
        info!(property_id = %created.id, "property created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: PropertyInput,
    ) -> Result<property::Model, ServiceError> {
        input.validate()?;
        let mut model: property::ActiveModel = self.get(id).await?.into();
        input.apply(&mut model);

        Ok(model
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_db_write(e, DUPLICATE_PROPERTY_MESSAGE))?)
    }

    /// Deletes a property after removing every file its documents and task photos hold.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<property::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get(id).await?;

        let documents = existing.find_related(document::Entity).all(db).await?;
        let photos = task_image::Entity::find()
            .inner_join(task::Entity)
            .filter(task::Column::PropertyId.eq(id))
            .all(db)
            .await?;

        for key in documents
            .iter()
            .map(|d| d.file.as_str())
            .chain(photos.iter().map(|p| p.image.as_str()))
        {
            remove_stored_file(self.storage.as_ref(), &self.logger, key).await?;
        }

        property::Entity::delete_by_id(id).exec(db).await?;
        slog::info!(self.logger, "property deleted";
            "property_id" => %id,
            "documents" => documents.len(),
            "task_images" => photos.len());
        Ok(existing)
    }

    /// select2 lookup by address, `LOOKUP_LIMIT` per page.
    pub async fn autocomplete(
        &self,
        term: Option<&str>,
        page: Option<u64>,
    ) -> Result<LookupPage, ServiceError> {
        let mut query = property::Entity::find().order_by_asc(property::Column::Name);
        if let Some(needle) = term.map(str::trim).filter(|q| !q.is_empty()) {
            query = query.filter(icontains(property::Column::Address, needle));
        }

        let rows = query
            .offset(LookupPage::offset(page))
            .limit(LOOKUP_LIMIT + 1)
            .all(&*self.db_pool)
            .await?;
        Ok(LookupPage::from_rows(
            rows.into_iter()
                .map(|p| LookupOption { id: p.id, text: p.name })
                .collect(),
        ))
    }
}

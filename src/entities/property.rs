use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of dwelling a property record describes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[sea_orm(string_value = "one_bedroom")]
    OneBedroom,
    #[sea_orm(string_value = "two_bedroom")]
    TwoBedroom,
    #[sea_orm(string_value = "three_bedroom")]
    ThreeBedroom,
    #[sea_orm(string_value = "studio")]
    Studio,
    #[sea_orm(string_value = "flat")]
    Flat,
    #[sea_orm(string_value = "house")]
    House,
    #[sea_orm(string_value = "block")]
    Block,
}

impl PropertyType {
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::OneBedroom => "1 Bedroom",
            PropertyType::TwoBedroom => "2 Bedroom",
            PropertyType::ThreeBedroom => "3 Bedroom",
            PropertyType::Studio => "Studio",
            PropertyType::Flat => "Flat",
            PropertyType::House => "House",
            PropertyType::Block => "Block",
        }
    }
}

/// The five compliance certificates tracked per property, in dashboard order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize, ToSchema,
)]
pub enum CertificateKind {
    #[strum(serialize = "Gas Certificate")]
    #[serde(rename = "Gas Certificate")]
    Gas,
    #[strum(serialize = "Electric Certificate")]
    #[serde(rename = "Electric Certificate")]
    Electric,
    #[strum(serialize = "EPC Certificate")]
    #[serde(rename = "EPC Certificate")]
    Epc,
    #[strum(serialize = "FRA Certificate")]
    #[serde(rename = "FRA Certificate")]
    Fra,
    #[strum(serialize = "Building Insurance")]
    #[serde(rename = "Building Insurance")]
    BuildingInsurance,
}

impl CertificateKind {
    pub const ALL: [CertificateKind; 5] = [
        CertificateKind::Gas,
        CertificateKind::Electric,
        CertificateKind::Epc,
        CertificateKind::Fra,
        CertificateKind::BuildingInsurance,
    ];

    /// Prefix used by the `<cert>_soonest` / `<cert>_furthest` sort keys
    pub fn sort_prefix(&self) -> &'static str {
        match self {
            CertificateKind::Gas => "gas",
            CertificateKind::Electric => "electric",
            CertificateKind::Epc => "epc",
            CertificateKind::Fra => "fra",
            CertificateKind::BuildingInsurance => "building_insurance",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub city: Option<String>,
    pub county: Option<String>,
    pub property_type: PropertyType,
    pub number_of_units: i32,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
    pub building_insurance_expiry_date: Option<NaiveDate>,
    pub gas_certificate_expiry_date: Option<NaiveDate>,
    pub electric_certificate_expiry_date: Option<NaiveDate>,
    pub epc_certificate_expiry_date: Option<NaiveDate>,
    pub fra_certificate_expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn certificate_expiry(&self, kind: CertificateKind) -> Option<NaiveDate> {
        match kind {
            CertificateKind::Gas => self.gas_certificate_expiry_date,
            CertificateKind::Electric => self.electric_certificate_expiry_date,
            CertificateKind::Epc => self.epc_certificate_expiry_date,
            CertificateKind::Fra => self.fra_certificate_expiry_date,
            CertificateKind::BuildingInsurance => self.building_insurance_expiry_date,
        }
    }

    /// Every recorded expiry date, in dashboard order
    pub fn certificate_dates(&self) -> impl Iterator<Item = (CertificateKind, NaiveDate)> + '_ {
        CertificateKind::ALL
            .into_iter()
            .filter_map(move |kind| self.certificate_expiry(kind).map(|date| (kind, date)))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::folder::Entity")]
    Folders,
    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
    #[sea_orm(has_many = "super::tenancy::Entity")]
    Tenancies,
}

impl Related<super::folder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Folders.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl Related<super::tenancy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenancies.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

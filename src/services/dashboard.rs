use crate::{
    db::DbPool,
    entities::property::{self, CertificateKind},
    errors::ServiceError,
};
use chrono::{Datelike, Duration, Month, NaiveDate};
use sea_orm::{EntityTrait, QueryOrder};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

pub const INVALID_PERIOD_NOTICE: &str = "Invalid month or year selected for filtering.";

/// Days ahead of today that count as "expiring soon"
pub const EXPIRING_SOON_DAYS: i64 = 7;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// One certificate expiry shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CertificateEntry {
    pub property_name: String,
    pub property_id: Uuid,
    pub certificate_type: CertificateKind,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthOption {
    pub number: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub expired: Vec<CertificateEntry>,
    pub due_today: Vec<CertificateEntry>,
    pub expiring_soon: Vec<CertificateEntry>,
    pub month_filtered: Vec<CertificateEntry>,
    pub today: NaiveDate,
    pub months: Vec<MonthOption>,
    pub years: Vec<i32>,
    pub selected_month: u32,
    pub selected_year: i32,
    pub selected_month_name: String,
    pub notices: Vec<String>,
}

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_default()
}

/// Period requested through the `month`/`year` query pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Current,
    Selected { month: u32, year: i32 },
    Invalid,
}

impl Period {
    /// Only a complete pair selects a period.
    pub fn parse(month: Option<&str>, year: Option<&str>) -> Self {
        let (Some(month), Some(year)) = (
            month.map(str::trim).filter(|m| !m.is_empty()),
            year.map(str::trim).filter(|y| !y.is_empty()),
        ) else {
            return Period::Current;
        };

        match (month.parse::<u32>(), year.parse::<i32>()) {
            (Ok(month), Ok(year))
                if (1..=12).contains(&month) && (MIN_YEAR..=MAX_YEAR).contains(&year) =>
            {
                Period::Selected { month, year }
            }
            _ => Period::Invalid,
        }
    }
}

/// Buckets every recorded certificate date of `properties` relative to `today`.
pub fn build_dashboard(
    properties: &[property::Model],
    today: NaiveDate,
    month: Option<&str>,
    year: Option<&str>,
) -> Dashboard {
    let mut notices = Vec::new();
    let (selected_month, selected_year) = match Period::parse(month, year) {
        Period::Selected { month, year } => (month, year),
        Period::Current => (today.month(), today.year()),
        Period::Invalid => {
            notices.push(INVALID_PERIOD_NOTICE.to_string());
            (today.month(), today.year())
        }
    };

    let soon_limit = today + Duration::days(EXPIRING_SOON_DAYS);
    let mut expired = Vec::new();
    let mut due_today = Vec::new();
    let mut expiring_soon = Vec::new();
    let mut month_filtered = Vec::new();

    for prop in properties {
        for (kind, date) in prop.certificate_dates() {
            let entry = CertificateEntry {
                property_name: prop.name.clone(),
                property_id: prop.id,
                certificate_type: kind,
                expiry_date: date,
            };

            if date.month() == selected_month && date.year() == selected_year {
                month_filtered.push(entry.clone());
            }
            if date < today {
                expired.push(entry);
            } else if date == today {
                due_today.push(entry);
            } else if date <= soon_limit {
                expiring_soon.push(entry);
            }
        }
    }

    for bucket in [&mut expired, &mut due_today, &mut expiring_soon, &mut month_filtered] {
        bucket.sort_by_key(|e| e.expiry_date);
    }

    Dashboard {
        expired,
        due_today,
        expiring_soon,
        month_filtered,
        today,
        months: (1..=12)
            .map(|number| MonthOption {
                number,
                name: month_name(number),
            })
            .collect(),
        years: (today.year() - 5..today.year() + 10).collect(),
        selected_month,
        selected_year,
        selected_month_name: month_name(selected_month),
        notices,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn build(
        &self,
        today: NaiveDate,
        month: Option<&str>,
        year: Option<&str>,
    ) -> Result<Dashboard, ServiceError> {
        let properties = property::Entity::find()
            .order_by_asc(property::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(build_dashboard(&properties, today, month, year))
    }
}

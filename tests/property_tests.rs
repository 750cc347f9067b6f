//! Property-based tests for the pure rules behind the dashboard, sections and uploads.
//!
//! These use proptest to check invariants over a wide range of dates and inputs.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use proptest::prelude::*;
use pynnacle_api::{
    entities::{
        property::{self, PropertyType},
        tenancy,
    },
    services::{
        dashboard::{build_dashboard, Period, EXPIRING_SOON_DAYS, INVALID_PERIOD_NOTICE},
        sections::{resolve_section, DocumentTab, Section, TenancyEntry},
        tenancies::partition_tenancies,
    },
    storage::sanitize_file_name,
};
use uuid::Uuid;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (-400i64..400).prop_map(|offset| base_date() + Duration::days(offset))
}

fn optional_date_strategy() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of(date_strategy())
}

fn property_strategy() -> impl Strategy<Value = property::Model> {
    (
        "[A-Z][a-z]{2,10} (House|Court|Lodge)",
        optional_date_strategy(),
        optional_date_strategy(),
        optional_date_strategy(),
        optional_date_strategy(),
        optional_date_strategy(),
    )
        .prop_map(|(name, gas, electric, epc, fra, insurance)| property::Model {
            id: Uuid::new_v4(),
            name,
            address: "1 High Street".to_string(),
            postcode: "M1 1AA".to_string(),
            city: None,
            county: None,
            property_type: PropertyType::House,
            number_of_units: 1,
            purchase_date: None,
            purchase_price: None,
            building_insurance_expiry_date: insurance,
            gas_certificate_expiry_date: gas,
            electric_certificate_expiry_date: electric,
            epc_certificate_expiry_date: epc,
            fra_certificate_expiry_date: fra,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
}

fn tenancy_strategy() -> impl Strategy<Value = TenancyEntry> {
    (date_strategy(), prop::option::of(0i64..800)).prop_map(|(move_in, stay)| TenancyEntry {
        tenancy: tenancy::Model {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            move_in_date: move_in,
            move_out_date: stay.map(|days| move_in + Duration::days(days)),
        },
        tenant: None,
    })
}

proptest! {
    #[test]
    fn dashboard_buckets_are_disjoint_and_bounded(
        properties in prop::collection::vec(property_strategy(), 0..8),
        today in date_strategy(),
    ) {
        let dashboard = build_dashboard(&properties, today, None, None);
        let soon_limit = today + Duration::days(EXPIRING_SOON_DAYS);

        prop_assert!(dashboard.expired.iter().all(|e| e.expiry_date < today));
        prop_assert!(dashboard.due_today.iter().all(|e| e.expiry_date == today));
        prop_assert!(dashboard
            .expiring_soon
            .iter()
            .all(|e| e.expiry_date > today && e.expiry_date <= soon_limit));

        let recorded: Vec<NaiveDate> = properties
            .iter()
            .flat_map(|p| p.certificate_dates().map(|(_, date)| date))
            .collect();
        let expected_bucketed = recorded.iter().filter(|d| **d <= soon_limit).count();
        prop_assert_eq!(
            dashboard.expired.len() + dashboard.due_today.len() + dashboard.expiring_soon.len(),
            expected_bucketed
        );
    }

    #[test]
    fn dashboard_buckets_are_sorted_by_expiry(
        properties in prop::collection::vec(property_strategy(), 0..8),
        today in date_strategy(),
    ) {
        let dashboard = build_dashboard(&properties, today, None, None);
        for bucket in [&dashboard.expired, &dashboard.expiring_soon, &dashboard.month_filtered] {
            prop_assert!(bucket.windows(2).all(|w| w[0].expiry_date <= w[1].expiry_date));
        }
    }

    #[test]
    fn month_filter_matches_the_selected_period(
        properties in prop::collection::vec(property_strategy(), 0..8),
        month in 1u32..=12,
        year in 2023i32..=2025,
    ) {
        let month_raw = month.to_string();
        let year_raw = year.to_string();
        let dashboard = build_dashboard(&properties, base_date(), Some(&month_raw), Some(&year_raw));

        prop_assert!(dashboard.notices.is_empty());
        prop_assert_eq!(dashboard.selected_month, month);
        prop_assert_eq!(dashboard.selected_year, year);
        prop_assert!(dashboard
            .month_filtered
            .iter()
            .all(|e| e.expiry_date.month() == month && e.expiry_date.year() == year));
    }

    #[test]
    fn out_of_range_months_are_invalid(month in 13u32..1000, year in 1900i32..=2100) {
        prop_assert_eq!(
            Period::parse(Some(&month.to_string()), Some(&year.to_string())),
            Period::Invalid
        );

        let dashboard = build_dashboard(&[], base_date(), Some(&month.to_string()), Some(&year.to_string()));
        prop_assert_eq!(dashboard.selected_month, base_date().month());
        prop_assert_eq!(dashboard.notices, vec![INVALID_PERIOD_NOTICE.to_string()]);
    }

    #[test]
    fn tenancy_ledger_is_a_partition(
        entries in prop::collection::vec(tenancy_strategy(), 0..12),
        today in date_strategy(),
    ) {
        let total = entries.len();
        let ledger = partition_tenancies(entries, today);

        prop_assert_eq!(ledger.current.len() + ledger.past.len(), total);
        prop_assert!(ledger
            .current
            .iter()
            .all(|e| e.tenancy.move_out_date.map_or(true, |d| d >= today)));
        prop_assert!(ledger
            .past
            .iter()
            .all(|e| e.tenancy.move_out_date.map_or(false, |d| d < today)));
    }

    #[test]
    fn unknown_sections_fall_back_with_a_notice(slug in "[a-z]{1,12}(-[a-z]{1,8})?") {
        let (section, notice) = resolve_section(&slug);
        match Section::parse(&slug) {
            Some(parsed) => {
                prop_assert_eq!(section, parsed);
                prop_assert!(notice.is_none());
            }
            None => {
                prop_assert_eq!(section, Section::Documents(DocumentTab::DEFAULT));
                let notice = notice.unwrap();
                prop_assert!(notice.starts_with("Invalid section selected: '"), "{}", notice);
            }
        }
    }

    #[test]
    fn sanitized_names_stay_in_one_segment(raw in "\\PC{0,40}") {
        let name = sanitize_file_name(&raw);
        prop_assert!(!name.is_empty());
        prop_assert!(!name.contains('/'));
        prop_assert!(!name.contains('\\'));
        prop_assert!(!name.starts_with('.'));
        prop_assert!(!name.chars().any(char::is_whitespace));
    }
}

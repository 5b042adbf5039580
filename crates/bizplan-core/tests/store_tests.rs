use bizplan_core::models::{LoanItem, RepaymentType};
use bizplan_core::store::PlanStore;
use bizplan_core::{FinanceBundle, PlanError};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;

fn bundle() -> FinanceBundle {
    let mut bundle = FinanceBundle::default();
    bundle.loans.loans.push(LoanItem {
        name: "Bank".into(),
        principal: dec!(1234567.891011121314),
        interest_rate: dec!(0.0125),
        term_months: 60,
        start_month: 3,
        repayment_type: RepaymentType::InterestOnly,
    });
    bundle
}

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("bizplan-store-{}-{name}", std::process::id()))
        .join("plans.json")
}

#[test]
fn test_store_file_round_trip() {
    let path = scratch_file("round-trip");
    let mut store = PlanStore::open(&path).unwrap();
    let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
    store
        .save_version_at("acme", "FY24", bundle(), Some("draft".into()), "ops", at)
        .unwrap();
    store
        .save_version_at("acme", "FY24", bundle(), None, "cfo", at)
        .unwrap();
    store.save(&path).unwrap();

    let reopened = PlanStore::open(&path).unwrap();
    assert_eq!(reopened, store);
    let latest = reopened.load("acme", "FY24", None).unwrap();
    assert_eq!(latest.version, 2);
    assert_eq!(latest.actor, "cfo");
    assert_eq!(latest.payload, bundle());

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

#[test]
fn test_duplicate_plan_keys_rejected() {
    let json = r#"{
        "plans": [
            {"owner": "acme", "name": "FY24", "versions": []},
            {"owner": "acme", "name": "FY24", "versions": []}
        ]
    }"#;
    assert!(matches!(PlanStore::from_json(json), Err(PlanError::Conflict(_))));
}

#[test]
fn test_same_name_different_owner_is_separate() {
    let mut store = PlanStore::new();
    store.save_version("acme", "FY24", bundle(), None, "ops").unwrap();
    store.save_version("globex", "FY24", bundle(), None, "ops").unwrap();
    assert_eq!(store.list_plans("acme").len(), 1);
    assert_eq!(store.list_versions("globex", "FY24").unwrap().len(), 1);
    assert!(matches!(
        store.list_versions("initech", "FY24"),
        Err(PlanError::NotFound(_))
    ));
}

//! 集成測試

use std::fs;

use proptest::prelude::*;
use serde_json::{json, Value};
use tempfile::tempdir;
use wms::wms_calc::BatchReconciler;
use wms::wms_core::{
    IdentityCatalog, InventoryLedger, SalesRecord, SourcePolicy, WmsConfig, DEFAULT_WAREHOUSE,
};
use wms::wms_io::{DataPaths, MemorySink, PayloadFileUploader, SalesBatch, UploadOutcome, Uploader};
use wms_core::record::QUANTITY_FIELD;

fn aliases() -> Vec<String> {
    WmsConfig::default().quantity_aliases
}

fn batch(value: Value) -> SalesBatch {
    SalesBatch::from_json_str(&value.to_string(), &aliases()).unwrap()
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_mapped_sku_scenario() {
    // 場景：A1 → M1，w1 倉賣出 5 個
    let catalog = IdentityCatalog::empty().with_sku_mapping("A1", "M1");
    let mut ledger = InventoryLedger::new();
    let sales = batch(json!([{"sku": "A1", "quantity": 5, "warehouse": "w1"}]));

    let result = BatchReconciler::new(&catalog).reconcile(&sales.records, &mut ledger);

    assert_eq!(
        serde_json::to_value(&result.resolved[0]).unwrap(),
        json!({
            "sku": "A1",
            "quantity": 5,
            "warehouse": "w1",
            "msku": "M1",
            "is_combo": false,
            "component_mskus": null
        })
    );
    assert_eq!(
        serde_json::to_value(&ledger).unwrap(),
        json!({"w1": {"M1": -5}})
    );
}

#[test]
fn test_combo_sku_scenario() {
    let catalog = IdentityCatalog::empty().with_combo("C1", ["M1", "M2"]);
    let mut ledger = InventoryLedger::new();
    let sales = batch(json!([{"sku": "C1", "quantity": 2, "warehouse": "w1"}]));

    let result = BatchReconciler::new(&catalog).reconcile(&sales.records, &mut ledger);

    let resolved = &result.resolved[0];
    assert_eq!(resolved.msku.as_deref(), Some("C1"));
    assert!(resolved.is_combo);
    assert_eq!(
        resolved.component_mskus,
        Some(vec!["M1".to_string(), "M2".to_string()])
    );
    assert_eq!(
        serde_json::to_value(&ledger).unwrap(),
        json!({"w1": {"M1": -2, "M2": -2}})
    );
}

#[test]
fn test_unmapped_sku_scenario() {
    let catalog = IdentityCatalog::empty().with_sku_mapping("A1", "M1");
    let mut ledger = InventoryLedger::new().with_quantity("main", "M1", 10);
    let before = ledger.clone();
    let sales = batch(json!([{"sku": "Z9", "quantity": 3}]));

    let result = BatchReconciler::new(&catalog).reconcile(&sales.records, &mut ledger);

    assert_eq!(result.resolved[0].msku, None);
    assert!(!result.resolved[0].is_combo);
    assert_eq!(ledger, before);
    assert!(result.identities.contains_sku("Z9"));
    assert_eq!(result.identities.msku_count(), 0);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_same_pair_deltas_summed() {
    let catalog = IdentityCatalog::empty().with_sku_mapping("A1", "M1");
    let mut ledger = InventoryLedger::new();
    let sales = batch(json!([
        {"sku": "A1", "quantity": 3, "warehouse": "w1"},
        {"sku": "A1", "quantity": 2, "warehouse": "w1"}
    ]));

    let result = BatchReconciler::new(&catalog).reconcile(&sales.records, &mut ledger);

    assert_eq!(
        serde_json::to_value(&ledger).unwrap(),
        json!({"w1": {"M1": -5}})
    );
    assert_eq!(result.deltas.get("w1", "M1"), Some(-5));
    assert_eq!(result.deltas.pair_count(), 1);
}

#[test]
fn test_zero_quantity_creates_entry() {
    let catalog = IdentityCatalog::empty().with_sku_mapping("A1", "M1");
    let mut ledger = InventoryLedger::new();
    let sales = batch(json!([{"sku": "A1", "quantity": 0}]));

    let result = BatchReconciler::new(&catalog).reconcile(&sales.records, &mut ledger);

    assert!(result.identities.contains_msku("M1"));
    assert!(ledger.contains("main", "M1"));
    assert_eq!(ledger.get("main", "M1"), 0);
}

#[test]
fn test_missing_quantity_column_rejects_batch() {
    let err = SalesBatch::from_json_str(
        &json!([{"sku": "A1", "amount": 5}]).to_string(),
        &aliases(),
    )
    .unwrap_err();

    assert!(wms::is_precondition_failure(&err));
}

#[test]
fn test_quantity_alias_from_csv() {
    let sales =
        SalesBatch::from_csv_str("sku,Quantity Sold,warehouse\n A1 ,4,w2\nB2,1,\n", &aliases())
            .unwrap();

    assert_eq!(sales.quantity_column, "Quantity Sold");
    assert_eq!(sales.records[0].sku, "A1");
    assert_eq!(sales.records[0].quantity, 4);
    assert_eq!(sales.records[1].effective_warehouse(DEFAULT_WAREHOUSE), "main");
}

#[test]
fn test_end_to_end_files() {
    let dir = tempdir().unwrap();
    let data = dir.path();
    fs::write(data.join("sku_mapping.json"), r#"{"A1": "M1", "B2": "M3"}"#).unwrap();
    fs::write(
        data.join("combo_mapping.json"),
        r#"{"C1": ["M1", "M2"]}"#,
    )
    .unwrap();
    fs::write(data.join("inventory.json"), r#"{"main": {"M1": 42}}"#).unwrap();
    let sales_path = data.join("upload.csv");
    fs::write(
        &sales_path,
        "sku,qty,warehouse,order_id\nA1,2,,O-1\nC1,1,w1,O-2\nZ9,7,,O-3\n",
    )
    .unwrap();

    let paths = DataPaths::from_data_dir(data).with_output_dir(data.join("out"));
    let upload_dir = data.join("upload");
    let uploader = PayloadFileUploader::new(&upload_dir);

    let outcome = wms::run_files(
        &sales_path,
        &paths,
        &WmsConfig::default(),
        true,
        Some(&uploader as &dyn Uploader),
    )
    .unwrap();

    assert_eq!(outcome.summary.records, 3);
    assert_eq!(outcome.summary.unmapped_records, 1);
    assert_eq!(outcome.upload, Some(UploadOutcome::ok()));

    assert_eq!(
        read_json(&paths.output.updated_inventory),
        json!({"main": {"M1": 40}, "w1": {"M1": -1, "M2": -1}})
    );
    assert_eq!(
        read_json(&paths.output.unique_skus),
        json!(["A1", "C1", "Z9"])
    );
    assert_eq!(read_json(&paths.output.unique_mskus), json!(["M1", "M2"]));

    let processed = read_json(&paths.output.processed_sales);
    assert_eq!(processed[0][QUANTITY_FIELD], json!(2));
    assert_eq!(processed[0]["order_id"], json!("O-1"));
    assert_eq!(processed[1]["component_mskus"], json!(["M1", "M2"]));
    assert_eq!(processed[2]["msku"], Value::Null);

    let archived = read_json(&paths.sales_archive);
    assert_eq!(archived.as_array().map(|a| a.len()), Some(3));

    let payload = read_json(&upload_dir.join("Sales_Data_0000.json"));
    assert_eq!(payload["records"][1]["fields"]["sku"], json!("C1"));

    // 原始庫存帳不覆寫
    assert_eq!(
        read_json(&data.join("inventory.json")),
        json!({"main": {"M1": 42}})
    );
}

#[test]
fn test_missing_sources_degraded_mode() {
    let dir = tempdir().unwrap();
    let sales_path = dir.path().join("sales.json");
    fs::write(&sales_path, r#"[{"sku": "A1", "quantity": 1}]"#).unwrap();
    let paths = DataPaths::from_data_dir(dir.path());

    let outcome =
        wms::run_files(&sales_path, &paths, &WmsConfig::default(), false, None).unwrap();

    assert_eq!(outcome.summary.unmapped_records, 1);
    assert_eq!(outcome.upload, None);
    assert_eq!(read_json(&paths.output.updated_inventory), json!({}));

    let strict = WmsConfig::default().with_source_policy(SourcePolicy::Strict);
    let err = wms::run_files(&sales_path, &paths, &strict, false, None).unwrap_err();
    assert!(err.is_missing_source());
}

#[test]
fn test_header_only_csv_runs_empty_batch() {
    let dir = tempdir().unwrap();
    let sales_path = dir.path().join("sales.csv");
    fs::write(&sales_path, "sku,quantity,warehouse\n").unwrap();
    fs::write(dir.path().join("inventory.json"), r#"{"main": {"M1": 3}}"#).unwrap();
    let paths = DataPaths::from_data_dir(dir.path());

    let outcome =
        wms::run_files(&sales_path, &paths, &WmsConfig::default(), false, None).unwrap();

    assert_eq!(outcome.summary.records, 0);
    assert_eq!(read_json(&paths.output.processed_sales), json!([]));
    assert_eq!(
        read_json(&paths.output.updated_inventory),
        json!({"main": {"M1": 3}})
    );
}

#[test]
fn test_extreme_quantities_do_not_abort_run() {
    let catalog = IdentityCatalog::empty().with_sku_mapping("A1", "M1");
    let mut ledger = InventoryLedger::new();
    let sales = batch(json!([
        {"sku": "A1", "quantity": i64::MIN},
        {"sku": "A1", "quantity": i64::MAX},
        {"sku": "A1", "quantity": 5}
    ]));

    let result = BatchReconciler::new(&catalog).reconcile(&sales.records, &mut ledger);

    assert_eq!(sales.issues.len(), 2);
    assert_eq!(result.resolved.len(), 3);
    assert_eq!(ledger.get("main", "M1"), -5);
}

struct FailingUploader;

impl Uploader for FailingUploader {
    fn upload(&self, _rows: &[serde_json::Map<String, Value>]) -> UploadOutcome {
        UploadOutcome::failed("連線逾時")
    }
}

#[test]
fn test_upload_failure_keeps_results() {
    let catalog = IdentityCatalog::empty().with_sku_mapping("A1", "M1");
    let mut ledger = InventoryLedger::new();
    let sales = batch(json!([{"sku": "A1", "quantity": 2}]));
    let mut sink = MemorySink::default();

    let outcome = wms::run_batch(
        &sales,
        &catalog,
        &mut ledger,
        &WmsConfig::default(),
        &mut sink,
        Some(&FailingUploader as &dyn Uploader),
    )
    .unwrap();

    assert!(!outcome.upload_succeeded());
    assert_eq!(ledger.get("main", "M1"), -2);
    assert_eq!(sink.unique_mskus, vec!["M1"]);
}

fn catalog_fixture() -> IdentityCatalog {
    IdentityCatalog::empty()
        .with_sku_mapping("A1", "M1")
        .with_sku_mapping("A2", "M2")
        .with_sku_mapping("C1", "M9")
        .with_combo("C1", ["M1", "M3"])
        .with_combo("C2", ["M2", "M2", "M4"])
}

fn record_strategy() -> impl Strategy<Value = SalesRecord> {
    (
        prop::sample::select(vec!["A1", "A2", "C1", "C2", "Z9", ""]),
        -20i64..50,
        prop::option::of(prop::sample::select(vec!["main", "w1", "w2"])),
    )
        .prop_map(|(sku, quantity, warehouse)| {
            let record = SalesRecord::new(sku, quantity);
            match warehouse {
                Some(w) => record.with_warehouse(w),
                None => record,
            }
        })
}

/// 一批紀錄與它的隨機排列
fn records_and_permutation() -> impl Strategy<Value = (Vec<SalesRecord>, Vec<SalesRecord>)> {
    prop::collection::vec(record_strategy(), 0..40)
        .prop_flat_map(|records| (Just(records.clone()), Just(records).prop_shuffle()))
}

proptest! {
    #[test]
    fn prop_order_independent_ledger((records, shuffled) in records_and_permutation()) {
        let catalog = catalog_fixture();
        let reconciler = BatchReconciler::new(&catalog);

        let mut forward = InventoryLedger::new();
        reconciler.reconcile(&records, &mut forward);

        let mut permuted = InventoryLedger::new();
        reconciler.reconcile(&shuffled, &mut permuted);

        prop_assert_eq!(forward, permuted);
    }

    #[test]
    fn prop_delta_sum_matches_quantities(records in prop::collection::vec(record_strategy(), 0..40)) {
        let catalog = catalog_fixture();
        let mut ledger = InventoryLedger::new();
        let result = BatchReconciler::new(&catalog).reconcile(&records, &mut ledger);

        let expected: i64 = result
            .resolved
            .iter()
            .map(|r| {
                let occurrences = match (&r.component_mskus, r.is_mapped()) {
                    (Some(components), _) => components.len() as i64,
                    (None, true) => 1,
                    (None, false) => 0,
                };
                r.record.quantity * occurrences
            })
            .sum();

        prop_assert_eq!(result.deltas.net_total(), -expected);
        let ledger_total: i64 = ledger
            .warehouses()
            .filter_map(|w| ledger.items_in(w))
            .flat_map(|items| items.values())
            .sum();
        prop_assert_eq!(ledger_total, -expected);
    }

    #[test]
    fn prop_parallel_matches_sequential(records in prop::collection::vec(record_strategy(), 0..60)) {
        let catalog = catalog_fixture();
        let reconciler = BatchReconciler::new(&catalog);

        let mut sequential = InventoryLedger::new().with_quantity("main", "M1", 100);
        let mut parallel = sequential.clone();
        let seq = reconciler.reconcile(&records, &mut sequential);
        let par = reconciler.reconcile_parallel(&records, &mut parallel);

        prop_assert_eq!(sequential, parallel);
        prop_assert_eq!(seq.resolved, par.resolved);
        prop_assert_eq!(seq.identities, par.identities);
    }

    #[test]
    fn prop_combo_precedence(quantity in -10i64..10) {
        let catalog = catalog_fixture();
        let mut ledger = InventoryLedger::new();
        let records = vec![SalesRecord::new("C1", quantity)];

        let result = BatchReconciler::new(&catalog).reconcile(&records, &mut ledger);

        prop_assert!(result.resolved[0].is_combo);
        prop_assert_eq!(result.resolved[0].msku.as_deref(), Some("C1"));
        prop_assert!(!ledger.contains("main", "M9"));
    }
}

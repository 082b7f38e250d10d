//! # WMS
//!
//! 銷售資料對帳流程：載入目錄與庫存帳、解析銷售批次、合併庫存、輸出報表與上傳。
//!
//! 載入失敗時是否改用空資料由這一層依 [`SourcePolicy`] 決定，載入函式本身只回報錯誤。

use std::path::Path;

use wms_calc::{BatchReconciler, ReconcileResult, RunSummary};
use wms_core::{IdentityCatalog, InventoryLedger, SourcePolicy, WmsConfig, WmsError};
use wms_io::{
    load_combo_mapping, load_ledger, load_sku_mapping, to_rows, write_json_pretty, DataPaths,
    JsonDirectorySink, ReportSink, RunReport, SalesBatch, UploadOutcome, Uploader,
};

pub use wms_calc;
pub use wms_core;
pub use wms_io;

/// 一次執行的結果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: ReconcileResult,
    pub summary: RunSummary,

    /// 輸入資料列的問題數（例如數量無法解析）
    pub input_issues: usize,

    /// 未設定上傳端時為 None
    pub upload: Option<UploadOutcome>,
}

impl RunOutcome {
    /// 上傳是否成功（未上傳視為成功）
    pub fn upload_succeeded(&self) -> bool {
        self.upload.as_ref().map_or(true, |u| u.success)
    }
}

/// 依策略決定載入失敗時是否以空資料繼續
fn substitute_on_failure<T: Default>(
    loaded: wms_core::Result<T>,
    policy: SourcePolicy,
) -> wms_core::Result<T> {
    match loaded {
        Ok(value) => Ok(value),
        Err(e) => match e.source_kind() {
            Some(kind) if policy.allows_substitute(kind) => {
                tracing::warn!("{}，改用空資料", e);
                Ok(T::default())
            }
            _ => Err(e),
        },
    }
}

/// 載入識別目錄（套用載入策略）
pub fn load_catalog_with_policy(
    paths: &DataPaths,
    policy: SourcePolicy,
) -> wms_core::Result<IdentityCatalog> {
    let sku_to_msku = substitute_on_failure(load_sku_mapping(&paths.sku_mapping), policy)?;
    let combos = substitute_on_failure(load_combo_mapping(&paths.combo_mapping), policy)?;
    let catalog = IdentityCatalog::new(sku_to_msku, combos);

    for sku in catalog.overlapping_skus() {
        tracing::warn!("SKU 同時存在於對應表與組合品表，以組合品處理: {}", sku);
    }
    for combo in catalog.empty_combos() {
        tracing::warn!("組合品沒有組成 MSKU: {}", combo);
    }

    tracing::info!(
        "識別目錄：SKU 對應 {} 筆，組合品 {} 筆",
        catalog.sku_count(),
        catalog.combo_count()
    );
    Ok(catalog)
}

/// 載入庫存帳（套用載入策略）
pub fn load_ledger_with_policy(
    paths: &DataPaths,
    policy: SourcePolicy,
) -> wms_core::Result<InventoryLedger> {
    let ledger = substitute_on_failure(load_ledger(&paths.inventory), policy)?;
    tracing::info!("庫存帳：倉庫/MSKU 組數 {}", ledger.len());
    Ok(ledger)
}

/// 備份正規化後的銷售批次
pub fn archive_sales(batch: &SalesBatch, path: &Path) -> wms_core::Result<()> {
    write_json_pretty(path, &batch.records)?;
    tracing::info!("銷售資料已備份: {}", path.display());
    Ok(())
}

/// 對一個批次執行對帳、輸出報表並交給上傳端
///
/// 上傳失敗只記錄在結果中，不影響已完成的庫存帳與報表。
pub fn run_batch(
    batch: &SalesBatch,
    catalog: &IdentityCatalog,
    ledger: &mut InventoryLedger,
    config: &WmsConfig,
    sink: &mut dyn ReportSink,
    uploader: Option<&dyn Uploader>,
) -> wms_core::Result<RunOutcome> {
    let reconciler = BatchReconciler::from_config(catalog, config);
    let result = if config.parallel {
        reconciler.reconcile_parallel(&batch.records, ledger)
    } else {
        reconciler.reconcile(&batch.records, ledger)
    };

    let snapshot = ledger.snapshot();
    let summary = result.summary();
    sink.emit(&RunReport {
        resolved: &result.resolved,
        ledger: &snapshot,
        identities: &result.identities,
        summary: &summary,
    })?;

    let upload = uploader.map(|uploader| match to_rows(&result.resolved) {
        Ok(rows) => uploader.upload(&rows),
        Err(e) => UploadOutcome::failed(e.to_string()),
    });
    if let Some(outcome) = upload.as_ref().filter(|o| !o.success) {
        tracing::error!(
            "上傳失敗: {}",
            outcome.message.as_deref().unwrap_or("未知錯誤")
        );
    }

    tracing::info!(
        "執行摘要：紀錄 {} 筆，總數量 {}，唯一 SKU {}，唯一 MSKU {}，未對應 {}，輸入問題 {}",
        summary.records,
        summary.total_quantity,
        summary.unique_skus,
        summary.unique_mskus,
        summary.unmapped_records,
        batch.issues.len()
    );

    Ok(RunOutcome {
        result,
        summary,
        input_issues: batch.issues.len(),
        upload,
    })
}

/// 從檔案執行完整流程
///
/// 先檢查銷售資料（缺少數量欄位時不處理任何資料），再載入目錄與庫存帳。
pub fn run_files(
    sales_path: &Path,
    paths: &DataPaths,
    config: &WmsConfig,
    archive: bool,
    uploader: Option<&dyn Uploader>,
) -> wms_core::Result<RunOutcome> {
    config.validate()?;

    let batch = SalesBatch::load(sales_path, &config.quantity_aliases)?;
    tracing::info!(
        "銷售資料 {} 筆，數量欄位: {}",
        batch.len(),
        batch.quantity_column
    );
    if archive {
        archive_sales(&batch, &paths.sales_archive)?;
    }

    let catalog = load_catalog_with_policy(paths, config.source_policy)?;
    let mut ledger = load_ledger_with_policy(paths, config.source_policy)?;

    let mut sink = JsonDirectorySink::new(paths.output.clone());
    run_batch(&batch, &catalog, &mut ledger, config, &mut sink, uploader)
}

/// 檢查錯誤是否為批次前置條件失敗
pub fn is_precondition_failure(error: &WmsError) -> bool {
    matches!(error, WmsError::MissingQuantityColumn { .. })
}

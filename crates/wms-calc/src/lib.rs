//! # WMS Reconciliation Engine
//!
//! SKU 解析與庫存對帳引擎

pub mod reconciler;
pub mod resolution;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use wms_core::{InventoryDeltaBatch, ResolvedRecord, UniqueIdentitySets};

// Re-export 主要類型
pub use reconciler::BatchReconciler;
pub use resolution::{Resolution, Resolver, SkuClass};

/// 對帳結果
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    /// 執行ID
    pub run_id: Uuid,

    /// 開始時間
    pub started_at: DateTime<Utc>,

    /// 解析後的紀錄（與輸入順序相同）
    pub resolved: Vec<ResolvedRecord>,

    /// 本次出現的 SKU / MSKU
    pub identities: UniqueIdentitySets,

    /// 已合併進庫存帳的異動
    pub deltas: InventoryDeltaBatch,

    /// 警告信息
    pub warnings: Vec<ReconcileWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl ReconcileResult {
    /// 創建空的對帳結果
    pub fn empty() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            resolved: Vec::new(),
            identities: UniqueIdentitySets::new(),
            deltas: InventoryDeltaBatch::new(),
            warnings: Vec::new(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: ReconcileWarning) {
        self.warnings.push(warning);
    }

    /// 未對應 SKU 的紀錄數
    pub fn unmapped_count(&self) -> usize {
        self.resolved.iter().filter(|r| !r.is_mapped()).count()
    }

    /// 銷售總數量
    pub fn total_quantity(&self) -> i64 {
        self.resolved
            .iter()
            .fold(0i64, |total, r| total.saturating_add(r.record.quantity))
    }

    /// 執行摘要
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            records: self.resolved.len(),
            total_quantity: self.total_quantity(),
            unique_skus: self.identities.sku_count(),
            unique_mskus: self.identities.msku_count(),
            unmapped_records: self.unmapped_count(),
            warnings: self.warnings.len(),
            ledger_pairs_touched: self.deltas.pair_count(),
            calculation_time_ms: self.calculation_time_ms,
        }
    }
}

/// 執行摘要（報表輸出用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub records: usize,
    pub total_quantity: i64,
    pub unique_skus: usize,
    pub unique_mskus: usize,
    pub unmapped_records: usize,
    pub warnings: usize,
    pub ledger_pairs_touched: usize,
    pub calculation_time_ms: Option<u128>,
}

/// 對帳警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileWarning {
    /// 輸入列號（從 0 開始）
    pub row: usize,
    pub sku: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ReconcileWarning {
    pub fn new(row: usize, sku: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            row,
            sku,
            message,
            severity,
        }
    }

    pub fn info(row: usize, sku: String, message: String) -> Self {
        Self::new(row, sku, message, WarningSeverity::Info)
    }

    pub fn warning(row: usize, sku: String, message: String) -> Self {
        Self::new(row, sku, message, WarningSeverity::Warning)
    }

    /// 未對應 SKU
    pub fn unmapped_sku(row: usize, sku: &str) -> Self {
        Self::warning(row, sku.to_string(), format!("找不到 SKU 對應: {}", sku))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
}

//! 批次對帳器

use rayon::prelude::*;
use wms_core::{
    IdentityCatalog, InventoryDeltaBatch, InventoryLedger, SalesRecord, UniqueIdentitySets,
    WmsConfig, MAX_QUANTITY,
};

use crate::resolution::{Resolution, Resolver, SkuClass};
use crate::{ReconcileResult, ReconcileWarning};

/// 批次對帳器
pub struct BatchReconciler<'a> {
    resolver: Resolver<'a>,
}

impl<'a> BatchReconciler<'a> {
    /// 創建新的對帳器
    pub fn new(catalog: &'a IdentityCatalog) -> Self {
        Self {
            resolver: Resolver::new(catalog),
        }
    }

    /// 從配置創建
    pub fn from_config(catalog: &'a IdentityCatalog, config: &WmsConfig) -> Self {
        Self::new(catalog).with_default_warehouse(config.default_warehouse.clone())
    }

    /// 建構器模式：設置預設倉庫
    pub fn with_default_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_default_warehouse(warehouse);
        self
    }

    /// 主對帳入口（循序）
    ///
    /// 所有紀錄解析完成後才一次合併進庫存帳。
    pub fn reconcile(
        &self,
        records: &[SalesRecord],
        ledger: &mut InventoryLedger,
    ) -> ReconcileResult {
        tracing::info!("開始對帳：銷售紀錄 {} 筆", records.len());
        let start_time = std::time::Instant::now();
        let mut result = ReconcileResult::empty();

        // Step 1: 逐筆解析並累積異動
        tracing::debug!("Step 1: 解析 SKU");
        let mut deltas = InventoryDeltaBatch::new();
        let mut identities = UniqueIdentitySets::new();
        let mut resolutions = Vec::with_capacity(records.len());

        for record in records {
            let resolution = self.resolver.resolve(record);
            deltas.extend(&resolution.deltas);
            track_identities(&mut identities, &resolution);
            resolutions.push(resolution);
        }

        self.finish(&mut result, resolutions, deltas, identities, ledger);
        result.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!("對帳完成，耗時 {:?}", start_time.elapsed());
        result
    }

    /// 並行對帳
    ///
    /// 解析分散到 rayon 工作執行緒；每個工作執行緒各自累積異動，再歸併成一個批次。
    /// 庫存帳仍只在最後由單一步驟合併。
    pub fn reconcile_parallel(
        &self,
        records: &[SalesRecord],
        ledger: &mut InventoryLedger,
    ) -> ReconcileResult {
        tracing::info!("開始並行對帳：銷售紀錄 {} 筆", records.len());
        let start_time = std::time::Instant::now();
        let mut result = ReconcileResult::empty();

        // Step 1: 並行解析（collect 保留輸入順序）
        tracing::debug!("Step 1: 並行解析 SKU");
        let resolutions: Vec<Resolution> = records
            .par_iter()
            .map(|record| self.resolver.resolve(record))
            .collect();

        // Step 2: 分工作執行緒累積，再歸併
        tracing::debug!("Step 2: 歸併異動");
        let (deltas, identities) = resolutions
            .par_iter()
            .fold(
                || (InventoryDeltaBatch::new(), UniqueIdentitySets::new()),
                |(mut deltas, mut identities), resolution| {
                    deltas.extend(&resolution.deltas);
                    track_identities(&mut identities, resolution);
                    (deltas, identities)
                },
            )
            .reduce(
                || (InventoryDeltaBatch::new(), UniqueIdentitySets::new()),
                |(left_deltas, left_ids), (right_deltas, right_ids)| {
                    (left_deltas.merge(right_deltas), left_ids.merge(right_ids))
                },
            );

        self.finish(&mut result, resolutions, deltas, identities, ledger);
        result.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!("並行對帳完成，耗時 {:?}", start_time.elapsed());
        result
    }

    /// 收集警告、合併庫存帳、整理結果
    fn finish(
        &self,
        result: &mut ReconcileResult,
        resolutions: Vec<Resolution>,
        deltas: InventoryDeltaBatch,
        identities: UniqueIdentitySets,
        ledger: &mut InventoryLedger,
    ) {
        for (row, resolution) in resolutions.iter().enumerate() {
            match resolution.class {
                SkuClass::Unmapped => {
                    result.add_warning(ReconcileWarning::unmapped_sku(row, resolution.record.sku()));
                }
                SkuClass::Combo if resolution.deltas.is_empty() => {
                    result.add_warning(ReconcileWarning::info(
                        row,
                        resolution.record.sku().to_string(),
                        "組合品沒有任何組成 MSKU，不影響庫存".to_string(),
                    ));
                }
                _ => {}
            }

            let quantity = resolution.record.record.quantity;
            let in_range = (-MAX_QUANTITY..=MAX_QUANTITY).contains(&quantity);
            if !resolution.deltas.is_empty() && !in_range {
                result.add_warning(ReconcileWarning::warning(
                    row,
                    resolution.record.sku().to_string(),
                    format!("數量 {} 超出範圍，庫存異動可能被截斷", quantity),
                ));
            }
        }

        // Step 3: 合併進庫存帳
        tracing::debug!("Step 3: 合併庫存帳");
        let (merged, saturated) = ledger.apply_batch(&deltas);
        tracing::debug!("合併倉庫/MSKU 組數: {}", merged);
        if saturated > 0 || deltas.saturated_count() > 0 {
            tracing::warn!(
                "庫存溢位截斷：異動 {} 次，庫存帳 {} 組",
                deltas.saturated_count(),
                saturated
            );
        }

        tracing::info!(
            "唯一 SKU: {}，唯一 MSKU: {}，警告: {}",
            identities.sku_count(),
            identities.msku_count(),
            result.warnings.len()
        );

        result.resolved = resolutions.into_iter().map(|r| r.record).collect();
        result.identities = identities;
        result.deltas = deltas;
    }
}

/// 記錄解析過程中出現的 SKU 與產生的 MSKU
fn track_identities(identities: &mut UniqueIdentitySets, resolution: &Resolution) {
    identities.record_sku(resolution.record.sku());
    identities.record_mskus(resolution.produced_mskus());
}

//! SKU 解析
//!
//! 依序判斷：組合品 → 一般對應 → 未對應，第一個符合的規則勝出。
//! 組合品的每個組成 MSKU 都扣除完整的銷售數量（不按組成數量平分）。

use serde::Serialize;
use wms_core::{IdentityCatalog, InventoryDelta, ResolvedRecord, SalesRecord, DEFAULT_WAREHOUSE};

/// SKU 分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkuClass {
    /// 組合品
    Combo,
    /// 一般對應
    Mapped,
    /// 未對應
    Unmapped,
}

/// 單筆紀錄的解析結果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: ResolvedRecord,
    pub class: SkuClass,
    pub deltas: Vec<InventoryDelta>,
}

impl Resolution {
    /// 解析產生的 MSKU（組合品為所有組成 MSKU，不含組合 SKU 本身）
    pub fn produced_mskus(&self) -> Vec<&str> {
        match self.class {
            SkuClass::Combo => self
                .record
                .component_mskus
                .iter()
                .flatten()
                .map(String::as_str)
                .collect(),
            SkuClass::Mapped => self.record.msku.as_deref().into_iter().collect(),
            SkuClass::Unmapped => Vec::new(),
        }
    }

    pub fn is_unmapped(&self) -> bool {
        self.class == SkuClass::Unmapped
    }
}

/// SKU 解析器
pub struct Resolver<'a> {
    /// 識別目錄（唯讀）
    catalog: &'a IdentityCatalog,

    /// 預設倉庫
    default_warehouse: String,
}

impl<'a> Resolver<'a> {
    /// 創建新的解析器
    pub fn new(catalog: &'a IdentityCatalog) -> Self {
        Self {
            catalog,
            default_warehouse: DEFAULT_WAREHOUSE.to_string(),
        }
    }

    /// 建構器模式：設置預設倉庫
    pub fn with_default_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.default_warehouse = warehouse.into();
        self
    }

    /// 判斷 SKU 分類
    pub fn classify(&self, sku: &str) -> SkuClass {
        if self.catalog.is_combo(sku) {
            SkuClass::Combo
        } else if self.catalog.msku_for(sku).is_some() {
            SkuClass::Mapped
        } else {
            SkuClass::Unmapped
        }
    }

    /// 解析單筆銷售紀錄
    ///
    /// 不修改輸入紀錄；相同輸入與目錄永遠得到相同結果。
    pub fn resolve(&self, record: &SalesRecord) -> Resolution {
        let sku = record.sku.as_str();
        let warehouse = record.effective_warehouse(&self.default_warehouse);
        let consumed = record.quantity.saturating_neg();

        if let Some(components) = self.catalog.components_for(sku) {
            let deltas = components
                .iter()
                .map(|component| InventoryDelta::new(warehouse, component.as_str(), consumed))
                .collect();

            tracing::debug!(
                "組合品 {} 展開: {:?} (倉庫: {}, 數量: {})",
                sku,
                components,
                warehouse,
                record.quantity
            );

            return Resolution {
                record: ResolvedRecord::combo(record.clone(), components.to_vec()),
                class: SkuClass::Combo,
                deltas,
            };
        }

        if let Some(msku) = self.catalog.msku_for(sku) {
            return Resolution {
                record: ResolvedRecord::mapped(record.clone(), msku.to_string()),
                class: SkuClass::Mapped,
                deltas: vec![InventoryDelta::new(warehouse, msku, consumed)],
            };
        }

        tracing::warn!("找不到 SKU 對應: {}", sku);

        Resolution {
            record: ResolvedRecord::unmapped(record.clone()),
            class: SkuClass::Unmapped,
            deltas: Vec::new(),
        }
    }
}

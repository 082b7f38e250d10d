//! 庫存帳模型

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::delta::{add_saturating, InventoryDeltaBatch};

/// 倉庫 → (MSKU → 數量)
pub type StockMap = BTreeMap<String, BTreeMap<String, i64>>;

/// 庫存帳
///
/// 數量允許為負（超賣 / 欠貨）。只有批次對帳的合併步驟會修改庫存帳。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryLedger {
    stock: StockMap,
}

impl InventoryLedger {
    /// 創建空的庫存帳
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：設置期初數量
    pub fn with_quantity(
        mut self,
        warehouse: impl Into<String>,
        msku: impl Into<String>,
        quantity: i64,
    ) -> Self {
        let (warehouse, msku): (String, String) = (warehouse.into(), msku.into());
        *self.entry_mut(&warehouse, &msku) = quantity;
        self
    }

    /// 查詢數量（不存在時為 0）
    pub fn get(&self, warehouse: &str, msku: &str) -> i64 {
        self.stock
            .get(warehouse)
            .and_then(|items| items.get(msku))
            .copied()
            .unwrap_or(0)
    }

    /// 檢查倉庫 / MSKU 是否已有紀錄
    pub fn contains(&self, warehouse: &str, msku: &str) -> bool {
        self.stock
            .get(warehouse)
            .is_some_and(|items| items.contains_key(msku))
    }

    /// 取得（必要時建立）倉庫 / MSKU 的數量欄位
    pub fn entry_mut(&mut self, warehouse: &str, msku: &str) -> &mut i64 {
        self.stock
            .entry(warehouse.to_string())
            .or_default()
            .entry(msku.to_string())
            .or_insert(0)
    }

    /// 套用單筆異動（不存在時建立）
    ///
    /// 溢位時停在 i64 上下限並回傳 false。
    pub fn apply_delta(&mut self, warehouse: &str, msku: &str, delta: i64) -> bool {
        let entry = self.entry_mut(warehouse, msku);
        let applied = add_saturating(entry, delta);
        if !applied {
            tracing::warn!("庫存數量溢位 ({}/{})，已截斷為 {}", warehouse, msku, entry);
        }
        applied
    }

    /// 合併整批異動，回傳（合併的倉庫 / MSKU 組數, 溢位截斷的組數）
    pub fn apply_batch(&mut self, batch: &InventoryDeltaBatch) -> (usize, usize) {
        let mut merged = 0;
        let mut saturated = 0;
        for (warehouse, msku, delta) in batch.iter() {
            if !self.apply_delta(warehouse, msku, delta) {
                saturated += 1;
            }
            merged += 1;
        }
        (merged, saturated)
    }

    /// 所有倉庫（已排序）
    pub fn warehouses(&self) -> impl Iterator<Item = &str> {
        self.stock.keys().map(String::as_str)
    }

    /// 單一倉庫的庫存
    pub fn items_in(&self, warehouse: &str) -> Option<&BTreeMap<String, i64>> {
        self.stock.get(warehouse)
    }

    /// 某 MSKU 在所有倉庫的總數量
    pub fn total_for(&self, msku: &str) -> i64 {
        self.stock
            .values()
            .filter_map(|items| items.get(msku))
            .fold(0i64, |total, q| total.saturating_add(*q))
    }

    /// 倉庫 / MSKU 組數
    pub fn len(&self) -> usize {
        self.stock.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 唯讀快照（用於輸出）
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            stock: self.stock.clone(),
        }
    }
}

/// 庫存帳唯讀快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LedgerSnapshot {
    stock: StockMap,
}

impl LedgerSnapshot {
    pub fn as_map(&self) -> &StockMap {
        &self.stock
    }

    pub fn get(&self, warehouse: &str, msku: &str) -> i64 {
        self.stock
            .get(warehouse)
            .and_then(|items| items.get(msku))
            .copied()
            .unwrap_or(0)
    }
}

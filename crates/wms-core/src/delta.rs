//! 庫存異動批次

use std::collections::BTreeMap;

use serde::Serialize;

/// 單筆庫存異動
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryDelta {
    pub warehouse: String,
    pub msku: String,
    pub delta: i64,
}

impl InventoryDelta {
    pub fn new(warehouse: impl Into<String>, msku: impl Into<String>, delta: i64) -> Self {
        Self {
            warehouse: warehouse.into(),
            msku: msku.into(),
            delta,
        }
    }
}

/// 一次執行內累積的庫存異動（倉庫 → MSKU → 異動量）
///
/// 同一倉庫 / MSKU 的異動先加總，最後一次合併進庫存帳。
/// 加總溢位時停在 i64 上下限，並計入 `saturated_count`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InventoryDeltaBatch {
    deltas: BTreeMap<String, BTreeMap<String, i64>>,

    #[serde(skip)]
    saturated: usize,
}

impl InventoryDeltaBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加異動（不存在時建立，零異動也會建立）
    pub fn accumulate(&mut self, warehouse: &str, msku: &str, delta: i64) {
        let entry = self
            .deltas
            .entry(warehouse.to_string())
            .or_default()
            .entry(msku.to_string())
            .or_insert(0);
        let applied = add_saturating(entry, delta);
        let total = *entry;
        if !applied {
            self.saturated += 1;
            tracing::warn!("庫存異動溢位 ({}/{})，已截斷為 {}", warehouse, msku, total);
        }
    }

    /// 累加多筆異動
    pub fn extend<'a, I>(&mut self, deltas: I)
    where
        I: IntoIterator<Item = &'a InventoryDelta>,
    {
        for d in deltas {
            self.accumulate(&d.warehouse, &d.msku, d.delta);
        }
    }

    /// 合併另一個批次（並行計算的歸併步驟）
    pub fn merge(mut self, other: InventoryDeltaBatch) -> Self {
        self.saturated += other.saturated;
        for (warehouse, items) in other.deltas {
            let target = self.deltas.entry(warehouse).or_default();
            for (msku, delta) in items {
                if !add_saturating(target.entry(msku).or_insert(0), delta) {
                    self.saturated += 1;
                }
            }
        }
        self
    }

    /// 查詢累積異動
    pub fn get(&self, warehouse: &str, msku: &str) -> Option<i64> {
        self.deltas
            .get(warehouse)
            .and_then(|items| items.get(msku))
            .copied()
    }

    /// 逐筆列出（倉庫, MSKU, 異動量）
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, i64)> {
        self.deltas.iter().flat_map(|(warehouse, items)| {
            items
                .iter()
                .map(move |(msku, delta)| (warehouse.as_str(), msku.as_str(), *delta))
        })
    }

    /// 倉庫 / MSKU 組數
    pub fn pair_count(&self) -> usize {
        self.deltas.values().map(BTreeMap::len).sum()
    }

    /// 全部異動的總和
    pub fn net_total(&self) -> i64 {
        self.iter()
            .fold(0i64, |total, (_, _, delta)| total.saturating_add(delta))
    }

    /// 溢位截斷的次數
    pub fn saturated_count(&self) -> usize {
        self.saturated
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

/// 飽和加法，回傳是否未溢位
pub(crate) fn add_saturating(target: &mut i64, delta: i64) -> bool {
    match target.checked_add(delta) {
        Some(sum) => {
            *target = sum;
            true
        }
        None => {
            *target = target.saturating_add(delta);
            false
        }
    }
}

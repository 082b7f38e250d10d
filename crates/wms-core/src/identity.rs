//! 唯一識別追蹤

use std::collections::BTreeSet;

use serde::Serialize;

/// 一次執行內出現過的 SKU 與 MSKU
///
/// 每次執行開始時為空，不屬於庫存帳狀態，只作為報表輸出。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UniqueIdentitySets {
    skus: BTreeSet<String>,
    mskus: BTreeSet<String>,
}

impl UniqueIdentitySets {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self::default()
    }

    /// 記錄檢查過的 SKU（包含未對應的 SKU）
    pub fn record_sku(&mut self, sku: &str) {
        if !self.skus.contains(sku) {
            self.skus.insert(sku.to_string());
        }
    }

    /// 記錄解析產生的 MSKU
    pub fn record_msku(&mut self, msku: &str) {
        if !self.mskus.contains(msku) {
            self.mskus.insert(msku.to_string());
        }
    }

    pub fn record_mskus<'a, I>(&mut self, mskus: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for msku in mskus {
            self.record_msku(msku);
        }
    }

    pub fn contains_sku(&self, sku: &str) -> bool {
        self.skus.contains(sku)
    }

    pub fn contains_msku(&self, msku: &str) -> bool {
        self.mskus.contains(msku)
    }

    pub fn sku_count(&self) -> usize {
        self.skus.len()
    }

    pub fn msku_count(&self) -> usize {
        self.mskus.len()
    }

    /// 所有 SKU（已排序）
    pub fn skus(&self) -> Vec<String> {
        self.skus.iter().cloned().collect()
    }

    /// 所有 MSKU（已排序）
    pub fn mskus(&self) -> Vec<String> {
        self.mskus.iter().cloned().collect()
    }

    /// 合併另一組追蹤結果
    pub fn merge(mut self, other: UniqueIdentitySets) -> Self {
        self.skus.extend(other.skus);
        self.mskus.extend(other.mskus);
        self
    }
}

//! SKU 識別目錄
//!
//! 一次執行期間唯讀，可在多個解析工作執行緒間共享。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// SKU → MSKU 對應表與組合品展開表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCatalog {
    /// SKU → MSKU
    sku_to_msku: HashMap<String, String>,

    /// 組合 SKU → 組成 MSKU（有序）
    combo_to_components: HashMap<String, Vec<String>>,
}

impl IdentityCatalog {
    /// 創建新的識別目錄
    pub fn new(
        sku_to_msku: HashMap<String, String>,
        combo_to_components: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            sku_to_msku,
            combo_to_components,
        }
    }

    /// 空目錄（所有 SKU 皆未對應）
    pub fn empty() -> Self {
        Self::default()
    }

    /// 建構器模式：添加 SKU 對應
    pub fn with_sku_mapping(mut self, sku: impl Into<String>, msku: impl Into<String>) -> Self {
        self.sku_to_msku.insert(sku.into(), msku.into());
        self
    }

    /// 建構器模式：添加組合品
    pub fn with_combo<I, S>(mut self, sku: impl Into<String>, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.combo_to_components
            .insert(sku.into(), components.into_iter().map(Into::into).collect());
        self
    }

    /// 查詢一般 SKU 對應的 MSKU
    pub fn msku_for(&self, sku: &str) -> Option<&str> {
        self.sku_to_msku.get(sku).map(String::as_str)
    }

    /// 查詢組合品的組成 MSKU
    pub fn components_for(&self, sku: &str) -> Option<&[String]> {
        self.combo_to_components.get(sku).map(Vec::as_slice)
    }

    /// 檢查是否為組合 SKU
    pub fn is_combo(&self, sku: &str) -> bool {
        self.combo_to_components.contains_key(sku)
    }

    pub fn sku_count(&self) -> usize {
        self.sku_to_msku.len()
    }

    pub fn combo_count(&self) -> usize {
        self.combo_to_components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sku_to_msku.is_empty() && self.combo_to_components.is_empty()
    }

    /// 同時出現在兩張表的 SKU（已排序）
    ///
    /// 解析時組合品優先，這些 SKU 的一般對應永遠不會被使用。
    pub fn overlapping_skus(&self) -> Vec<&str> {
        let mut overlap: Vec<&str> = self
            .combo_to_components
            .keys()
            .filter(|sku| self.sku_to_msku.contains_key(*sku))
            .map(String::as_str)
            .collect();
        overlap.sort_unstable();
        overlap
    }

    /// 沒有任何組成 MSKU 的組合品（已排序）
    pub fn empty_combos(&self) -> Vec<&str> {
        let mut empty: Vec<&str> = self
            .combo_to_components
            .iter()
            .filter(|(_, components)| components.is_empty())
            .map(|(sku, _)| sku.as_str())
            .collect();
        empty.sort_unstable();
        empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let catalog = IdentityCatalog::empty()
            .with_sku_mapping("A1", "M1")
            .with_combo("C1", ["M1", "M2"]);

        assert_eq!(catalog.msku_for("A1"), Some("M1"));
        assert_eq!(catalog.msku_for("Z9"), None);
        assert_eq!(
            catalog.components_for("C1"),
            Some(&["M1".to_string(), "M2".to_string()][..])
        );
        assert!(catalog.is_combo("C1"));
        assert!(!catalog.is_combo("A1"));
        assert_eq!(catalog.sku_count(), 1);
        assert_eq!(catalog.combo_count(), 1);
    }

    #[test]
    fn test_overlapping_skus() {
        let catalog = IdentityCatalog::empty()
            .with_sku_mapping("X", "M9")
            .with_sku_mapping("A1", "M1")
            .with_combo("X", ["M1", "M2"]);

        assert_eq!(catalog.overlapping_skus(), vec!["X"]);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = IdentityCatalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.overlapping_skus().is_empty());
    }

    #[test]
    fn test_deserialize_catalog() {
        let catalog: IdentityCatalog = serde_json::from_str(
            r#"{"sku_to_msku": {"A1": "M1"}, "combo_to_components": {"C1": ["M1"], "C2": []}}"#,
        )
        .unwrap();

        assert_eq!(catalog.msku_for("A1"), Some("M1"));
        assert_eq!(catalog.empty_combos(), vec!["C2"]);
    }
}

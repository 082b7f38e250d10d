//! WMS 配置模型

use serde::{Deserialize, Serialize};

use crate::record::DEFAULT_WAREHOUSE;
use crate::{SourceErrorKind, WmsError};

/// 預設可接受的數量欄位名稱（依優先順序）
pub const DEFAULT_QUANTITY_ALIASES: [&str; 4] = ["quantity", "Quantity Sold", "qty", "units"];

/// 資料來源載入失敗時的處理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePolicy {
    /// 任何載入失敗都中止執行
    Strict,

    /// 檔案不存在時以空資料繼續（預設）
    ///
    /// 格式錯誤或無法讀取的檔案仍會中止，避免以空的庫存帳覆蓋損壞但仍有內容的資料；
    /// 需要連格式錯誤都降級處理時使用 `SubstituteAny`。
    #[default]
    SubstituteMissing,

    /// 檔案不存在或格式錯誤都以空資料繼續
    SubstituteAny,
}

impl SourcePolicy {
    /// 檢查該錯誤是否可以用空資料替代
    pub fn allows_substitute(&self, kind: &SourceErrorKind) -> bool {
        match self {
            SourcePolicy::Strict => false,
            SourcePolicy::SubstituteMissing => matches!(kind, SourceErrorKind::NotFound),
            SourcePolicy::SubstituteAny => true,
        }
    }
}

/// 執行配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WmsConfig {
    /// 可接受的數量欄位名稱（第一個出現在資料中的欄位勝出）
    pub quantity_aliases: Vec<String>,

    /// 預設倉庫
    pub default_warehouse: String,

    /// 目錄 / 庫存帳載入失敗時的處理策略
    pub source_policy: SourcePolicy,

    /// 是否並行解析
    pub parallel: bool,
}

impl WmsConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            quantity_aliases: DEFAULT_QUANTITY_ALIASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_warehouse: DEFAULT_WAREHOUSE.to_string(),
            source_policy: SourcePolicy::default(),
            parallel: false,
        }
    }

    /// 建構器模式：設置數量欄位名稱
    pub fn with_quantity_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quantity_aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// 建構器模式：設置預設倉庫
    pub fn with_default_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.default_warehouse = warehouse.into();
        self
    }

    /// 建構器模式：設置載入策略
    pub fn with_source_policy(mut self, policy: SourcePolicy) -> Self {
        self.source_policy = policy;
        self
    }

    /// 建構器模式：設置是否並行解析
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 檢查配置
    pub fn validate(&self) -> crate::Result<()> {
        if self.quantity_aliases.iter().all(|a| a.trim().is_empty()) {
            return Err(WmsError::Config("至少需要一個數量欄位名稱".to_string()));
        }
        if self.default_warehouse.trim().is_empty() {
            return Err(WmsError::Config("預設倉庫不可為空".to_string()));
        }
        Ok(())
    }
}

impl Default for WmsConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = WmsConfig::new();

        assert_eq!(
            config.quantity_aliases,
            vec!["quantity", "Quantity Sold", "qty", "units"]
        );
        assert_eq!(config.default_warehouse, "main");
        assert_eq!(config.source_policy, SourcePolicy::SubstituteMissing);
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = WmsConfig::new()
            .with_quantity_aliases(["units"])
            .with_default_warehouse("DC-01")
            .with_source_policy(SourcePolicy::Strict)
            .with_parallel(true);

        assert_eq!(config.quantity_aliases, vec!["units"]);
        assert_eq!(config.default_warehouse, "DC-01");
        assert_eq!(config.source_policy, SourcePolicy::Strict);
        assert!(config.parallel);
    }

    #[test]
    fn test_validate() {
        let config = WmsConfig::new().with_quantity_aliases(Vec::<String>::new());
        assert!(matches!(config.validate(), Err(WmsError::Config(_))));

        let config = WmsConfig::new().with_default_warehouse(" ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WmsConfig =
            serde_json::from_str(r#"{"source_policy": "substitute_any", "parallel": true}"#)
                .unwrap();

        assert_eq!(config.source_policy, SourcePolicy::SubstituteAny);
        assert_eq!(config.default_warehouse, "main");
        assert_eq!(config.quantity_aliases.len(), 4);
    }

    #[rstest]
    #[case(SourcePolicy::Strict, SourceErrorKind::NotFound, false)]
    #[case(SourcePolicy::SubstituteMissing, SourceErrorKind::NotFound, true)]
    #[case(SourcePolicy::SubstituteMissing, SourceErrorKind::Malformed("x".into()), false)]
    #[case(SourcePolicy::SubstituteAny, SourceErrorKind::Malformed("x".into()), true)]
    #[case(SourcePolicy::SubstituteAny, SourceErrorKind::Unreadable("x".into()), true)]
    fn test_policy_allows_substitute(
        #[case] policy: SourcePolicy,
        #[case] kind: SourceErrorKind,
        #[case] expected: bool,
    ) {
        assert_eq!(policy.allows_substitute(&kind), expected);
    }
}

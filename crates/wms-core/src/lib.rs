//! # WMS Core
//!
//! 核心資料模型與類型定義

pub mod catalog;
pub mod config;
pub mod delta;
pub mod identity;
pub mod inventory;
pub mod record;

use std::path::PathBuf;

// Re-export 主要類型
pub use catalog::IdentityCatalog;
pub use config::{SourcePolicy, WmsConfig};
pub use delta::{InventoryDelta, InventoryDeltaBatch};
pub use identity::UniqueIdentitySets;
pub use inventory::{InventoryLedger, LedgerSnapshot};
pub use record::{ResolvedRecord, SalesRecord, DEFAULT_WAREHOUSE, MAX_QUANTITY};

/// 資料來源錯誤類別
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceErrorKind {
    #[error("檔案不存在")]
    NotFound,

    #[error("無法讀取: {0}")]
    Unreadable(String),

    #[error("格式錯誤: {0}")]
    Malformed(String),
}

/// WMS 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum WmsError {
    #[error("SKU 目錄載入失敗 ({}): {kind}", .path.display())]
    CatalogLoad { path: PathBuf, kind: SourceErrorKind },

    #[error("庫存帳載入失敗 ({}): {kind}", .path.display())]
    LedgerLoad { path: PathBuf, kind: SourceErrorKind },

    #[error("銷售資料載入失敗 ({}): {kind}", .path.display())]
    SalesLoad { path: PathBuf, kind: SourceErrorKind },

    #[error("找不到有效的數量欄位，可接受的欄位: {aliases:?}")]
    MissingQuantityColumn { aliases: Vec<String> },

    #[error("輸出寫入失敗 ({}): {message}", .path.display())]
    Output { path: PathBuf, message: String },

    #[error("上傳失敗: {0}")]
    UploadTransport(String),

    #[error("配置錯誤: {0}")]
    Config(String),
}

impl WmsError {
    /// 取得資料來源錯誤類別（僅載入類錯誤）
    pub fn source_kind(&self) -> Option<&SourceErrorKind> {
        match self {
            Self::CatalogLoad { kind, .. }
            | Self::LedgerLoad { kind, .. }
            | Self::SalesLoad { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// 檢查是否為「檔案不存在」
    pub fn is_missing_source(&self) -> bool {
        matches!(self.source_kind(), Some(SourceErrorKind::NotFound))
    }
}

pub type Result<T> = std::result::Result<T, WmsError>;

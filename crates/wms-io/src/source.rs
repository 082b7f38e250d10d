//! 目錄與庫存帳載入
//!
//! 載入函式只回報錯誤，檔案不存在時是否改用空資料由呼叫端決定。

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::de::DeserializeOwned;
use wms_core::{IdentityCatalog, InventoryLedger, SourceErrorKind, WmsError};

/// 讀取並解析 JSON 文件
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, SourceErrorKind> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| SourceErrorKind::Malformed(e.to_string()))
}

/// 讀取文字檔
pub(crate) fn read_text(path: &Path) -> Result<String, SourceErrorKind> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SourceErrorKind::NotFound,
        _ => SourceErrorKind::Unreadable(e.to_string()),
    })
}

/// 載入 SKU → MSKU 對應表，例如 `{"SKU123": "MSKU001"}`
pub fn load_sku_mapping(path: &Path) -> wms_core::Result<HashMap<String, String>> {
    let mapping: HashMap<String, String> =
        read_document(path).map_err(|kind| WmsError::CatalogLoad {
            path: path.to_path_buf(),
            kind,
        })?;
    tracing::debug!("載入 SKU 對應 {} 筆: {}", mapping.len(), path.display());
    Ok(mapping)
}

/// 載入組合品表，例如 `{"COMBO1": ["MSKU001", "MSKU002"]}`
pub fn load_combo_mapping(path: &Path) -> wms_core::Result<HashMap<String, Vec<String>>> {
    let mapping: HashMap<String, Vec<String>> =
        read_document(path).map_err(|kind| WmsError::CatalogLoad {
            path: path.to_path_buf(),
            kind,
        })?;
    tracing::debug!("載入組合品 {} 筆: {}", mapping.len(), path.display());
    Ok(mapping)
}

/// 載入完整識別目錄（兩個檔案都必須存在）
pub fn load_catalog(sku_path: &Path, combo_path: &Path) -> wms_core::Result<IdentityCatalog> {
    let sku_to_msku = load_sku_mapping(sku_path)?;
    let combos = load_combo_mapping(combo_path)?;
    Ok(IdentityCatalog::new(sku_to_msku, combos))
}

/// 載入庫存帳，例如 `{"main": {"MSKU001": 42}}`
pub fn load_ledger(path: &Path) -> wms_core::Result<InventoryLedger> {
    let ledger: InventoryLedger = read_document(path).map_err(|kind| WmsError::LedgerLoad {
        path: path.to_path_buf(),
        kind,
    })?;
    tracing::debug!("載入庫存帳 {} 筆: {}", ledger.len(), path.display());
    Ok(ledger)
}

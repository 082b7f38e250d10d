//! 上傳交接
//!
//! 處理後的紀錄交給外部表格服務。這裡只負責整理酬載，實際傳輸由 `Uploader` 實作決定。

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Map, Value};
use wms_core::{ResolvedRecord, WmsError};

use crate::report::write_json_pretty;

/// 預設資料表名稱
pub const DEFAULT_TABLE: &str = "Sales_Data";

/// 每個酬載最多的紀錄數（表格服務單次寫入上限）
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// 上傳結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl UploadOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// 轉成 Result，失敗時帶出訊息
    pub fn into_result(self) -> wms_core::Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(WmsError::UploadTransport(
                self.message.unwrap_or_else(|| "未知錯誤".to_string()),
            ))
        }
    }
}

/// 上傳端
pub trait Uploader {
    fn upload(&self, rows: &[Map<String, Value>]) -> UploadOutcome;
}

/// 將解析後紀錄轉成欄位列
pub fn to_rows(records: &[ResolvedRecord]) -> wms_core::Result<Vec<Map<String, Value>>> {
    records
        .iter()
        .map(|record| match serde_json::to_value(record) {
            Ok(Value::Object(row)) => Ok(row),
            Ok(other) => Err(WmsError::UploadTransport(format!(
                "紀錄無法轉成欄位列: {}",
                other
            ))),
            Err(e) => Err(WmsError::UploadTransport(e.to_string())),
        })
        .collect()
}

/// 表格服務酬載：`{"records": [{"fields": row}, ...]}`
pub fn table_payload(rows: &[Map<String, Value>]) -> Value {
    let records: Vec<Value> = rows.iter().map(|row| json!({ "fields": row })).collect();
    json!({ "records": records })
}

/// 將酬載寫到目錄的上傳端
///
/// 每 `batch_size` 筆一個檔案，檔名為 `{table}_{序號:04}.json`。
pub struct PayloadFileUploader {
    dir: PathBuf,
    table: String,
    batch_size: usize,
}

impl PayloadFileUploader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            table: DEFAULT_TABLE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// 建構器模式：設置資料表名稱
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// 建構器模式：設置批次大小（最小為 1）
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn payload_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{:04}.json", self.table, index))
    }

    fn write_payloads(&self, rows: &[Map<String, Value>]) -> wms_core::Result<usize> {
        let mut written = 0;
        for (index, chunk) in rows.chunks(self.batch_size).enumerate() {
            write_json_pretty(&self.payload_path(index), &table_payload(chunk))?;
            written += 1;
        }
        Ok(written)
    }
}

impl Uploader for PayloadFileUploader {
    fn upload(&self, rows: &[Map<String, Value>]) -> UploadOutcome {
        match self.write_payloads(rows) {
            Ok(files) => {
                tracing::info!(
                    "上傳酬載已寫入 {} 個檔案（{} 筆）: {}",
                    files,
                    rows.len(),
                    self.dir.display()
                );
                UploadOutcome::ok()
            }
            Err(e) => {
                tracing::error!("上傳酬載寫入失敗: {}", e);
                UploadOutcome::failed(e.to_string())
            }
        }
    }
}

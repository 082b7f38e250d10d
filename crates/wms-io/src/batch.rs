//! 銷售資料解析
//!
//! 支援 JSON（物件陣列）與 CSV（需有標題列）。數量欄位依別名清單偵測，
//! 整批都找不到數量欄位時直接拒絕，不處理任何紀錄。

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};
use wms_core::record::{QUANTITY_FIELD, SKU_FIELD, WAREHOUSE_FIELD};
use wms_core::{SalesRecord, SourceErrorKind, WmsError, MAX_QUANTITY};

use crate::source::read_text;

/// 單列資料的問題（不中止批次）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub row: usize,
    pub message: String,
}

/// 一批銷售紀錄
#[derive(Debug, Clone)]
pub struct SalesBatch {
    pub records: Vec<SalesRecord>,

    /// 實際使用的數量欄位
    pub quantity_column: String,

    pub issues: Vec<RowIssue>,
}

/// 欄位名稱與資料列
type Table = (Vec<String>, Vec<Map<String, Value>>);

impl SalesBatch {
    /// 從資料列建立批次（欄位取自所有資料列的鍵）
    pub fn from_rows(rows: Vec<Map<String, Value>>, aliases: &[String]) -> wms_core::Result<Self> {
        let columns = row_columns(&rows);
        Self::from_table(&columns, rows, aliases)
    }

    /// 從欄位清單與資料列建立批次
    ///
    /// 數量欄位只依欄位清單偵測，沒有資料列時仍可通過檢查。
    fn from_table(
        columns: &[String],
        rows: Vec<Map<String, Value>>,
        aliases: &[String],
    ) -> wms_core::Result<Self> {
        let quantity_column = {
            let columns: BTreeSet<&str> = columns.iter().map(String::as_str).collect();

            detect_quantity_column(&columns, aliases)
                .ok_or_else(|| WmsError::MissingQuantityColumn {
                    aliases: aliases.to_vec(),
                })?
                .to_string()
        };

        tracing::debug!("數量欄位: {}", quantity_column);

        let mut issues = Vec::new();
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(row, fields)| record_from_row(row, fields, &quantity_column, &mut issues))
            .collect();

        for issue in &issues {
            tracing::warn!("第 {} 列: {}", issue.row, issue.message);
        }

        Ok(Self {
            records,
            quantity_column,
            issues,
        })
    }

    /// 解析 JSON 文字
    pub fn from_json_str(text: &str, aliases: &[String]) -> wms_core::Result<Self> {
        let (columns, rows) = parse_json_table(text).map_err(|kind| WmsError::SalesLoad {
            path: "<json>".into(),
            kind,
        })?;
        Self::from_table(&columns, rows, aliases)
    }

    /// 解析 CSV 文字（欄位取自標題列）
    pub fn from_csv_str(text: &str, aliases: &[String]) -> wms_core::Result<Self> {
        let (columns, rows) = parse_csv_table(text).map_err(|kind| WmsError::SalesLoad {
            path: "<csv>".into(),
            kind,
        })?;
        Self::from_table(&columns, rows, aliases)
    }

    /// 依副檔名載入（.csv 以外一律視為 JSON）
    pub fn load(path: &Path, aliases: &[String]) -> wms_core::Result<Self> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let (columns, rows) = read_text(path)
            .and_then(|text| {
                if is_csv {
                    parse_csv_table(&text)
                } else {
                    parse_json_table(&text)
                }
            })
            .map_err(|kind| WmsError::SalesLoad {
                path: path.to_path_buf(),
                kind,
            })?;

        tracing::info!("載入銷售資料 {} 列: {}", rows.len(), path.display());
        Self::from_table(&columns, rows, aliases)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 銷售總數量
    pub fn total_quantity(&self) -> i64 {
        self.records
            .iter()
            .fold(0i64, |total, r| total.saturating_add(r.quantity))
    }
}

/// 找出第一個出現在資料欄位中的數量別名
pub fn detect_quantity_column<'a>(
    columns: &BTreeSet<&str>,
    aliases: &'a [String],
) -> Option<&'a str> {
    aliases
        .iter()
        .map(String::as_str)
        .find(|alias| columns.contains(alias))
}

/// 所有資料列出現過的鍵（依第一次出現的順序）
fn row_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn parse_json_table(text: &str) -> Result<Table, SourceErrorKind> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| SourceErrorKind::Malformed(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(SourceErrorKind::Malformed("銷售資料必須是物件陣列".to_string()));
    };

    let rows = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(SourceErrorKind::Malformed(format!(
                "第 {} 筆不是物件: {}",
                i, other
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((row_columns(&rows), rows))
}

/// CSV 空白儲存格轉為 null
fn parse_csv_table(text: &str) -> Result<Table, SourceErrorKind> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SourceErrorKind::Malformed(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SourceErrorKind::Malformed(e.to_string()))?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}

/// 將一列資料轉為銷售紀錄
///
/// 缺少 sku 視為空字串；缺少數量視為 0；數量無法解析或超出範圍時記錄問題並視為 0。
/// 輸出保留輸入的欄位順序，以及 sku / warehouse 的非字串原始值。
fn record_from_row(
    row: usize,
    mut fields: Map<String, Value>,
    quantity_column: &str,
    issues: &mut Vec<RowIssue>,
) -> SalesRecord {
    // 數量別名換成 quantity；別名不是 quantity 時，原本的 quantity 欄位不保留
    let columns: Vec<String> = fields
        .keys()
        .filter(|key| key.as_str() != QUANTITY_FIELD || quantity_column == QUANTITY_FIELD)
        .map(|key| {
            if key == quantity_column {
                QUANTITY_FIELD.to_string()
            } else {
                key.clone()
            }
        })
        .collect();

    let raw_sku = fields.shift_remove(SKU_FIELD);
    let sku = match &raw_sku {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let quantity = match fields.shift_remove(quantity_column) {
        None | Some(Value::Null) => 0,
        Some(value) => match parse_quantity(&value) {
            Some(q) if (-MAX_QUANTITY..=MAX_QUANTITY).contains(&q) => q,
            Some(q) => {
                issues.push(RowIssue {
                    row,
                    message: format!("數量超出範圍 {}，視為 0", q),
                });
                0
            }
            None => {
                issues.push(RowIssue {
                    row,
                    message: format!("無法解析數量 {}，視為 0", value),
                });
                0
            }
        },
    };
    fields.shift_remove(QUANTITY_FIELD);

    let raw_warehouse = fields.shift_remove(WAREHOUSE_FIELD);
    let warehouse = match &raw_warehouse {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    let mut record = SalesRecord::new(sku, quantity).with_column_order(columns);
    if let Some(raw) = raw_sku {
        record = record.with_raw_value(SKU_FIELD, raw);
    }
    if let Some(raw) = raw_warehouse {
        record = record.with_raw_value(WAREHOUSE_FIELD, raw);
    }
    record.warehouse = warehouse;
    record.extra = fields;
    record
}

/// 解析整數數量（接受整數、整數值的浮點數與數字字串）
fn parse_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

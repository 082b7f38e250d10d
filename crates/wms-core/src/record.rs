//! 銷售紀錄模型

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// 未指定倉庫時使用的預設倉庫
pub const DEFAULT_WAREHOUSE: &str = "main";

/// 保留欄位名稱（不會進入附帶欄位）
pub const SKU_FIELD: &str = "sku";
pub const QUANTITY_FIELD: &str = "quantity";
pub const WAREHOUSE_FIELD: &str = "warehouse";

/// 可接受的數量絕對值上限
///
/// 超過時整批加總可能溢位，批次解析會將該列數量視為 0 並記錄問題。
pub const MAX_QUANTITY: i64 = 1_000_000_000_000;

/// 銷售紀錄（上游資料列）
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    /// 賣場 SKU（已去除前後空白）
    pub sku: String,

    /// 銷售數量（負數代表退貨）
    pub quantity: i64,

    /// 倉庫
    pub warehouse: Option<String>,

    /// 其他附帶欄位（原樣帶到輸出）
    pub extra: Map<String, Value>,

    /// 輸入列的欄位順序（數量別名已換成 quantity）
    columns: Vec<String>,

    /// sku / warehouse 的非字串原始值
    raw_sku: Option<Value>,
    raw_warehouse: Option<Value>,
}

impl SalesRecord {
    /// 創建新的銷售紀錄
    pub fn new(sku: impl AsRef<str>, quantity: i64) -> Self {
        Self {
            sku: sku.as_ref().trim().to_string(),
            quantity,
            warehouse: None,
            extra: Map::new(),
            columns: Vec::new(),
            raw_sku: None,
            raw_warehouse: None,
        }
    }

    /// 建構器模式：設置倉庫
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    /// 建構器模式：添加附帶欄位
    ///
    /// 保留欄位（sku / quantity / warehouse）會被忽略。
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !is_reserved_field(&key) {
            self.extra.insert(key, value);
        }
        self
    }

    /// 建構器模式：保留輸入列的欄位順序
    pub fn with_column_order<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// 建構器模式：保留 sku / warehouse 的原始值
    ///
    /// 字串值一律以正規化後的欄位輸出，只有非字串（數字、null 等）會原樣還原。
    pub fn with_raw_value(mut self, key: &str, value: Value) -> Self {
        if value.is_string() {
            return self;
        }
        match key {
            SKU_FIELD => self.raw_sku = Some(value),
            WAREHOUSE_FIELD => self.raw_warehouse = Some(value),
            _ => {}
        }
        self
    }

    /// 實際使用的倉庫（缺少或空白時使用預設倉庫）
    pub fn effective_warehouse<'a>(&'a self, default_warehouse: &'a str) -> &'a str {
        match self.warehouse.as_deref().map(str::trim) {
            Some(w) if !w.is_empty() => w,
            _ => default_warehouse,
        }
    }

    /// 輸出欄位順序：先依輸入列，再補上未出現的保留欄位與附帶欄位
    fn output_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let remaining = [SKU_FIELD, QUANTITY_FIELD, WAREHOUSE_FIELD]
            .into_iter()
            .chain(self.extra.keys().map(String::as_str));
        for key in remaining {
            if !columns.contains(&key) {
                columns.push(key);
            }
        }
        columns
    }
}

impl Serialize for SalesRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for key in self.output_columns() {
            match key {
                SKU_FIELD => match &self.raw_sku {
                    Some(raw) => map.serialize_entry(key, raw)?,
                    None => map.serialize_entry(key, &self.sku)?,
                },
                QUANTITY_FIELD => map.serialize_entry(key, &self.quantity)?,
                WAREHOUSE_FIELD => match (&self.raw_warehouse, &self.warehouse) {
                    (Some(raw), _) => map.serialize_entry(key, raw)?,
                    (None, Some(warehouse)) => map.serialize_entry(key, warehouse)?,
                    (None, None) => {}
                },
                _ => {
                    if let Some(value) = self.extra.get(key) {
                        map.serialize_entry(key, value)?;
                    }
                }
            }
        }
        map.end()
    }
}

/// 檢查是否為保留欄位
pub fn is_reserved_field(key: &str) -> bool {
    matches!(key, SKU_FIELD | QUANTITY_FIELD | WAREHOUSE_FIELD)
}

/// 解析後的銷售紀錄
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecord {
    #[serde(flatten)]
    pub record: SalesRecord,

    /// 對應的 MSKU（組合品為組合 SKU 本身，未對應為 None）
    pub msku: Option<String>,

    /// 是否為組合品
    pub is_combo: bool,

    /// 組合品的組成 MSKU
    pub component_mskus: Option<Vec<String>>,
}

impl ResolvedRecord {
    /// 組合品
    pub fn combo(record: SalesRecord, components: Vec<String>) -> Self {
        let msku = Some(record.sku.clone());
        Self {
            record,
            msku,
            is_combo: true,
            component_mskus: Some(components),
        }
    }

    /// 一般對應
    pub fn mapped(record: SalesRecord, msku: String) -> Self {
        Self {
            record,
            msku: Some(msku),
            is_combo: false,
            component_mskus: None,
        }
    }

    /// 未對應
    pub fn unmapped(record: SalesRecord) -> Self {
        Self {
            record,
            msku: None,
            is_combo: false,
            component_mskus: None,
        }
    }

    pub fn sku(&self) -> &str {
        &self.record.sku
    }

    /// 檢查是否已對應到 MSKU
    pub fn is_mapped(&self) -> bool {
        self.msku.is_some()
    }
}

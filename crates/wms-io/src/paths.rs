//! 資料檔路徑

use std::path::{Path, PathBuf};

/// 輸入檔路徑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub sku_mapping: PathBuf,
    pub combo_mapping: PathBuf,
    pub inventory: PathBuf,

    /// 正規化後的銷售資料備份
    pub sales_archive: PathBuf,

    pub output: OutputPaths,
}

impl DataPaths {
    /// 以資料目錄建立預設路徑
    pub fn from_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            sku_mapping: dir.join("sku_mapping.json"),
            combo_mapping: dir.join("combo_mapping.json"),
            inventory: dir.join("inventory.json"),
            sales_archive: dir.join("sales_data.json"),
            output: OutputPaths::in_dir(dir),
        }
    }

    /// 建構器模式：設置輸出目錄
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output = OutputPaths::in_dir(dir);
        self
    }
}

/// 輸出檔路徑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub processed_sales: PathBuf,
    pub updated_inventory: PathBuf,
    pub unique_skus: PathBuf,
    pub unique_mskus: PathBuf,
    pub run_summary: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            processed_sales: dir.join("processed_sales.json"),
            updated_inventory: dir.join("updated_inventory.json"),
            unique_skus: dir.join("unique_skus.json"),
            unique_mskus: dir.join("unique_mskus.json"),
            run_summary: dir.join("run_summary.json"),
        }
    }
}

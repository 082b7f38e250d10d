//! 報表輸出

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use wms_calc::RunSummary;
use wms_core::{LedgerSnapshot, ResolvedRecord, UniqueIdentitySets, WmsError};

use crate::paths::OutputPaths;

/// 一次執行要交出的所有結果
#[derive(Debug, Clone, Copy)]
pub struct RunReport<'a> {
    pub resolved: &'a [ResolvedRecord],
    pub ledger: &'a LedgerSnapshot,
    pub identities: &'a UniqueIdentitySets,
    pub summary: &'a RunSummary,
}

/// 報表輸出端
pub trait ReportSink {
    fn emit(&mut self, report: &RunReport<'_>) -> wms_core::Result<()>;
}

/// 寫入 JSON 檔（縮排 4 格），必要時建立上層目錄
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> wms_core::Result<()> {
    let output_err = |message: String| WmsError::Output {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| output_err(e.to_string()))?;
    }

    let file = File::create(path).map_err(|e| output_err(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| output_err(e.to_string()))?;
    writer.flush().map_err(|e| output_err(e.to_string()))?;
    Ok(())
}

/// 輸出到資料目錄的 JSON 檔
pub struct JsonDirectorySink {
    paths: OutputPaths,
}

impl JsonDirectorySink {
    pub fn new(paths: OutputPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }
}

impl ReportSink for JsonDirectorySink {
    fn emit(&mut self, report: &RunReport<'_>) -> wms_core::Result<()> {
        write_json_pretty(&self.paths.processed_sales, report.resolved)?;
        tracing::info!("已輸出處理後銷售資料: {}", self.paths.processed_sales.display());

        write_json_pretty(&self.paths.updated_inventory, report.ledger)?;
        tracing::info!("已輸出更新後庫存: {}", self.paths.updated_inventory.display());

        write_json_pretty(&self.paths.unique_skus, &report.identities.skus())?;
        write_json_pretty(&self.paths.unique_mskus, &report.identities.mskus())?;
        write_json_pretty(&self.paths.run_summary, report.summary)?;

        tracing::info!("唯一 SKU 數量: {}", report.identities.sku_count());
        tracing::info!("唯一 MSKU 數量: {}", report.identities.msku_count());
        Ok(())
    }
}

/// 保留在記憶體中的輸出（嵌入呼叫端使用）
#[derive(Debug, Default)]
pub struct MemorySink {
    pub processed: Vec<Value>,
    pub ledger: Option<LedgerSnapshot>,
    pub unique_skus: Vec<String>,
    pub unique_mskus: Vec<String>,
    pub summary: Option<RunSummary>,
}

impl ReportSink for MemorySink {
    fn emit(&mut self, report: &RunReport<'_>) -> wms_core::Result<()> {
        self.processed = report
            .resolved
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()
            .map_err(|e| WmsError::Output {
                path: "<memory>".into(),
                message: e.to_string(),
            })?;
        self.ledger = Some(report.ledger.clone());
        self.unique_skus = report.identities.skus();
        self.unique_mskus = report.identities.mskus();
        self.summary = Some(report.summary.clone());
        Ok(())
    }
}

//! wms CLI
//!
//! 處理一批銷售資料：SKU 對應、庫存扣帳、輸出報表

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use wms::wms_core::{SourcePolicy, WmsConfig};
use wms::wms_io::{DataPaths, PayloadFileUploader, Uploader};

#[derive(Parser)]
#[command(name = "wms")]
#[command(about = "銷售資料對帳：SKU → MSKU 對應與庫存扣帳")]
struct Cli {
    /// 銷售資料檔（.csv 或 .json）
    #[arg(long, env = "WMS_SALES")]
    sales: PathBuf,

    /// 資料目錄（對應表、庫存帳與預設輸出位置）
    #[arg(long, env = "WMS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// SKU 對應表路徑
    #[arg(long, env = "WMS_SKU_MAP")]
    sku_map: Option<PathBuf>,

    /// 組合品表路徑
    #[arg(long, env = "WMS_COMBO_MAP")]
    combo_map: Option<PathBuf>,

    /// 庫存帳路徑
    #[arg(long, env = "WMS_INVENTORY")]
    inventory: Option<PathBuf>,

    /// 輸出目錄（預設為資料目錄）
    #[arg(long, env = "WMS_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// JSON 配置檔
    #[arg(long, env = "WMS_CONFIG")]
    config: Option<PathBuf>,

    /// 數量欄位名稱（逗號分隔，依優先順序）
    #[arg(long, env = "WMS_QUANTITY_COLUMNS", value_delimiter = ',')]
    quantity_column: Vec<String>,

    /// 預設倉庫
    #[arg(long, env = "WMS_DEFAULT_WAREHOUSE")]
    default_warehouse: Option<String>,

    /// 並行解析
    #[arg(long, env = "WMS_PARALLEL")]
    parallel: bool,

    /// 對應表 / 庫存帳載入失敗時的處理方式
    #[arg(long, env = "WMS_SOURCE_POLICY", value_enum)]
    source_policy: Option<PolicyArg>,

    /// 備份正規化後的銷售資料（sales_data.json）
    #[arg(long, env = "WMS_ARCHIVE")]
    archive: bool,

    /// 上傳酬載輸出目錄
    #[arg(long, env = "WMS_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// 上傳資料表名稱
    #[arg(long, env = "WMS_UPLOAD_TABLE", default_value = "Sales_Data")]
    upload_table: String,

    /// 以 JSON 格式輸出日誌
    #[arg(long, env = "WMS_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Strict,
    SubstituteMissing,
    SubstituteAny,
}

impl From<PolicyArg> for SourcePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Strict => SourcePolicy::Strict,
            PolicyArg::SubstituteMissing => SourcePolicy::SubstituteMissing,
            PolicyArg::SubstituteAny => SourcePolicy::SubstituteAny,
        }
    }
}

impl Cli {
    fn config(&self) -> Result<WmsConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("無法讀取配置檔 {}", path.display()))?;
                serde_json::from_str::<WmsConfig>(&text)
                    .with_context(|| format!("配置檔格式錯誤 {}", path.display()))?
            }
            None => WmsConfig::default(),
        };

        if !self.quantity_column.is_empty() {
            config = config.with_quantity_aliases(self.quantity_column.iter().map(|s| s.trim()));
        }
        if let Some(warehouse) = &self.default_warehouse {
            config = config.with_default_warehouse(warehouse.clone());
        }
        if let Some(policy) = self.source_policy {
            config = config.with_source_policy(policy.into());
        }
        if self.parallel {
            config = config.with_parallel(true);
        }
        Ok(config)
    }

    fn paths(&self) -> DataPaths {
        let mut paths = DataPaths::from_data_dir(&self.data_dir);
        if let Some(dir) = &self.out_dir {
            paths = paths.with_output_dir(dir);
        }
        if let Some(path) = &self.sku_map {
            paths.sku_mapping = path.clone();
        }
        if let Some(path) = &self.combo_map {
            paths.combo_mapping = path.clone();
        }
        if let Some(path) = &self.inventory {
            paths.inventory = path.clone();
        }
        paths
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = cli.config()?;
    let paths = cli.paths();
    let uploader = cli
        .upload_dir
        .as_ref()
        .map(|dir| PayloadFileUploader::new(dir).with_table(cli.upload_table.clone()));

    let outcome = wms::run_files(
        &cli.sales,
        &paths,
        &config,
        cli.archive,
        uploader.as_ref().map(|u| u as &dyn Uploader),
    )
    .with_context(|| format!("處理銷售資料失敗: {}", cli.sales.display()))?;

    println!(
        "完成：紀錄 {} 筆，唯一 SKU {}，唯一 MSKU {}，警告 {}",
        outcome.summary.records,
        outcome.summary.unique_skus,
        outcome.summary.unique_mskus,
        outcome.summary.warnings
    );

    if !outcome.upload_succeeded() {
        anyhow::bail!("上傳失敗（對帳結果已輸出）");
    }
    Ok(())
}

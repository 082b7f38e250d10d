//! # WMS IO
//!
//! 資料檔讀寫：目錄 / 庫存帳載入、銷售資料解析、報表輸出、上傳交接

pub mod batch;
pub mod paths;
pub mod report;
pub mod source;
pub mod upload;

// Re-export 主要類型
pub use batch::{detect_quantity_column, RowIssue, SalesBatch};
pub use paths::{DataPaths, OutputPaths};
pub use report::{write_json_pretty, JsonDirectorySink, MemorySink, ReportSink, RunReport};
pub use source::{load_catalog, load_combo_mapping, load_ledger, load_sku_mapping};
pub use upload::{to_rows, PayloadFileUploader, UploadOutcome, Uploader};

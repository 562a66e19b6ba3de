//! 车辆档案处理 - 車両書類アーカイブの一括OCRツール
//!
//! # 機能
//! - ZIPアーカイブの展開（GBKのファイル名に対応）と車両フォルダ構成の判定
//! - Tesseract / Google Vision API によるテキスト認識（PDFは1ページ目）
//! - 書類種別（登记证・发票・行驶证）の判定と重複ページの統合
//! - 車台番号・所有者・金額などの抽出
//! - 車台番号ごとのフォルダ整理とExcelレポート出力

pub mod archive;
pub mod cli;
pub mod console;
pub mod document;
pub mod logger;
pub mod ocr;
pub mod organize;
pub mod parser;
pub mod pdf;
pub mod pipeline;
pub mod report;
pub mod vision;

pub use cli::Config;
pub use document::{DocType, DocumentFile};
pub use parser::VehicleInfo;
pub use pipeline::{ArchiveResult, BatchProcessor, BatchSummary, ProcessOptions};

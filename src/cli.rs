//! コマンドライン設定

use crate::ocr::{EngineKind, EngineOptions};
use crate::pipeline::ProcessOptions;
use clap::Parser;
use std::path::{Path, PathBuf};

/// 対応する圧縮形式の拡張子
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z"];

#[derive(Debug, Clone, Parser)]
#[command(name = "vehicle_archiver", version)]
#[command(about = "车辆档案批量识别：提取车架号・车主・交易金额，按车架号整理并导出Excel")]
pub struct Config {
    /// 圧縮ファイル（zip）または展開済みフォルダ
    #[arg(required = true, value_name = "ARCHIVES")]
    pub archives: Vec<PathBuf>,

    /// 出力フォルダ
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// OCRエンジン
    #[arg(short, long, value_enum, env = "VEHICLE_OCR_ENGINE", default_value = "tesseract")]
    pub engine: EngineKind,

    /// 車台番号フォルダへの整理をしない
    #[arg(long)]
    pub no_organize: bool,

    /// Excelレポートを出力しない
    #[arg(long)]
    pub no_excel: bool,

    /// レポートのファイル名（既存ファイルは上書きしない）
    #[arg(long, default_value = "vehicle_info.xlsx")]
    pub report_name: String,

    #[arg(long, env = "TESSERACT_CMD", default_value = "tesseract")]
    pub tesseract_cmd: PathBuf,

    #[arg(long, default_value = "chi_sim+eng")]
    pub tesseract_lang: String,

    #[arg(long, env = "PDFTOPPM_CMD", default_value = "pdftoppm")]
    pub pdftoppm_cmd: PathBuf,

    /// Google Cloud サービスアカウントの認証ファイル
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// 完了後に出力フォルダを開く
    #[arg(long)]
    pub open: bool,

    /// 詳細ログ
    #[arg(short, long)]
    pub verbose: bool,

    /// デバッグログ（パターンごとの抽出結果まで出す）
    #[arg(long)]
    pub debug: bool,
}

impl Config {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            kind: self.engine,
            tesseract_cmd: self.tesseract_cmd.clone(),
            tesseract_lang: self.tesseract_lang.clone(),
            credentials: self.credentials.clone(),
        }
    }

    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            output_dir: self.output.clone(),
            organize: !self.no_organize,
            export_excel: !self.no_excel,
            report_name: self.report_name.clone(),
            pdftoppm_cmd: self.pdftoppm_cmd.clone(),
        }
    }

    /// 存在しない入力
    pub fn missing_inputs(&self) -> Vec<&Path> {
        self.archives
            .iter()
            .map(PathBuf::as_path)
            .filter(|p| !p.exists())
            .collect()
    }

    /// フォルダでも対応形式の圧縮ファイルでもない入力
    pub fn unrecognized_inputs(&self) -> Vec<&Path> {
        self.archives
            .iter()
            .map(PathBuf::as_path)
            .filter(|p| p.exists() && !p.is_dir() && !is_archive(p))
            .collect()
    }
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ARCHIVE_EXTENSIONS.iter().any(|a| e.eq_ignore_ascii_case(a)))
}

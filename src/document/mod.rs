//! 書類モジュール - 書類種別の判定と重複ページの統合

mod classifier;
mod dedupe;

pub use classifier::{classify, classify_by_filename};
pub use dedupe::merge_duplicate_pages;

use crate::parser::VehicleInfo;
use std::fmt;
use std::path::PathBuf;

/// 車両書類の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    /// 機動車登記証書（注册登记ページ）
    Registration,
    /// 機動車登記証書の転移登記欄（最終ページ）
    RegistrationTransfer,
    /// 機動車销售統一発票
    Invoice,
    /// 機動車行驶证
    License,
    Unknown,
}

impl DocType {
    /// 表示名
    pub fn label(self) -> &'static str {
        match self {
            DocType::Registration => "登记证",
            DocType::RegistrationTransfer => "登记证尾页",
            DocType::Invoice => "发票",
            DocType::License => "行驶证",
            DocType::Unknown => "未知",
        }
    }

    /// 整理後のファイル名（対象外の種別は元のファイル名を使う）
    pub fn organized_name(self) -> Option<&'static str> {
        match self {
            DocType::Registration | DocType::Invoice | DocType::License => Some(self.label()),
            DocType::RegistrationTransfer | DocType::Unknown => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 処理済みの書類ファイル
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub path: PathBuf,
    pub doc_type: DocType,
    /// 種別判定の確信度 (0.0〜1.0)
    pub confidence: f32,
    pub ocr_text: String,
    pub info: VehicleInfo,
}

impl DocumentFile {
    /// 処理に失敗した書類
    pub fn failed(path: PathBuf) -> Self {
        Self {
            path,
            doc_type: DocType::Unknown,
            confidence: 0.0,
            ocr_text: String::new(),
            info: VehicleInfo::default(),
        }
    }

    /// 種別が信頼できるか
    pub fn is_confident(&self) -> bool {
        self.doc_type != DocType::Unknown && self.confidence >= LOW_CONFIDENCE
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// これ未満の確信度はファイル名からの推測を優先する
pub const LOW_CONFIDENCE: f32 = 0.3;

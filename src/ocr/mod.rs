//! OCRモジュール - エンジン共通インターフェース

mod prepare;
mod tesseract;

pub use prepare::{prepare_for_ocr, PreparedImage, MAX_OCR_HEIGHT, MAX_OCR_WIDTH};
pub use tesseract::TesseractEngine;

use crate::vision::VisionClient;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// 画像からテキストを認識するエンジン
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// エンジン名（ログ表示用）
    fn name(&self) -> &str;

    /// 画像を認識し、行を改行で連結したテキストを返す
    async fn recognize(&self, image: &Path) -> Result<String>;
}

/// 選択可能なOCRエンジン
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EngineKind {
    /// ローカルの Tesseract
    Tesseract,
    /// Google Cloud Vision API
    Vision,
}

/// エンジン生成時の設定
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub kind: EngineKind,
    pub tesseract_cmd: PathBuf,
    pub tesseract_lang: String,
    pub credentials: Option<PathBuf>,
}

/// 設定に応じたエンジンを生成
pub fn build_engine(options: &EngineOptions) -> Result<Box<dyn OcrEngine>> {
    Ok(match options.kind {
        EngineKind::Tesseract => Box::new(TesseractEngine::new(
            options.tesseract_cmd.clone(),
            options.tesseract_lang.clone(),
        )),
        EngineKind::Vision => Box::new(VisionClient::new(options.credentials.as_deref())?),
    })
}

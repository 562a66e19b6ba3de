//! Tesseract OCR エンジン（外部コマンド）

use super::OcrEngine;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// `tesseract <image> stdout -l <lang> --psm 6` を実行する
pub struct TesseractEngine {
    command: PathBuf,
    lang: String,
}

impl TesseractEngine {
    pub fn new(command: impl Into<PathBuf>, lang: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            lang: lang.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &Path) -> Result<String> {
        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .args(["-l", self.lang.as_str(), "--psm", "6"])
            .output()
            .await
            .with_context(|| format!("tesseractの実行に失敗: {:?}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract エラー: {}", stderr.trim());
        }

        Ok(normalize_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// 各行の前後空白を除き、空行を捨てる
fn normalize_output(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

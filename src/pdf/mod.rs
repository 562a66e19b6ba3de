//! PDF処理モジュール - PDFから画像への変換

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

/// OCR用の解像度（書類1ページなら150dpiで十分）
pub const PDF_RENDER_DPI: u32 = 150;

/// 変換された1ページ目の画像
/// 破棄時に一時ディレクトリごと削除される
pub struct RenderedPage {
    path: PathBuf,
    _dir: TempDir,
}

impl RenderedPage {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// pdftoppm によるPDF変換
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    pdftoppm: PathBuf,
    dpi: u32,
}

impl PdfRenderer {
    pub fn new(pdftoppm: impl Into<PathBuf>) -> Self {
        Self {
            pdftoppm: pdftoppm.into(),
            dpi: PDF_RENDER_DPI,
        }
    }

    /// PDFの1ページ目を画像に変換
    pub fn render_first_page(&self, pdf_path: impl AsRef<Path>) -> Result<RenderedPage> {
        let pdf_path = pdf_path.as_ref();

        let temp_dir = tempfile::Builder::new()
            .prefix("vehicle_pdf_")
            .tempdir()
            .context("一時ディレクトリの作成に失敗")?;
        let output_base = temp_dir.path().join("page");

        let dpi = self.dpi.to_string();
        let mut command = Command::new(&self.pdftoppm);
        command
            .args(["-png", "-f", "1", "-l", "1", "-r", dpi.as_str()])
            .arg(pdf_path)
            .arg(&output_base);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(0x08000000); // CREATE_NO_WINDOW
        }

        let output = command
            .output()
            .with_context(|| format!("pdftoppmの実行に失敗: {:?}", self.pdftoppm))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("PDF変換に失敗: {}", stderr.trim());
        }

        // ページ数によって page-1.png / page-01.png / page-001.png になる
        let image_path = ["page-1.png", "page-01.png", "page-001.png"]
            .iter()
            .map(|name| temp_dir.path().join(name))
            .find(|p| p.exists())
            .context("変換された画像ファイルが見つかりません")?;

        debug!("PDF変換完了: {} → {}", pdf_path.display(), image_path.display());

        Ok(RenderedPage {
            path: image_path,
            _dir: temp_dir,
        })
    }
}

/// PDFファイルか（拡張子で判定）
pub fn is_pdf(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_detection() {
        assert!(is_pdf(Path::new("scan.PDF")));
        assert!(!is_pdf(Path::new("scan.jpg")));
    }

    #[test]
    fn missing_converter_is_an_error() {
        let renderer = PdfRenderer::new("/nonexistent/pdftoppm");
        assert!(renderer.render_first_page("missing.pdf").is_err());
    }
}

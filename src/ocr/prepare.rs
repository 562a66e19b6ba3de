//! OCR前の画像縮小
//!
//! 大きすぎる画像はOCRが極端に遅くなるため、1920x1080 に収まるよう縮小する。

use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

pub const MAX_OCR_WIDTH: u32 = 1920;
pub const MAX_OCR_HEIGHT: u32 = 1080;

/// OCRに渡す画像
/// 縮小した場合は一時ファイルを指し、破棄時に削除される
pub struct PreparedImage {
    path: PathBuf,
    temp_dir: Option<TempDir>,
}

impl PreparedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn was_resized(&self) -> bool {
        self.temp_dir.is_some()
    }
}

/// 必要なら縮小した画像を用意する
/// 読み込めない画像はそのままエンジンに渡す
pub fn prepare_for_ocr(path: &Path) -> PreparedImage {
    match resize_if_needed(path) {
        Ok(Some(prepared)) => prepared,
        Ok(None) => unchanged(path),
        Err(e) => {
            warn!("画像の縮小に失敗（元画像を使用）: {}: {}", path.display(), e);
            unchanged(path)
        }
    }
}

fn unchanged(path: &Path) -> PreparedImage {
    PreparedImage {
        path: path.to_path_buf(),
        temp_dir: None,
    }
}

fn resize_if_needed(path: &Path) -> anyhow::Result<Option<PreparedImage>> {
    let (width, height) = image::image_dimensions(path)?;
    if width <= MAX_OCR_WIDTH && height <= MAX_OCR_HEIGHT {
        return Ok(None);
    }

    // 縦横比を保ったまま上限に収める
    let resized = image::open(path)?.resize(MAX_OCR_WIDTH, MAX_OCR_HEIGHT, FilterType::Triangle);
    debug!(
        "画像サイズ: {}x{} → {}x{}",
        width,
        height,
        resized.width(),
        resized.height()
    );

    let dir = tempfile::Builder::new().prefix("vehicle_ocr_").tempdir()?;
    let out = dir.path().join("resized.png");
    resized.save(&out)?;

    Ok(Some(PreparedImage {
        path: out,
        temp_dir: Some(dir),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        ImageBuffer::from_pixel(width, height, Rgb([255u8, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn small_image_is_untouched() {
        let tmp = TempDir::new().unwrap();
        let path = write_image(tmp.path(), "small.png", 640, 480);
        let prepared = prepare_for_ocr(&path);
        assert!(!prepared.was_resized());
        assert_eq!(prepared.path(), path);
    }

    #[test]
    fn large_image_fits_the_limit() {
        let tmp = TempDir::new().unwrap();
        let path = write_image(tmp.path(), "large.png", 4000, 1000);
        let prepared = prepare_for_ocr(&path);
        assert!(prepared.was_resized());
        let (w, h) = image::image_dimensions(prepared.path()).unwrap();
        assert_eq!(w, 1920);
        assert!(h <= MAX_OCR_HEIGHT);
    }

    #[test]
    fn unreadable_image_is_passed_through() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert_eq!(prepare_for_ocr(&path).path(), path);
    }
}

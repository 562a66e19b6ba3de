//! 展開後のフォルダ構成の判定と書類ファイルの検索

use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// 処理対象の拡張子
pub const DOCUMENT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "pdf"];

/// 処理対象の書類ファイルか（拡張子の大文字小文字は区別しない、隠しファイルは除く）
pub fn is_document(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DOCUMENT_EXTENSIONS.iter().any(|d| e.eq_ignore_ascii_case(d)));
    !hidden && supported
}

/// 隠しフォルダ・macOSのメタデータフォルダ
fn is_ignored_dir(name: &str) -> bool {
    name.starts_with('.') || name == "__MACOSX"
}

/// 直下のサブフォルダ（名前順）
pub fn subfolders(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let ignored = entry.file_name().to_str().is_some_and(is_ignored_dir);
        if path.is_dir() && !ignored {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// 直下に書類ファイルがあるか
pub fn has_root_documents(dir: &Path) -> io::Result<bool> {
    Ok(!documents_in(dir)?.is_empty())
}

/// 直下の書類ファイル（パス順、再帰しない）
pub fn documents_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_document(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// 配下すべての書類ファイル（パス順）
pub fn documents_under(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_documents(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_documents(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            if !entry.file_name().to_str().is_some_and(is_ignored_dir) {
                collect_documents(&path, files)?;
            }
        } else if is_document(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// 中間フォルダを飛ばす
///
/// 展開結果が「フォルダ1つだけ」で、その中に書類がなくサブフォルダがある場合は
/// そのフォルダを作業ルートとみなす。
pub fn skip_intermediate_folder(dir: &Path) -> io::Result<PathBuf> {
    let folders = subfolders(dir)?;
    if folders.len() == 1 && !has_root_documents(dir)? {
        let candidate = &folders[0];
        let nested = subfolders(candidate)?;
        if !has_root_documents(candidate)? && !nested.is_empty() {
            info!(
                "中間フォルダを検出: {} ({} 個の車両フォルダ)",
                candidate.file_name().unwrap_or_default().to_string_lossy(),
                nested.len()
            );
            return Ok(candidate.clone());
        }
    }
    Ok(dir.to_path_buf())
}

/// 作業ルートの構成
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// 車両ごとのサブフォルダ
    MultiFolder(Vec<PathBuf>),
    /// 全書類が1台分
    Single,
}

impl Layout {
    pub fn detect(dir: &Path) -> io::Result<Self> {
        let folders = subfolders(dir)?;
        if !folders.is_empty() && !has_root_documents(dir)? {
            Ok(Layout::MultiFolder(folders))
        } else {
            Ok(Layout::Single)
        }
    }
}

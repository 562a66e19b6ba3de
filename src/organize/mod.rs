//! 書類整理モジュール - 車台番号ごとのフォルダへコピー

use crate::parser::{get_unique_filename, sanitize_for_filename};
use crate::pipeline::ArchiveResult;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 整理先のフォルダ名（車台番号、なければ入力名）
pub fn folder_name(result: &ArchiveResult) -> String {
    match result.merged.vin.as_deref().filter(|v| !v.is_empty()) {
        Some(vin) => sanitize_for_filename(vin),
        None => sanitize_for_filename(&result.folder_name),
    }
}

/// 書類を `output_dir/<フォルダ名>/` にコピーし、種別名にリネーム
///
/// 同名ファイルがあれば `_1`, `_2` … を付ける。コピーに失敗した書類は飛ばす。
pub fn organize_result(result: &ArchiveResult, output_dir: &Path) -> Result<PathBuf> {
    let target = output_dir.join(folder_name(result));
    std::fs::create_dir_all(&target)
        .with_context(|| format!("フォルダの作成に失敗: {}", target.display()))?;

    info!("整理先: {}", target.display());

    for doc in &result.documents {
        let stem = match doc.doc_type.organized_name() {
            Some(name) => name.to_string(),
            None => doc
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
        };
        let filename = match doc.path.extension() {
            Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
            None => stem,
        };

        let unique = get_unique_filename(&target, &filename);
        match std::fs::copy(&doc.path, target.join(&unique)) {
            Ok(_) => info!("  {} → {}", doc.file_name(), unique),
            Err(e) => warn!("  コピー失敗: {} ({})", doc.file_name(), e),
        }
    }

    Ok(target)
}

//! アーカイブ処理モジュール - 圧縮ファイルの展開とフォルダ構成の判定

mod layout;

pub use layout::{
    documents_in, documents_under, has_root_documents, is_document, skip_intermediate_folder, subfolders,
    Layout, DOCUMENT_EXTENSIONS,
};

use encoding_rs::GBK;
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("未対応の圧縮形式です: {0}")]
    Unsupported(String),

    #[error("展開先の外を指すエントリです: {0}")]
    UnsafePath(String),

    #[error("ZIPの読み込みに失敗: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("入出力エラー: {0}")]
    Io(#[from] io::Error),
}

/// 圧縮形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
    SevenZip,
}

impl ArchiveKind {
    /// 拡張子から判定（大文字小文字を区別しない）
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "zip" => Some(Self::Zip),
            "rar" => Some(Self::Rar),
            "7z" => Some(Self::SevenZip),
            _ => None,
        }
    }
}

/// 圧縮ファイルを `dest` に展開
///
/// UTF-8 でないエントリ名（中国語版Windowsで作成されたZIP）は GBK として読む。
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    match ArchiveKind::from_path(archive) {
        Some(ArchiveKind::Zip) => extract_zip(archive, dest),
        Some(kind) => Err(ArchiveError::Unsupported(format!("{:?} ({})", kind, archive.display()))),
        None => Err(ArchiveError::Unsupported(archive.display().to_string())),
    }
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), ArchiveError> {
    info!("展開中: {} → {}", archive_path.display(), dest.display());

    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    std::fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = decode_entry_name(entry.name_raw());
        let relative = safe_relative_path(&name).ok_or_else(|| ArchiveError::UnsafePath(name.clone()))?;
        let outpath = dest.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;
        debug!("展開: {}", relative.display());
    }

    info!("展開完了: {} エントリ", archive.len());
    Ok(())
}

/// エントリ名をデコード（UTF-8 でなければ GBK）
pub fn decode_entry_name(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(name) => name.to_string(),
        Err(_) => GBK.decode(raw).0.into_owned(),
    }
}

/// 展開先からはみ出さない相対パスに変換
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut path = PathBuf::new();

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    (!path.as_os_str().is_empty()).then_some(path)
}

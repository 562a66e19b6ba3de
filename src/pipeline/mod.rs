//! 一括処理モジュール - 入力ごとの展開・OCR・整理・レポート出力

use crate::archive::{
    documents_in, documents_under, extract_archive, skip_intermediate_folder, Layout,
};
use crate::document::{classify, classify_by_filename, merge_duplicate_pages, DocumentFile, LOW_CONFIDENCE};
use crate::ocr::{prepare_for_ocr, OcrEngine};
use crate::organize::organize_result;
use crate::parser::VehicleInfo;
use crate::pdf::{is_pdf, PdfRenderer};
use crate::report::export_report;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// ファイル名からの推測を採用したときの確信度
const FILENAME_GUESS_CONFIDENCE: f32 = 0.5;

/// 処理設定
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub output_dir: PathBuf,
    /// 車台番号ごとのフォルダに書類をコピーする
    pub organize: bool,
    pub export_excel: bool,
    pub report_name: String,
    pub pdftoppm_cmd: PathBuf,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            organize: true,
            export_excel: true,
            report_name: "vehicle_info.xlsx".to_string(),
            pdftoppm_cmd: PathBuf::from("pdftoppm"),
        }
    }
}

/// 1台分（アーカイブまたはサブフォルダ）の処理結果
#[derive(Debug, Clone)]
pub struct ArchiveResult {
    /// 入力ファイル名またはサブフォルダ名（レポートの来源文件欄）
    pub name: String,
    /// 車台番号がないときの整理先フォルダ名
    pub folder_name: String,
    /// 入力ファイル
    pub source: PathBuf,
    pub documents: Vec<DocumentFile>,
    /// 全書類の統合情報
    pub merged: VehicleInfo,
    /// 書類が1つ以上見つかったか
    pub success: bool,
    /// 整理先フォルダ
    pub organized_dir: Option<PathBuf>,
}

impl ArchiveResult {
    fn new(name: String, source: &Path, documents: Vec<DocumentFile>) -> Self {
        let merged = VehicleInfo::merge(documents.iter().map(|d| &d.info));
        Self {
            folder_name: name.clone(),
            name,
            source: source.to_path_buf(),
            success: !documents.is_empty(),
            documents,
            merged,
            organized_dir: None,
        }
    }
}

/// 一括処理の集計
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<ArchiveResult>,
    /// 処理できなかった入力とエラー内容
    pub failed_inputs: Vec<(PathBuf, String)>,
    pub report_path: Option<PathBuf>,
    pub report_error: Option<String>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded() + self.failed_inputs.len()
    }

    /// 1台でも成功したか
    pub fn is_success(&self) -> bool {
        self.succeeded() > 0
    }
}

/// 一括処理
pub struct BatchProcessor {
    engine: Box<dyn OcrEngine>,
    renderer: PdfRenderer,
    options: ProcessOptions,
}

impl BatchProcessor {
    pub fn new(engine: Box<dyn OcrEngine>, options: ProcessOptions) -> Self {
        Self {
            engine,
            renderer: PdfRenderer::new(options.pdftoppm_cmd.clone()),
            options,
        }
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// PDFの1ページ目を認識
    async fn recognize_pdf(&self, path: &Path) -> Result<String> {
        let page = self.renderer.render_first_page(path)?;
        let prepared = prepare_for_ocr(page.path());
        self.engine.recognize(prepared.path()).await
    }

    async fn recognize_image(&self, path: &Path) -> Result<String> {
        let prepared = prepare_for_ocr(path);
        self.engine.recognize(prepared.path()).await
    }

    /// 書類1件を処理
    ///
    /// PDFの変換・認識に失敗した場合は空のテキストとして判定を続け、
    /// ファイル名からの推測に任せる。画像の認識失敗は種別不明の書類になる。
    pub async fn process_document(&self, path: &Path) -> DocumentFile {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let guess = classify_by_filename(&file_name);

        let text = if is_pdf(path) {
            self.recognize_pdf(path).await.unwrap_or_else(|e| {
                warn!("PDF処理失敗: {} ({:#})", file_name, e);
                String::new()
            })
        } else {
            match self.recognize_image(path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("OCR失敗: {} ({:#})", file_name, e);
                    return DocumentFile::failed(path.to_path_buf());
                }
            }
        };

        let (mut doc_type, mut confidence) = classify(&text);
        if confidence < LOW_CONFIDENCE {
            if let Some(guessed) = guess {
                debug!("ファイル名から種別を推測: {} → {}", file_name, guessed);
                doc_type = guessed;
                confidence = FILENAME_GUESS_CONFIDENCE;
            }
        }

        info!("  {} → {} (確信度 {:.2})", file_name, doc_type, confidence);

        let info = VehicleInfo::parse(&text, doc_type);

        DocumentFile {
            path: path.to_path_buf(),
            doc_type,
            confidence,
            ocr_text: text,
            info,
        }
    }

    async fn process_files(&self, files: &[PathBuf]) -> Vec<DocumentFile> {
        let mut documents = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            debug!("[{}/{}] {}", i + 1, files.len(), file.display());
            documents.push(self.process_document(file).await);
        }
        documents
    }

    /// 車両フォルダ1つを処理（直下のみ、重複ページを統合）
    pub async fn process_folder(&self, dir: &Path, name: &str) -> Result<ArchiveResult> {
        let files = documents_in(dir).with_context(|| format!("フォルダの読み込みに失敗: {}", dir.display()))?;
        info!("フォルダ処理: {} ({} ファイル)", name, files.len());

        let documents = merge_duplicate_pages(self.process_files(&files).await);
        Ok(ArchiveResult::new(name.to_string(), dir, documents))
    }

    /// 1台分のフォルダツリーを処理（再帰、重複統合なし）
    pub async fn process_tree(&self, dir: &Path, name: &str) -> Result<ArchiveResult> {
        let files = documents_under(dir).with_context(|| format!("フォルダの読み込みに失敗: {}", dir.display()))?;
        info!("単一車両として処理: {} ({} ファイル)", name, files.len());

        let documents = self.process_files(&files).await;
        Ok(ArchiveResult::new(name.to_string(), dir, documents))
    }

    /// 展開済みのルートを構成に応じて処理
    async fn process_root(&self, root: &Path, input: &Path) -> Result<Vec<ArchiveResult>> {
        let mut results = match Layout::detect(root)? {
            Layout::MultiFolder(folders) => {
                info!("複数車両モード: {} フォルダ", folders.len());
                let mut results = Vec::with_capacity(folders.len());
                for folder in &folders {
                    let name = folder
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    results.push(self.process_folder(folder, &name).await?);
                }
                results
            }
            Layout::Single => {
                let mut result = self.process_tree(root, &input_name(input)).await?;
                result.folder_name = input_stem(input);
                vec![result]
            }
        };

        for result in &mut results {
            result.source = input.to_path_buf();
            if !result.success {
                warn!("書類が見つかりません: {}", result.name);
                continue;
            }
            if self.options.organize {
                match organize_result(result, &self.options.output_dir) {
                    Ok(dir) => result.organized_dir = Some(dir),
                    Err(e) => warn!("整理に失敗: {} ({:#})", result.name, e),
                }
            }
        }

        Ok(results)
    }

    /// 入力1つ（圧縮ファイルまたはフォルダ）を処理
    ///
    /// 展開先の一時ディレクトリは書類の整理が終わるまで保持する。
    pub async fn process_input(&self, input: &Path) -> Result<Vec<ArchiveResult>> {
        info!("処理開始: {}", input.display());

        if input.is_dir() {
            let root = skip_intermediate_folder(input)?;
            return self.process_root(&root, input).await;
        }

        let temp_dir = tempfile::Builder::new()
            .prefix("vehicle_archive_")
            .tempdir()
            .context("一時ディレクトリの作成に失敗")?;
        extract_archive(input, temp_dir.path())
            .with_context(|| format!("展開に失敗: {}", input.display()))?;

        let root = skip_intermediate_folder(temp_dir.path())?;
        self.process_root(&root, input).await
    }

    /// 全入力を順に処理し、最後にレポートを出力
    pub async fn run(&self, inputs: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for (i, input) in inputs.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, inputs.len(), input.display());
            match self.process_input(input).await {
                Ok(results) => summary.results.extend(results),
                Err(e) => {
                    error!("処理失敗: {} ({:#})", input.display(), e);
                    summary.failed_inputs.push((input.clone(), format!("{:#}", e)));
                }
            }
        }

        if self.options.export_excel && summary.is_success() {
            match export_report(&summary.results, &self.options.output_dir, &self.options.report_name) {
                Ok(path) => summary.report_path = Some(path),
                Err(e) => {
                    error!("レポート出力失敗: {:#}", e);
                    summary.report_error = Some(format!("{:#}", e));
                }
            }
        }

        summary
    }
}

/// 入力のファイル名（拡張子付き）
fn input_name(input: &Path) -> String {
    input
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 入力名（拡張子なし、フォルダはそのまま）
fn input_stem(input: &Path) -> String {
    if input.is_dir() {
        return input_name(input);
    }
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

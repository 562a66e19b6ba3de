//! Excelレポート出力モジュール

use crate::document::DocType;
use crate::parser::{get_unique_filename, VehicleInfo};
use crate::pipeline::ArchiveResult;
use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// シート名
pub const SHEET_NAME: &str = "车辆信息";

/// 見出し行
pub const HEADERS: [&str; 8] = [
    "序号",
    "来源文件",
    "车架号(行驶证)",
    "车架号(登记证)",
    "车架号(发票)",
    "车主(行驶证)",
    "新车主(登记证)",
    "交易金额(发票)",
];

const COLUMN_WIDTHS: [f64; 8] = [6.0, 20.0, 22.0, 22.0, 22.0, 30.0, 30.0, 15.0];

/// 車台番号の列（行驶证・登记证）
const LICENSE_VIN_COL: u16 = 2;
const REGISTRATION_VIN_COL: u16 = 3;

/// レポートの1行（1台分）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRow {
    pub serial: usize,
    pub source: String,
    pub license_vin: String,
    pub registration_vin: String,
    pub invoice_vin: String,
    pub license_owner: String,
    pub new_owner: String,
    pub invoice_amount: String,
}

impl ReportRow {
    /// 種別ごとに最後の書類の情報を使う
    pub fn from_result(serial: usize, result: &ArchiveResult) -> Self {
        let license = last_of(result, DocType::License);
        let registration = last_of(result, DocType::Registration);
        let transfer = last_of(result, DocType::RegistrationTransfer);
        let invoice = last_of(result, DocType::Invoice);

        // 転移登記欄を優先し、なければ注册登记ページ
        let mut new_owner = field(transfer, |i| i.new_owner_name.as_deref());
        if new_owner.is_empty() {
            new_owner = field(registration, |i| i.new_owner_name.as_deref());
        }

        Self {
            serial,
            source: result.name.clone(),
            license_vin: field(license, |i| i.vin.as_deref()),
            registration_vin: field(registration, |i| i.vin.as_deref()),
            invoice_vin: field(invoice, |i| i.vin.as_deref()),
            license_owner: field(license, |i| i.owner_name.as_deref()),
            new_owner,
            invoice_amount: field(invoice, |i| i.invoice_amount.as_deref()),
        }
    }

    /// 行驶证と登记证の車台番号が両方あり、一致しない
    pub fn vin_mismatch(&self) -> bool {
        !self.license_vin.is_empty()
            && !self.registration_vin.is_empty()
            && self.license_vin != self.registration_vin
    }

    fn cells(&self) -> [&str; 7] {
        [
            self.source.as_str(),
            self.license_vin.as_str(),
            self.registration_vin.as_str(),
            self.invoice_vin.as_str(),
            self.license_owner.as_str(),
            self.new_owner.as_str(),
            self.invoice_amount.as_str(),
        ]
    }
}

/// 指定種別の最後の書類の情報
fn last_of(result: &ArchiveResult, doc_type: DocType) -> Option<&VehicleInfo> {
    result
        .documents
        .iter()
        .rev()
        .find(|d| d.doc_type == doc_type)
        .map(|d| &d.info)
}

fn field(info: Option<&VehicleInfo>, get: impl Fn(&VehicleInfo) -> Option<&str>) -> String {
    info.and_then(get).unwrap_or_default().to_string()
}

/// 成功した結果だけを行にする（連番は1から）
pub fn build_rows(results: &[ArchiveResult]) -> Vec<ReportRow> {
    results
        .iter()
        .filter(|r| r.success)
        .enumerate()
        .map(|(i, r)| ReportRow::from_result(i + 1, r))
        .collect()
}

/// `output_dir/report_name` にレポートを書き出す（既存ファイルは上書きしない）
pub fn export_report(results: &[ArchiveResult], output_dir: &Path, report_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("出力フォルダの作成に失敗: {}", output_dir.display()))?;
    let path = output_dir.join(get_unique_filename(output_dir, report_name));

    let rows = build_rows(results);
    write_workbook(&rows, &path)?;

    info!("レポート出力: {} ({} 件)", path.display(), rows.len());
    Ok(path)
}

fn write_workbook(rows: &[ReportRow], path: &Path) -> Result<()> {
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x4472C4))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let cell_format = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap();
    let mismatch_format = cell_format
        .clone()
        .set_bold()
        .set_font_color(Color::RGB(0xFF0000))
        .set_background_color(Color::RGB(0xFFE6E6));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (header, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *header, &header_format)?;
        sheet.set_column_width(col, width)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let mismatch = row.vin_mismatch();
        if mismatch {
            warn!(
                "車台番号不一致: {} (行驶证 {} / 登记证 {})",
                row.source, row.license_vin, row.registration_vin
            );
        }

        sheet.write_number_with_format(r, 0, row.serial as f64, &cell_format)?;
        for (offset, value) in row.cells().into_iter().enumerate() {
            let col = offset as u16 + 1;
            let highlighted = mismatch && (col == LICENSE_VIN_COL || col == REGISTRATION_VIN_COL);
            let format = if highlighted { &mismatch_format } else { &cell_format };
            sheet.write_string_with_format(r, col, value, format)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("レポートの保存に失敗: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentFile;
    use regex::Regex;
    use std::io::Read;
    use tempfile::TempDir;

    fn doc(doc_type: DocType, info: VehicleInfo) -> DocumentFile {
        DocumentFile {
            path: PathBuf::from("x.jpg"),
            doc_type,
            confidence: 1.0,
            ocr_text: String::new(),
            info,
        }
    }

    fn vin(v: &str) -> VehicleInfo {
        VehicleInfo {
            vin: Some(v.to_string()),
            ..Default::default()
        }
    }

    fn result(name: &str, documents: Vec<DocumentFile>) -> ArchiveResult {
        ArchiveResult {
            name: name.to_string(),
            folder_name: name.to_string(),
            source: PathBuf::from(format!("{}.zip", name)),
            merged: VehicleInfo::default(),
            success: !documents.is_empty(),
            documents,
            organized_dir: None,
        }
    }

    #[test]
    fn row_uses_last_document_per_type() {
        let res = result(
            "car1",
            vec![
                doc(DocType::License, vin("LSVAB4186E2123450")),
                doc(
                    DocType::License,
                    VehicleInfo {
                        vin: Some("LSVAB4186E2123456".into()),
                        owner_name: Some("张伟".into()),
                        ..Default::default()
                    },
                ),
                doc(
                    DocType::Invoice,
                    VehicleInfo {
                        vin: Some("LSVAB4186E2123456".into()),
                        invoice_amount: Some("150000.00".into()),
                        ..Default::default()
                    },
                ),
            ],
        );

        let row = ReportRow::from_result(1, &res);
        assert_eq!(row.source, "car1");
        assert_eq!(row.license_vin, "LSVAB4186E2123456");
        assert_eq!(row.license_owner, "张伟");
        assert_eq!(row.invoice_amount, "150000.00");
        assert_eq!(row.registration_vin, "");
        assert!(!row.vin_mismatch());
    }

    #[test]
    fn transfer_page_owner_has_priority() {
        let owner = |name: &str| VehicleInfo {
            new_owner_name: Some(name.to_string()),
            ..Default::default()
        };
        let both = result(
            "a",
            vec![doc(DocType::Registration, owner("王芳")), doc(DocType::RegistrationTransfer, owner("刘洋"))],
        );
        assert_eq!(ReportRow::from_result(1, &both).new_owner, "刘洋");

        let registration_only = result("b", vec![doc(DocType::Registration, owner("王芳"))]);
        assert_eq!(ReportRow::from_result(1, &registration_only).new_owner, "王芳");
    }

    #[test]
    fn mismatch_requires_both_vins() {
        let mismatch = result(
            "a",
            vec![doc(DocType::License, vin("LSVAB4186E2123456")), doc(DocType::Registration, vin("LSVAB4186E2123457"))],
        );
        assert!(ReportRow::from_result(1, &mismatch).vin_mismatch());

        let one_side = result("b", vec![doc(DocType::License, vin("LSVAB4186E2123456"))]);
        assert!(!ReportRow::from_result(1, &one_side).vin_mismatch());
    }

    #[test]
    fn only_successful_results_are_numbered() {
        let results = vec![
            result("a", vec![doc(DocType::License, VehicleInfo::default())]),
            result("empty", Vec::new()),
            result("b", vec![doc(DocType::Invoice, VehicleInfo::default())]),
        ];
        let rows = build_rows(&results);
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].serial, rows[0].source.as_str()), (1, "a"));
        assert_eq!((rows[1].serial, rows[1].source.as_str()), (2, "b"));
    }

    #[test]
    fn existing_report_is_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        let results = vec![result("a", vec![doc(DocType::License, vin("LSVAB4186E2123456"))])];

        let first = export_report(&results, tmp.path(), "vehicle_info.xlsx").unwrap();
        let second = export_report(&results, tmp.path(), "vehicle_info.xlsx").unwrap();
        assert_eq!(first, tmp.path().join("vehicle_info.xlsx"));
        assert_eq!(second, tmp.path().join("vehicle_info_1.xlsx"));
        assert!(second.exists());
    }

    fn xlsx_entry(path: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        let mut content = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    fn cell_style(sheet: &str, cell: &str) -> String {
        let re = Regex::new(&format!(r#"<c r="{}"[^>]*?\ss="(\d+)""#, cell)).unwrap();
        re.captures(sheet).unwrap()[1].to_string()
    }

    #[test]
    fn mismatched_vins_are_highlighted_in_the_workbook() {
        let tmp = TempDir::new().unwrap();
        let results = vec![
            result(
                "mismatch",
                vec![doc(DocType::License, vin("LSVAB4186E2123456")), doc(DocType::Registration, vin("LSVAB4186E2123457"))],
            ),
            result(
                "match",
                vec![doc(DocType::License, vin("LSVAB4186E2123456")), doc(DocType::Registration, vin("LSVAB4186E2123456"))],
            ),
        ];

        let path = export_report(&results, tmp.path(), "vehicle_info.xlsx").unwrap();

        let styles = xlsx_entry(&path, "xl/styles.xml");
        assert!(styles.contains("FFFF0000"));
        assert!(styles.contains("FFFFE6E6"));

        let sheet = xlsx_entry(&path, "xl/worksheets/sheet1.xml");
        let plain = cell_style(&sheet, "B2");
        let highlighted = cell_style(&sheet, "C2");
        assert_ne!(highlighted, plain);
        assert_eq!(cell_style(&sheet, "D2"), highlighted);
        assert_eq!(cell_style(&sheet, "E2"), plain);

        assert_eq!(cell_style(&sheet, "C3"), plain);
        assert_eq!(cell_style(&sheet, "D3"), plain);
    }
}

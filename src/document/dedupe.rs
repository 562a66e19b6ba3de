//! 連続する重複ページの統合
//!
//! 登記証や行驶证は複数枚スキャンされることが多い。同じ種別が続き、
//! 車台番号がほぼ同じ（または両方なし）なら2枚目以降を落とす。

use super::{DocType, DocumentFile};
use crate::parser::are_vins_similar;
use tracing::{debug, info};

/// OCR誤認識として許容する文字数
const MAX_VIN_DIFF: usize = 2;

/// 連続する重複ページを取り除く（発票は常に残す）
pub fn merge_duplicate_pages(documents: Vec<DocumentFile>) -> Vec<DocumentFile> {
    let total = documents.len();
    let mut merged: Vec<DocumentFile> = Vec::with_capacity(total);
    let mut current: Option<(DocType, Option<String>)> = None;

    for doc in documents {
        if !doc.is_confident() {
            merged.push(doc);
            current = None;
            continue;
        }

        let vin = doc.info.vin.clone();
        let duplicate = match &current {
            Some((prev_type, prev_vin)) if *prev_type == doc.doc_type => match doc.doc_type {
                DocType::Registration | DocType::License => match (&vin, prev_vin) {
                    (Some(a), Some(b)) => are_vins_similar(a, b, MAX_VIN_DIFF),
                    (None, None) => true,
                    _ => false,
                },
                DocType::RegistrationTransfer => true,
                DocType::Invoice | DocType::Unknown => false,
            },
            _ => false,
        };

        if duplicate {
            debug!("重複ページをスキップ: {}", doc.file_name());
            continue;
        }

        current = Some((doc.doc_type, vin));
        merged.push(doc);
    }

    if merged.len() < total {
        info!("重複ページを統合: {} → {}", total, merged.len());
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::VehicleInfo;
    use std::path::PathBuf;

    fn doc(name: &str, doc_type: DocType, confidence: f32, vin: Option<&str>) -> DocumentFile {
        DocumentFile {
            path: PathBuf::from(name),
            doc_type,
            confidence,
            ocr_text: String::new(),
            info: VehicleInfo {
                vin: vin.map(str::to_string),
                ..Default::default()
            },
        }
    }

    fn names(docs: &[DocumentFile]) -> Vec<String> {
        docs.iter().map(|d| d.file_name()).collect()
    }

    #[test]
    fn similar_vins_are_merged() {
        let docs = vec![
            doc("1.jpg", DocType::Registration, 1.0, Some("LSVAB4186E2123456")),
            doc("2.jpg", DocType::Registration, 1.0, Some("LSVAB4186E2123458")),
            doc("3.jpg", DocType::License, 1.0, Some("LSVAB4186E2123456")),
        ];
        assert_eq!(names(&merge_duplicate_pages(docs)), ["1.jpg", "3.jpg"]);
    }

    #[test]
    fn different_vins_are_kept() {
        let docs = vec![
            doc("1.jpg", DocType::License, 1.0, Some("LSVAB4186E2123456")),
            doc("2.jpg", DocType::License, 1.0, Some("LFV2A21K0A3000001")),
        ];
        assert_eq!(merge_duplicate_pages(docs).len(), 2);
    }

    #[test]
    fn pages_without_vin_are_merged_but_not_with_vin() {
        let docs = vec![
            doc("1.jpg", DocType::Registration, 1.0, None),
            doc("2.jpg", DocType::Registration, 1.0, None),
            doc("3.jpg", DocType::Registration, 1.0, Some("LSVAB4186E2123456")),
        ];
        assert_eq!(names(&merge_duplicate_pages(docs)), ["1.jpg", "3.jpg"]);
    }

    #[test]
    fn transfer_pages_collapse_and_invoices_stay() {
        let docs = vec![
            doc("1.jpg", DocType::RegistrationTransfer, 1.0, None),
            doc("2.jpg", DocType::RegistrationTransfer, 0.75, None),
            doc("3.jpg", DocType::Invoice, 1.0, Some("LSVAB4186E2123456")),
            doc("4.jpg", DocType::Invoice, 1.0, Some("LSVAB4186E2123456")),
        ];
        assert_eq!(names(&merge_duplicate_pages(docs)), ["1.jpg", "3.jpg", "4.jpg"]);
    }

    #[test]
    fn unknown_pages_reset_the_run() {
        let docs = vec![
            doc("1.jpg", DocType::License, 1.0, None),
            doc("2.jpg", DocType::Unknown, 0.0, None),
            doc("3.jpg", DocType::License, 1.0, None),
            doc("4.jpg", DocType::License, 0.1, None),
        ];
        assert_eq!(merge_duplicate_pages(docs).len(), 4);
    }
}

//! 書類種別の判定

use super::DocType;

/// 種別ごとのキーワード（判定順）
const KEYWORDS: &[(DocType, &[&str])] = &[
    (DocType::Registration, &["注册登记", "机动车登记证书"]),
    (DocType::RegistrationTransfer, &["登记栏", "转移登记"]),
    (DocType::Invoice, &["发票", "机动车销售统一发票", "增值税发票", "购车发票"]),
    (DocType::License, &["行驶证", "机动车行驶证", "行驶证正页"]),
];

/// OCRテキストから書類種別と確信度を判定
///
/// 登記証の転移登記欄と注册登记ページは専用の強い目印で先に採点し、
/// 残りの種別はキーワード一致（+2）と文字の部分一致（+0.5）で採点する。
/// 同点の場合は先に採点された種別を採用する。
pub fn classify(text: &str) -> (DocType, f32) {
    let mut scores: Vec<(DocType, f32)> = Vec::new();

    if text.contains("登记栏") {
        scores.push((DocType::RegistrationTransfer, 4.0));
    } else if text.contains("转移登记") || text.contains("现机动车所有人") {
        scores.push((DocType::RegistrationTransfer, 3.0));
    }

    if text.contains("注册登记") {
        scores.push((DocType::Registration, 4.0));
    } else if text.contains("机动车登记证书") {
        scores.push((DocType::Registration, 3.0));
    }

    for (doc_type, keywords) in KEYWORDS {
        if scores.iter().any(|(t, _)| t == doc_type) {
            continue;
        }

        let score: f32 = keywords
            .iter()
            .map(|keyword| {
                if text.contains(keyword) {
                    2.0
                } else if keyword.chars().any(|c| text.contains(c)) {
                    0.5
                } else {
                    0.0
                }
            })
            .sum();

        if score > 0.0 {
            scores.push((*doc_type, score));
        }
    }

    let mut best: Option<(DocType, f32)> = None;
    for (doc_type, score) in scores {
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((doc_type, score));
        }
    }

    match best {
        Some((doc_type, score)) if score > 0.0 => (doc_type, (score / 4.0).min(1.0)),
        _ => (DocType::Unknown, 0.0),
    }
}

/// ファイル名から書類種別を推測
pub fn classify_by_filename(filename: &str) -> Option<DocType> {
    let name = filename.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

    if has(&["登记栏", "登记尾", "transfer"]) {
        Some(DocType::RegistrationTransfer)
    } else if has(&["登记", "registration", "djz"]) {
        Some(DocType::Registration)
    } else if has(&["发票", "invoice", "fp"]) {
        Some(DocType::Invoice)
    } else if has(&["行驶", "license", "xsz"]) {
        Some(DocType::License)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_page_has_priority() {
        let (doc_type, confidence) = classify("机动车登记证书\n转移登记\n登记栏");
        assert_eq!(doc_type, DocType::RegistrationTransfer);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn registration_page() {
        let (doc_type, confidence) = classify("机动车登记证书\n注册登记摘要信息栏");
        assert_eq!(doc_type, DocType::Registration);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn invoice_by_keywords() {
        let (doc_type, confidence) = classify("机动车销售统一发票\n价税合计");
        assert_eq!(doc_type, DocType::Invoice);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn license_by_keyword() {
        let (doc_type, _) = classify("中华人民共和国机动车行驶证");
        assert_eq!(doc_type, DocType::License);
    }

    #[test]
    fn partial_characters_give_low_confidence() {
        let (doc_type, confidence) = classify("车");
        assert_eq!(doc_type, DocType::Invoice);
        assert!(confidence < 0.3);
    }

    #[test]
    fn empty_text_is_unknown() {
        assert_eq!(classify(""), (DocType::Unknown, 0.0));
        assert_eq!(classify("hello world"), (DocType::Unknown, 0.0));
    }

    #[test]
    fn filename_guess() {
        assert_eq!(classify_by_filename("登记证_尾页_transfer.jpg"), Some(DocType::RegistrationTransfer));
        assert_eq!(classify_by_filename("DJZ_001.JPG"), Some(DocType::Registration));
        assert_eq!(classify_by_filename("invoice.pdf"), Some(DocType::Invoice));
        assert_eq!(classify_by_filename("xsz.png"), Some(DocType::License));
        assert_eq!(classify_by_filename("scan_001.jpg"), None);
    }
}

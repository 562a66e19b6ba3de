//! 車台番号（VIN）抽出モジュール

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// ラベルとして使われるキーワード（具体的なものから順に）
const VIN_KEYWORDS: &[&str] = &[
    "车辆识别代号/车架号",
    "车辆识别代号/车架号码",
    "车辆识别代号",
    "车架号码",
    "车架号",
    "VIN",
    "识别代号",
    "识别代码",
];

/// よく見かけるメーカーコード（WMI）
const COMMON_WMI_PREFIXES: &[&str] = &["LSV", "WVW", "LFV", "LDC", "LHG", "LVS"];

/// VINで使用可能な文字のみ（I, O, Q を除く）
static STRICT_VIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-HJ-NPR-Z0-9]{17}").expect("valid regex"));

/// OCR誤認識を含む緩い候補
static LOOSE_VIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z0-9]{17}").expect("valid regex"));

static FULL_VIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("valid regex"));

/// キーワードごとのラベル付きパターン
static LABELED_VIN: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    VIN_KEYWORDS
        .iter()
        .map(|keyword| {
            let pattern = format!(r"(?i){}[:：\s/]*([A-Z0-9]{{17}})", regex::escape(keyword));
            (*keyword, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

/// テキストから車台番号を抽出
/// 優先順位: ラベル付き > 厳密な全文検索 > OCR補正付きの緩い検索
pub fn extract_vin(text: &str) -> Option<String> {
    let clean = clean_text(text);

    if let Some(vin) = extract_labeled_vin(&clean) {
        return Some(vin);
    }

    let strict: Vec<String> = STRICT_VIN
        .find_iter(&clean)
        .map(|m| m.as_str().to_string())
        .filter(|m| {
            let ok = is_valid_vin_format(m);
            if !ok {
                debug!("全文一致したが形式チェック失敗: {}", m);
            }
            ok
        })
        .collect();

    if let Some(vin) = prefer_common_wmi(&strict) {
        info!("全文検索で車台番号を検出: {}", vin);
        return Some(vin);
    }

    let corrected: Vec<String> = LOOSE_VIN
        .find_iter(&clean)
        .map(|m| m.as_str())
        .filter(|m| is_valid_vin_format(m))
        .filter_map(correct_ocr_errors)
        .collect();

    if let Some(vin) = prefer_common_wmi(&corrected) {
        info!("OCR補正で車台番号を検出: {}", vin);
        return Some(vin);
    }

    warn!("車台番号が見つかりません");
    None
}

/// 改行を空白に、句読点を除去し、連続空白をまとめる
fn clean_text(text: &str) -> String {
    let replaced = text.replace('\n', " ").replace(['.', ','], "");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ラベル付きの車台番号を抽出
fn extract_labeled_vin(clean: &str) -> Option<String> {
    for (keyword, re) in LABELED_VIN.iter() {
        let Some(caps) = re.captures(clean) else {
            continue;
        };
        let candidate = caps.get(1)?.as_str().to_uppercase();
        debug!("キーワード '{}' で候補: {}", keyword, candidate);

        if candidate.contains(['I', 'O', 'Q']) {
            if let Some(corrected) = correct_ocr_errors(&candidate) {
                if is_valid_vin_format(&corrected) {
                    info!("キーワード '{}' で車台番号を検出 (補正: {} -> {})", keyword, candidate, corrected);
                    return Some(corrected);
                }
            }
        } else if is_valid_vin_format(&candidate) {
            info!("キーワード '{}' で車台番号を検出: {}", keyword, candidate);
            return Some(candidate);
        } else {
            debug!("キーワード一致したが形式チェック失敗: {}", candidate);
        }
    }

    None
}

/// 一般的なWMIで始まる候補を優先し、なければ先頭を返す
fn prefer_common_wmi(candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find(|c| COMMON_WMI_PREFIXES.iter().any(|p| c.starts_with(p)))
        .or_else(|| candidates.first())
        .cloned()
}

/// 車台番号らしい形式かチェック
///
/// 数字のみの請求書番号や、`91` で始まる統一社会信用コードを除外する。
pub fn is_valid_vin_format(vin: &str) -> bool {
    if vin.chars().count() != 17 {
        return false;
    }

    let alpha = vin.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let digits = vin.chars().filter(|c| c.is_ascii_digit()).count();

    if alpha == 0 {
        return false;
    }

    if vin.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }

    if !vin.chars().take(3).any(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    if alpha < 3 || digits < 3 {
        return false;
    }

    let credit_code_like = (vin.starts_with("91") || vin.starts_with("92"))
        && vin.chars().skip(2).take(4).all(|c| c.is_ascii_digit());
    !credit_code_like
}

/// OCRでよくある誤認識を補正（I→1, O→0, Q→0）
pub fn correct_ocr_errors(vin: &str) -> Option<String> {
    if vin.chars().count() != 17 {
        return None;
    }

    let corrected: String = vin
        .chars()
        .map(|c| match c {
            'I' => '1',
            'O' | 'Q' => '0',
            other => other,
        })
        .collect();

    FULL_VIN.is_match(&corrected).then_some(corrected)
}

/// 2つの車台番号が数文字の誤認識の範囲で一致するか
pub fn are_similar(a: &str, b: &str, max_diff: usize) -> bool {
    if a.is_empty() || b.is_empty() || a.chars().count() != b.chars().count() {
        return false;
    }
    a.chars().zip(b.chars()).filter(|(x, y)| x != y).count() <= max_diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_has_a_pattern() {
        assert_eq!(LABELED_VIN.len(), VIN_KEYWORDS.len());
    }

    #[test]
    fn labeled_vin_wins_over_other_candidates() {
        let text = "发票号码 LFV2A21K0A3000001\n车辆识别代号/车架号 LSVAB4186E2123456";
        assert_eq!(extract_vin(text).as_deref(), Some("LSVAB4186E2123456"));
    }

    #[test]
    fn labeled_vin_is_corrected() {
        let text = "车架号: LSVAB4I86E2O23456";
        assert_eq!(extract_vin(text).as_deref(), Some("LSVAB4186E2023456"));
    }

    #[test]
    fn lowercase_label_match_is_uppercased() {
        let text = "vin lsvab4186e2123456";
        assert_eq!(extract_vin(text).as_deref(), Some("LSVAB4186E2123456"));
    }

    #[test]
    fn common_wmi_is_preferred() {
        let text = "ABCDE12345FGH6789 LHGCM56707A012345";
        assert_eq!(extract_vin(text).as_deref(), Some("LHGCM56707A012345"));
    }

    #[test]
    fn credit_code_is_not_a_vin() {
        assert!(!is_valid_vin_format("91410100MACFUB487"));
        assert!(!is_valid_vin_format("12345678901234567"));
        assert!(is_valid_vin_format("LSVAB4186E2123456"));
    }

    #[test]
    fn loose_match_is_corrected() {
        let text = "号码 LSVOB4186E2123456 其他";
        assert_eq!(extract_vin(text).as_deref(), Some("LSV0B4186E2123456"));
    }

    #[test]
    fn punctuation_inside_vin_is_removed() {
        let text = "LSVAB4186.E2123456.";
        assert_eq!(extract_vin(text).as_deref(), Some("LSVAB4186E2123456"));
    }

    #[test]
    fn no_vin_in_plain_text() {
        assert_eq!(extract_vin("机动车行驶证\n所有人 张三"), None);
    }

    #[test]
    fn similarity_allows_two_differences() {
        assert!(are_similar("LSVAB4186E2123456", "LSVAB4186E2123499", 2));
        assert!(!are_similar("LSVAB4186E2123456", "LSVAB4186E2129999", 2));
        assert!(!are_similar("LSVAB4186E2123456", "", 2));
    }
}

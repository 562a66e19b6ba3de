//! 金額抽出モジュール

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// 金額パターン（請求書専用の書式から汎用的なものへ）
static AMOUNT_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("车价合计+小写", r"车价合计.*?小写[:：\s]*([0-9,，]+\.?\d*)"),
        ("价税合计+小写", r"价税合计.*?小写[:：\s]*([0-9,，]+\.?\d*)"),
        ("合计金额+小写", r"合计金额.*?小写[:：\s]*([0-9,，]+\.?\d*)"),
        ("小写", r"小写[:：\s]*([0-9,，]+\.?\d*)"),
        ("金额/价额/总额", r"[金价总]额[:：￥¥]*\s*([0-9,，]+\.?\d*)"),
        ("¥", r"¥\s*([0-9,，]+\.?\d*)"),
        ("￥", r"￥\s*([0-9,，]+\.?\d*)"),
        ("数字+元", r"([0-9,，]+\.?\d*)\s*元"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (name, re)))
    .collect()
});

/// テキストから請求金額を抽出
/// 桁区切りのカンマは除去して返す
pub fn extract_amount(text: &str) -> Option<String> {
    for (name, re) in AMOUNT_PATTERNS.iter() {
        let Some(caps) = re.captures(text) else {
            debug!("金額パターン不一致: {}", name);
            continue;
        };
        let Some(m) = caps.get(1) else {
            continue;
        };

        let amount = m.as_str().replace([',', '，'], "");
        if amount.parse::<f64>().is_ok() {
            debug!("金額パターン '{}' で検出: {}", name, amount);
            return Some(amount);
        }
        debug!("数値として解釈できない金額: {}", amount);
    }

    warn!("金額が見つかりません");
    None
}

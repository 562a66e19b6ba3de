//! ナンバープレート抽出モジュール

use regex::Regex;
use std::sync::LazyLock;

const PROVINCES: &str = "京津沪渝冀豫云辽黑湘皖鲁新苏浙赣鄂桂甘晋蒙陕吉闽贵粤青藏川宁琼使领";

/// 省略文字 + 英字 + 5文字（I, O を除く）
static PLATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"[{PROVINCES}][A-Z][A-HJ-NP-Z0-9]{{5}}"),
        format!(r"号牌号码[:：]\s*([{PROVINCES}][A-Z][A-HJ-NP-Z0-9]{{5}})"),
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// テキストからナンバープレートを抽出
pub fn extract_plate_number(text: &str) -> Option<String> {
    let clean = text.replace([' ', '\n'], "");

    PLATE_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(&clean)?;
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
    })
}

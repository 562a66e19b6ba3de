//! 日付抽出モジュール

use regex::Regex;
use std::sync::LazyLock;

/// 注册日期ラベル付き > 年月日形式
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"注册日期[:：]\s*(\d{4}年\d{1,2}月\d{1,2}日)",
        r"注册日期[:：]\s*(\d{4}-\d{1,2}-\d{1,2})",
        r"注册日期[:：]\s*(\d{4}/\d{1,2}/\d{1,2})",
        r"(\d{4}年\d{1,2}月\d{1,2}日)",
    ]
    .into_iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// テキストから登録日を抽出（書類上の表記のまま返す）
pub fn extract_register_date(text: &str) -> Option<String> {
    DATE_PATTERNS
        .iter()
        .find_map(|re| re.captures(text)?.get(1).map(|m| m.as_str().to_string()))
}

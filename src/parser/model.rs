//! 車両型式抽出モジュール

use regex::Regex;
use std::sync::LazyLock;

const MODEL_KEYWORDS: &[&str] = &["品牌型号", "车辆型号", "型号"];

/// 英語の項目名だけの行
const ENGLISH_LABELS: &[&str] = &["Use Character", "Model", "VIN", "Engine No.", "Owner", "Address"];

/// 型式欄の終わりを示す語（次の項目名、または空行）
static SECTION_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"车辆识别代号|发动机|注册日期|档案编号|\n{2,}").expect("valid regex"));

static MODEL_LABELS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    MODEL_KEYWORDS
        .iter()
        .map(|keyword| Regex::new(&format!(r"{}[:：\s]*", regex::escape(keyword))).expect("valid regex"))
        .collect()
});

/// テキストから車両型式を抽出
pub fn extract_vehicle_model(text: &str) -> Option<String> {
    for re in MODEL_LABELS.iter() {
        let Some(m) = re.find(text) else {
            continue;
        };

        let rest = &text[m.end()..];
        // 値は最低1文字必要
        let Some(first) = rest.chars().next() else {
            continue;
        };
        let skip = first.len_utf8();
        let end = SECTION_END
            .find_at(rest, skip)
            .map(|e| e.start())
            .unwrap_or(rest.len());

        let lines: Vec<&str> = rest[..end]
            .trim()
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let preferred = lines.iter().find(|line| {
            if ENGLISH_LABELS.contains(*line) {
                return false;
            }
            let has_cjk = line.chars().any(|c| ('\u{4e00}'..='\u{9fa5}').contains(&c));
            let has_digit = line.chars().any(|c| c.is_ascii_digit());
            has_cjk || (line.chars().count() > 3 && has_digit)
        });

        if let Some(line) = preferred.or(lines.first()) {
            return Some(line.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_skips_english_label() {
        let text = "品牌型号\nModel\n大众汽车牌SVW7183LJD\n车辆识别代号 LSVAB4186E2123456";
        assert_eq!(extract_vehicle_model(text).as_deref(), Some("大众汽车牌SVW7183LJD"));
    }

    #[test]
    fn every_keyword_has_a_pattern() {
        assert_eq!(MODEL_LABELS.len(), MODEL_KEYWORDS.len());
    }

    #[test]
    fn model_stops_at_next_field() {
        let text = "车辆型号：BJ7202发动机号码：ABC123456";
        assert_eq!(extract_vehicle_model(text).as_deref(), Some("BJ7202"));
    }
}

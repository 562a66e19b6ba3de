//! 所有者・購入者名の抽出モジュール
//!
//! OCR結果では項目名と値が別の行に分かれたり、「所有人」が「所」と「人」に
//! 分割されることが多いため、同じ行 → 後続行 → 分割キーワードの順に探す。

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// 所有者名のキーワード
const OWNER_KEYWORDS: &[&str] = &["所有人", "车主", "姓名", "买方"];

/// 購入者名のキーワード（請求書）
const BUYER_KEYWORDS: &[&str] = &["买方", "购买方", "购方名称", "客户名称"];

/// 名義変更後の所有者名のキーワード（登記証の転移登記欄）
const NEW_OWNER_KEYWORDS: &[&str] = &[
    "转入所有人",
    "现所有人",
    "现机动车所有人",
    "受让方",
    "姓名/名称",
    "姓名／名称",
    "姓名",
    "名称",
    "过户后车主",
    "转入车主",
];

/// 会社名らしさを示す語
const COMPANY_MARKERS: &[&str] = &["公司", "企业", "集团", "中心", "单位"];

/// 人名ではない語（地名・書類の項目名など）
const NON_NAME_WORDS: &[&str] = &[
    // 地名
    "北京", "上海", "天津", "重庆", "广州", "深圳", "杭州", "南京",
    "成都", "西安", "武汉", "郑州", "长沙", "沈阳", "哈尔滨", "济南",
    "青岛", "大连", "厦门", "福州", "昆明", "兰州", "太原", "石家庄",
    "合肥", "南昌", "贵阳", "海口", "银川", "西宁", "拉萨", "呼和浩特",
    "乌鲁木齐", "朝阳区", "海淀区", "丰台区", "东城区", "西城区",
    // 一般語
    "单位", "企业", "公司", "集团", "有限", "股份",
    "信息", "摘要", "备注", "说明", "注意", "事项",
    "机动车", "车辆", "登记", "证书", "发票", "行驶",
    "住址", "地址", "联系", "电话",
    // 書類の語彙
    "转移", "登记证", "行驶证", "所有人", "车主", "姓名",
    "品牌", "型号", "类型", "用途",
    // 行驶证の技術項目（OCRで位置がずれやすい）
    "外廓尺寸", "外麻尺寸", "核定载人数", "核定载质量",
    "整备质量", "准牵引总质量", "总质量", "使用性质",
    "车辆类型", "品牌型号", "发动机号码", "注册日期",
    "发证日期", "检验记录", "档案编号",
];

/// 長い名称（会社名）に含まれてはいけない語
const FORBIDDEN_IN_LONG_NAME: &[&str] = &[
    "机动车", "登记证", "行驶证", "发票",
    "车辆类型", "品牌型号", "使用性质",
    "所有人", "车主", "车架号", "发动机号",
    "注册日期", "发证日期", "检验记录",
    "身份证明", "统一社会信用代码",
];

static CJK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{4e00}-\x{9fa5}]{2,40}").expect("valid regex"));

static HAS_CJK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{4e00}-\x{9fa5}]").expect("valid regex"));

/// 「キーワード + 区切り + 2〜40文字の漢字」のパターン表
fn keyword_patterns(keywords: &[&'static str]) -> Vec<(&'static str, Regex)> {
    keywords
        .iter()
        .map(|keyword| {
            let pattern = format!(r"{}[:：\s]*([\x{{4e00}}-\x{{9fa5}}]{{2,40}})", regex::escape(keyword));
            (*keyword, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
}

static OWNER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| keyword_patterns(OWNER_KEYWORDS));

static BUYER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| keyword_patterns(BUYER_KEYWORDS));

static NEW_OWNER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| keyword_patterns(NEW_OWNER_KEYWORDS));

/// キーワード直後（同じ行）の名称を取得
fn name_after_keyword(re: &Regex, line: &str) -> Option<String> {
    Some(re.captures(line)?.get(1)?.as_str().to_string())
}

/// 行内の最初の漢字列（2〜40文字）
fn first_cjk_run(line: &str) -> Option<String> {
    CJK_RUN.find(line).map(|m| m.as_str().to_string())
}

fn is_company(name: &str) -> bool {
    COMPANY_MARKERS.iter().any(|m| name.contains(m))
}

/// `lines[start..end]` の中から名称候補を探す
/// 会社名が見つかれば即座に返し、なければ最初の候補を返す
fn scan_candidates(lines: &[&str], start: usize, end: usize, min_chars: usize) -> Option<String> {
    let mut first: Option<String> = None;

    for line in lines.iter().take(end).skip(start) {
        let line = line.trim();
        if line.chars().count() < min_chars || !HAS_CJK.is_match(line) {
            continue;
        }
        let Some(name) = first_cjk_run(line) else {
            continue;
        };
        if !is_valid_name_or_company(&name) {
            continue;
        }
        if is_company(&name) {
            return Some(name);
        }
        first.get_or_insert(name);
    }

    first
}

/// 登記証・行驶证から所有者名を抽出
pub fn extract_owner_name(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();

    for (keyword, re) in OWNER_PATTERNS.iter() {
        for (i, line) in lines.iter().enumerate() {
            if !line.contains(keyword) {
                continue;
            }

            if let Some(name) = name_after_keyword(re, line) {
                if is_valid_name_or_company(&name) {
                    debug!("キーワード '{}' と同じ行で所有者を検出: {}", keyword, name);
                    return Some(name);
                }
            }

            // OCRの位置ずれに備えて後続7行まで探す
            if let Some(name) = scan_candidates(&lines, i + 1, (i + 8).min(lines.len()), 1) {
                debug!("キーワード '{}' の後続行で所有者を検出: {}", keyword, name);
                return Some(name);
            }
        }
    }

    if let Some(name) = extract_owner_from_split_keyword(&lines) {
        return Some(name);
    }

    warn!("所有者が見つかりません");
    None
}

/// 「所有人」が「所」…「人」に分割されたケース
fn extract_owner_from_split_keyword(lines: &[&str]) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let head = line.trim();
        let head_len = head.chars().count();
        let is_head = matches!(head, "所" | "所有" | "所 有") || (head_len <= 3 && head.contains('所'));
        if !is_head {
            continue;
        }

        for j in 1..4.min(lines.len() - i) {
            let tail = lines[i + j].trim();
            let is_tail = matches!(tail, "人" | "有人" | "所人")
                || (tail.chars().count() <= 3 && tail.contains('人') && !matches!(tail, "人数" | "载人"));
            if !is_tail {
                continue;
            }

            debug!("分割キーワードを検出: 行{} '{}' + 行{} '{}'", i, head, i + j, tail);
            let end = (i + j + 8).min(lines.len());
            if let Some(name) = scan_candidates(lines, i + j + 1, end, 2) {
                info!("分割キーワードから所有者を検出: {}", name);
                return Some(name);
            }
            break;
        }
    }

    None
}

/// 請求書から購入者名を抽出
pub fn extract_buyer_name(text: &str) -> Option<String> {
    BUYER_PATTERNS.iter().find_map(|(_, re)| {
        let name = name_after_keyword(re, text)?;
        is_valid_name_or_company(&name).then_some(name)
    })
}

/// 登記証の転移登記欄から新しい所有者名を抽出
pub fn extract_new_owner_name(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();

    for (keyword, re) in NEW_OWNER_PATTERNS.iter() {
        for (i, line) in lines.iter().enumerate() {
            if !line.contains(keyword) {
                continue;
            }

            if let Some(name) = name_after_keyword(re, line) {
                if is_valid_name_or_company(&name) {
                    return Some(name);
                }
            }

            // 後続3行のうち、2文字以上の漢字列を含む最初の行だけを見る
            let next = lines
                .iter()
                .take((i + 4).min(lines.len()))
                .skip(i + 1)
                .find_map(|l| first_cjk_run(l.trim()));

            if let Some(name) = next {
                if is_valid_name_or_company(&name) && extract_owner_name(text).as_deref() != Some(name.as_str()) {
                    return Some(name);
                }
            }
        }
    }

    None
}

/// 短い人名（2〜4文字）の厳密チェック
fn is_valid_name(name: &str) -> bool {
    if name.chars().count() < 2 {
        return false;
    }

    if NON_NAME_WORDS.iter().any(|w| w.contains(name) || name.contains(w)) {
        return false;
    }

    if name.ends_with(['市', '省', '区', '县', '镇', '村', '街', '路', '号']) {
        return false;
    }

    !["kg", "mm", "人", "质量", "尺寸", "载"].iter().any(|k| name.contains(k))
}

/// 人名または会社名として妥当か
pub fn is_valid_name_or_company(name: &str) -> bool {
    let len = name.chars().count();
    if len < 2 {
        return false;
    }
    if len <= 4 {
        return is_valid_name(name);
    }
    !FORBIDDEN_IN_LONG_NAME.iter().any(|w| name.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_on_same_line() {
        let text = "机动车行驶证\n所有人：张伟\n住址 北京市朝阳区";
        assert_eq!(extract_owner_name(text).as_deref(), Some("张伟"));
    }

    #[test]
    fn owner_on_following_line_prefers_company() {
        let text = "所有人\nOwner\n王芳\n杭州某某汽车服务有限公司";
        assert_eq!(extract_owner_name(text).as_deref(), Some("杭州某某汽车服务有限公司"));
    }

    #[test]
    fn owner_skips_technical_words() {
        let text = "所有人\n住址\n李雷";
        assert_eq!(extract_owner_name(text).as_deref(), Some("李雷"));
    }

    #[test]
    fn owner_from_split_keyword() {
        let text = "所\n人\nOwner\n赵敏";
        assert_eq!(extract_owner_name(text).as_deref(), Some("赵敏"));
    }

    #[test]
    fn buyer_from_invoice() {
        let text = "机动车销售统一发票\n购方名称：陈晨";
        assert_eq!(extract_buyer_name(text).as_deref(), Some("陈晨"));
    }

    #[test]
    fn new_owner_differs_from_original_owner() {
        let text = "机动车所有人 王芳\n转移登记\n现机动车所有人\n刘洋";
        assert_eq!(extract_new_owner_name(text).as_deref(), Some("刘洋"));
    }

    #[test]
    fn new_owner_skips_single_character_line() {
        assert_eq!(extract_new_owner_name("受让方\n张\n刘洋").as_deref(), Some("刘洋"));
    }

    #[test]
    fn keyword_tables_are_complete() {
        assert_eq!(OWNER_PATTERNS.len(), OWNER_KEYWORDS.len());
        assert_eq!(BUYER_PATTERNS.len(), BUYER_KEYWORDS.len());
        assert_eq!(NEW_OWNER_PATTERNS.len(), NEW_OWNER_KEYWORDS.len());
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name_or_company("张伟"));
        assert!(!is_valid_name_or_company("北京"));
        assert!(!is_valid_name_or_company("海淀区"));
        assert!(!is_valid_name_or_company("张"));
        assert!(is_valid_name_or_company("上海汽车销售有限公司"));
        assert!(!is_valid_name_or_company("机动车登记证书编号"));
    }
}

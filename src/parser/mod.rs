//! テキスト解析モジュール - 車両書類情報の抽出

mod amount;
mod date;
mod model;
mod owner;
mod plate;
mod vin;

use crate::document::DocType;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

pub use vin::{are_similar as are_vins_similar, correct_ocr_errors, extract_vin, is_valid_vin_format};

/// 車両書類から抽出された情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleInfo {
    /// 車台番号 (VIN)
    pub vin: Option<String>,
    /// 請求金額（発票）
    pub invoice_amount: Option<String>,
    /// 所有者（登記証・行驶证）
    pub owner_name: Option<String>,
    /// 購入者（発票）
    pub buyer_name: Option<String>,
    /// 名義変更後の所有者（登記証の転移登記欄）
    pub new_owner_name: Option<String>,
    /// ナンバープレート
    pub plate_number: Option<String>,
    /// 車両型式
    pub vehicle_model: Option<String>,
    /// エンジン番号
    pub engine_number: Option<String>,
    /// 登録日
    pub register_date: Option<String>,
}

static ENGINE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"发动机号码?[:：]\s*([A-Z0-9]{6,})").expect("valid regex"));

impl VehicleInfo {
    /// OCRテキストから書類種別に応じた情報を抽出
    ///
    /// 種別が一致しなくても、本文中の目印（发票・登记栏・注册登记・行驶证）で
    /// 抽出する項目を切り替える。
    pub fn parse(text: &str, doc_type: DocType) -> Self {
        debug!("情報抽出開始 - 種別: {:?}, {} 文字", doc_type, text.chars().count());

        let mut info = Self {
            vin: vin::extract_vin(text),
            ..Self::default()
        };

        if doc_type == DocType::Invoice || text.contains("发票") {
            info.invoice_amount = amount::extract_amount(text);
            info.buyer_name = owner::extract_buyer_name(text);
        } else if doc_type == DocType::RegistrationTransfer || text.contains("登记栏") {
            info.new_owner_name = owner::extract_new_owner_name(text);
        } else if doc_type == DocType::Registration || text.contains("注册登记") {
            info.owner_name = owner::extract_owner_name(text);
            info.register_date = date::extract_register_date(text);
            info.vehicle_model = model::extract_vehicle_model(text);
        } else if doc_type == DocType::License || text.contains("行驶证") {
            info.plate_number = plate::extract_plate_number(text);
            info.owner_name = owner::extract_owner_name(text);
            info.vehicle_model = model::extract_vehicle_model(text);
        } else {
            info.invoice_amount = amount::extract_amount(text);
            info.owner_name = owner::extract_owner_name(text);
            info.buyer_name = owner::extract_buyer_name(text);
            info.plate_number = plate::extract_plate_number(text);
            info.vehicle_model = model::extract_vehicle_model(text);
        }

        info.engine_number = extract_engine_number(text);

        info!(
            "抽出結果 - VIN: {}, 所有者: {}, 金額: {}",
            info.vin.as_deref().unwrap_or("-"),
            info.owner_name.as_deref().unwrap_or("-"),
            info.invoice_amount.as_deref().unwrap_or("-"),
        );

        info
    }

    /// 複数の書類の情報を統合（各項目で最初に見つかった値を採用）
    pub fn merge<'a>(infos: impl IntoIterator<Item = &'a VehicleInfo>) -> Self {
        let mut merged = Self::default();

        for info in infos {
            fill(&mut merged.vin, &info.vin);
            fill(&mut merged.invoice_amount, &info.invoice_amount);
            fill(&mut merged.owner_name, &info.owner_name);
            fill(&mut merged.buyer_name, &info.buyer_name);
            fill(&mut merged.new_owner_name, &info.new_owner_name);
            fill(&mut merged.plate_number, &info.plate_number);
            fill(&mut merged.vehicle_model, &info.vehicle_model);
            fill(&mut merged.engine_number, &info.engine_number);
            fill(&mut merged.register_date, &info.register_date);
        }

        merged
    }

    /// 何も抽出できなかったか
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 空の項目だけを埋める
fn fill(target: &mut Option<String>, value: &Option<String>) {
    if target.as_deref().is_none_or(str::is_empty) {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            *target = Some(v.to_string());
        }
    }
}

/// エンジン番号を抽出
fn extract_engine_number(text: &str) -> Option<String> {
    let compact = text.replace(' ', "");
    ENGINE_NUMBER
        .captures(&compact)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// ファイル名に使用できない文字を置換
pub fn sanitize_for_filename(text: &str) -> String {
    let invalid_chars = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];
    let result: String = text
        .replace(['\r', '\n'], " ")
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect();

    let result = result.trim().trim_matches('_');
    if result.is_empty() {
        "unknown".to_string()
    } else {
        result.to_string()
    }
}

/// ユニークなファイル名を取得（同名ファイルがある場合は連番を付与）
pub fn get_unique_filename(directory: &std::path::Path, filename: &str) -> String {
    let path = std::path::Path::new(filename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    let ext = path.extension().and_then(|s| s.to_str());

    let mut final_name = filename.to_string();
    let mut counter = 1;

    while directory.join(&final_name).exists() {
        final_name = match ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        counter += 1;
    }

    final_name
}

#[cfg(test)]
mod tests {
    use super::*;

    const LICENSE_TEXT: &str = "中华人民共和国机动车行驶证\n号牌号码 浙A12345\n所有人 张伟\n品牌型号 大众汽车牌SVW7183LJD\n车辆识别代号 LSVAB4186E2123456\n发动机号码：CSS123456";

    const INVOICE_TEXT: &str = "机动车销售统一发票\n购方名称：陈晨\n车辆识别代号/车架号码 LSVAB4186E2123456\n价税合计 小写 150000.00";

    #[test]
    fn license_fields() {
        let info = VehicleInfo::parse(LICENSE_TEXT, DocType::License);
        assert_eq!(info.vin.as_deref(), Some("LSVAB4186E2123456"));
        assert_eq!(info.plate_number.as_deref(), Some("浙A12345"));
        assert_eq!(info.owner_name.as_deref(), Some("张伟"));
        assert_eq!(info.vehicle_model.as_deref(), Some("大众汽车牌SVW7183LJD"));
        assert_eq!(info.engine_number.as_deref(), Some("CSS123456"));
        assert_eq!(info.invoice_amount, None);
    }

    #[test]
    fn invoice_fields() {
        let info = VehicleInfo::parse(INVOICE_TEXT, DocType::Invoice);
        assert_eq!(info.vin.as_deref(), Some("LSVAB4186E2123456"));
        assert_eq!(info.invoice_amount.as_deref(), Some("150000.00"));
        assert_eq!(info.buyer_name.as_deref(), Some("陈晨"));
        assert_eq!(info.owner_name, None);
    }

    #[test]
    fn text_marker_overrides_unknown_type() {
        let info = VehicleInfo::parse(INVOICE_TEXT, DocType::Unknown);
        assert_eq!(info.invoice_amount.as_deref(), Some("150000.00"));
    }

    #[test]
    fn merge_keeps_first_non_empty_value() {
        let a = VehicleInfo {
            vin: Some("LSVAB4186E2123456".into()),
            ..Default::default()
        };
        let b = VehicleInfo {
            vin: Some("LFV2A21K0A3000001".into()),
            owner_name: Some("张伟".into()),
            ..Default::default()
        };
        let merged = VehicleInfo::merge([&a, &b]);
        assert_eq!(merged.vin.as_deref(), Some("LSVAB4186E2123456"));
        assert_eq!(merged.owner_name.as_deref(), Some("张伟"));
        assert!(!merged.is_empty());
        assert!(VehicleInfo::merge([]).is_empty());
    }

    #[test]
    fn filename_sanitizing() {
        assert_eq!(sanitize_for_filename("A/B:C"), "A_B_C");
        assert_eq!(sanitize_for_filename("//"), "unknown");
    }
}

//! Vision API クライアント

use super::auth::{get_access_token, load_credentials, ServiceAccountCredentials};
use crate::ocr::OcrEngine;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

const VISION_API_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Vision APIクライアント
pub struct VisionClient {
    credentials: ServiceAccountCredentials,
    access_token: Arc<RwLock<Option<String>>>,
    http_client: reqwest::Client,
}

impl VisionClient {
    /// 新しいクライアントを作成
    pub fn new(credentials_path: Option<&Path>) -> Result<Self> {
        let credentials = load_credentials(credentials_path)?;
        Ok(Self {
            credentials,
            access_token: Arc::new(RwLock::new(None)),
            http_client: reqwest::Client::new(),
        })
    }

    /// アクセストークンを取得（キャッシュあり）
    async fn get_token(&self) -> Result<String> {
        // キャッシュされたトークンがあれば使用
        {
            let token = self.access_token.read().await;
            if let Some(ref t) = *token {
                return Ok(t.clone());
            }
        }

        // 新しいトークンを取得
        let new_token = get_access_token(&self.http_client, &self.credentials).await?;

        // キャッシュに保存
        {
            let mut token = self.access_token.write().await;
            *token = Some(new_token.clone());
        }

        Ok(new_token)
    }

    /// 画像からテキストを抽出
    pub async fn extract_text(&self, image_path: impl AsRef<Path>) -> Result<String> {
        let image_data = tokio::fs::read(image_path.as_ref())
            .await
            .with_context(|| format!("画像ファイルの読み込みに失敗: {:?}", image_path.as_ref()))?;

        let request = build_request(&image_data);
        let token = self.get_token().await?;

        let response = self.http_client
            .post(VISION_API_URL)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .context("Vision APIリクエストに失敗")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Vision API エラー: {}", error_text);
        }

        let vision_response: VisionResponse = response
            .json()
            .await
            .context("Vision APIレスポンスのパースに失敗")?;

        Ok(vision_response.into_text())
    }
}

#[async_trait]
impl OcrEngine for VisionClient {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(&self, image: &Path) -> Result<String> {
        self.extract_text(image).await
    }
}

/// 書類向けのテキスト検出リクエスト（中国語・英語）
fn build_request(image_data: &[u8]) -> VisionRequest {
    VisionRequest {
        requests: vec![AnnotateImageRequest {
            image: Image {
                content: STANDARD.encode(image_data),
            },
            features: vec![Feature {
                feature_type: "DOCUMENT_TEXT_DETECTION".to_string(),
                max_results: 1,
            }],
            image_context: Some(ImageContext {
                language_hints: vec!["zh".to_string(), "en".to_string()],
            }),
        }],
    }
}

// Vision API リクエスト/レスポンス構造体

#[derive(Serialize)]
struct VisionRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Serialize)]
struct AnnotateImageRequest {
    image: Image,
    features: Vec<Feature>,
    #[serde(rename = "imageContext", skip_serializing_if = "Option::is_none")]
    image_context: Option<ImageContext>,
}

#[derive(Serialize)]
struct Image {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
    #[serde(rename = "maxResults")]
    max_results: i32,
}

#[derive(Serialize)]
struct ImageContext {
    #[serde(rename = "languageHints")]
    language_hints: Vec<String>,
}

#[derive(Deserialize)]
struct VisionResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

impl VisionResponse {
    /// 最初の画像の全文テキスト（検出なしなら空）
    fn into_text(self) -> String {
        self.responses
            .into_iter()
            .next()
            .and_then(|r| r.full_text_annotation)
            .map(|a| a.text.trim_end().to_string())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "fullTextAnnotation")]
    full_text_annotation: Option<TextAnnotation>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_language_hints() {
        let json = serde_json::to_value(build_request(b"abc")).unwrap();
        let request = &json["requests"][0];
        assert_eq!(request["image"]["content"], "YWJj");
        assert_eq!(request["features"][0]["type"], "DOCUMENT_TEXT_DETECTION");
        assert_eq!(request["imageContext"]["languageHints"][0], "zh");
    }

    #[test]
    fn response_text() {
        let response: VisionResponse = serde_json::from_str(
            r#"{"responses":[{"fullTextAnnotation":{"text":"机动车行驶证\n所有人 张伟\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), "机动车行驶证\n所有人 张伟");

        let empty: VisionResponse = serde_json::from_str(r#"{"responses":[{}]}"#).unwrap();
        assert_eq!(empty.into_text(), "");
    }
}

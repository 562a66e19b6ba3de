//! Google Cloud 認証処理

use anyhow::{Context, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// 認証ファイルのパスを指定する環境変数
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

const VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";

/// サービスアカウントの認証情報
#[derive(Debug, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

/// JWTクレーム
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    exp: u64,
    iat: u64,
}

/// アクセストークンレスポンス
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    expires_in: u64,
    #[allow(dead_code)]
    token_type: String,
}

/// 認証ファイルを読み込む
/// パス指定がなければ `GOOGLE_APPLICATION_CREDENTIALS` を使う
pub fn load_credentials(path: Option<&Path>) -> Result<ServiceAccountCredentials> {
    let path: PathBuf = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::var_os(CREDENTIALS_ENV)
            .map(PathBuf::from)
            .with_context(|| format!("認証ファイルが指定されていません（{} を設定してください）", CREDENTIALS_ENV))?,
    };

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("認証ファイルの読み込みに失敗: {}", path.display()))?;
    serde_json::from_str(&json).context("認証情報のパースに失敗")
}

/// アクセストークンを取得
pub async fn get_access_token(
    http_client: &reqwest::Client,
    credentials: &ServiceAccountCredentials,
) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("システム時刻が不正です")?
        .as_secs();

    let claims = Claims {
        iss: credentials.client_email.clone(),
        scope: VISION_SCOPE.to_string(),
        aud: credentials.token_uri.clone(),
        exp: now + 3600,
        iat: now,
    };

    // RSA秘密鍵でJWTを署名
    let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
        .context("RSA秘密鍵のパースに失敗")?;

    let header = Header::new(Algorithm::RS256);
    let jwt = encode(&header, &claims, &key)
        .context("JWTの生成に失敗")?;

    // トークンエンドポイントにリクエスト
    let response = http_client
        .post(&credentials.token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ])
        .send()
        .await
        .context("トークンリクエストに失敗")?;

    let token_response: TokenResponse = response
        .json()
        .await
        .context("トークンレスポンスのパースに失敗")?;

    Ok(token_response.access_token)
}

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::constants::GOOGLE_SHEETS_SINK;
use crate::error::LoadError;
use crate::load::Sink;
use crate::types::{CleanRecord, Column};

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const SHEETS_API: &str = "https://sheets.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// The fields of a Google service-account key file that the sink needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::MissingCredentials(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Overwrites a fixed range of a spreadsheet with the header row and every
/// record, values sent as-is (`RAW`).
pub struct GoogleSheetsSink {
    client: reqwest::Client,
    spreadsheet_id: String,
    credentials: PathBuf,
    range: String,
}

impl GoogleSheetsSink {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        credentials: impl Into<PathBuf>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            spreadsheet_id: spreadsheet_id.into(),
            credentials: credentials.into(),
            range: range.into(),
        }
    }

    fn signed_assertion(key: &ServiceAccountKey) -> Result<String, LoadError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &key.client_email,
            scope: SHEETS_SCOPE,
            aud: &key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &signing_key,
        )?)
    }

    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String, LoadError> {
        let assertion = Self::signed_assertion(key)?;
        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoadError::Api {
                message: format!("token exchange failed with status {status}: {body}"),
            });
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    fn values_url(&self) -> Result<reqwest::Url, LoadError> {
        let invalid = |reason: String| LoadError::Api { message: reason };
        let mut url = reqwest::Url::parse(SHEETS_API).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("cannot build a path on {SHEETS_API}")))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.range.as_str(),
            ]);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        Ok(url)
    }
}

/// Header row followed by one row per record, in canonical column order.
pub fn sheet_values(records: &[CleanRecord]) -> Vec<Vec<Value>> {
    let header: Vec<Value> = Column::header().into_iter().map(Value::from).collect();
    std::iter::once(header)
        .chain(records.iter().map(|r| {
            vec![
                json!(r.title),
                json!(r.price),
                json!(r.rating),
                json!(r.colors),
                json!(r.size),
                json!(r.gender),
                json!(r.timestamp),
            ]
        }))
        .collect()
}

#[async_trait]
impl Sink for GoogleSheetsSink {
    fn name(&self) -> &'static str {
        GOOGLE_SHEETS_SINK
    }

    #[instrument(skip(self, records), fields(spreadsheet = %self.spreadsheet_id, rows = records.len()))]
    async fn write(&self, records: &[CleanRecord]) -> Result<String, LoadError> {
        let key = ServiceAccountKey::from_file(&self.credentials)?;
        let token = self.access_token(&key).await?;
        debug!(client_email = %key.client_email, "Obtained access token");

        let body = json!({
            "range": self.range,
            "majorDimension": "ROWS",
            "values": sheet_values(records),
        });
        let response = self
            .client
            .put(self.values_url()?)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LoadError::Api {
                message: format!("values.update failed with status {status}: {text}"),
            });
        }
        Ok(text)
    }
}

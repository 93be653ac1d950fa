//! Google Sheets v4 REST client with service-account authentication

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{GOOGLE_TOKEN_URI, SHEETS_SCOPE};

/// The fields we need from a Google service-account key file.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// JWT claims for the service-account assertion
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct SheetsClient {
    http: Client,
    access_token: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    /// Exchange a signed service-account assertion for a bearer token.
    ///
    /// The token is held for the client's lifetime; a run is far shorter
    /// than the one-hour window the assertion requests.
    pub async fn connect(
        key: &ServiceAccountKey,
        spreadsheet_id: &str,
    ) -> Result<Self, SheetsError> {
        let http = Client::new();

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: key.client_email.clone(),
            scope: SHEETS_SCOPE.to_string(),
            aud: key.token_uri.clone(),
            exp: now + 3600,
            iat: now,
        };

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::Auth(format!("invalid service-account key: {}", e)))?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| SheetsError::Auth(format!("failed to sign assertion: {}", e)))?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &assertion),
        ];

        let resp = http.post(&key.token_uri).form(&params).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(SheetsError::Auth(format!("token exchange failed: {}", text)));
        }

        let token: GoogleTokenResponse = resp.json().await?;

        Ok(Self {
            http,
            access_token: token.access_token,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
            self.spreadsheet_id,
            percent_encode(range)
        )
    }

    /// Read a range of cells. Cells come back as display strings; numeric
    /// cells are stringified so row parsing sees one shape.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let resp = self
            .http
            .get(self.values_url(range))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(SheetsError::Api(text));
        }

        let range: ValueRange = resp.json().await?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    /// Write a single cell with RAW input (no sheet-side parsing).
    pub async fn update_cell(
        &self,
        sheet: &str,
        row: u32,
        column: &str,
        value: &str,
    ) -> Result<(), SheetsError> {
        let range = format!("{}!{}{}", sheet, column, row);
        self.update_range(&range, vec![vec![value.to_string()]]).await
    }

    /// Bulk RAW update of a range.
    pub async fn update_range(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), SheetsError> {
        let body = serde_json::json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });

        let resp = self
            .http
            .put(format!("{}?valueInputOption=RAW", self.values_url(range)))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(SheetsError::Api(text));
        }

        Ok(())
    }
}

fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn percent_encode(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[derive(Debug)]
pub enum SheetsError {
    Http(reqwest::Error),
    Api(String),
    Auth(String),
}

impl From<reqwest::Error> for SheetsError {
    fn from(e: reqwest::Error) -> Self {
        SheetsError::Http(e)
    }
}

impl std::fmt::Display for SheetsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsError::Http(e) => write!(f, "HTTP error: {}", e),
            SheetsError::Api(s) => write!(f, "Sheets API error: {}", s),
            SheetsError::Auth(s) => write!(f, "Sheets auth error: {}", s),
        }
    }
}

impl std::error::Error for SheetsError {}

//! Google Sheets persistence: service-account OAuth2 and the values API.
//!
//! The sheet is the only datastore. One bearer token is minted per run via
//! an RS256 JWT assertion; the URL column seeds the dedup set and accepted
//! listings are appended RAW, one row each.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Config, SHEET_TAB};
use crate::listing::Listing;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields we need from `GOOGLE_SERVICE_ACCOUNT_JSON`.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
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

#[derive(Debug, Deserialize, Default)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct SheetsClient {
    http: reqwest::Client,
    token: String,
    sheet_id: String,
}

impl SheetsClient {
    /// Parse the credential document and exchange a signed assertion for a
    /// bearer token. Fatal on failure: without the sheet there is no dedup
    /// and nowhere to write.
    pub async fn connect(config: &Config) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(&config.service_account_json)
            .context("GOOGLE_SERVICE_ACCOUNT_JSON is not a valid service-account document")?;

        let assertion = sign_assertion(&key)?;
        let http = reqwest::Client::new();

        let response = http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Google token exchange failed: {} {}", status, body));
        }

        let token: TokenResponse = response.json().await?;
        info!("Authenticated with Google Sheets as {}", key.client_email);

        Ok(Self {
            http,
            token: token.access_token,
            sheet_id: config.sheet_id.clone(),
        })
    }

    /// Read the URL column of the sheet to seed the seen-set.
    pub async fn load_seen_urls(&self) -> Result<Vec<String>> {
        let url = values_url(&self.sheet_id, &format!("'{}'!G:G", SHEET_TAB), "");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Sheets read failed: {} {}", status, body));
        }

        let range: ValueRange = response.json().await?;
        let urls = rows_to_urls(range);
        debug!("Loaded {} previously recorded URLs", urls.len());
        Ok(urls)
    }

    /// Append one listing as one row, RAW, in the fixed column order.
    pub async fn append_row(&self, listing: &Listing) -> Result<()> {
        let url = values_url(&self.sheet_id, &format!("'{}'!A:G", SHEET_TAB), ":append");
        let body = serde_json::json!({ "values": [listing.to_row()] });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Sheets append failed: {} {}", status, body));
        }

        Ok(())
    }
}

fn values_url(sheet_id: &str, range: &str, suffix: &str) -> String {
    format!(
        "{}/{}/values/{}{}",
        SHEETS_API,
        sheet_id,
        urlencoding::encode(range),
        suffix
    )
}

fn rows_to_urls(range: ValueRange) -> Vec<String> {
    range
        .values
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter_map(|cell| cell.as_str().map(|s| s.trim().to_string()))
        .filter(|url| !url.is_empty() && url != "URL")
        .collect()
}

fn sign_assertion(key: &ServiceAccountKey) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        iss: &key.client_email,
        scope: SPREADSHEETS_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + 3600,
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .context("service-account private_key is not a valid RSA PEM")?;

    Ok(encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_url_encodes_the_range() {
        let url = values_url("sheet123", "'Affitti Milano Bot'!A:G", ":append");
        assert!(url.starts_with("https://sheets.googleapis.com/v4/spreadsheets/sheet123/values/"));
        assert!(url.ends_with(":append"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_rows_to_urls_skips_header_and_blanks() {
        let range: ValueRange = serde_json::from_value(serde_json::json!({
            "range": "'Affitti Milano Bot'!G1:G4",
            "majorDimension": "ROWS",
            "values": [["URL"], ["https://www.subito.it/annunci/1"], [""], ["https://www.facebook.com/groups/g/posts/2"]]
        }))
        .unwrap();

        let urls = rows_to_urls(range);
        assert_eq!(
            urls,
            vec![
                "https://www.subito.it/annunci/1".to_string(),
                "https://www.facebook.com/groups/g/posts/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_rows_to_urls_handles_empty_sheet() {
        let range: ValueRange =
            serde_json::from_value(serde_json::json!({ "range": "x", "majorDimension": "ROWS" }))
                .unwrap();
        assert!(rows_to_urls(range).is_empty());
    }

    #[test]
    fn test_service_account_key_defaults_token_uri() {
        let key: ServiceAccountKey = serde_json::from_str(
            r#"{"client_email": "bot@project.iam.gserviceaccount.com", "private_key": "pem"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
    }
}

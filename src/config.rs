//! Runtime configuration from environment variables plus the compiled-in
//! scrape targets and acceptance thresholds.

use anyhow::{anyhow, Result};
use std::env;

/// The Facebook groups (and the Marketplace search) scanned every run, in
/// order. These are deployment constants, not runtime configuration.
pub const FACEBOOK_GROUPS: [&str; 9] = [
    "https://www.facebook.com/groups/affittimilano.flats.room/",
    "https://www.facebook.com/groups/251657727366458/",
    "https://www.facebook.com/groups/HomeStudentMilano/",
    "https://www.facebook.com/groups/441612000631632/",
    "https://www.facebook.com/groups/204469673444759/",
    "https://www.facebook.com/groups/milanoaffittiperchihafretta/",
    "https://www.facebook.com/groups/milanoaffittocasa/",
    "https://www.facebook.com/groups/582894099747293/",
    "https://www.facebook.com/marketplace/milano/search/?query=affitti&category_filter_name=for_rent",
];

/// Maximum monthly price in EUR, utilities included.
pub const PRICE_LIMIT: f64 = 600.0;

/// Keywords that mark a post as a rental type we care about.
pub const ACCOMMODATION_TYPES: [&str; 5] = ["monolocale", "stanza", "studio", "room", "camera"];

/// Tab of the target spreadsheet.
pub const SHEET_TAB: &str = "Affitti Milano Bot";

#[derive(Debug, Clone)]
pub struct Config {
    pub fb_email: String,
    pub fb_password: String,
    pub sheet_id: String,
    /// Full service-account credential document, as a JSON string.
    pub service_account_json: String,
    pub webhook_url: Option<String>,
    /// Whether candidates without an extractable price pass the filter.
    pub accept_missing_price: bool,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            fb_email: required("FB_EMAIL")?,
            fb_password: required("FB_PASSWORD")?,
            sheet_id: env::var("GOOGLE_SHEET_ID")
                .unwrap_or_else(|_| "122yhOYc6d8p7uIG-umC4tKtgApTbTokyE29CU7KIVJE".to_string()),
            service_account_json: required("GOOGLE_SERVICE_ACCOUNT_JSON")?,
            webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
            accept_missing_price: env::var("ACCEPT_MISSING_PRICE")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow!("{} must be set", name))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_scrape_targets() {
        assert_eq!(FACEBOOK_GROUPS.len(), 9);
        assert!(FACEBOOK_GROUPS.iter().all(|u| u.starts_with("https://www.facebook.com/")));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(parse_bool(" YES "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}

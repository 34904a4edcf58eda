//! Free-text extraction of listing fields from scraped posts.
//!
//! Posts are unstructured Italian text; everything here is best-effort
//! pattern matching. Extractors return `None` when nothing matched and a
//! post is never rejected at this stage.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ACCOMMODATION_TYPES;
use crate::listing::{Listing, RawPost};

// Price formats seen in the groups: "€500", "500 €", "500€/mese",
// "500 euro", decimal comma for cents.
static PRICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"€\s*(\d+(?:[.,]\d{2})?)").unwrap(),
        Regex::new(r"(\d+(?:[.,]\d{2})?)\s*€").unwrap(),
        Regex::new(r"(\d+(?:[.,]\d{2})?)\s*euro\b").unwrap(),
        Regex::new(r"(\d+(?:[.,]\d{2})?)\s*eur\b").unwrap(),
    ]
});

// Italian mobile/landline formats, with an optional contact prefix.
static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\+?39\s?\d{9,10}").unwrap(),
        Regex::new(r"\d{2,3}\s?\d{3,4}\s?\d{3,4}").unwrap(),
        Regex::new(r"(?i)(?:tel|cell|phone|mobile)[\s:.]*([+\d][\d\s\-]{6,})").unwrap(),
    ]
});

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

/// Milan neighborhoods looked up in post text, first match wins.
static MILAN_ZONES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Duomo", "Centro", "Navigli", "Ticinese", "Porta Romana",
        "Porta Vittoria", "Porta Monforte", "Porta Venezia", "Garibaldi",
        "Porta Nuova", "Moscova", "Brera", "Sant'Ambrogio", "Magenta",
        "Cairoli", "Cordusio", "Lanza", "Vercelli", "Pagano", "Conciliazione",
        "Cadorna", "Bocconi", "Gratosoglio", "De Angeli", "Wagner",
        "Buonarroti", "Moscatelli", "Nolo", "Isola", "Pastrone", "Stazione",
        "Centrale", "Lambrate", "Cologno", "Monza", "Brianza", "Vimercate",
    ]
});

const TITLE_MAX_CHARS: usize = 200;

/// Extract a monthly price in EUR. Decimal comma is normalized to a dot.
pub fn extract_price(text: &str) -> Option<f64> {
    let text = text.to_lowercase();
    for pattern in PRICE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&text) {
            let normalized = caps[1].replace(',', ".");
            if let Ok(price) = normalized.parse::<f64>() {
                return Some(price);
            }
        }
    }
    None
}

/// Extract a phone number. Requires at least 9 digits so that prices and
/// dates in the same post don't match.
pub fn extract_phone(text: &str) -> Option<String> {
    for pattern in PHONE_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let matched = caps
                .get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            let digits = matched.chars().filter(|c| c.is_ascii_digit()).count();
            if digits >= 9 {
                return Some(matched.to_string());
            }
        }
    }
    None
}

pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// Look up a known Milan zone in the text, returning its canonical casing.
pub fn extract_zone(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    MILAN_ZONES
        .iter()
        .find(|zone| lower.contains(&zone.to_lowercase()))
        .map(|zone| zone.to_string())
}

/// First accommodation keyword contained in the text, if any.
pub fn accommodation_type(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    ACCOMMODATION_TYPES
        .iter()
        .copied()
        .find(|keyword| lower.contains(keyword))
}

/// Build a listing candidate from a raw post. Unmatched fields stay empty;
/// hopeless candidates are culled later by the filter.
pub fn parse_post(raw: &RawPost) -> Listing {
    let titolo = raw
        .text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .chars()
        .take(TITLE_MAX_CHARS)
        .collect();

    Listing {
        platform: raw.platform,
        titolo,
        prezzo: extract_price(&raw.text),
        tipo: accommodation_type(&raw.text),
        zona: extract_zone(&raw.text),
        telefono: extract_phone(&raw.text),
        email: extract_email(&raw.text),
        url: raw.url.clone(),
    }
}

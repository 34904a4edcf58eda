//! Listing data model shared by the scrapers and the sheet writer.

use serde::Serialize;

/// Column order of the target sheet. Rows are appended RAW in this order.
pub const SHEET_COLUMNS: [&str; 7] = [
    "Platform", "Titolo", "Prezzo", "Zona", "Telefono", "Email", "URL",
];

/// A post as it comes off a page, before any parsing.
#[derive(Debug, Clone)]
pub struct RawPost {
    pub platform: &'static str,
    pub text: String,
    pub url: String,
}

/// A candidate rental listing extracted from a single post.
///
/// Optional fields stay `None` when nothing matched; the filter decides
/// whether the candidate survives. Never persisted on its own.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub platform: &'static str,
    pub titolo: String,
    pub prezzo: Option<f64>,
    /// Matched accommodation keyword, e.g. "monolocale" or "stanza".
    pub tipo: Option<&'static str>,
    pub zona: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub url: String,
}

impl Listing {
    /// Render the listing as one sheet row, following `SHEET_COLUMNS`.
    /// Absent optionals become empty cells.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.platform.to_string(),
            self.titolo.clone(),
            self.prezzo.map(format_price).unwrap_or_default(),
            self.zona.clone().unwrap_or_default(),
            self.telefono.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
            self.url.clone(),
        ]
    }
}

/// Format a price for the sheet: whole euros without a decimal tail.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("€{}", price as i64)
    } else {
        format!("€{}", price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Listing {
        Listing {
            platform: "Facebook",
            titolo: "Monolocale zona Navigli".to_string(),
            prezzo: Some(550.0),
            tipo: Some("monolocale"),
            zona: Some("Navigli".to_string()),
            telefono: Some("3331234567".to_string()),
            email: None,
            url: "https://www.facebook.com/groups/affittimilano/posts/1".to_string(),
        }
    }

    #[test]
    fn test_row_follows_column_order() {
        let row = sample().to_row();
        assert_eq!(row.len(), SHEET_COLUMNS.len());
        assert_eq!(row[0], "Facebook");
        assert_eq!(row[1], "Monolocale zona Navigli");
        assert_eq!(row[2], "€550");
        assert_eq!(row[3], "Navigli");
        assert_eq!(row[4], "3331234567");
        assert_eq!(row[5], "");
        assert_eq!(row[6], "https://www.facebook.com/groups/affittimilano/posts/1");
    }

    #[test]
    fn test_missing_optionals_render_empty() {
        let mut listing = sample();
        listing.prezzo = None;
        listing.zona = None;
        listing.telefono = None;
        let row = listing.to_row();
        assert_eq!(row[2], "");
        assert_eq!(row[3], "");
        assert_eq!(row[4], "");
    }

    #[test]
    fn test_price_formatting() {
        assert_eq!(format_price(550.0), "€550");
        assert_eq!(format_price(550.5), "€550.5");
    }
}

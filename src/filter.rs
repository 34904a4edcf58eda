//! Acceptance rules for listing candidates.

use crate::config::PRICE_LIMIT;
use crate::listing::Listing;

#[derive(Debug, Clone, Copy)]
pub struct FilterPolicy {
    pub price_limit: f64,
    /// Whether candidates with no extractable price pass. Off by default.
    pub accept_missing_price: bool,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            price_limit: PRICE_LIMIT,
            accept_missing_price: false,
        }
    }
}

/// Pure accept/reject decision: an accommodation keyword must have matched
/// and the price must be within the ceiling (or absent, if policy allows).
pub fn accepts(listing: &Listing, policy: &FilterPolicy) -> bool {
    if listing.tipo.is_none() {
        return false;
    }
    match listing.prezzo {
        Some(price) => price <= policy.price_limit,
        None => policy.accept_missing_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(prezzo: Option<f64>, tipo: Option<&'static str>) -> Listing {
        Listing {
            platform: "Facebook",
            titolo: "Annuncio".to_string(),
            prezzo,
            tipo,
            zona: None,
            telefono: None,
            email: None,
            url: "https://www.facebook.com/groups/g/posts/1".to_string(),
        }
    }

    #[test]
    fn test_rejects_over_price_limit() {
        let policy = FilterPolicy::default();
        assert!(!accepts(&candidate(Some(601.0), Some("stanza")), &policy));
        assert!(!accepts(&candidate(Some(700.0), Some("stanza")), &policy));
        assert!(!accepts(&candidate(Some(1200.0), Some("monolocale")), &policy));
    }

    #[test]
    fn test_rejects_without_accommodation_keyword() {
        let policy = FilterPolicy::default();
        assert!(!accepts(&candidate(Some(400.0), None), &policy));
        assert!(!accepts(&candidate(None, None), &policy));
    }

    #[test]
    fn test_accepts_within_limit() {
        let policy = FilterPolicy::default();
        assert!(accepts(&candidate(Some(550.0), Some("monolocale")), &policy));
        assert!(accepts(&candidate(Some(600.0), Some("camera")), &policy));
    }

    #[test]
    fn test_missing_price_follows_policy() {
        let strict = FilterPolicy::default();
        assert!(!accepts(&candidate(None, Some("stanza")), &strict));

        let lenient = FilterPolicy {
            accept_missing_price: true,
            ..FilterPolicy::default()
        };
        assert!(accepts(&candidate(None, Some("stanza")), &lenient));
    }
}

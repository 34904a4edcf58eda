//! Public listing portals scraped without a login: Subito, Bakeca and
//! Idealista search pages over plain HTTP.
//!
//! Each portal is described by a `SiteSpec`; the anchors found on its search page
//! go through the same parse/filter/dedup path as the Facebook posts.

use std::time::Duration;

use anyhow::Result;
use scraper::{Html, Selector};
use tracing::info;

use crate::listing::RawPost;
use crate::session;

pub struct SiteSpec {
    pub platform: &'static str,
    pub search_url: &'static str,
    pub anchor_selector: &'static str,
    pub link_prefix: &'static str,
    /// Extra keyword the anchor text must contain (Idealista: private
    /// listings only).
    pub required_keyword: Option<&'static str>,
    pub max_items: usize,
}

pub const SITES: &[SiteSpec] = &[
    SiteSpec {
        platform: "Subito",
        search_url: "https://www.subito.it/annunci-piemonte/affitti/milano/?sort=newest&max=600",
        anchor_selector: r#"a[href*="/annunci/"]"#,
        link_prefix: "https://www.subito.it",
        required_keyword: None,
        max_items: 20,
    },
    SiteSpec {
        platform: "Bakeca",
        search_url: "https://www.bakeca.it/annunci-affitti-case-stanze-milano.html",
        anchor_selector: r#"a[href*="/annunci/"]"#,
        link_prefix: "https://www.bakeca.it",
        required_keyword: None,
        max_items: 20,
    },
    SiteSpec {
        platform: "Idealista",
        search_url: "https://www.idealista.it/affitti-milano.html?maxPrice=600&actualPage=1",
        anchor_selector: r#"a[href*="/immobili/"]"#,
        link_prefix: "https://www.idealista.it",
        required_keyword: Some("privato"),
        max_items: 15,
    },
];

/// Fetch one portal's search page and collect its listing anchors.
pub async fn fetch_site_listings(site: &SiteSpec) -> Result<Vec<RawPost>> {
    info!("Scraping {}: {}", site.platform, site.search_url);

    let client = reqwest::Client::builder()
        .user_agent(session::random_user_agent())
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(Duration::from_secs(30))
        .build()?;

    let html = client
        .get(site.search_url)
        .header("Accept-Language", "it-IT,it;q=0.9,en;q=0.5")
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let items = collect_site_items(site, &html);
    info!("Found {} {} anchors", items.len(), site.platform);
    Ok(items)
}

fn collect_site_items(site: &SiteSpec, html: &str) -> Vec<RawPost> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse(site.anchor_selector).unwrap();

    document
        .select(&anchor_selector)
        .take(site.max_items)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let text = anchor
                .text()
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                return None;
            }
            if let Some(keyword) = site.required_keyword {
                if !text.to_lowercase().contains(keyword) {
                    return None;
                }
            }

            let url = if href.starts_with("http") {
                href.to_string()
            } else {
                format!("{}{}", site.link_prefix, href)
            };

            Some(RawPost {
                platform: site.platform,
                text,
                url,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_site_items_absolutizes_links() {
        let html = r#"
            <html><body>
              <a href="/annunci/monolocale-550-euro">Monolocale 550 € zona Centrale</a>
              <a href="https://www.subito.it/annunci/stanza-400">Stanza 400 €</a>
              <a href="/altro/non-annuncio">Qualcos'altro</a>
            </body></html>
        "#;
        let items = collect_site_items(&SITES[0], html);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://www.subito.it/annunci/monolocale-550-euro");
        assert_eq!(items[1].url, "https://www.subito.it/annunci/stanza-400");
        assert_eq!(items[0].platform, "Subito");
    }

    #[test]
    fn test_required_keyword_filters_anchors() {
        let html = r#"
            <html><body>
              <a href="/immobili/1">Monolocale privato 500 €</a>
              <a href="/immobili/2">Monolocale agenzia 500 €</a>
            </body></html>
        "#;
        let items = collect_site_items(&SITES[2], html);
        assert_eq!(items.len(), 1);
        assert!(items[0].text.to_lowercase().contains("privato"));
    }

    #[test]
    fn test_max_items_bounds_collection() {
        let mut html = String::from("<html><body>");
        for i in 0..40 {
            html.push_str(&format!(r#"<a href="/annunci/{i}">Stanza {i} a 400 €</a>"#));
        }
        html.push_str("</body></html>");
        let items = collect_site_items(&SITES[0], &html);
        assert_eq!(items.len(), SITES[0].max_items);
    }
}

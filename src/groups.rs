//! Facebook group feed fetcher: navigate, scroll to trigger lazy loading,
//! snapshot the rendered DOM and collect the visible posts.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use headless_chrome::Tab;
use rand::Rng;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::listing::RawPost;
use crate::session;

const SCROLL_PASSES: u32 = 5;

/// Fetch the recent visible posts of one group (or the Marketplace search).
/// Bounded by what the feed renders after a few scrolls, never full history.
pub fn fetch_group_posts(tab: &Arc<Tab>, group_url: &str) -> Result<Vec<RawPost>> {
    info!("Scraping group: {}", group_url);

    tab.navigate_to(group_url)?;
    tab.wait_until_navigated()?;
    thread::sleep(Duration::from_secs(3));

    session::check_for_checkpoint(tab)?;

    // Lazy feeds render on scroll; vary step and pause to look human.
    for _ in 0..SCROLL_PASSES {
        let _ = tab.evaluate("window.scrollBy(0, window.innerHeight * 0.8);", false);
        let pause = 800 + rand::thread_rng().gen_range(0..1200);
        thread::sleep(Duration::from_millis(pause));
    }

    let html = tab.get_content()?;
    let posts = collect_posts(&html);
    info!("Found {} feed posts", posts.len());
    Ok(posts)
}

/// Collect `[role="article"]` nodes from a rendered feed snapshot.
fn collect_posts(html: &str) -> Vec<RawPost> {
    let document = Html::parse_document(html);
    let article_selector = Selector::parse(r#"[role="article"]"#).unwrap();
    let link_selector =
        Selector::parse(r#"a[href*="/groups/"], a[href*="/marketplace/item"]"#).unwrap();

    document
        .select(&article_selector)
        .filter_map(|article| {
            let text = article
                .text()
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            if text.is_empty() {
                debug!("Skipping empty article node");
                return None;
            }

            let url = article
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(canonical_post_url)
                .unwrap_or_default();

            Some(RawPost {
                platform: "Facebook",
                text,
                url,
            })
        })
        .collect()
}

/// Absolutize a post permalink and strip tracking query/fragment so the
/// same post always yields the same dedup key.
fn canonical_post_url(href: &str) -> String {
    let absolute = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("https://www.facebook.com{}", href)
    };
    let end = absolute
        .find(|c| c == '?' || c == '#')
        .unwrap_or(absolute.len());
    absolute[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_posts_from_feed_snapshot() {
        let html = r#"
            <html><body>
              <div role="article">
                <span>Affittasi monolocale</span>
                <span>€550/mese</span>
                <a href="/groups/affittimilano/posts/42/?__cft__=abc">link</a>
              </div>
              <div role="article">
                <span>Stanza singola 480 €</span>
              </div>
              <div role="article"></div>
            </body></html>
        "#;

        let posts = collect_posts(html);
        assert_eq!(posts.len(), 2);
        assert!(posts[0].text.contains("Affittasi monolocale"));
        assert_eq!(
            posts[0].url,
            "https://www.facebook.com/groups/affittimilano/posts/42/"
        );
        assert!(posts[1].url.is_empty());
    }

    #[test]
    fn test_canonical_post_url_strips_tracking() {
        assert_eq!(
            canonical_post_url("https://www.facebook.com/groups/g/posts/1?__cft__=x#frag"),
            "https://www.facebook.com/groups/g/posts/1"
        );
        assert_eq!(
            canonical_post_url("/marketplace/item/123456/"),
            "https://www.facebook.com/marketplace/item/123456/"
        );
    }
}

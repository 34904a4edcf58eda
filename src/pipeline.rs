//! One end-to-end scrape run, strictly sequential:
//! sheet auth → seen-set load → Facebook login → per-group fetch →
//! parse → filter → dedup → append → public portals → done.
//!
//! Error ladder: sheet or Facebook auth failure is fatal; a group or portal
//! failure skips that source; a row-write failure is logged and the batch
//! continues. No retries inside a run.

use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, FACEBOOK_GROUPS};
use crate::dedup::SeenSet;
use crate::filter::{self, FilterPolicy};
use crate::groups;
use crate::listing::{Listing, RawPost};
use crate::parser;
use crate::session::FbSession;
use crate::sheets::SheetsClient;
use crate::sites;

#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub scraped: usize,
    pub accepted: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub no_url: usize,
    pub groups_failed: usize,
    pub sites_failed: usize,
    pub write_failures: usize,
}

pub async fn run_once(config: &Config) -> Result<RunSummary> {
    let policy = FilterPolicy {
        accept_missing_price: config.accept_missing_price,
        ..FilterPolicy::default()
    };

    // Sheet access first: without it there is no dedup and nowhere to write.
    let sheets = SheetsClient::connect(config).await?;
    let mut seen = SeenSet::from_urls(sheets.load_seen_urls().await?);
    info!("Seen-set seeded with {} recorded listings", seen.len());

    let mut summary = RunSummary::default();

    let fb = FbSession::open(&config.fb_email, &config.fb_password)
        .context("Facebook authentication failed")?;

    for group_url in FACEBOOK_GROUPS {
        match groups::fetch_group_posts(fb.tab(), group_url) {
            Ok(posts) => {
                process_posts(&posts, &policy, &mut seen, &sheets, &mut summary).await;
            }
            Err(e) => {
                warn!("Group fetch failed, skipping {}: {:#}", group_url, e);
                summary.groups_failed += 1;
            }
        }

        let pause = 2 + rand::thread_rng().gen_range(0..4);
        tokio::time::sleep(Duration::from_secs(pause)).await;
    }

    // Close Chrome before the plain-HTTP portals.
    drop(fb);

    for site in sites::SITES {
        match sites::fetch_site_listings(site).await {
            Ok(items) => {
                process_posts(&items, &policy, &mut seen, &sheets, &mut summary).await;
            }
            Err(e) => {
                warn!("{} fetch failed, skipping: {:#}", site.platform, e);
                summary.sites_failed += 1;
            }
        }
    }

    info!(
        "Run complete: {} scraped, {} accepted, {} appended, {} duplicates, {} sources failed",
        summary.scraped,
        summary.accepted,
        summary.appended,
        summary.duplicates,
        summary.groups_failed + summary.sites_failed,
    );
    Ok(summary)
}

async fn process_posts(
    posts: &[RawPost],
    policy: &FilterPolicy,
    seen: &mut SeenSet,
    sheets: &SheetsClient,
    summary: &mut RunSummary,
) {
    for raw in posts {
        summary.scraped += 1;
        let listing = parser::parse_post(raw);

        if !should_append(&listing, policy, seen, summary) {
            continue;
        }

        match sheets.append_row(&listing).await {
            Ok(()) => {
                summary.appended += 1;
                info!("Appended: {} ({})", listing.titolo, listing.url);
            }
            Err(e) => {
                // Keep going with the rest of the batch; the URL never
                // reached the sheet, so the next run retries it.
                warn!("Row append failed for {}: {:#}", listing.url, e);
                summary.write_failures += 1;
            }
        }
    }
}

/// Filter + dedup decision for one candidate, updating the counters for
/// everything short of the actual write.
fn should_append(
    listing: &Listing,
    policy: &FilterPolicy,
    seen: &mut SeenSet,
    summary: &mut RunSummary,
) -> bool {
    if !filter::accepts(listing, policy) {
        return false;
    }
    summary.accepted += 1;

    if listing.url.is_empty() {
        summary.no_url += 1;
        return false;
    }
    if !seen.insert(&listing.url) {
        summary.duplicates += 1;
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::RawPost;

    fn raw(text: &str, url: &str) -> RawPost {
        RawPost {
            platform: "Facebook",
            text: text.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_same_url_twice_appends_once() {
        let policy = FilterPolicy::default();
        let mut seen = SeenSet::default();
        let mut summary = RunSummary::default();

        let post = raw(
            "Monolocale €550/mese zona Isola",
            "https://www.facebook.com/groups/g/posts/1",
        );
        let first = parser::parse_post(&post);
        let second = parser::parse_post(&post);

        assert!(should_append(&first, &policy, &mut seen, &mut summary));
        assert!(!should_append(&second, &policy, &mut seen, &mut summary));
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.accepted, 2);
    }

    #[test]
    fn test_over_limit_candidate_never_reaches_the_sheet() {
        let policy = FilterPolicy::default();
        let mut seen = SeenSet::default();
        let mut summary = RunSummary::default();

        let listing = parser::parse_post(&raw(
            "Stanza €700/mese zona Centrale",
            "https://www.facebook.com/groups/g/posts/2",
        ));
        assert!(!should_append(&listing, &policy, &mut seen, &mut summary));
        assert_eq!(summary.accepted, 0);
        assert_eq!(seen.len(), 0);
    }

    #[test]
    fn test_url_already_in_sheet_is_rejected() {
        let policy = FilterPolicy::default();
        let mut seen = SeenSet::from_urls(vec![
            "https://www.facebook.com/groups/g/posts/3".to_string(),
        ]);
        let mut summary = RunSummary::default();

        let listing = parser::parse_post(&raw(
            "Camera singola 480 € zona Bocconi",
            "https://www.facebook.com/groups/g/posts/3",
        ));
        assert!(!should_append(&listing, &policy, &mut seen, &mut summary));
        assert_eq!(summary.duplicates, 1);
    }

    #[test]
    fn test_candidate_without_url_is_dropped() {
        let policy = FilterPolicy::default();
        let mut seen = SeenSet::default();
        let mut summary = RunSummary::default();

        let listing = parser::parse_post(&raw("Stanza 400 € zona Lambrate", ""));
        assert!(!should_append(&listing, &policy, &mut seen, &mut summary));
        assert_eq!(summary.no_url, 1);
    }
}

//! Facebook browser session: Chrome launch, cookie reuse, credential login
//! and checkpoint detection.
//!
//! Authentication failure is fatal to the run; recovery is the next
//! scheduled invocation, never an in-run retry.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use headless_chrome::protocol::cdp::{Network, Page};
use headless_chrome::{Browser, LaunchOptions, Tab};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::stealth::stealth_script;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    ]
});

const COOKIE_FILE: &str = "cookies.json";
const LOGIN_URL: &str = "https://www.facebook.com/login";

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36")
}

/// Stored cookie, `cookies.json` schema: domain key -> cookie list.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
}

pub type CookieMap = std::collections::HashMap<String, Vec<Cookie>>;

/// An authenticated Facebook browser session. Dropping it closes Chrome.
pub struct FbSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl FbSession {
    /// Launch a hardened Chrome, reuse stored cookies when present, and
    /// fall back to a credential login.
    pub fn open(email: &str, password: &str) -> Result<Self> {
        let browser = launch_browser()?;
        let tab = browser.new_tab()?;

        tab.enable_debugger()?;
        tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
            source: stealth_script().to_string(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        })?;

        if let Some(cookies) = load_cookies("facebook.com") {
            inject_cookies(&tab, &cookies);
        }

        login(&tab, email, password)?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }
}

fn launch_browser() -> Result<Browser> {
    info!("Launching headless Chrome...");

    let mut args = vec![
        std::ffi::OsStr::new("--disable-blink-features=AutomationControlled"),
        std::ffi::OsStr::new("--no-sandbox"),
        std::ffi::OsStr::new("--disable-dev-shm-usage"),
        std::ffi::OsStr::new("--disable-infobars"),
        std::ffi::OsStr::new("--window-position=0,0"),
        std::ffi::OsStr::new("--ignore-certificate-errors"),
        std::ffi::OsStr::new("--headless=new"),
    ];
    let ua_arg = format!("--user-agent={}", random_user_agent());
    args.push(std::ffi::OsStr::new(&ua_arg));

    Browser::new(LaunchOptions {
        headless: false, // new headless mode is passed via args
        window_size: Some((1920, 1080)),
        args,
        ..Default::default()
    })
    .context("Failed to launch Chrome")
}

/// Load stored cookies for a domain, if a cookie file exists.
pub fn load_cookies(domain_key: &str) -> Option<Vec<Cookie>> {
    if !Path::new(COOKIE_FILE).exists() {
        return None;
    }

    let content = match std::fs::read_to_string(COOKIE_FILE) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", COOKIE_FILE, e);
            return None;
        }
    };

    match serde_json::from_str::<CookieMap>(&content) {
        Ok(map) => match map.get(domain_key) {
            Some(cookies) => {
                info!("🍪 Found {} stored cookies for {}", cookies.len(), domain_key);
                Some(cookies.clone())
            }
            None => None,
        },
        Err(e) => {
            warn!("Failed to parse {}: {}", COOKIE_FILE, e);
            None
        }
    }
}

/// Inject cookies via CDP before navigating. Individual failures are
/// logged and skipped; the login flow covers a stale session.
fn inject_cookies(tab: &Arc<Tab>, cookies: &[Cookie]) {
    info!("🍪 Injecting {} cookies...", cookies.len());
    for cookie in cookies {
        let result = tab.call_method(Network::SetCookie {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            url: None,
            domain: Some(cookie.domain.clone()),
            path: Some(cookie.path.clone()),
            secure: Some(cookie.secure),
            http_only: Some(false),
            same_site: None,
            expires: None,
            priority: None,
            same_party: None,
            source_scheme: None,
            source_port: None,
            partition_key: None,
        });
        if let Err(e) = result {
            warn!("Failed to set cookie {}: {}", cookie.name, e);
        }
    }
}

fn login(tab: &Arc<Tab>, email: &str, password: &str) -> Result<()> {
    tab.navigate_to(LOGIN_URL)?;
    tab.wait_until_navigated()?;
    thread::sleep(Duration::from_secs(2));

    dismiss_cookie_banner(tab);

    if is_logged_in(tab) {
        info!("Reused stored Facebook session, skipping credential login");
        check_for_checkpoint(tab)?;
        return Ok(());
    }

    if email.is_empty() || password.is_empty() {
        return Err(anyhow!(
            "No stored session and FB_EMAIL/FB_PASSWORD are empty"
        ));
    }

    info!("Logging in as {}...", email);
    tab.wait_for_element_with_custom_timeout("input#email", Duration::from_secs(15))?;

    focus_field(tab, "input#email")?;
    type_slow(tab, email)?;
    focus_field(tab, "input#pass")?;
    type_slow(tab, password)?;

    tab.press_key("Enter")?;
    tab.wait_until_navigated()?;
    thread::sleep(Duration::from_secs(3));

    check_for_checkpoint(tab)?;

    if tab.get_url().contains("/login") {
        return Err(anyhow!("Facebook login failed, still on the login page"));
    }

    info!("✅ Facebook login successful");
    Ok(())
}

fn is_logged_in(tab: &Arc<Tab>) -> bool {
    tab.evaluate("document.cookie.includes('c_user')", false)
        .ok()
        .and_then(|result| result.value)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

fn dismiss_cookie_banner(tab: &Arc<Tab>) {
    let _ = tab.evaluate(
        r#"
        (() => {
            const selectors = [
                'button[data-cookiebanner="accept_button"]',
                'button[data-testid="cookie-policy-manage-dialog-accept-button"]',
                'div[role="dialog"] div[aria-label][role="button"]',
            ];
            for (const selector of selectors) {
                const btn = document.querySelector(selector);
                if (btn && btn.offsetParent !== null) { btn.click(); return "clicked"; }
            }
            return "none";
        })();
        "#,
        false,
    );
}

fn focus_field(tab: &Arc<Tab>, selector: &str) -> Result<()> {
    tab.evaluate(
        &format!(
            r#"const el = document.querySelector('{}'); if (el) {{ el.click(); el.focus(); el.value = ''; }}"#,
            selector
        ),
        false,
    )?;
    thread::sleep(Duration::from_millis(400));
    Ok(())
}

/// Human-paced typing into the focused element.
fn type_slow(tab: &Arc<Tab>, text: &str) -> Result<()> {
    for ch in text.chars() {
        tab.type_str(&ch.to_string())?;
        let pause = 60 + rand::thread_rng().gen_range(0..90);
        thread::sleep(Duration::from_millis(pause));
    }
    Ok(())
}

/// Detect Facebook checkpoint/security-challenge pages. A checkpoint means
/// the session is burned for this run.
pub fn check_for_checkpoint(tab: &Arc<Tab>) -> Result<()> {
    let url = tab.get_url();
    if url.contains("checkpoint") || url.contains("challenge") || url.contains("suspicious") {
        return Err(anyhow!("Checkpoint URL detected: {}", url));
    }

    if let Ok(html) = tab.get_content() {
        if html.contains("Verify it's you")
            || html.contains("security check")
            || html.contains("temporarily locked")
        {
            return Err(anyhow!("Checkpoint content detected"));
        }
    }

    Ok(())
}

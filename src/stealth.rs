//! Fingerprint hardening injected before any page script runs.
//!
//! Facebook flags vanilla headless Chrome quickly; this covers the checks
//! that matter for a logged-in feed scrape (webdriver flag, runtime object,
//! plugin/language surface).

/// Script for `Page.addScriptToEvaluateOnNewDocument`.
pub fn stealth_script() -> &'static str {
    r#"
    // Unmask automation
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
    });

    // Italian desktop profile
    Object.defineProperty(navigator, 'languages', {
        get: () => ['it-IT', 'it', 'en-US'],
    });

    // Headless Chrome ships zero plugins; give it a plausible surface
    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3],
    });

    // Minimal chrome runtime object, enough for presence checks
    window.chrome = window.chrome || {
        runtime: {
            sendMessage: function () {},
            onMessage: { addListener: function () {}, removeListener: function () {} },
        },
        app: { isInstalled: false },
    };

    // Notification permission probe must not report the denied+headless combo
    const originalQuery = window.navigator.permissions.query;
    window.navigator.permissions.query = (parameters) =>
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters);
    "#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_covers_the_basic_probes() {
        let script = stealth_script();
        assert!(script.contains("webdriver"));
        assert!(script.contains("it-IT"));
        assert!(script.contains("window.chrome"));
    }
}

//! Browser identity profiles for fetch attempts.
//!
//! Each attempt picks one complete profile so the user agent and its
//! companion headers always agree. Mixing headers across profiles is a
//! fingerprinting giveaway.

use std::time::SystemTime;

/// One coherent browser identity: user agent plus matching header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserIdentity {
    pub label: &'static str,
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_language: &'static str,
    /// Client-hint brand list; None for browsers that do not send it.
    pub sec_ch_ua: Option<&'static str>,
    pub sec_ch_ua_platform: Option<&'static str>,
}

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Fixed identity pool (current browser versions as of late 2024).
pub const IDENTITY_POOL: &[BrowserIdentity] = &[
    BrowserIdentity {
        label: "chrome-win",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        accept: ACCEPT_HTML,
        accept_language: "en-US,en;q=0.9",
        sec_ch_ua: Some(r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#),
        sec_ch_ua_platform: Some(r#""Windows""#),
    },
    BrowserIdentity {
        label: "chrome-mac",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        accept: ACCEPT_HTML,
        accept_language: "en-US,en;q=0.9",
        sec_ch_ua: Some(r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#),
        sec_ch_ua_platform: Some(r#""macOS""#),
    },
    BrowserIdentity {
        label: "firefox-win",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "en-US,en;q=0.5",
        sec_ch_ua: None,
        sec_ch_ua_platform: None,
    },
    BrowserIdentity {
        label: "firefox-mac",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "en-CA,en;q=0.5",
        sec_ch_ua: None,
        sec_ch_ua_platform: None,
    },
    BrowserIdentity {
        label: "safari-mac",
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "en-CA,en-US;q=0.9,en;q=0.8",
        sec_ch_ua: None,
        sec_ch_ua_platform: None,
    },
    BrowserIdentity {
        label: "edge-win",
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
        accept: ACCEPT_HTML,
        accept_language: "en-US,en;q=0.9",
        sec_ch_ua: Some(r#""Microsoft Edge";v="131", "Chromium";v="131", "Not_A Brand";v="24""#),
        sec_ch_ua_platform: Some(r#""Windows""#),
    },
];

/// Pick an identity for one attempt. Independent per call so consecutive
/// attempts do not share a stable fingerprint.
pub fn random_identity() -> &'static BrowserIdentity {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0);
    &IDENTITY_POOL[nanos % IDENTITY_POOL.len()]
}

// src/normalize.rs
//! Text normalization applied before scoring and word counting.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:https?|www)\S+").expect("url regex"));
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[@#]\w+").expect("mention/hashtag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Strip URLs, then @mentions and #hashtags, then collapse whitespace and trim.
///
/// Pure and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    // 1) URLs (http…, https…, www…) up to the next whitespace
    let out = RE_URL.replace_all(text, "");

    // 2) Mentions and hashtags
    let out = RE_TAG.replace_all(&out, "");

    // 3) Collapse whitespace
    let out = RE_WS.replace_all(&out, " ");
    out.trim().to_string()
}

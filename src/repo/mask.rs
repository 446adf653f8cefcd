// src/repo/mask.rs

use std::sync::LazyLock;

use regex::Regex;

static URL_CREDENTIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*://)[^@/\s]+@")
        .unwrap_or_else(|e| panic!("credential mask regex is invalid: {e}"))
});

/// Replace the user-info part of every URL in `text` with `***`.
///
/// Used on anything that may echo an authenticated remote URL (git stderr,
/// dry-run output, log fields).
pub fn mask_credentials(text: &str) -> String {
    URL_CREDENTIALS
        .replace_all(text, "${scheme}***@")
        .into_owned()
}

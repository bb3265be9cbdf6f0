use url::Url;

use crate::domain::UrlMode;

/// Collect the URLs the user typed, in the order they appear.
///
/// Single mode always yields exactly one (possibly empty) entry, multiple
/// mode yields one entry per non-blank line.
pub fn collect_urls(mode: UrlMode, single: &str, multiple: &str) -> Vec<String> {
    match mode {
        UrlMode::Single => vec![single.trim().to_string()],
        UrlMode::Multiple => multiple
            .trim()
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Whether `input` points at a Bandcamp page.
///
/// yt-dlp accepts anything it has an extractor for, so this is only used to
/// warn about unexpected input.
pub fn is_bandcamp_url(input: &str) -> bool {
    Url::parse(input)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host == "bandcamp.com" || host.ends_with(".bandcamp.com"))
}

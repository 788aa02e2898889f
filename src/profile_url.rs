//! Reddit profile URL parsing.

use url::Url;

/// Extract the username from a Reddit profile URL.
///
/// Accepts `https://www.reddit.com/user/<name>` and `/u/<name>` forms on
/// `reddit.com` or any of its subdomains, with or without a scheme or a
/// trailing path. A bare username (optionally `u/`-prefixed) is returned
/// as-is. Returns `None` for anything else, including other hosts.
pub fn extract_username(input: &str) -> Option<String> {
    let input = input.trim();
    if is_bare_username(input) {
        return Some(input.trim_start_matches("u/").to_owned());
    }

    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()?;
    if !url.host_str().is_some_and(is_reddit_host) {
        return None;
    }
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let prefix = segments.next()?;
    if !prefix.eq_ignore_ascii_case("user") && !prefix.eq_ignore_ascii_case("u") {
        return None;
    }
    let name = segments.next()?;
    is_valid_name(name).then(|| name.to_owned())
}

fn is_reddit_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "reddit.com" || host.ends_with(".reddit.com")
}

fn is_bare_username(input: &str) -> bool {
    let name = input.strip_prefix("u/").unwrap_or(input);
    is_valid_name(name)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

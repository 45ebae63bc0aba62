use url::Url;

/// Schemes accepted as-is from user input. Anything else that happens to parse
/// (`localhost:8080`, `example.com:443`) is really a host with a port.
const KNOWN_SCHEMES: &[&str] = &["http", "https", "file", "ftp", "data", "about", "mailto"];

/// Scheme prepended to input that is not already a URL.
pub const FALLBACK_SCHEME: &str = "https";

/// Best-effort normalization of typed input into something loadable.
///
/// Input that parses strictly with a known scheme is returned unchanged
/// (apart from surrounding whitespace). Otherwise `https://` is prepended
/// once. The result is not validated further; the engine rejects what it
/// cannot load.
pub fn normalize_url(input: &str) -> String {
    let input = input.trim();

    if let Ok(url) = Url::parse(input) {
        if KNOWN_SCHEMES.contains(&url.scheme()) {
            return input.to_string();
        }
    }

    let prefixed = format!("{FALLBACK_SCHEME}://{input}");
    if let Err(e) = Url::parse(&prefixed) {
        log::debug!("'{}' is still not a valid URL ({}), passing it on", prefixed, e);
    }
    prefixed
}

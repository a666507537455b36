use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped during normalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL into the key used by the visited set and the frontier
///
/// Legacy government servers are sensitive to path shape (trailing slashes,
/// `www.` hosts), so the path and host are kept as the server wrote them.
///
/// # Normalization Steps
///
/// 1. Parse the URL (resolves `.`/`..` segments, lowercases the host,
///    drops default ports); reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Require a host
/// 4. Remove the fragment
/// 5. Remove tracking query parameters (`utm_*`, `fbclid`, ...)
/// 6. Sort the remaining query parameters by key, keeping relative order
///    of repeated keys
/// 7. Remove an empty query string
///
/// # Examples
///
/// ```
/// use lex_archiver::url::normalize_url;
///
/// let url = normalize_url("http://WWW.PLANALTO.GOV.BR/ccivil_03/leis/L001.htm#art1").unwrap();
/// assert_eq!(url.as_str(), "http://www.planalto.gov.br/ccivil_03/leis/L001.htm");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::InvalidScheme(format!(
            "expected http or https, got {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    let kept = retained_query_pairs(&url);
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Ok(url)
}

/// Query pairs minus tracking parameters, stably sorted by key
fn retained_query_pairs(url: &Url) -> Vec<(String, String)> {
    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    // Repeated keys keep their original order
    kept.sort_by(|a, b| a.0.cmp(&b.0));
    kept
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

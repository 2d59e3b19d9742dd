//! Destination URL checks applied before a link is created.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::domain::errors::LinkError;

/// Longest destination accepted, matching the `links.destination` column.
pub const MAX_DESTINATION_LENGTH: usize = 2048;

/// Permissive URL shape: optional scheme, optional userinfo, dotted host with
/// a 2-5 letter TLD, optional port and path.
static URL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:https?://(?:www\.)?|//)?(?:[a-z0-9_-]*:?[a-z0-9_-]*@)?[a-z0-9]+(?:[-.][a-z0-9]+)*\.[a-z]{2,5}(?::[0-9]{1,5})?(?:[/?#].*)?$",
    )
    .expect("URL shape pattern is valid")
});

/// Validates a destination and returns it trimmed.
///
/// The destination must look like a URL and must not point back at the
/// shortener's own host, so a short link can never redirect to another short
/// link on the same service.
///
/// # Errors
///
/// Returns [`LinkError::InvalidDestination`] with the reason.
pub fn validate_destination(destination: &str, service_host: &str) -> Result<String, LinkError> {
    let destination = destination.trim();

    if destination.is_empty() {
        return Err(LinkError::InvalidDestination("destination is empty".into()));
    }
    if destination.len() > MAX_DESTINATION_LENGTH {
        return Err(LinkError::InvalidDestination(format!(
            "destination longer than {MAX_DESTINATION_LENGTH} characters"
        )));
    }
    if !URL_SHAPE.is_match(destination) {
        return Err(LinkError::InvalidDestination("destination is not a URL".into()));
    }

    let host = host_of(destination)
        .ok_or_else(|| LinkError::InvalidDestination("destination has no host".into()))?;

    if !service_host.is_empty() && host == normalize_host(service_host) {
        return Err(LinkError::InvalidDestination(
            "destination points at this service".into(),
        ));
    }

    Ok(destination.to_string())
}

/// Returns the absolute URL a redirect should send the client to.
///
/// Destinations may be stored without a scheme; those default to `https`.
pub fn redirect_target(destination: &str) -> String {
    if destination.starts_with("//") {
        format!("https:{destination}")
    } else if has_scheme(destination) {
        destination.to_string()
    } else {
        format!("https://{destination}")
    }
}

/// Lowercased host of a URL-like string, without a leading `www.`.
pub fn host_of(url_like: &str) -> Option<String> {
    let parsed = Url::parse(&redirect_target(url_like)).ok()?;
    parsed.host_str().map(normalize_host)
}

/// Normalizes a bare host name for comparison.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

fn has_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

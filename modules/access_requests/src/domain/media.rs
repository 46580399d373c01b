use url::Url;

use crate::domain::error::DomainError;

/// Parse a user-supplied media link and check it against the allowed hosts.
///
/// Accepts http(s) URLs whose host equals one of `allowed_hosts` or is a
/// subdomain of one.
pub fn parse_media_url(raw: &str, allowed_hosts: &[String]) -> Result<Url, DomainError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| DomainError::invalid_input("url", format!("not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DomainError::invalid_input(
            "url",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    let host = url
        .host_str()
        .ok_or_else(|| DomainError::invalid_input("url", "missing host"))?
        .to_ascii_lowercase();

    let allowed = allowed_hosts.iter().any(|h| {
        let h = h.to_ascii_lowercase();
        host == h || host.ends_with(&format!(".{h}"))
    });
    if !allowed {
        return Err(DomainError::invalid_input(
            "url",
            format!("host '{host}' is not supported"),
        ));
    }

    Ok(url)
}

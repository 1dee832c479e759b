//! Capability probe: one HEAD request to learn the resource size and whether
//! the server will honor byte ranges.
use crate::error::{DownloadError, Result};
use crate::job::ProbeResult;
use reqwest::Client;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, HeaderMap};
use tracing::{debug, warn};
use url::Url;

/// Issues a HEAD request against `url` and inspects the headers.
///
/// # Errors
///
/// * [`DownloadError::RemoteUnavailable`] if the server answers with a
///   non-success status.
/// * [`DownloadError::Network`] if the request itself fails.
pub async fn probe(url: &Url, client: &Client) -> Result<ProbeResult> {
    let response = client.head(url.clone()).send().await?;

    if !response.status().is_success() {
        return Err(DownloadError::RemoteUnavailable {
            status: response.status(),
        });
    }

    Ok(inspect_headers(response.headers()))
}

/// Ranges are only usable when the server advertises `Accept-Ranges: bytes`
/// and also tells us how long the resource is.
fn inspect_headers(headers: &HeaderMap) -> ProbeResult {
    let accepts_bytes = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes"));

    if !accepts_bytes {
        warn!("Remote does not accept ranges");
        return ProbeResult::unsupported();
    }
    debug!("Header will accept range queries");

    // Read the header itself; the body size hint of a HEAD response is 0.
    let length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match length {
        Some(total_size) => {
            debug!("Length of remote is {}", total_size);
            ProbeResult {
                supports_ranges: true,
                total_size,
            }
        }
        None => {
            warn!("Remote did not specify a length");
            ProbeResult::unsupported()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(reqwest::header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn ranges_and_length_are_required() {
        let result = inspect_headers(&headers(&[
            (ACCEPT_RANGES, "bytes"),
            (CONTENT_LENGTH, "1000000"),
        ]));
        assert_eq!(
            result,
            ProbeResult {
                supports_ranges: true,
                total_size: 1_000_000
            }
        );
    }

    #[test]
    fn missing_length_disables_ranges() {
        let result = inspect_headers(&headers(&[(ACCEPT_RANGES, "bytes")]));
        assert!(!result.supports_ranges);
    }

    #[test]
    fn accept_ranges_none_disables_ranges() {
        let result = inspect_headers(&headers(&[
            (ACCEPT_RANGES, "none"),
            (CONTENT_LENGTH, "1000000"),
        ]));
        assert!(!result.supports_ranges);

        let result = inspect_headers(&headers(&[(CONTENT_LENGTH, "1000000")]));
        assert!(!result.supports_ranges);
    }

    #[test]
    fn garbage_length_disables_ranges() {
        let result = inspect_headers(&headers(&[
            (ACCEPT_RANGES, "bytes"),
            (CONTENT_LENGTH, "lots"),
        ]));
        assert!(!result.supports_ranges);
    }
}

use url::Url;

use bolo_core::error::{BoloError, Result};

/// Parse the configured service base address.
pub fn parse_base_url(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| BoloError::Config(format!("invalid base_url '{}': {}", base, e)))
}

/// Build an endpoint URL by appending path segments to `base`.
///
/// Segments are percent-encoded, so a user id containing `/` or spaces
/// stays a single segment.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| BoloError::Config(format!("base_url '{}' cannot be a base", base)))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Resolve an audio reference returned by `/tts` to an absolute address.
///
/// Relative paths (`/static/x.mp3`) are joined against the service origin;
/// absolute URLs pass through unchanged.
pub fn resolve_audio_url(base: &str, audio_url: &str) -> Result<String> {
    if let Ok(absolute) = Url::parse(audio_url) {
        return Ok(absolute.to_string());
    }
    let base = parse_base_url(base)?;
    base.join(audio_url)
        .map(|u| u.to_string())
        .map_err(|e| BoloError::InvalidResponse(format!("bad audio_url '{}': {}", audio_url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_audio_url() {
        let resolved = resolve_audio_url("http://localhost:8000", "/static/tts_ab12.mp3").unwrap();
        assert_eq!(resolved, "http://localhost:8000/static/tts_ab12.mp3");
    }

    #[test]
    fn test_resolve_absolute_audio_url_passes_through() {
        let resolved =
            resolve_audio_url("http://localhost:8000", "https://cdn.example.org/a.mp3").unwrap();
        assert_eq!(resolved, "https://cdn.example.org/a.mp3");
    }

    #[test]
    fn test_resolve_with_invalid_base() {
        assert!(resolve_audio_url("not a url", "/static/a.mp3").is_err());
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = parse_base_url("http://localhost:8000").unwrap();
        let url = endpoint(&base, &["user_history", "alice smith/x"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/user_history/alice%20smith%2Fx"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = parse_base_url("http://example.org/api/").unwrap();
        let url = endpoint(&base, &["chat"]).unwrap();
        assert_eq!(url.as_str(), "http://example.org/api/chat");
    }
}

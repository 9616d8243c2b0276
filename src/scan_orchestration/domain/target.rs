use super::scan::{ScanConfig, ScanType};
use crate::shared::error::ScanError;
use crate::shared::security::{validate_size, MAX_CONTENT_SIZE};
use crate::shared::Result;
use url::Url;

/// Maximum length for URL and API targets
const MAX_URL_LENGTH: usize = 2048;

/// Maximum length for file names
const MAX_FILE_NAME_LENGTH: usize = 255;

/// Upper bound for the per-scan deadline, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Path markers an API endpoint must contain
const API_PATH_MARKERS: [&str; 3] = ["/api/", "/v1/", "/graphql"];

/// A validated scan target
///
/// Construction performs all input validation, so holding a `ScanTarget`
/// means no stage will ever see a malformed target.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanTarget {
    raw: String,
    scan_type: ScanType,
    url: Option<Url>,
}

impl ScanTarget {
    pub fn parse(target: &str, scan_type: ScanType) -> Result<Self> {
        let trimmed = target.trim();
        if trimmed.is_empty() {
            return Err(ScanError::validation(
                "Target cannot be empty",
                "Pass a URL, an API endpoint or a file name",
            )
            .into());
        }

        match scan_type {
            ScanType::Url | ScanType::Api => {
                let url = Self::parse_http_url(trimmed, scan_type)?;
                Ok(Self {
                    raw: trimmed.to_string(),
                    scan_type,
                    url: Some(url),
                })
            }
            ScanType::File => {
                if trimmed.len() > MAX_FILE_NAME_LENGTH {
                    return Err(ScanError::validation(
                        format!(
                            "File name is too long ({} bytes). Maximum allowed: {} bytes",
                            trimmed.len(),
                            MAX_FILE_NAME_LENGTH
                        ),
                        "Use a shorter file name",
                    )
                    .into());
                }
                Ok(Self {
                    raw: trimmed.to_string(),
                    scan_type,
                    url: None,
                })
            }
        }
    }

    fn parse_http_url(target: &str, scan_type: ScanType) -> Result<Url> {
        if target.len() > MAX_URL_LENGTH {
            return Err(ScanError::validation(
                format!("URL too long ({} bytes)", target.len()),
                format!("URLs are limited to {} bytes", MAX_URL_LENGTH),
            )
            .into());
        }

        let url = Url::parse(target).map_err(|e| {
            ScanError::validation(
                format!("Invalid URL format: {}", e),
                "Must start with http:// or https://",
            )
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ScanError::validation(
                format!("Unsupported scheme '{}'", url.scheme()),
                "Must start with http:// or https://",
            )
            .into());
        }

        if scan_type == ScanType::Api && !API_PATH_MARKERS.iter().any(|m| target.contains(m)) {
            return Err(ScanError::validation(
                "Invalid API endpoint",
                "Must be a valid HTTP(S) URL with an API path (/api/, /v1/ or /graphql)",
            )
            .into());
        }

        Ok(url)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    /// Parsed URL for `url` and `api` targets
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }
}

/// Validates the parts of a scan request that do not belong to the target itself
pub fn validate_request(config: &ScanConfig, content: Option<&str>) -> Result<()> {
    if config.timeout == 0 || config.timeout > MAX_TIMEOUT_SECS {
        return Err(ScanError::validation(
            format!("Timeout must be between 1 and {} seconds", MAX_TIMEOUT_SECS),
            "Set config.timeout to a positive number of seconds",
        )
        .into());
    }

    if let Some(content) = content {
        validate_size(content.len() as u64, "Scan content", MAX_CONTENT_SIZE).map_err(|e| {
            ScanError::validation(e.to_string(), "Split the content into smaller files")
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_validation_error(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<ScanError>(),
            Some(ScanError::Validation { .. })
        )
    }

    #[test]
    fn test_parse_url_valid() {
        let target = ScanTarget::parse(" https://example.com/login ", ScanType::Url).unwrap();
        assert_eq!(target.as_str(), "https://example.com/login");
        assert_eq!(target.url().unwrap().host_str(), Some("example.com"));
    }

    #[test]
    fn test_parse_empty_target() {
        let err = ScanTarget::parse("   ", ScanType::Url).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        let err = ScanTarget::parse("ftp://example.com", ScanType::Url).unwrap_err();
        assert!(err.to_string().contains("Unsupported scheme"));
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        let err = ScanTarget::parse("not a url", ScanType::Url).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_parse_api_requires_api_path() {
        assert!(ScanTarget::parse("https://example.com/api/users", ScanType::Api).is_ok());
        assert!(ScanTarget::parse("https://example.com/graphql", ScanType::Api).is_ok());
        let err = ScanTarget::parse("https://example.com/users", ScanType::Api).unwrap_err();
        assert!(err.to_string().contains("Invalid API endpoint"));
    }

    #[test]
    fn test_parse_file_name_length() {
        assert!(ScanTarget::parse("app.js", ScanType::File).is_ok());
        let long_name = "a".repeat(MAX_FILE_NAME_LENGTH + 1);
        assert!(ScanTarget::parse(&long_name, ScanType::File).is_err());
    }

    #[test]
    fn test_validate_request_timeout_bounds() {
        let mut config = ScanConfig::default();
        assert!(validate_request(&config, None).is_ok());

        config.timeout = 0;
        assert!(is_validation_error(&validate_request(&config, None).unwrap_err()));

        config.timeout = MAX_TIMEOUT_SECS + 1;
        assert!(validate_request(&config, None).is_err());
    }
}

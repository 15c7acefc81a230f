//! Safe logging helpers
//!
//! Masks credentials carried in headers so request logs never leak them.

use std::fmt;

/// Headers whose values start with an auth scheme (`Bearer`, `Basic`, ...)
const CREDENTIAL_HEADERS: [&str; 2] = ["authorization", "proxy-authorization"];

/// Masked header value
///
/// Prints `***` in place of the value. Values built with
/// [`SensitiveValue::credentials`] keep their auth scheme.
#[derive(Clone, Debug)]
pub struct SensitiveValue<'a> {
    inner: &'a str,
    keep_scheme: bool,
}

impl<'a> SensitiveValue<'a> {
    /// ```
    /// use lawyer_office_api::logging::SensitiveValue;
    ///
    /// assert_eq!(SensitiveValue::new("prod secretpart").to_string(), "***");
    /// assert_eq!(SensitiveValue::new("sessionid=xyz").to_string(), "***");
    /// ```
    pub fn new(value: &'a str) -> Self {
        Self {
            inner: value,
            keep_scheme: false,
        }
    }

    /// `Authorization`-style value: `<scheme> <credentials>`
    ///
    /// ```
    /// use lawyer_office_api::logging::SensitiveValue;
    ///
    /// assert_eq!(SensitiveValue::credentials("Bearer abc123").to_string(), "Bearer ***");
    /// assert_eq!(SensitiveValue::credentials("abc123").to_string(), "***");
    /// ```
    pub fn credentials(value: &'a str) -> Self {
        Self {
            inner: value,
            keep_scheme: true,
        }
    }
}

impl<'a> fmt::Display for SensitiveValue<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keep_scheme {
            if let Some((scheme, _)) = self.inner.split_once(' ') {
                if is_auth_scheme(scheme) {
                    return write!(f, "{} ***", scheme);
                }
            }
        }
        write!(f, "***")
    }
}

fn is_auth_scheme(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic())
}

/// Header names are compared case-insensitively
pub fn is_sensitive_header(name: &str, redact: &[String]) -> bool {
    redact.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Masked form of `value` if `name` is sensitive, otherwise `value` unchanged
///
/// Only credential headers keep their scheme; any other redacted header is
/// replaced entirely.
pub fn sanitize_header_value(name: &str, value: &str, redact: &[String]) -> String {
    if !is_sensitive_header(name, redact) {
        return value.to_string();
    }

    if CREDENTIAL_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
    {
        SensitiveValue::credentials(value).to_string()
    } else {
        SensitiveValue::new(value).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redact() -> Vec<String> {
        vec![
            "authorization".to_string(),
            "cookie".to_string(),
            "x-api-key".to_string(),
        ]
    }

    #[test]
    fn test_credentials_keep_scheme() {
        assert_eq!(SensitiveValue::credentials("Bearer tok-123").to_string(), "Bearer ***");
        assert_eq!(SensitiveValue::credentials("Basic dXNlcjpwdw==").to_string(), "Basic ***");
    }

    #[test]
    fn test_credentials_without_scheme() {
        assert_eq!(SensitiveValue::credentials("tok-123").to_string(), "***");
    }

    #[test]
    fn test_plain_value_is_fully_masked() {
        assert_eq!(SensitiveValue::new("Bearer tok-123").to_string(), "***");
        assert_eq!(SensitiveValue::new("csrftoken=a1; sessionid=b2").to_string(), "***");
    }

    #[test]
    fn test_is_sensitive_header_case_insensitive() {
        assert!(is_sensitive_header("Authorization", &redact()));
        assert!(is_sensitive_header("COOKIE", &redact()));
        assert!(!is_sensitive_header("user-agent", &redact()));
    }

    #[test]
    fn test_sanitize_authorization_keeps_scheme() {
        assert_eq!(
            sanitize_header_value("authorization", "Bearer secret", &redact()),
            "Bearer ***"
        );
        assert_eq!(
            sanitize_header_value("Authorization", "Basic dXNlcjpwdw==", &redact()),
            "Basic ***"
        );
    }

    #[test]
    fn test_sanitize_api_key_leaks_no_words() {
        assert_eq!(
            sanitize_header_value("x-api-key", "prod secretpart", &redact()),
            "***"
        );
        assert_eq!(
            sanitize_header_value("cookie", "session abc", &redact()),
            "***"
        );
    }

    #[test]
    fn test_sanitize_leaves_other_headers() {
        assert_eq!(
            sanitize_header_value("accept", "application/json", &redact()),
            "application/json"
        );
    }
}
